use feed_rs::parser;
use thiserror::Error;

/// The response body was not a parseable syndication document.
#[derive(Debug, Error)]
#[error("malformed feed document: {0}")]
pub struct ParseError(pub String);

/// Channel metadata plus the items found in one feed document.
///
/// Owned by the fetch task that produced it and discarded once items are
/// handed to the sink.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Items in document order; no deduplication or filtering beyond the
    /// link requirement.
    pub items: Vec<Item>,
}

/// A single discovered entry. Ownership transfers to the sink on accept.
#[derive(Debug, Clone)]
pub struct Item {
    pub title: String,
    pub link: String,
    /// Unix seconds of the publish (or last-updated) date, when present.
    pub published: Option<i64>,
    pub summary: Option<String>,
}

/// Result of parsing one document: the document itself plus the number of
/// entries dropped for missing a link.
pub struct ParseResult {
    pub document: ParsedDocument,
    pub skipped: usize,
}

/// Parse raw feed bytes (RSS or Atom) into a [`ParsedDocument`].
///
/// Entries without a link are dropped and counted in `skipped`; a missing
/// title falls back to "Untitled". Absent publish dates and summaries are
/// not errors.
pub fn parse_document(bytes: &[u8]) -> Result<ParseResult, ParseError> {
    let feed = parser::parse(bytes).map_err(|e| ParseError(e.to_string()))?;

    let title = feed.title.map(|t| t.content);
    let description = feed.description.map(|d| d.content);

    let total = feed.entries.len();
    let items: Vec<Item> = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let link = entry.links.first().map(|l| l.href.clone())?;
            let published = entry.published.or(entry.updated).map(|dt| dt.timestamp());
            let summary = entry
                .summary
                .map(|s| s.content)
                .or_else(|| entry.content.and_then(|c| c.body));
            let title = entry
                .title
                .map(|t| t.content)
                .unwrap_or_else(|| "Untitled".to_string());

            Some(Item {
                title,
                link,
                published,
                summary,
            })
        })
        .collect();

    let skipped = total - items.len();
    Ok(ParseResult {
        document: ParsedDocument {
            title,
            description,
            items,
        },
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rss_document_preserves_item_order() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <title>Example Blog</title>
    <description>Posts about examples</description>
    <item><title>first</title><link>https://example.com/1</link></item>
    <item><title>second</title><link>https://example.com/2</link></item>
    <item><title>third</title><link>https://example.com/3</link></item>
</channel></rss>"#;

        let result = parse_document(rss.as_bytes()).unwrap();
        let doc = result.document;

        assert_eq!(doc.title.as_deref(), Some("Example Blog"));
        assert_eq!(doc.description.as_deref(), Some("Posts about examples"));
        assert_eq!(result.skipped, 0);

        let titles: Vec<&str> = doc.items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
        assert_eq!(doc.items[0].link, "https://example.com/1");
    }

    #[test]
    fn optional_fields_absent_is_not_an_error() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <item><title>bare</title><link>https://example.com/bare</link></item>
</channel></rss>"#;

        let doc = parse_document(rss.as_bytes()).unwrap().document;
        assert_eq!(doc.items.len(), 1);
        assert!(doc.items[0].published.is_none());
        assert!(doc.items[0].summary.is_none());
    }

    #[test]
    fn publish_date_and_summary_pass_through() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <item>
        <title>dated</title>
        <link>https://example.com/dated</link>
        <pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate>
        <description>a summary</description>
    </item>
</channel></rss>"#;

        let doc = parse_document(rss.as_bytes()).unwrap().document;
        assert_eq!(doc.items[0].published, Some(1704067200));
        assert_eq!(doc.items[0].summary.as_deref(), Some("a summary"));
    }

    #[test]
    fn entry_without_link_is_skipped_and_counted() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <item><title>linked</title><link>https://example.com/1</link></item>
    <item><title>linkless</title></item>
</channel></rss>"#;

        let result = parse_document(rss.as_bytes()).unwrap();
        assert_eq!(result.document.items.len(), 1);
        assert_eq!(result.document.items[0].title, "linked");
        assert_eq!(result.skipped, 1);
    }

    #[test]
    fn missing_title_falls_back_to_untitled() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <item><link>https://example.com/untitled</link></item>
</channel></rss>"#;

        let doc = parse_document(rss.as_bytes()).unwrap().document;
        assert_eq!(doc.items.len(), 1);
        assert_eq!(doc.items[0].title, "Untitled");
    }

    #[test]
    fn malformed_document_is_an_error() {
        let result = parse_document(b"<not valid xml");
        assert!(result.is_err());
    }

    #[test]
    fn empty_channel_yields_no_items() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>Empty</title></channel></rss>"#;

        let result = parse_document(rss.as_bytes()).unwrap();
        assert!(result.document.items.is_empty());
        assert_eq!(result.skipped, 0);
    }

    #[test]
    fn atom_document_parses() {
        let atom = r#"<?xml version="1.0"?>
<feed xmlns="http://www.w3.org/2005/Atom">
    <title>Atom Feed</title>
    <entry>
        <title>entry one</title>
        <link href="https://example.com/atom/1"/>
        <updated>2024-01-01T00:00:00Z</updated>
    </entry>
</feed>"#;

        let doc = parse_document(atom.as_bytes()).unwrap().document;
        assert_eq!(doc.title.as_deref(), Some("Atom Feed"));
        assert_eq!(doc.items.len(), 1);
        assert_eq!(doc.items[0].link, "https://example.com/atom/1");
        assert_eq!(doc.items[0].published, Some(1704067200));
    }
}
