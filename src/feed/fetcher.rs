use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use thiserror::Error;

use crate::feed::parser::{parse_document, ParseError, ParsedDocument};

/// Response bodies larger than this fail the fetch.
const MAX_BODY_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors that can occur while turning a feed URL into a document.
///
/// All variants are whole-feed failures: the caller gets zero items and the
/// feed stays due for its natural next-overdue turn.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request and body read exceeded the configured timeout
    #[error("request timed out")]
    Timeout,
    /// Response body exceeded the size limit
    #[error("response too large")]
    ResponseTooLarge,
    /// Body was not a parseable feed document
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Turns a feed's source URL into a [`ParsedDocument`].
///
/// Implementations must bound how long a single fetch can take: the
/// scheduler joins whole batches, so an unbounded fetch would stall every
/// subsequent cycle.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<ParsedDocument, FetchError>;
}

/// HTTP fetcher with a whole-request timeout and a capped body size.
///
/// No retry logic lives here; a failed feed is simply retried when it next
/// rotates to the front of the overdue ordering.
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<ParsedDocument, FetchError> {
        // One deadline covers the request and the body read; a server that
        // accepts the connection and then stalls cannot hold a task open.
        let retrieve = async {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(FetchError::Network)?;

            if !response.status().is_success() {
                return Err(FetchError::HttpStatus(response.status().as_u16()));
            }

            read_limited_bytes(response, MAX_BODY_SIZE).await
        };

        let bytes = tokio::time::timeout(self.timeout, retrieve)
            .await
            .map_err(|_| FetchError::Timeout)??;

        let parsed = parse_document(&bytes)?;
        if parsed.skipped > 0 {
            tracing::warn!(url, skipped = parsed.skipped, "entries without a link dropped");
        }
        Ok(parsed.document)
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length before streaming
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const VALID_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <title>Test Feed</title>
    <item><title>one</title><link>https://example.com/1</link></item>
    <item><title>two</title><link>https://example.com/2</link></item>
</channel></rss>"#;

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(reqwest::Client::new(), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn fetch_success_returns_document() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(VALID_RSS)
                    .insert_header("Content-Type", "application/xml"),
            )
            .mount(&mock_server)
            .await;

        let doc = fetcher()
            .fetch(&format!("{}/feed", mock_server.uri()))
            .await
            .unwrap();

        assert_eq!(doc.title.as_deref(), Some("Test Feed"));
        assert_eq!(doc.items.len(), 2);
        assert_eq!(doc.items[0].title, "one");
        assert_eq!(doc.items[1].title, "two");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let result = fetcher().fetch(&format!("{}/feed", mock_server.uri())).await;
        match result.unwrap_err() {
            FetchError::HttpStatus(404) => {}
            e => panic!("Expected HttpStatus(404), got {:?}", e),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_parse_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<not valid xml"))
            .mount(&mock_server)
            .await;

        let result = fetcher().fetch(&format!("{}/feed", mock_server.uri())).await;
        match result.unwrap_err() {
            FetchError::Parse(_) => {}
            e => panic!("Expected Parse error, got {:?}", e),
        }
    }

    #[tokio::test]
    async fn empty_channel_is_success_with_no_items() {
        let empty_rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel></channel></rss>"#;

        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(empty_rss))
            .mount(&mock_server)
            .await;

        let doc = fetcher()
            .fetch(&format!("{}/feed", mock_server.uri()))
            .await
            .unwrap();
        assert!(doc.items.is_empty());
    }

    #[tokio::test]
    async fn slow_response_hits_the_timeout() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(VALID_RSS)
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new(reqwest::Client::new(), Duration::from_millis(50));
        let result = fetcher.fetch(&format!("{}/feed", mock_server.uri())).await;
        match result.unwrap_err() {
            FetchError::Timeout => {}
            e => panic!("Expected Timeout, got {:?}", e),
        }
    }

    #[tokio::test]
    async fn connection_failure_is_network_error() {
        // Nothing listens on this port
        let fetcher = HttpFetcher::new(reqwest::Client::new(), Duration::from_secs(2));
        let result = fetcher.fetch("http://127.0.0.1:9/feed").await;
        assert!(matches!(
            result.unwrap_err(),
            FetchError::Network(_) | FetchError::Timeout
        ));
    }
}
