// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, RANGE};
use reqwest::redirect::Policy;
use tracing::debug;

use crate::error::FetchError;

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("talsync/", env!("CARGO_PKG_VERSION"));

/// Default timeout for a single request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const MAX_REDIRECTS: usize = 10;

/// HTTP response after all redirects have been followed
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Address the request finally landed on
    pub final_url: String,
    /// Content-Type header value, if present
    pub content_type: Option<String>,
    /// Response body (empty for resolve probes)
    pub body: Bytes,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        self.status < 400
    }
}

/// HTTP client abstraction for testability
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Fetch a page, following redirects
    async fn get(&self, url: &str) -> Result<HttpResponse, reqwest::Error>;

    /// Probe a URL without downloading its body, following redirects.
    ///
    /// Used to find the final address of audio assets.
    async fn resolve(&self, url: &str) -> Result<HttpResponse, reqwest::Error>;
}

/// Default HTTP client implementation using reqwest
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Create a new ReqwestClient with the given per-request timeout
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()?;

        Ok(Self { client })
    }
}

fn content_type(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(String::from)
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, reqwest::Error> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = content_type(&response);
        let body = response.bytes().await?;

        Ok(HttpResponse {
            status,
            final_url,
            content_type,
            body,
        })
    }

    async fn resolve(&self, url: &str) -> Result<HttpResponse, reqwest::Error> {
        let mut response = self.client.head(url).send().await?;

        // Some CDNs refuse HEAD; a one-byte ranged GET lands on the same address.
        if matches!(response.status().as_u16(), 403 | 405 | 501) {
            debug!(%url, status = response.status().as_u16(), "HEAD rejected, retrying with ranged GET");
            response = self.client.get(url).header(RANGE, "bytes=0-0").send().await?;
        }

        Ok(HttpResponse {
            status: response.status().as_u16(),
            final_url: response.url().to_string(),
            content_type: content_type(&response),
            body: Bytes::new(),
        })
    }
}

/// A fetched HTML document and the address it was served from
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub final_url: String,
    pub content_type: Option<String>,
    pub body: String,
}

impl FetchedPage {
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.contains("application/json"))
    }
}

/// Fetch a page as text, treating error statuses as failures
pub async fn fetch_page<C: HttpClient + ?Sized>(
    client: &C,
    url: &str,
) -> Result<FetchedPage, FetchError> {
    let response = client
        .get(url)
        .await
        .map_err(|e| FetchError::RequestFailed {
            url: url.to_string(),
            source: e,
        })?;

    if !response.is_success() {
        return Err(FetchError::HttpStatus {
            url: url.to_string(),
            status: response.status,
        });
    }

    Ok(FetchedPage {
        final_url: response.final_url,
        content_type: response.content_type,
        body: String::from_utf8_lossy(&response.body).into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockHttpClient;

    #[test]
    fn reqwest_client_can_be_created() {
        let _client = ReqwestClient::new(DEFAULT_TIMEOUT).unwrap();
    }

    #[test]
    fn reqwest_client_can_be_cloned() {
        let client = ReqwestClient::new(Duration::from_secs(1)).unwrap();
        let _cloned = client.clone();
    }

    #[tokio::test]
    async fn fetch_page_returns_body_and_final_url() {
        let client = MockHttpClient::new()
            .with_page("https://example.com/a", "<p>hello</p>")
            .with_redirect("https://example.com/old", "https://example.com/a");

        let page = fetch_page(&client, "https://example.com/old").await.unwrap();

        assert_eq!(page.final_url, "https://example.com/a");
        assert_eq!(page.body, "<p>hello</p>");
        assert!(!page.is_json());
    }

    #[tokio::test]
    async fn fetch_page_fails_on_http_error() {
        let client = MockHttpClient::new();

        let result = fetch_page(&client, "https://example.com/missing").await;

        match result.unwrap_err() {
            FetchError::HttpStatus { status, .. } => assert_eq!(status, 404),
            other => panic!("Expected HttpStatus error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_page_detects_json_envelopes() {
        let client = MockHttpClient::new().with_json_page(
            "https://example.com/archive?page=2",
            r#"{"html": "<a></a>"}"#,
        );

        let page = fetch_page(&client, "https://example.com/archive?page=2")
            .await
            .unwrap();

        assert!(page.is_json());
    }
}
