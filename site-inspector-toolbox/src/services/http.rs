//! Homepage and document fetching.

use std::error::Error as _;
use std::time::{Duration, Instant};

use log::{debug, warn};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Client, redirect};

use crate::error::{ToolboxError, ToolboxResult};
use crate::types::{HomepageFetch, HttpHeader, HttpResponse};

/// Timeouts and identity used by [`HttpClient`].
#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(2),
            request_timeout: Duration::from_secs(10),
            user_agent: "debug/1.0".to_string(),
        }
    }
}

/// HTTP client that never follows redirects and never treats a status code
/// as an error, so the response seen is exactly what the origin sent.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    request_timeout: Duration,
}

impl HttpClient {
    pub fn new(options: &HttpOptions) -> ToolboxResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("text/html"));
        headers.insert("fastly-debug", HeaderValue::from_static("1"));

        let client = Client::builder()
            .connect_timeout(options.connect_timeout)
            .timeout(options.request_timeout)
            .redirect(redirect::Policy::none())
            .user_agent(options.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(|e| {
                ToolboxError::ValidationError(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            request_timeout: options.request_timeout,
        })
    }

    /// Request `https://{domain}/`, falling back once to plain HTTP.
    ///
    /// The HTTPS failure reason is kept in `connect_error`. If the HTTP retry
    /// fails too the fetch carries no response.
    pub async fn fetch_homepage(&self, domain: &str) -> HomepageFetch {
        let https_url = format!("https://{domain}/");
        match self.get(&https_url, None).await {
            Ok(response) => HomepageFetch {
                response: Some(response),
                has_ssl: true,
                connect_error: None,
            },
            Err(https_error) => {
                let reason = https_error.to_string();
                warn!("[HTTP] {https_url} failed, retrying over HTTP: {reason}");

                let http_url = format!("http://{domain}/");
                let response = match self.get(&http_url, None).await {
                    Ok(response) => Some(response),
                    Err(e) => {
                        warn!("[HTTP] {http_url} failed: {e}");
                        None
                    }
                };

                HomepageFetch {
                    response,
                    has_ssl: false,
                    connect_error: Some(reason),
                }
            }
        }
    }

    /// Fetch a machine-readable document. Anything but a 2xx is an error.
    pub async fn get_document(&self, url: &str, timeout: Duration) -> ToolboxResult<String> {
        let response = self.get(url, Some(timeout)).await?;
        if !(200..300).contains(&response.status) {
            return Err(ToolboxError::NetworkError(format!(
                "HTTP {} from {url}",
                response.status
            )));
        }
        Ok(response.body)
    }

    async fn get(&self, url: &str, timeout: Option<Duration>) -> ToolboxResult<HttpResponse> {
        debug!("[HTTP] GET {url}");
        let start = Instant::now();

        let mut request = self.client.get(url);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout).header(ACCEPT, "application/json");
        }
        let budget = timeout.unwrap_or(self.request_timeout);

        let response = request
            .send()
            .await
            .map_err(|e| map_send_error(&e, budget))?;

        let status = response.status().as_u16();
        let headers: Vec<HttpHeader> = response
            .headers()
            .iter()
            .map(|(name, value)| HttpHeader {
                name: name.to_string(),
                value: String::from_utf8_lossy(value.as_bytes()).into_owned(),
            })
            .collect();

        let body_bytes = response
            .bytes()
            .await
            .map_err(|e| map_send_error(&e, budget))?;

        debug!(
            "[HTTP] {url} - status={status}, headers={}, bytes={}, time={:?}",
            headers.len(),
            body_bytes.len(),
            start.elapsed()
        );

        Ok(HttpResponse {
            url: url.to_string(),
            status,
            headers,
            body: String::from_utf8_lossy(&body_bytes).into_owned(),
        })
    }
}

fn map_send_error(e: &reqwest::Error, budget: Duration) -> ToolboxError {
    if e.is_timeout() {
        return ToolboxError::Timeout(budget.as_secs());
    }
    ToolboxError::NetworkError(error_chain(e))
}

/// The error text followed by each underlying cause, so TLS and DNS reasons
/// survive into the report.
fn error_chain(e: &reqwest::Error) -> String {
    let mut text = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !text.contains(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = HttpOptions::default();
        assert_eq!(options.connect_timeout, Duration::from_secs(2));
        assert_eq!(options.request_timeout, Duration::from_secs(10));
        assert_eq!(options.user_agent, "debug/1.0");
    }

    #[test]
    fn test_client_builds() {
        assert!(HttpClient::new(&HttpOptions::default()).is_ok());
    }

    /// Plain HTTP origin on loopback. Every connection gets the same
    /// response, so a TLS handshake against it fails.
    async fn plain_http_origin() -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 2048];
                    let _ = stream.read(&mut buf).await;
                    let _ = stream
                        .write_all(
                            b"HTTP/1.1 200 OK\r\nServer: loopback\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello",
                        )
                        .await;
                    let _ = stream.shutdown().await;
                });
            }
        });
        addr.to_string()
    }

    #[tokio::test]
    async fn test_fetch_homepage_falls_back_to_http() {
        let origin = plain_http_origin().await;
        let client = HttpClient::new(&HttpOptions::default()).unwrap();

        let fetch = client.fetch_homepage(&origin).await;

        assert!(!fetch.has_ssl);
        assert!(fetch.connect_error.is_some());
        let response = fetch.response.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.url, format!("http://{origin}/"));
        assert_eq!(response.header_line("server"), "loopback");
        assert_eq!(response.body, "hello");
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn test_fetch_homepage_unresolvable_host() {
        let client = HttpClient::new(&HttpOptions::default()).unwrap();
        let fetch = client.fetch_homepage("does-not-exist.invalid").await;
        assert!(!fetch.has_ssl);
        assert!(fetch.response.is_none());
        assert!(fetch.connect_error.is_some());
    }

    #[tokio::test]
    async fn test_get_document_invalid_url() {
        let client = HttpClient::new(&HttpOptions::default()).unwrap();
        let result = client
            .get_document("not a url", Duration::from_secs(1))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn test_fetch_homepage_real() {
        let client = HttpClient::new(&HttpOptions::default()).unwrap();
        let fetch = client.fetch_homepage("www.example.com").await;
        let response = fetch
            .response
            .unwrap_or_else(|| panic!("no response (network issue?)"));
        assert!(fetch.has_ssl);
        assert!(response.status > 0);
    }
}
