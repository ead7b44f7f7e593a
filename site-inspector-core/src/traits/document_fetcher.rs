//! Remote document fetch trait

use std::time::Duration;

use async_trait::async_trait;
use site_inspector_toolbox::HttpClient;

use crate::error::InspectorResult;

/// Fetches a machine-readable document such as a published range feed.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Body of `url`. Connection failures and non-2xx statuses are errors.
    async fn fetch_document(&self, url: &str) -> InspectorResult<String>;
}

/// [`DocumentFetcher`] over the shared HTTP client with its own time budget.
#[derive(Clone)]
pub struct HttpDocumentFetcher {
    client: HttpClient,
    timeout: Duration,
}

impl HttpDocumentFetcher {
    pub fn new(client: HttpClient, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl DocumentFetcher for HttpDocumentFetcher {
    async fn fetch_document(&self, url: &str) -> InspectorResult<String> {
        Ok(self.client.get_document(url, self.timeout).await?)
    }
}
