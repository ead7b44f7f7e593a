//! Homepage fetch trait

use async_trait::async_trait;
use site_inspector_toolbox::{HomepageFetch, HttpClient};

/// Fetches `/` of a domain, HTTPS first with one plain HTTP retry.
#[async_trait]
pub trait HomepageFetcher: Send + Sync {
    async fn fetch_homepage(&self, domain: &str) -> HomepageFetch;
}

#[async_trait]
impl HomepageFetcher for HttpClient {
    async fn fetch_homepage(&self, domain: &str) -> HomepageFetch {
        HttpClient::fetch_homepage(self, domain).await
    }
}
