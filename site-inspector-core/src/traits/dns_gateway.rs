//! DNS Query Gateway trait

use async_trait::async_trait;
use site_inspector_toolbox::{DnsAnswerSet, DnsClient, RecordKind};

/// Ordered answers for a name.
///
/// Implementations never fail: resolver errors, timeouts and NXDOMAIN are
/// all an empty [`DnsAnswerSet`].
#[async_trait]
pub trait DnsGateway: Send + Sync {
    async fn resolve(&self, name: &str, kind: RecordKind) -> DnsAnswerSet;
}

#[async_trait]
impl DnsGateway for DnsClient {
    async fn resolve(&self, name: &str, kind: RecordKind) -> DnsAnswerSet {
        self.query(name, kind).await
    }
}
