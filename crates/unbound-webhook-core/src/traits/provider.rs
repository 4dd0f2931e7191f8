// # Provider Trait
//
// The capability exposed to the webhook HTTP layer. It matches the four
// operations of the ExternalDNS webhook protocol: domain filter negotiation,
// record listing, change application and endpoint adjustment.

use crate::domain_filter::DomainFilter;
use crate::endpoint::{Changes, Endpoint};
use async_trait::async_trait;

/// Trait for ExternalDNS providers
///
/// Implementations are shared between concurrent HTTP requests behind an
/// `Arc`, so every method takes `&self`.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Domain filter advertised to ExternalDNS during negotiation
    fn domain_filter(&self) -> &DomainFilter;

    /// Current records within the provider's scope
    async fn records(&self) -> Result<Vec<Endpoint>, crate::Error>;

    /// Apply one reconciliation pass
    async fn apply_changes(&self, changes: Changes) -> Result<(), crate::Error>;

    /// Normalize endpoints before ExternalDNS plans with them
    ///
    /// The default leaves endpoints untouched.
    async fn adjust_endpoints(
        &self,
        endpoints: Vec<Endpoint>,
    ) -> Result<Vec<Endpoint>, crate::Error> {
        Ok(endpoints)
    }
}
