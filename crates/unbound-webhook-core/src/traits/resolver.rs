// # Resolver Client Trait
//
// Defines the capability the provider needs from the DNS resolver: list the
// dynamic records, add one, remove one.
//
// ## Implementations
//
// - Unbound remote control: `unbound-webhook-control` crate
// - In-memory: [`crate::resolver::MemoryResolver`] (tests, dry environments)
//
// ## Usage
//
// ```rust,ignore
// use unbound_webhook_core::{ResolverClient, ResourceRecord};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let client = /* ResolverClient implementation */;
//
//     client.add(&ResourceRecord::new("test.lan", "A", 300, "192.168.1.1")).await?;
//     for rr in client.list().await? {
//         println!("{rr}");
//     }
//
//     Ok(())
// }
// ```

use crate::record::ResourceRecord;
use async_trait::async_trait;

/// Trait for resolver record stores
///
/// # Idempotency
///
/// Both mutations must be idempotent: adding a record that already exists
/// (same name, type and value) overwrites or leaves it, and removing a record
/// that does not exist succeeds without effect.
///
/// # Thread Safety
///
/// Implementations must be usable across async tasks. The provider makes no
/// attempt to serialize concurrent callers; consistency is whatever the
/// underlying store offers.
///
/// # No Retry
///
/// Implementations return errors as-is. Retrying is the caller's decision
/// (ExternalDNS re-plans on its next loop).
#[async_trait]
pub trait ResolverClient: Send + Sync {
    /// List every dynamic record, in resolver order
    async fn list(&self) -> Result<Vec<ResourceRecord>, crate::Error>;

    /// Add (or overwrite) a single record
    async fn add(&self, rr: &ResourceRecord) -> Result<(), crate::Error>;

    /// Remove a single record; absent records are not an error
    async fn remove(&self, rr: &ResourceRecord) -> Result<(), crate::Error>;

    /// Client name (for logging/debugging)
    fn client_name(&self) -> &'static str;
}
