// # Memory Resolver
//
// In-memory implementation of ResolverClient.
//
// ## Purpose
//
// Behaves like Unbound's local-data store for a single process: records are
// kept in insertion order, adds are keyed on (name, type, value), removals of
// absent records succeed. Used by tests and for running the webhook without a
// resolver behind it.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::record::ResourceRecord;
use crate::traits::resolver::ResolverClient;

/// In-memory resolver record store
///
/// Cloning shares the underlying store, so a test can keep a handle while
/// the provider owns another.
///
/// # Example
///
/// ```rust,no_run
/// use unbound_webhook_core::resolver::MemoryResolver;
/// use unbound_webhook_core::{ResolverClient, ResourceRecord};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let resolver = MemoryResolver::new();
///
///     resolver.add(&ResourceRecord::new("test.lan", "A", 300, "192.168.1.1")).await?;
///     assert_eq!(resolver.len().await, 1);
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryResolver {
    inner: Arc<RwLock<Vec<ResourceRecord>>>,
}

impl MemoryResolver {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `records`, in order
    pub fn with_records(records: impl IntoIterator<Item = ResourceRecord>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(records.into_iter().collect())),
        }
    }

    /// Snapshot of the stored records
    pub async fn snapshot(&self) -> Vec<ResourceRecord> {
        self.inner.read().await.clone()
    }

    /// Get the number of records in the store
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl ResolverClient for MemoryResolver {
    async fn list(&self) -> Result<Vec<ResourceRecord>, Error> {
        Ok(self.snapshot().await)
    }

    async fn add(&self, rr: &ResourceRecord) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        match guard.iter_mut().find(|existing| existing.same_record(rr)) {
            Some(existing) => existing.ttl = rr.ttl,
            None => guard.push(rr.clone()),
        }
        Ok(())
    }

    async fn remove(&self, rr: &ResourceRecord) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.retain(|existing| !existing.same_record(rr));
        Ok(())
    }

    fn client_name(&self) -> &'static str {
        "memory"
    }
}
