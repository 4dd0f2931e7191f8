//! Reconciliation engine
//!
//! [`UnboundProvider`] implements the [`Provider`] capability on top of a
//! [`ResolverClient`]:
//! - Listing resolver records within the domain filter as endpoints
//! - Expanding change sets into ordered resolver operations
//! - Normalizing endpoint names
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐
//! │ Webhook API  │─── Changes ───┐
//! └──────────────┘               │
//!                                ▼
//!                      ┌──────────────────┐
//!                      │ UnboundProvider  │
//!                      └──────────────────┘
//!                                │
//!         ┌──────────────────────┼──────────────────────┐
//!         │                      │                      │
//!         ▼                      ▼                      ▼
//! ┌──────────────┐      ┌────────────────┐     ┌────────────────┐
//! │ DomainFilter │      │ record::expand │     │ ResolverClient │
//! │ (read side)  │      │ (fan-out, TTL) │     │ (add / remove) │
//! └──────────────┘      └────────────────┘     └────────────────┘
//! ```
//!
//! ## Apply Order
//!
//! 1. `create` → upserts
//! 2. `update_old` → removes
//! 3. `update_new` → upserts
//! 4. `delete` → removes
//!
//! The resolver only offers add and remove, so an update is a removal of the
//! old records followed by creation of the new ones. All old records go
//! before any new record is added.

use crate::domain_filter::DomainFilter;
use crate::endpoint::{Changes, Endpoint};
use crate::error::{Error, Result};
use crate::record::{self, Operation};
use crate::traits::{Provider, ResolverClient};
use async_trait::async_trait;
use tracing::{debug, info};

/// Immutable settings captured at construction
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Log operations without executing them
    pub dry_run: bool,
    /// TTL for endpoints that carry none
    pub default_ttl: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            dry_run: false,
            default_ttl: 300,
        }
    }
}

/// ExternalDNS provider backed by Unbound local data
///
/// ## Lifecycle
///
/// 1. Create with [`UnboundProvider::new()`]
/// 2. Share behind an `Arc` with the webhook server
/// 3. Each call is independent; nothing is cached between calls
///
/// ## Threading
///
/// All methods take `&self` and may run concurrently. Concurrent
/// `apply_changes` calls are not serialized.
pub struct UnboundProvider {
    /// Resolver record store
    client: Box<dyn ResolverClient>,

    /// Read-side scope
    domain_filter: DomainFilter,

    /// Dry-run flag and default TTL
    settings: EngineSettings,
}

impl UnboundProvider {
    /// Create a new provider
    ///
    /// # Parameters
    ///
    /// - `client`: resolver implementation
    /// - `domain_filter`: compiled filter for `records()`
    /// - `settings`: dry-run flag and default TTL
    pub fn new(
        client: Box<dyn ResolverClient>,
        domain_filter: DomainFilter,
        settings: EngineSettings,
    ) -> Self {
        if settings.dry_run {
            tracing::warn!("Unbound provider running in DRY-RUN mode - no changes will be made");
        }

        Self {
            client,
            domain_filter,
            settings,
        }
    }

    /// Whether mutations are suppressed
    pub fn dry_run(&self) -> bool {
        self.settings.dry_run
    }

    /// TTL applied to endpoints without one
    pub fn default_ttl(&self) -> u32 {
        self.settings.default_ttl
    }

    /// Expand a change set into the ordered operation sequence
    pub fn plan(&self, changes: &Changes) -> Vec<Operation> {
        let ttl = self.settings.default_ttl;

        expand_all(&changes.create, ttl, Operation::Upsert)
            .chain(expand_all(&changes.update_old, ttl, Operation::Remove))
            .chain(expand_all(&changes.update_new, ttl, Operation::Upsert))
            .chain(expand_all(&changes.delete, ttl, Operation::Remove))
            .collect()
    }

    /// Submit operations in order, stopping at the first failure
    ///
    /// Operations already applied are not rolled back.
    async fn submit(&self, operations: Vec<Operation>) -> Result<()> {
        if operations.is_empty() {
            info!("All records are already up to date, nothing to do");
            return Ok(());
        }

        for operation in &operations {
            let rr = operation.record();
            info!(
                record = %rr.name,
                record_type = %rr.record_type,
                ttl = rr.ttl,
                action = operation.action(),
                dry_run = self.settings.dry_run,
                "Changing record."
            );

            if self.settings.dry_run {
                continue;
            }

            let result = match operation {
                Operation::Upsert(rr) => self.client.add(rr).await,
                Operation::Remove(rr) => self.client.remove(rr).await,
            };

            result.map_err(|e| Error::ApplyFailed {
                action: operation.action().to_string(),
                name: rr.name.clone(),
                record_type: rr.record_type.to_string(),
                value: rr.value.clone(),
                message: e.to_string(),
            })?;
        }

        debug!("Applied {} operation(s)", operations.len());
        Ok(())
    }
}

fn expand_all(
    endpoints: &[Endpoint],
    ttl: u32,
    operation: fn(record::ResourceRecord) -> Operation,
) -> impl Iterator<Item = Operation> + '_ {
    endpoints
        .iter()
        .flat_map(move |e| record::expand(e, ttl))
        .map(operation)
}

impl std::fmt::Debug for UnboundProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnboundProvider")
            .field("client", &self.client.client_name())
            .field("domain_filter", &self.domain_filter)
            .field("settings", &self.settings)
            .finish()
    }
}

#[async_trait]
impl Provider for UnboundProvider {
    fn domain_filter(&self) -> &DomainFilter {
        &self.domain_filter
    }

    /// List resolver records as single-target endpoints
    ///
    /// Unsupported record types and names outside the domain filter are
    /// skipped; resolver order is preserved.
    async fn records(&self) -> Result<Vec<Endpoint>> {
        let records = self
            .client
            .list()
            .await
            .map_err(|e| Error::upstream_unavailable(e.to_string()))?;

        let endpoints: Vec<Endpoint> = records
            .iter()
            .filter(|rr| rr.record_type.is_supported())
            .filter(|rr| self.domain_filter.matches(&rr.name))
            .map(record::collapse)
            .collect();

        debug!(
            "Listed {} endpoint(s) from {} resolver record(s)",
            endpoints.len(),
            records.len()
        );
        Ok(endpoints)
    }

    async fn apply_changes(&self, changes: Changes) -> Result<()> {
        let operations = self.plan(&changes);
        self.submit(operations).await
    }

    /// Append the root dot to every name that lacks it
    async fn adjust_endpoints(&self, endpoints: Vec<Endpoint>) -> Result<Vec<Endpoint>> {
        Ok(endpoints
            .into_iter()
            .map(|mut endpoint| {
                if !endpoint.dns_name.ends_with('.') {
                    endpoint.dns_name.push('.');
                }
                endpoint
            })
            .collect())
    }
}
