//! Test doubles and common utilities for provider contract tests
//!
//! The doubles wrap the in-memory resolver and count calls, so tests can
//! assert both on the resulting record set and on what reached the resolver.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use unbound_webhook_core::{
    DomainFilter, DomainFilterSpec, EngineSettings, Error, MemoryResolver, ResolverClient,
    ResourceRecord, UnboundProvider,
};

/// A resolver that records every call and can be told to fail
pub struct RecordingResolver {
    /// Backing store
    store: MemoryResolver,
    /// Call counter for list()
    list_call_count: Arc<AtomicUsize>,
    /// Call counter for add() and remove()
    mutation_call_count: Arc<AtomicUsize>,
    /// Mutations in submission order, as "ADD <rr>" / "REMOVE <rr>"
    calls: Arc<Mutex<Vec<String>>>,
    /// 1-based index of the mutation that fails
    fail_mutation_at: Option<usize>,
    /// Whether list() fails
    fail_list: bool,
}

impl RecordingResolver {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    pub fn with_records(records: impl IntoIterator<Item = ResourceRecord>) -> Self {
        Self {
            store: MemoryResolver::with_records(records),
            list_call_count: Arc::new(AtomicUsize::new(0)),
            mutation_call_count: Arc::new(AtomicUsize::new(0)),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_mutation_at: None,
            fail_list: false,
        }
    }

    /// Fail the `n`th add/remove call (1-based)
    pub fn failing_mutation_at(mut self, n: usize) -> Self {
        self.fail_mutation_at = Some(n);
        self
    }

    /// Fail every list() call
    pub fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    /// Create a new RecordingResolver that shares store and counters with an
    /// existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            store: other.store.clone(),
            list_call_count: Arc::clone(&other.list_call_count),
            mutation_call_count: Arc::clone(&other.mutation_call_count),
            calls: Arc::clone(&other.calls),
            fail_mutation_at: other.fail_mutation_at,
            fail_list: other.fail_list,
        }
    }

    pub fn list_call_count(&self) -> usize {
        self.list_call_count.load(Ordering::SeqCst)
    }

    pub fn mutation_call_count(&self) -> usize {
        self.mutation_call_count.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub async fn records(&self) -> Vec<ResourceRecord> {
        self.store.snapshot().await
    }

    fn mutation(&self, label: &str, rr: &ResourceRecord) -> Result<(), Error> {
        let n = self.mutation_call_count.fetch_add(1, Ordering::SeqCst) + 1;
        self.calls.lock().unwrap().push(format!("{} {}", label, rr));

        if self.fail_mutation_at == Some(n) {
            return Err(Error::resolver("error: injected failure"));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ResolverClient for RecordingResolver {
    async fn list(&self) -> Result<Vec<ResourceRecord>, Error> {
        self.list_call_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_list {
            return Err(Error::Network(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            )));
        }
        self.store.list().await
    }

    async fn add(&self, rr: &ResourceRecord) -> Result<(), Error> {
        self.mutation("ADD", rr)?;
        self.store.add(rr).await
    }

    async fn remove(&self, rr: &ResourceRecord) -> Result<(), Error> {
        self.mutation("REMOVE", rr)?;
        self.store.remove(rr).await
    }

    fn client_name(&self) -> &'static str {
        "recording"
    }
}

/// Shorthand for a resolver record
pub fn rr(name: &str, record_type: &str, ttl: u32, value: &str) -> ResourceRecord {
    ResourceRecord::new(name, record_type, ttl, value)
}

/// Build a provider over a handle sharing state with `resolver`
pub fn provider_over(
    resolver: &RecordingResolver,
    filter: DomainFilter,
    settings: EngineSettings,
) -> UnboundProvider {
    UnboundProvider::new(
        Box::new(RecordingResolver::sharing_counters_with(resolver)),
        filter,
        settings,
    )
}

/// Settings with the given default TTL and dry-run off
pub fn settings_with_ttl(default_ttl: u32) -> EngineSettings {
    EngineSettings {
        dry_run: false,
        default_ttl,
    }
}

/// Build a filter from the four configuration values
pub fn filter(
    include: &[&str],
    exclude: &[&str],
    include_pattern: &str,
    exclude_pattern: &str,
) -> DomainFilter {
    let owned = |v: &[&str]| v.iter().map(|s| s.to_string()).collect();
    DomainFilter::build(&DomainFilterSpec::from_parts(
        owned(include),
        owned(exclude),
        include_pattern,
        exclude_pattern,
    ))
    .expect("filter builds")
}
