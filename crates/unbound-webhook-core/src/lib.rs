// # unbound-webhook-core
//
// Core library for the Unbound ExternalDNS webhook provider.
//
// ## Architecture Overview
//
// This library reconciles ExternalDNS change sets against Unbound's dynamic
// local data:
// - **DomainFilter**: Which record names the provider may read
// - **record**: Endpoint ⇄ resource record translation
// - **UnboundProvider**: Change set → ordered resolver operations
// - **ResolverClient**: Trait for the resolver's record store
// - **HealthStatus**: Liveness/readiness flags shared with the probe server
//
// ## Design Principles
//
// 1. **Capability Seams**: The resolver and the HTTP layers are traits
// 2. **Ordered and Idempotent**: Operations run in a fixed order; each one is
//    safe to repeat
// 3. **No Hidden Retries**: Failures surface to the caller unchanged
// 4. **Library-First**: The daemon is a thin wrapper over this crate

pub mod config;
pub mod domain_filter;
pub mod endpoint;
pub mod engine;
pub mod error;
pub mod health;
pub mod record;
pub mod resolver;
pub mod traits;

// Re-export core types for convenience
pub use config::{ProviderConfig, ServerOptions};
pub use domain_filter::{DomainFilter, DomainFilterSpec};
pub use endpoint::{Changes, Endpoint, RecordType};
pub use engine::{EngineSettings, UnboundProvider};
pub use error::{Error, Result};
pub use health::HealthStatus;
pub use record::{Operation, ResourceRecord};
pub use resolver::MemoryResolver;
pub use traits::{Provider, ResolverClient};
