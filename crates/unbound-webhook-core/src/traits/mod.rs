//! Core traits for the Unbound webhook
//!
//! This module defines the abstract interfaces at the two seams of the
//! system.
//!
//! - [`ResolverClient`]: the resolver's dynamic record store (consumed)
//! - [`Provider`]: the ExternalDNS provider capability (exposed)

pub mod provider;
pub mod resolver;

pub use provider::Provider;
pub use resolver::ResolverClient;
