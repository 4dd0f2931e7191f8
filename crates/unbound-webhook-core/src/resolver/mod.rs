// # Resolver Client Implementations
//
// Implementations of the ResolverClient trait that live in the core crate.
// The network-backed Unbound client is in the `unbound-webhook-control` crate.

pub mod memory;

pub use memory::MemoryResolver;
