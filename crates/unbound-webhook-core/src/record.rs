//! Resolver-native records and the translation to and from endpoints
//!
//! An [`Endpoint`] with N targets expands to N [`ResourceRecord`]s sharing
//! name, type and TTL. The reverse direction is one endpoint per record;
//! records sharing a name and type are not merged back together.

use crate::endpoint::{Endpoint, RecordType};
use std::fmt;

/// A single-valued resolver record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceRecord {
    pub name: String,
    pub record_type: RecordType,
    pub ttl: u32,
    pub value: String,
}

impl ResourceRecord {
    pub fn new(
        name: impl Into<String>,
        record_type: impl Into<RecordType>,
        ttl: u32,
        value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            record_type: record_type.into(),
            ttl,
            value: value.into(),
        }
    }

    /// Whether both records denote the same (name, type, value) tuple
    ///
    /// Names compare case-insensitively and ignore a trailing dot; TTL is
    /// not part of the identity.
    pub fn same_record(&self, other: &ResourceRecord) -> bool {
        same_name(&self.name, &other.name)
            && self.record_type == other.record_type
            && self.value == other.value
    }
}

impl fmt::Display for ResourceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} IN {} {}",
            self.name, self.ttl, self.record_type, self.value
        )
    }
}

/// Compare two DNS names, ignoring case and a trailing dot
pub fn same_name(a: &str, b: &str) -> bool {
    let a = a.strip_suffix('.').unwrap_or(a);
    let b = b.strip_suffix('.').unwrap_or(b);
    a.eq_ignore_ascii_case(b)
}

/// A single resolver mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Upsert(ResourceRecord),
    Remove(ResourceRecord),
}

impl Operation {
    /// Action label used in logs and errors
    pub fn action(&self) -> &'static str {
        match self {
            Operation::Upsert(_) => "CREATE",
            Operation::Remove(_) => "REMOVE",
        }
    }

    pub fn record(&self) -> &ResourceRecord {
        match self {
            Operation::Upsert(rr) | Operation::Remove(rr) => rr,
        }
    }
}

/// Fan an endpoint out to one record per target, in target order
pub fn expand(endpoint: &Endpoint, default_ttl: u32) -> Vec<ResourceRecord> {
    let ttl = endpoint.record_ttl.unwrap_or(default_ttl);
    endpoint
        .targets
        .iter()
        .map(|target| ResourceRecord {
            name: endpoint.dns_name.clone(),
            record_type: endpoint.record_type.clone(),
            ttl,
            value: target.clone(),
        })
        .collect()
}

/// Turn a resolver record into a single-target endpoint with explicit TTL
pub fn collapse(rr: &ResourceRecord) -> Endpoint {
    Endpoint::with_ttl(
        rr.name.clone(),
        rr.record_type.clone(),
        rr.ttl,
        [rr.value.clone()],
    )
}
