//! ExternalDNS data model
//!
//! [`Endpoint`] and [`Changes`] mirror the JSON documents exchanged with
//! ExternalDNS over the webhook protocol. Field names follow the upstream
//! wire format, so these types can be (de)serialized directly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// DNS record type of an endpoint or resource record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordType {
    A,
    Aaaa,
    Cname,
    Txt,
    Srv,
    Ns,
    Mx,
    Naptr,
    Ptr,
    Soa,
    /// Any type this crate has no name for, kept verbatim (upper-cased)
    Other(String),
}

impl RecordType {
    /// Record types this provider reads from and writes to the resolver
    pub const SUPPORTED: &'static [RecordType] = &[
        RecordType::A,
        RecordType::Aaaa,
        RecordType::Cname,
        RecordType::Srv,
        RecordType::Txt,
        RecordType::Ns,
        RecordType::Mx,
        RecordType::Naptr,
    ];

    /// Canonical upper-case mnemonic
    pub fn as_str(&self) -> &str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Cname => "CNAME",
            RecordType::Txt => "TXT",
            RecordType::Srv => "SRV",
            RecordType::Ns => "NS",
            RecordType::Mx => "MX",
            RecordType::Naptr => "NAPTR",
            RecordType::Ptr => "PTR",
            RecordType::Soa => "SOA",
            RecordType::Other(name) => name,
        }
    }

    /// Whether records of this type are managed by the provider
    pub fn is_supported(&self) -> bool {
        Self::SUPPORTED.contains(self)
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Ok(match upper.as_str() {
            "A" => RecordType::A,
            "AAAA" => RecordType::Aaaa,
            "CNAME" => RecordType::Cname,
            "TXT" => RecordType::Txt,
            "SRV" => RecordType::Srv,
            "NS" => RecordType::Ns,
            "MX" => RecordType::Mx,
            "NAPTR" => RecordType::Naptr,
            "PTR" => RecordType::Ptr,
            "SOA" => RecordType::Soa,
            _ => RecordType::Other(upper),
        })
    }
}

impl From<&str> for RecordType {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(record_type) => record_type,
            Err(never) => match never {},
        }
    }
}

impl Serialize for RecordType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RecordType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(RecordType::from(raw.as_str()))
    }
}

/// Provider-specific key/value attached to an endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSpecificProperty {
    pub name: String,
    pub value: String,
}

/// A desired DNS record, possibly resolving to several targets
///
/// A TTL of `None` means the provider default applies. On the wire an unset
/// TTL is either omitted or `0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// Fully or partially qualified record name
    pub dns_name: String,

    /// Target values, in order
    #[serde(default, deserialize_with = "null_as_default")]
    pub targets: Vec<String>,

    /// Record type
    pub record_type: RecordType,

    /// Set identifier for weighted/geo policies (unused by Unbound)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub set_identifier: String,

    /// Optional TTL in seconds
    #[serde(
        rename = "recordTTL",
        default,
        skip_serializing_if = "Option::is_none",
        with = "ttl_serde"
    )]
    pub record_ttl: Option<u32>,

    /// Ownership labels maintained by ExternalDNS
    #[serde(
        default,
        skip_serializing_if = "BTreeMap::is_empty",
        deserialize_with = "null_as_default"
    )]
    pub labels: BTreeMap<String, String>,

    /// Provider-specific properties
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "null_as_default"
    )]
    pub provider_specific: Vec<ProviderSpecificProperty>,
}

impl Endpoint {
    /// Create an endpoint without a TTL (the provider default applies)
    pub fn new<T: Into<String>>(
        dns_name: impl Into<String>,
        record_type: impl Into<RecordType>,
        targets: impl IntoIterator<Item = T>,
    ) -> Self {
        Self {
            dns_name: dns_name.into(),
            targets: targets.into_iter().map(Into::into).collect(),
            record_type: record_type.into(),
            set_identifier: String::new(),
            record_ttl: None,
            labels: BTreeMap::new(),
            provider_specific: Vec::new(),
        }
    }

    /// Create an endpoint with an explicit TTL
    pub fn with_ttl<T: Into<String>>(
        dns_name: impl Into<String>,
        record_type: impl Into<RecordType>,
        ttl: u32,
        targets: impl IntoIterator<Item = T>,
    ) -> Self {
        Self {
            record_ttl: Some(ttl),
            ..Self::new(dns_name, record_type, targets)
        }
    }
}

/// Go encodes nil slices and maps as `null`
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

mod ttl_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ttl: &Option<u32>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(ttl.unwrap_or(0))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
        let ttl = Option::<u32>::deserialize(deserializer)?;
        Ok(ttl.filter(|ttl| *ttl > 0))
    }
}

/// A four-way diff produced by the ExternalDNS planner
///
/// Consumed exactly once by [`crate::Provider::apply_changes`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changes {
    #[serde(rename = "Create", default, deserialize_with = "null_as_default")]
    pub create: Vec<Endpoint>,

    #[serde(rename = "UpdateOld", default, deserialize_with = "null_as_default")]
    pub update_old: Vec<Endpoint>,

    #[serde(rename = "UpdateNew", default, deserialize_with = "null_as_default")]
    pub update_new: Vec<Endpoint>,

    #[serde(rename = "Delete", default, deserialize_with = "null_as_default")]
    pub delete: Vec<Endpoint>,
}

impl Changes {
    /// Whether the change set carries no endpoints at all
    pub fn is_empty(&self) -> bool {
        self.create.is_empty()
            && self.update_old.is_empty()
            && self.update_new.is_empty()
            && self.delete.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_type_parsing() {
        assert_eq!(RecordType::from("a"), RecordType::A);
        assert_eq!(RecordType::from("AAAA"), RecordType::Aaaa);
        assert_eq!(RecordType::from("cname"), RecordType::Cname);
        assert_eq!(
            RecordType::from("hinfo"),
            RecordType::Other("HINFO".to_string())
        );
        assert_eq!(RecordType::Aaaa.to_string(), "AAAA");
    }

    #[test]
    fn test_supported_record_types() {
        assert!(RecordType::A.is_supported());
        assert!(RecordType::Txt.is_supported());
        assert!(!RecordType::Soa.is_supported());
        assert!(!RecordType::Ptr.is_supported());
        assert!(!RecordType::Other("HINFO".to_string()).is_supported());
    }

    #[test]
    fn test_endpoint_wire_format() {
        let endpoint = Endpoint::with_ttl("test.lan", "A", 300, ["192.168.1.1"]);
        let json = serde_json::to_value(&endpoint).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "dnsName": "test.lan",
                "targets": ["192.168.1.1"],
                "recordType": "A",
                "recordTTL": 300,
            })
        );
    }

    #[test]
    fn test_zero_ttl_means_unset() {
        let endpoint: Endpoint = serde_json::from_str(
            r#"{"dnsName":"test.lan","targets":["192.168.1.1"],"recordType":"A","recordTTL":0}"#,
        )
        .unwrap();
        assert_eq!(endpoint.record_ttl, None);

        let endpoint: Endpoint =
            serde_json::from_str(r#"{"dnsName":"test.lan","recordType":"TXT"}"#).unwrap();
        assert_eq!(endpoint.record_ttl, None);
        assert!(endpoint.targets.is_empty());
        assert_eq!(endpoint.record_type, RecordType::Txt);
    }

    #[test]
    fn test_changes_wire_format() {
        let changes: Changes = serde_json::from_str(
            r#"{
                "Create": [{"dnsName":"a.test.lan","targets":["10.0.0.1"],"recordType":"A","labels":null}],
                "UpdateOld": null,
                "UpdateNew": null,
                "Delete": [{"dnsName":"b.test.lan","targets":["10.0.0.2"],"recordType":"A","recordTTL":60}]
            }"#,
        )
        .unwrap();
        assert_eq!(changes.create.len(), 1);
        assert!(changes.update_old.is_empty());
        assert!(changes.update_new.is_empty());
        assert_eq!(changes.delete[0].record_ttl, Some(60));
        assert!(!changes.is_empty());
        assert!(Changes::default().is_empty());
    }
}
