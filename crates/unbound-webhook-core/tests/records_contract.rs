//! Contract Test: Listing Records
//!
//! Constraints verified:
//! - Each resolver record becomes one single-target endpoint with its TTL
//! - Resolver order is preserved
//! - The domain filter scopes what is listed, in both of its modes
//! - Record types ExternalDNS does not manage are skipped
//! - A resolver that cannot list surfaces as UpstreamUnavailable
//!
//! If this test fails, ExternalDNS would see a different current state than
//! the resolver actually holds.

mod common;

use common::*;
use unbound_webhook_core::{
    Changes, DomainFilter, Endpoint, EngineSettings, Error, Provider, ResourceRecord,
};

fn two_records() -> Vec<ResourceRecord> {
    vec![
        rr("test.lan", "A", 300, "192.168.1.1"),
        rr("a.example.com", "CNAME", 3600, "abc.def"),
    ]
}

async fn list(records: Vec<ResourceRecord>, filter: DomainFilter) -> Vec<Endpoint> {
    let resolver = RecordingResolver::with_records(records);
    let provider = provider_over(&resolver, filter, EngineSettings::default());
    provider.records().await.expect("records succeeds")
}

#[tokio::test]
async fn empty_store_lists_nothing() {
    assert!(list(vec![], DomainFilter::allow_all()).await.is_empty());
}

#[tokio::test]
async fn every_record_is_listed_in_resolver_order() {
    assert_eq!(
        list(two_records(), DomainFilter::allow_all()).await,
        vec![
            Endpoint::with_ttl("test.lan", "A", 300, ["192.168.1.1"]),
            Endpoint::with_ttl("a.example.com", "CNAME", 3600, ["abc.def"]),
        ]
    );
}

#[tokio::test]
async fn include_domain_filter() {
    assert_eq!(
        list(two_records(), filter(&["example.com"], &[], "", "")).await,
        vec![Endpoint::with_ttl("a.example.com", "CNAME", 3600, ["abc.def"])]
    );
}

#[tokio::test]
async fn exclude_domain_filter() {
    assert_eq!(
        list(two_records(), filter(&[], &["example.com"], "", "")).await,
        vec![Endpoint::with_ttl("test.lan", "A", 300, ["192.168.1.1"])]
    );
}

#[tokio::test]
async fn regex_domain_filter() {
    assert_eq!(
        list(two_records(), filter(&[], &[], ".*.com", "")).await,
        vec![Endpoint::with_ttl("a.example.com", "CNAME", 3600, ["abc.def"])]
    );
}

#[tokio::test]
async fn regex_domain_exclusion() {
    let records = vec![
        rr("test.lan", "A", 300, "192.168.1.1"),
        rr("a.test.lan", "CNAME", 3600, "abc.def"),
    ];

    assert_eq!(
        list(records, filter(&[], &[], ".*.lan", "^a.*")).await,
        vec![Endpoint::with_ttl("test.lan", "A", 300, ["192.168.1.1"])]
    );
}

#[tokio::test]
async fn regex_wins_over_plain_lists() {
    assert_eq!(
        list(two_records(), filter(&["example.com"], &[], r"\.lan$", "")).await,
        vec![Endpoint::with_ttl("test.lan", "A", 300, ["192.168.1.1"])]
    );
}

#[tokio::test]
async fn unsupported_types_are_skipped() {
    let records = vec![
        rr("lan", "SOA", 3600, "ns.lan. admin.lan. 1 3600 1200 604800 10800"),
        rr("1.1.168.192.in-addr.arpa", "PTR", 300, "test.lan."),
        rr("test.lan", "A", 300, "192.168.1.1"),
        rr("_sip._tcp.test.lan", "SRV", 300, "10 5 5060 sip.test.lan."),
    ];

    assert_eq!(
        list(records, DomainFilter::allow_all()).await,
        vec![
            Endpoint::with_ttl("test.lan", "A", 300, ["192.168.1.1"]),
            Endpoint::with_ttl("_sip._tcp.test.lan", "SRV", 300, ["10 5 5060 sip.test.lan."]),
        ]
    );
}

#[tokio::test]
async fn records_sharing_name_and_type_are_not_merged() {
    let records = vec![
        rr("rr.test.lan", "A", 60, "10.0.0.1"),
        rr("rr.test.lan", "A", 60, "10.0.0.2"),
    ];

    assert_eq!(
        list(records, DomainFilter::allow_all()).await,
        vec![
            Endpoint::with_ttl("rr.test.lan", "A", 60, ["10.0.0.1"]),
            Endpoint::with_ttl("rr.test.lan", "A", 60, ["10.0.0.2"]),
        ]
    );
}

#[tokio::test]
async fn unreachable_resolver_is_upstream_unavailable() {
    let resolver = RecordingResolver::new().failing_list();
    let provider = provider_over(
        &resolver,
        DomainFilter::allow_all(),
        EngineSettings::default(),
    );

    let err = provider.records().await.unwrap_err();
    assert!(matches!(err, Error::UpstreamUnavailable(_)), "got {err:?}");
    assert_eq!(resolver.list_call_count(), 1);
}

#[tokio::test]
async fn created_records_are_listed_back() {
    let resolver = RecordingResolver::new();
    let provider = provider_over(&resolver, DomainFilter::allow_all(), settings_with_ttl(300));

    let changes = Changes {
        create: vec![Endpoint::new("test.lan", "A", ["192.168.1.1"])],
        ..Changes::default()
    };
    provider.apply_changes(changes).await.unwrap();

    assert_eq!(
        provider.records().await.unwrap(),
        vec![Endpoint::with_ttl("test.lan", "A", 300, ["192.168.1.1"])]
    );
}
