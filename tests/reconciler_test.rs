//! Reconciliation-engine tests driven by an in-memory stub provider.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use ddns_provider::{DnsError, RecordOps, RecordRequest, Result, ZoneCache, reconciler};

/// A provider whose remote state is a single in-memory record.
struct StubProvider {
    cache: ZoneCache,
    /// Main domain this stub owns.
    zone_domain: String,
    /// Zone id to answer with, or `None` to simulate an unknown domain.
    zone: Mutex<Option<String>>,
    /// The one remote record, if any.
    store: Mutex<Option<Value>>,
    resolve_calls: AtomicUsize,
    query_calls: AtomicUsize,
    create_calls: Mutex<Vec<(String, String, String)>>,
    update_calls: Mutex<Vec<(Value, String)>>,
}

impl StubProvider {
    fn new(zone: Option<&str>) -> Self {
        Self {
            cache: ZoneCache::new(),
            zone_domain: "example.com".to_string(),
            zone: Mutex::new(zone.map(ToString::to_string)),
            store: Mutex::new(None),
            resolve_calls: AtomicUsize::new(0),
            query_calls: AtomicUsize::new(0),
            create_calls: Mutex::new(Vec::new()),
            update_calls: Mutex::new(Vec::new()),
        }
    }

    fn with_record(zone: &str, record: Value) -> Self {
        let stub = Self::new(Some(zone));
        *stub.store.lock().unwrap() = Some(record);
        stub
    }

    fn resolve_count(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }

    fn query_count(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordOps for StubProvider {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn zone_cache(&self) -> &ZoneCache {
        &self.cache
    }

    async fn resolve_zone(&self, main_domain: &str) -> Result<Option<String>> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        if main_domain == self.zone_domain {
            Ok(self.zone.lock().unwrap().clone())
        } else {
            Ok(None)
        }
    }

    async fn query_record(
        &self,
        _zone_id: &str,
        _subdomain: &str,
        _main_domain: &str,
        _record_type: &str,
        _line: Option<&str>,
        _extra: &Map<String, Value>,
    ) -> Result<Option<Value>> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.store.lock().unwrap().clone())
    }

    async fn create_record(
        &self,
        zone_id: &str,
        subdomain: &str,
        _main_domain: &str,
        value: &str,
        _record_type: &str,
        _ttl: Option<u32>,
        _line: Option<&str>,
        _extra: &Map<String, Value>,
    ) -> Result<bool> {
        self.create_calls.lock().unwrap().push((
            zone_id.to_string(),
            subdomain.to_string(),
            value.to_string(),
        ));
        *self.store.lock().unwrap() = Some(json!({
            "id": "r1",
            "name": subdomain,
            "value": value,
        }));
        Ok(true)
    }

    async fn update_record(
        &self,
        _zone_id: &str,
        old_record: &Value,
        value: &str,
        _record_type: &str,
        _ttl: Option<u32>,
        _line: Option<&str>,
        _extra: &Map<String, Value>,
    ) -> Result<bool> {
        self.update_calls
            .lock()
            .unwrap()
            .push((old_record.clone(), value.to_string()));
        if let Some(record) = self.store.lock().unwrap().as_mut() {
            record["value"] = json!(value);
        }
        Ok(true)
    }
}

#[tokio::test]
async fn creates_record_when_none_exists() {
    let stub = StubProvider::new(Some("z1"));
    let request = RecordRequest::new("test.example.com", "192.0.2.1");

    let applied = reconciler::set_record(&stub, &request).await.unwrap();

    assert!(applied);
    assert_eq!(stub.resolve_count(), 1);
    assert_eq!(stub.query_count(), 1);
    assert_eq!(
        *stub.create_calls.lock().unwrap(),
        vec![(
            "z1".to_string(),
            "test".to_string(),
            "192.0.2.1".to_string()
        )]
    );
    assert!(stub.update_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn updates_existing_record_and_passes_it_through() {
    let old = json!({ "id": "r42", "name": "www", "value": "198.51.100.1", "proxied": true });
    let stub = StubProvider::with_record("z1", old.clone());
    let request = RecordRequest::new("www~example.com", "192.0.2.7");

    let applied = reconciler::set_record(&stub, &request).await.unwrap();

    assert!(applied);
    assert!(stub.create_calls.lock().unwrap().is_empty());
    // the raw old record reaches the update primitive untouched
    assert_eq!(
        *stub.update_calls.lock().unwrap(),
        vec![(old, "192.0.2.7".to_string())]
    );
}

#[tokio::test]
async fn zone_resolved_once_per_main_domain() {
    let stub = StubProvider::new(Some("z1"));
    let request = RecordRequest::new("www.example.com", "192.0.2.1");

    reconciler::set_record(&stub, &request).await.unwrap();
    reconciler::set_record(&stub, &request).await.unwrap();

    assert_eq!(stub.resolve_count(), 1);
}

#[tokio::test]
async fn failed_zone_resolution_is_fatal_and_not_cached() {
    let stub = StubProvider::new(None);
    let request = RecordRequest::new("www~example.com", "192.0.2.1");

    let err = reconciler::set_record(&stub, &request).await.unwrap_err();
    assert!(matches!(err, DnsError::ZoneNotFound { ref domain, .. } if domain == "example.com"));

    // the domain becomes resolvable: a later call must retry and succeed
    *stub.zone.lock().unwrap() = Some("z1".to_string());
    let applied = reconciler::set_record(&stub, &request).await.unwrap();
    assert!(applied);
    assert_eq!(stub.resolve_count(), 2);
}

#[tokio::test]
async fn suffix_walk_finds_deep_subdomain() {
    let stub = StubProvider::new(Some("z1"));
    let request = RecordRequest::new("a.b.example.com", "192.0.2.1");

    reconciler::set_record(&stub, &request).await.unwrap();

    assert_eq!(
        *stub.create_calls.lock().unwrap(),
        vec![("z1".to_string(), "a.b".to_string(), "192.0.2.1".to_string())]
    );
}

#[tokio::test]
async fn explicit_zone_override_skips_resolution() {
    let stub = StubProvider::new(None);
    let request = RecordRequest::new("www~example.com#zone-9", "192.0.2.1");

    let applied = reconciler::set_record(&stub, &request).await.unwrap();

    assert!(applied);
    assert_eq!(stub.resolve_count(), 0);
    assert_eq!(
        *stub.create_calls.lock().unwrap(),
        vec![(
            "zone-9".to_string(),
            "www".to_string(),
            "192.0.2.1".to_string()
        )]
    );
}

#[tokio::test]
async fn explicit_record_override_skips_query() {
    let stub = StubProvider::new(None);
    let request = RecordRequest::new("www~example.com#zone-9#rec-7", "192.0.2.1");

    let applied = reconciler::set_record(&stub, &request).await.unwrap();

    assert!(applied);
    assert_eq!(stub.query_count(), 0);
    assert_eq!(
        *stub.update_calls.lock().unwrap(),
        vec![(json!({ "id": "rec-7" }), "192.0.2.1".to_string())]
    );
}

#[tokio::test]
async fn repeated_calls_are_idempotent() {
    let stub = StubProvider::new(Some("z1"));
    let request = RecordRequest::new("www.example.com", "192.0.2.1");

    assert!(reconciler::set_record(&stub, &request).await.unwrap());
    assert!(reconciler::set_record(&stub, &request).await.unwrap());

    // first call creates, second updates the same record; never a duplicate
    assert_eq!(stub.create_calls.lock().unwrap().len(), 1);
    assert_eq!(stub.update_calls.lock().unwrap().len(), 1);
    let store = stub.store.lock().unwrap();
    assert_eq!(
        store.as_ref().and_then(|r| r.get("value")),
        Some(&json!("192.0.2.1"))
    );
}

#[tokio::test]
async fn domain_expression_is_lowercased() {
    let stub = StubProvider::new(Some("z1"));
    let request = RecordRequest::new("WWW.Example.COM", "192.0.2.1");

    reconciler::set_record(&stub, &request).await.unwrap();

    assert_eq!(
        *stub.create_calls.lock().unwrap(),
        vec![(
            "z1".to_string(),
            "www".to_string(),
            "192.0.2.1".to_string()
        )]
    );
}
