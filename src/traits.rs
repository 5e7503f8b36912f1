//! Provider contracts.
//!
//! [`DnsProvider`] is the public surface: one `set_record` call per desired
//! record state. Standard providers implement [`RecordOps`] instead and let
//! the shared [`crate::reconciler`] drive the resolve/query/create/update
//! flow; simple dynamic-update services (No-IP) implement [`DnsProvider`]
//! directly because their API *is* the whole flow.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::cache::ZoneCache;
use crate::error::Result;

/// Remark placed on provider-side records created by this library, for
/// providers whose records carry a comment/description field.
pub const MANAGED_MARKER: &str = concat!("Managed by ddns-provider v", env!("CARGO_PKG_VERSION"));

/// One desired record state.
#[derive(Debug, Clone)]
pub struct RecordRequest {
    /// Domain expression (see [`crate::domain::split`] for the syntax).
    pub domain: String,
    /// Record value (an IP address for A/AAAA records).
    pub value: String,
    /// Record type; defaults to `"A"`.
    pub record_type: String,
    /// TTL in seconds; `None` keeps the provider default.
    pub ttl: Option<u32>,
    /// Resolution line/route, for providers that support it.
    pub line: Option<String>,
    /// Provider-specific parameters forwarded to the adapter.
    pub extra: Map<String, Value>,
}

impl RecordRequest {
    /// An A-record request with no TTL/line overrides.
    pub fn new(domain: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            value: value.into(),
            record_type: "A".to_string(),
            ttl: None,
            line: None,
            extra: Map::new(),
        }
    }

    /// Set the record type.
    #[must_use]
    pub fn record_type(mut self, record_type: impl Into<String>) -> Self {
        self.record_type = record_type.into();
        self
    }

    /// Set the TTL in seconds.
    #[must_use]
    pub fn ttl(mut self, ttl: u32) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Set the resolution line.
    #[must_use]
    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.line = Some(line.into());
        self
    }

    /// Add a provider-specific parameter.
    #[must_use]
    pub fn extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// The public provider contract: keep one record pointed at a value.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Provider identifier used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Create or update one DNS record so it carries `request.value`.
    ///
    /// Returns `Ok(true)` on success and `Ok(false)` on a documented soft
    /// provider failure (the provider answered, but refused). Transport,
    /// authentication, and zone-resolution failures are `Err`. The call is
    /// single-shot: nothing is retried internally.
    async fn set_record(&self, request: &RecordRequest) -> Result<bool>;
}

/// Primitives a standard provider supplies to the shared reconciler.
///
/// Implementations translate each primitive to one vendor API call and stay
/// free of orchestration: no caching, no create-or-update decisions, no
/// suffix walking. Old records are raw [`Value`] objects exactly as the
/// vendor returned them, so `update_record` can carry forward fields this
/// library does not manage.
#[async_trait]
pub trait RecordOps: Send + Sync {
    /// Provider identifier used in logs and error messages.
    fn name(&self) -> &'static str;

    /// The zone-id cache owned by this provider instance.
    fn zone_cache(&self) -> &ZoneCache;

    /// Map a main domain to the provider's zone identifier. `Ok(None)` means
    /// the provider does not know the domain.
    async fn resolve_zone(&self, main_domain: &str) -> Result<Option<String>>;

    /// Find the current record for the host and type, if any.
    async fn query_record(
        &self,
        zone_id: &str,
        subdomain: &str,
        main_domain: &str,
        record_type: &str,
        line: Option<&str>,
        extra: &Map<String, Value>,
    ) -> Result<Option<Value>>;

    /// Create a new record. `Ok(false)` is a soft provider refusal.
    #[allow(clippy::too_many_arguments)]
    async fn create_record(
        &self,
        zone_id: &str,
        subdomain: &str,
        main_domain: &str,
        value: &str,
        record_type: &str,
        ttl: Option<u32>,
        line: Option<&str>,
        extra: &Map<String, Value>,
    ) -> Result<bool>;

    /// Update an existing record, preserving provider-side fields this
    /// library does not manage. `old_record` may be a synthetic
    /// `{"id": ...}` object when the caller pinned the record id, so
    /// auxiliary fields must be treated as optional.
    #[allow(clippy::too_many_arguments)]
    async fn update_record(
        &self,
        zone_id: &str,
        old_record: &Value,
        value: &str,
        record_type: &str,
        ttl: Option<u32>,
        line: Option<&str>,
        extra: &Map<String, Value>,
    ) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_defaults_to_a_record() {
        let request = RecordRequest::new("www.example.com", "192.0.2.1");
        assert_eq!(request.record_type, "A");
        assert!(request.ttl.is_none());
        assert!(request.line.is_none());
        assert!(request.extra.is_empty());
    }

    #[test]
    fn request_builder_chain() {
        let request = RecordRequest::new("www.example.com", "2001:db8::1")
            .record_type("AAAA")
            .ttl(600)
            .line("电信")
            .extra("proxied", json!(true));
        assert_eq!(request.record_type, "AAAA");
        assert_eq!(request.ttl, Some(600));
        assert_eq!(request.line.as_deref(), Some("电信"));
        assert_eq!(request.extra.get("proxied"), Some(&json!(true)));
    }

    #[test]
    fn managed_marker_carries_version() {
        assert!(MANAGED_MARKER.starts_with("Managed by ddns-provider v"));
    }
}
