//! Vendor adapters.
//!
//! Each module holds one provider: its endpoint and wire conventions, the
//! [`crate::traits::RecordOps`] primitives (or a direct
//! [`crate::traits::DnsProvider`] implementation for simple dynamic-update
//! services), and unit tests for the pure request-building parts.

use serde_json::{Map, Value};

#[cfg(feature = "alidns")]
mod alidns;
#[cfg(feature = "cloudflare")]
mod cloudflare;
#[cfg(feature = "dnspod")]
mod dnspod;
#[cfg(feature = "huaweidns")]
mod huaweidns;
#[cfg(feature = "noip")]
mod noip;
#[cfg(feature = "tencentcloud")]
mod tencentcloud;

#[cfg(feature = "alidns")]
pub use alidns::AlidnsProvider;
#[cfg(feature = "cloudflare")]
pub use cloudflare::CloudflareProvider;
#[cfg(feature = "dnspod")]
pub use dnspod::DnspodProvider;
#[cfg(feature = "huaweidns")]
pub use huaweidns::HuaweidnsProvider;
#[cfg(feature = "noip")]
pub use noip::NoipProvider;
#[cfg(feature = "tencentcloud")]
pub use tencentcloud::TencentcloudProvider;

/// Read a string field from a raw record.
pub(crate) fn field_str<'a>(record: &'a Value, key: &str) -> Option<&'a str> {
    record.get(key).and_then(Value::as_str)
}

/// Read the record id, trying the provider's own key first and then the
/// generic `"id"` used by explicit record-id overrides. Numeric ids are
/// stringified.
pub(crate) fn record_id(record: &Value, provider_key: &str) -> Option<String> {
    for key in [provider_key, "id"] {
        match record.get(key) {
            Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

/// Append the caller's extra parameters to a form/query parameter list,
/// skipping nulls. Non-string values are rendered as JSON.
pub(crate) fn extend_params(params: &mut Vec<(String, String)>, extra: &Map<String, Value>) {
    for (key, value) in extra {
        if value.is_null() {
            continue;
        }
        let rendered = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        params.push((key.clone(), rendered));
    }
}

/// Merge the caller's extra parameters into a JSON body, skipping nulls and
/// leaving keys the adapter already set untouched.
pub(crate) fn merge_extra(body: &mut Map<String, Value>, extra: &Map<String, Value>) {
    for (key, value) in extra {
        if value.is_null() || body.contains_key(key) {
            continue;
        }
        body.insert(key.clone(), value.clone());
    }
}
