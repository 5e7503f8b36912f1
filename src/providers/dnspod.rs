//! DNSPod legacy API adapter (dnsapi.cn).
//!
//! Form-encoded `POST /<Action>` with a `login_token=id,token` credential
//! field; responses carry a `status.code` of `"1"` on success. Failures are
//! soft: the API answers HTTP 200 with a non-`"1"` code.
//! API reference: <https://docs.dnspod.cn/api/>

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{Map, Value};

use crate::cache::ZoneCache;
use crate::config::Credentials;
use crate::error::Result;
use crate::http::{TYPE_FORM, Transport, encode_pairs};
use crate::reconciler::{self, pick_record};
use crate::traits::{DnsProvider, RecordOps, RecordRequest};

use super::{extend_params, field_str, record_id};

const DEFAULT_ENDPOINT: &str = "https://dnsapi.cn";
const DEFAULT_LINE: &str = "默认";

/// DNSPod legacy-API provider (`login_token` credentials).
pub struct DnspodProvider {
    transport: Transport,
    login_token: String,
    zones: ZoneCache,
}

fn param(key: &str, value: impl Into<String>) -> (String, String) {
    (key.to_string(), value.into())
}

/// `status.code == "1"` marks success.
fn response_ok(data: &Value) -> bool {
    data.pointer("/status/code").and_then(Value::as_str) == Some("1")
}

fn status_message(data: &Value) -> &str {
    data.pointer("/status/message")
        .and_then(Value::as_str)
        .unwrap_or("unknown error")
}

/// Does this record's line satisfy the requested line filter?
fn line_matches(record_line: &str, wanted: Option<&str>) -> bool {
    match wanted {
        None => true,
        Some(line) => record_line == line || record_line == DEFAULT_LINE,
    }
}

/// Candidate filter for `Record.List` results. The host name must match
/// exactly: the listing covers the whole zone, and updating another host's
/// record would rewrite live DNS it does not own.
fn record_matches(record: &Value, subdomain: &str, record_type: &str, line: Option<&str>) -> bool {
    field_str(record, "name") == Some(subdomain)
        && field_str(record, "type") == Some(record_type)
        && line_matches(field_str(record, "line").unwrap_or(""), line)
}

impl DnspodProvider {
    /// Build the provider from an API token pair (`id` + `token`).
    pub fn new(credentials: Credentials) -> Result<Self> {
        credentials.require_id()?;
        credentials.require_token()?;
        let endpoint = credentials
            .endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let transport = Transport::new(
            "dnspod",
            endpoint,
            &credentials.token,
            credentials.proxy.as_deref(),
            credentials.verify_ssl,
        )?;
        Ok(Self {
            transport,
            login_token: format!("{},{}", credentials.id, credentials.token),
            zones: ZoneCache::new(),
        })
    }

    async fn request(&self, action: &str, mut params: Vec<(String, String)>) -> Result<Value> {
        params.push(param("login_token", self.login_token.clone()));
        params.push(param("format", "json"));
        params.push(param("length", "3000"));
        let headers = vec![
            param("content-type", TYPE_FORM),
            param(
                "user-agent",
                concat!("ddns-provider/", env!("CARGO_PKG_VERSION")),
            ),
        ];
        let body = encode_pairs(&params);
        let text = self
            .transport
            .send(Method::POST, &format!("/{action}"), &headers, Some(body))
            .await?;
        self.transport.parse_json(&text)
    }
}

#[async_trait]
impl RecordOps for DnspodProvider {
    fn name(&self) -> &'static str {
        "dnspod"
    }

    fn zone_cache(&self) -> &ZoneCache {
        &self.zones
    }

    async fn resolve_zone(&self, main_domain: &str) -> Result<Option<String>> {
        let data = self
            .request("Domain.Info", vec![param("domain", main_domain)])
            .await?;
        if !response_ok(&data) {
            log::debug!("[dnspod] Domain.Info: {}", status_message(&data));
            return Ok(None);
        }
        // the legacy API returns the id as a string or a number depending
        // on the endpoint revision
        Ok(match data.pointer("/domain/id") {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }

    async fn query_record(
        &self,
        zone_id: &str,
        subdomain: &str,
        _main_domain: &str,
        record_type: &str,
        line: Option<&str>,
        _extra: &Map<String, Value>,
    ) -> Result<Option<Value>> {
        let data = self
            .request("Record.List", vec![param("domain_id", zone_id)])
            .await?;
        if !response_ok(&data) {
            log::warn!("[dnspod] Record.List: {}", status_message(&data));
            return Ok(None);
        }
        let candidates: Vec<Value> = data
            .get("records")
            .and_then(Value::as_array)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| record_matches(r, subdomain, record_type, line))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(pick_record("dnspod", candidates, subdomain, |r: &Value| {
            field_str(r, "name")
        }))
    }

    async fn create_record(
        &self,
        zone_id: &str,
        subdomain: &str,
        _main_domain: &str,
        value: &str,
        record_type: &str,
        ttl: Option<u32>,
        line: Option<&str>,
        extra: &Map<String, Value>,
    ) -> Result<bool> {
        let mut params = vec![
            param("domain_id", zone_id),
            param("sub_domain", subdomain),
            param("value", value),
            param("record_type", record_type),
            param("record_line", line.unwrap_or(DEFAULT_LINE)),
        ];
        if let Some(ttl) = ttl {
            params.push(param("ttl", ttl.to_string()));
        }
        extend_params(&mut params, extra);
        let data = self.request("Record.Create", params).await?;
        if response_ok(&data) && data.get("record").is_some() {
            log::info!("[dnspod] record created");
            return Ok(true);
        }
        log::error!("[dnspod] failed to create record: {}", status_message(&data));
        Ok(false)
    }

    async fn update_record(
        &self,
        zone_id: &str,
        old_record: &Value,
        value: &str,
        record_type: &str,
        ttl: Option<u32>,
        line: Option<&str>,
        extra: &Map<String, Value>,
    ) -> Result<bool> {
        let record_line = line
            .map(ToString::to_string)
            .or_else(|| field_str(old_record, "line").map(|l| l.replace("Default", "default")))
            .unwrap_or_else(|| DEFAULT_LINE.to_string());
        let mut params = vec![
            param("domain_id", zone_id),
            param("record_id", record_id(old_record, "id").unwrap_or_default()),
            param("value", value),
            param(
                "sub_domain",
                field_str(old_record, "name").unwrap_or("@"),
            ),
            param("record_type", record_type),
            param("record_line", record_line),
        ];
        if let Some(ttl) = ttl {
            params.push(param("ttl", ttl.to_string()));
        }
        extend_params(&mut params, extra);
        let data = self.request("Record.Modify", params).await?;
        if response_ok(&data) && data.get("record").is_some() {
            log::info!("[dnspod] record updated");
            return Ok(true);
        }
        log::error!("[dnspod] failed to update record: {}", status_message(&data));
        Ok(false)
    }
}

#[async_trait]
impl DnsProvider for DnspodProvider {
    fn name(&self) -> &'static str {
        "dnspod"
    }

    async fn set_record(&self, request: &RecordRequest) -> Result<bool> {
        reconciler::set_record(self, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn response_ok_requires_code_one() {
        assert!(response_ok(&json!({ "status": { "code": "1" } })));
        assert!(!response_ok(&json!({ "status": { "code": "-1", "message": "bad login" } })));
        assert!(!response_ok(&json!({})));
    }

    #[test]
    fn status_message_fallback() {
        assert_eq!(
            status_message(&json!({ "status": { "message": "ok" } })),
            "ok"
        );
        assert_eq!(status_message(&json!({})), "unknown error");
    }

    #[test]
    fn line_matching_honors_default_line() {
        assert!(line_matches("电信", Some("电信")));
        assert!(line_matches(DEFAULT_LINE, Some("电信")));
        assert!(!line_matches("联通", Some("电信")));
        assert!(line_matches("联通", None));
    }

    #[test]
    fn record_matching_requires_exact_host() {
        let mail = json!({ "name": "mail", "type": "A", "line": DEFAULT_LINE });
        assert!(!record_matches(&mail, "www", "A", None));
        assert!(record_matches(&mail, "mail", "A", None));
    }

    #[test]
    fn record_matching_applies_type_and_line() {
        let www = json!({ "name": "www", "type": "AAAA", "line": "联通" });
        assert!(!record_matches(&www, "www", "A", None));
        assert!(!record_matches(&www, "www", "AAAA", Some("电信")));
        assert!(record_matches(&www, "www", "AAAA", Some("联通")));
    }

    #[test]
    fn new_rejects_missing_credentials() {
        assert!(DnspodProvider::new(Credentials::new("", "tok")).is_err());
        assert!(DnspodProvider::new(Credentials::new("10001", "")).is_err());
        assert!(DnspodProvider::new(Credentials::new("10001", "tok")).is_ok());
    }
}
