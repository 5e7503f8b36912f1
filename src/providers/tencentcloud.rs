//! Tencent Cloud DNSPod v3 adapter.
//!
//! JSON `POST /` where the action travels in the `X-TC-Action` header and
//! authentication in a scoped TC3-HMAC-SHA256 `Authorization` header (see
//! [`crate::signature::tc3_authorization`]). API errors arrive as a
//! structured `Response.Error` object under HTTP 200 and are soft failures.
//! API reference: <https://cloud.tencent.com/document/api/1427>

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Method;
use serde_json::{Map, Value, json};

use crate::cache::ZoneCache;
use crate::config::Credentials;
use crate::error::Result;
use crate::http::{TYPE_JSON, Transport};
use crate::reconciler::{self, pick_record};
use crate::signature::tc3_authorization;
use crate::traits::{DnsProvider, MANAGED_MARKER, RecordOps, RecordRequest};

use super::{field_str, record_id};

const DEFAULT_ENDPOINT: &str = "https://dnspod.tencentcloudapi.com";
const SERVICE: &str = "dnspod";
const API_VERSION: &str = "2021-03-23";
const DEFAULT_LINE: &str = "默认";

/// Tencent Cloud DNSPod provider (`SecretId` + `SecretKey`).
pub struct TencentcloudProvider {
    transport: Transport,
    secret_id: String,
    secret_key: String,
    zones: ZoneCache,
}

/// Target host name inside the zone, with `"@"` addressing the apex.
fn target_name(subdomain: &str) -> &str {
    if subdomain.is_empty() { "@" } else { subdomain }
}

/// Record ids are numeric in this API; pinned string overrides are parsed.
fn record_id_value(old_record: &Value) -> Option<Value> {
    match record_id(old_record, "RecordId") {
        Some(id) => match id.parse::<u64>() {
            Ok(n) => Some(json!(n)),
            Err(_) => Some(json!(id)),
        },
        None => None,
    }
}

/// Candidate filter for `DescribeRecordList` results. Apex queries send no
/// `Subdomain` parameter and get the whole zone back, so the host name
/// must match exactly here.
fn record_matches(record: &Value, target: &str, record_type: &str) -> bool {
    field_str(record, "Name") == Some(target) && field_str(record, "Type") == Some(record_type)
}

/// Build the `ModifyRecord` parameters, carrying forward whatever the
/// caller leaves unspecified. `None` when the old record has no usable id.
fn modify_params(
    zone_id: &str,
    old_record: &Value,
    value: &str,
    record_type: &str,
    ttl: Option<u32>,
    line: Option<&str>,
    extra: &Map<String, Value>,
) -> Option<Value> {
    let record_id = record_id_value(old_record)?;
    let record_line = line
        .or_else(|| field_str(old_record, "Line"))
        .unwrap_or(DEFAULT_LINE);
    let mut params = json!({
        "Domain": zone_id,
        "RecordId": record_id,
        "RecordType": record_type.to_ascii_uppercase(),
        "RecordLine": record_line,
        "Value": value,
    });
    if let Some(name) = field_str(old_record, "Name") {
        if name != "@" {
            params["SubDomain"] = json!(name);
        }
    }
    match ttl {
        Some(ttl) => params["TTL"] = json!(ttl),
        None => {
            if let Some(old_ttl) = old_record.get("TTL").and_then(Value::as_u64) {
                params["TTL"] = json!(old_ttl);
            }
        }
    }
    // keep MX/weight from the old record unless explicitly overridden
    for (field, extra_key) in [("MX", "mx"), ("Weight", "weight")] {
        if let Some(old_value) = old_record.get(field).and_then(Value::as_u64) {
            params[field] = json!(old_value);
        }
        if let Some(value) = extra.get(extra_key).and_then(Value::as_u64) {
            params[field] = json!(value);
        }
    }
    params["Remark"] = json!(field_str(old_record, "Remark").unwrap_or(MANAGED_MARKER));
    Some(params)
}

impl TencentcloudProvider {
    /// Build the provider from a `SecretId`/`SecretKey` pair.
    pub fn new(credentials: Credentials) -> Result<Self> {
        credentials.require_id()?;
        credentials.require_token()?;
        let endpoint = credentials
            .endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let transport = Transport::new(
            "tencentcloud",
            endpoint,
            &credentials.token,
            credentials.proxy.as_deref(),
            credentials.verify_ssl,
        )?;
        Ok(Self {
            transport,
            secret_id: credentials.id,
            secret_key: credentials.token,
            zones: ZoneCache::new(),
        })
    }

    /// Send one action. `Ok(None)` is a soft API error (already logged).
    async fn request(&self, action: &str, params: &Value) -> Result<Option<Value>> {
        let payload = params.to_string();
        let timestamp = Utc::now().timestamp();
        let authorization = tc3_authorization(
            &self.secret_id,
            &self.secret_key,
            SERVICE,
            self.transport.host(),
            TYPE_JSON,
            &payload,
            timestamp,
        );
        let headers = vec![
            ("content-type".to_string(), TYPE_JSON.to_string()),
            ("host".to_string(), self.transport.host().to_string()),
            ("X-TC-Action".to_string(), action.to_string()),
            ("X-TC-Version".to_string(), API_VERSION.to_string()),
            ("X-TC-Timestamp".to_string(), timestamp.to_string()),
            ("Authorization".to_string(), authorization),
        ];
        let text = self
            .transport
            .send(Method::POST, "/", &headers, Some(payload))
            .await?;
        let data: Value = self.transport.parse_json(&text)?;
        let Some(response) = data.get("Response") else {
            log::warn!("[tencentcloud] unexpected response shape");
            return Ok(None);
        };
        if let Some(error) = response.get("Error") {
            log::error!(
                "[tencentcloud] API error {}: {}",
                field_str(error, "Code").unwrap_or("Unknown"),
                field_str(error, "Message").unwrap_or("unknown error")
            );
            return Ok(None);
        }
        Ok(Some(response.clone()))
    }
}

#[async_trait]
impl RecordOps for TencentcloudProvider {
    fn name(&self) -> &'static str {
        "tencentcloud"
    }

    fn zone_cache(&self) -> &ZoneCache {
        &self.zones
    }

    async fn resolve_zone(&self, main_domain: &str) -> Result<Option<String>> {
        // the v3 API addresses zones by domain name; no id lookup needed
        Ok(Some(main_domain.to_string()))
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
        let record_type = record_type.to_ascii_uppercase();
        let mut params = json!({ "Domain": zone_id, "RecordType": record_type.as_str() });
        if !subdomain.is_empty() && subdomain != "@" {
            params["Subdomain"] = json!(subdomain);
        }
        if let Some(line) = line {
            params["RecordLine"] = json!(line);
        }
        // "no data" comes back as a soft error, which is simply no record
        let Some(response) = self.request("DescribeRecordList", &params).await? else {
            return Ok(None);
        };
        let candidates: Vec<Value> = response
            .get("RecordList")
            .and_then(Value::as_array)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| record_matches(r, target_name(subdomain), &record_type))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(pick_record(
            "tencentcloud",
            candidates,
            target_name(subdomain),
            |r: &Value| field_str(r, "Name"),
        ))
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
        let mut params = json!({
            "Domain": zone_id,
            "RecordType": record_type.to_ascii_uppercase(),
            "RecordLine": line.unwrap_or(DEFAULT_LINE),
            "Value": value,
            "Remark": MANAGED_MARKER,
        });
        if !subdomain.is_empty() && subdomain != "@" {
            params["SubDomain"] = json!(subdomain);
        }
        if let Some(ttl) = ttl {
            params["TTL"] = json!(ttl);
        }
        for (key, field) in [("mx", "MX"), ("weight", "Weight")] {
            if let Some(value) = extra.get(key).and_then(Value::as_u64) {
                params[field] = json!(value);
            }
        }
        match self.request("CreateRecord", &params).await? {
            Some(response) if response.get("RecordId").is_some() => {
                log::info!("[tencentcloud] record created");
                Ok(true)
            }
            _ => {
                log::error!("[tencentcloud] failed to create record");
                Ok(false)
            }
        }
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
        let Some(params) = modify_params(zone_id, old_record, value, record_type, ttl, line, extra)
        else {
            log::error!("[tencentcloud] old record carries no RecordId");
            return Ok(false);
        };
        match self.request("ModifyRecord", &params).await? {
            Some(response) if response.get("RecordId").is_some() => {
                log::info!("[tencentcloud] record updated");
                Ok(true)
            }
            _ => {
                log::error!("[tencentcloud] failed to update record");
                Ok(false)
            }
        }
    }
}

#[async_trait]
impl DnsProvider for TencentcloudProvider {
    fn name(&self) -> &'static str {
        "tencentcloud"
    }

    async fn set_record(&self, request: &RecordRequest) -> Result<bool> {
        reconciler::set_record(self, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_name_maps_empty_to_apex() {
        assert_eq!(target_name(""), "@");
        assert_eq!(target_name("@"), "@");
        assert_eq!(target_name("www"), "www");
    }

    #[test]
    fn record_id_value_keeps_numbers() {
        assert_eq!(record_id_value(&json!({ "RecordId": 42 })), Some(json!(42)));
    }

    #[test]
    fn record_id_value_parses_pinned_strings() {
        assert_eq!(record_id_value(&json!({ "id": "42" })), Some(json!(42)));
        assert_eq!(
            record_id_value(&json!({ "id": "abc" })),
            Some(json!("abc"))
        );
        assert_eq!(record_id_value(&json!({})), None);
    }

    #[test]
    fn record_matching_requires_exact_host() {
        let mail = json!({ "Name": "mail", "Type": "A" });
        assert!(!record_matches(&mail, "@", "A"));
        assert!(!record_matches(&mail, "www", "A"));
        assert!(record_matches(&mail, "mail", "A"));
        assert!(!record_matches(&mail, "mail", "AAAA"));
    }

    fn old_www_record() -> Value {
        json!({
            "RecordId": 42,
            "Name": "www",
            "Line": "电信",
            "TTL": 300,
            "MX": 10,
            "Remark": "keep me",
        })
    }

    #[test]
    fn modify_params_carry_old_fields() {
        let params_opt = modify_params(
            "example.com",
            &old_www_record(),
            "192.0.2.1",
            "A",
            None,
            None,
            &Map::new(),
        );
        assert!(params_opt.is_some());
        let Some(params) = params_opt else {
            return;
        };
        assert_eq!(params["SubDomain"], json!("www"));
        assert_eq!(params["RecordLine"], json!("电信"));
        assert_eq!(params["TTL"], json!(300));
        assert_eq!(params["MX"], json!(10));
        assert_eq!(params["Remark"], json!("keep me"));
    }

    #[test]
    fn modify_params_request_overrides_old_fields() {
        let mut extra = Map::new();
        extra.insert("mx".to_string(), json!(20));
        let params_opt = modify_params(
            "example.com",
            &old_www_record(),
            "192.0.2.1",
            "A",
            Some(600),
            Some(DEFAULT_LINE),
            &extra,
        );
        assert!(params_opt.is_some());
        let Some(params) = params_opt else {
            return;
        };
        assert_eq!(params["TTL"], json!(600));
        assert_eq!(params["MX"], json!(20));
        assert_eq!(params["RecordLine"], json!(DEFAULT_LINE));
    }

    #[test]
    fn modify_params_apex_sends_no_subdomain() {
        let old = json!({ "RecordId": 7, "Name": "@" });
        let params_opt = modify_params("example.com", &old, "192.0.2.1", "A", None, None, &Map::new());
        assert!(params_opt.is_some());
        let Some(params) = params_opt else {
            return;
        };
        assert!(params.get("SubDomain").is_none());
        assert_eq!(params["Remark"], json!(MANAGED_MARKER));
    }

    #[test]
    fn modify_params_require_record_id() {
        let old = json!({ "Name": "www" });
        assert!(modify_params("example.com", &old, "192.0.2.1", "A", None, None, &Map::new()).is_none());
    }

    #[test]
    fn new_rejects_missing_credentials() {
        assert!(TencentcloudProvider::new(Credentials::new("", "sk")).is_err());
        assert!(TencentcloudProvider::new(Credentials::new("AKID", "")).is_err());
        assert!(TencentcloudProvider::new(Credentials::new("AKID", "sk")).is_ok());
    }
}
