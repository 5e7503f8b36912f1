//! Aliyun DNS (AliDNS) adapter.
//!
//! RPC-style API: every operation is a form `POST /` whose parameters carry
//! the action name and an HMAC-SHA1 `Signature` (see
//! [`crate::signature::rpc_signature`]).
//! API reference: <https://help.aliyun.com/zh/dns/api-alidns-2015-01-09-dir>

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Method;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::cache::ZoneCache;
use crate::config::Credentials;
use crate::error::Result;
use crate::http::{TYPE_FORM, Transport, encode_pairs};
use crate::reconciler::{self, pick_record};
use crate::signature::rpc_signature;
use crate::traits::{DnsProvider, RecordOps, RecordRequest};

use super::{extend_params, field_str, record_id};

const DEFAULT_ENDPOINT: &str = "https://alidns.aliyuncs.com";
const API_VERSION: &str = "2015-01-09";

/// Aliyun DNS provider (access key id + secret).
pub struct AlidnsProvider {
    transport: Transport,
    access_key_id: String,
    access_key_secret: String,
    zones: ZoneCache,
}

fn param(key: &str, value: impl Into<String>) -> (String, String) {
    (key.to_string(), value.into())
}

/// Attach the fixed RPC fields and the `Signature` parameter.
///
/// Pure in `timestamp`/`nonce` so tests can pin them.
fn signed_params(
    action: &str,
    mut params: Vec<(String, String)>,
    access_key_id: &str,
    secret: &str,
    timestamp: &str,
    nonce: &str,
) -> Vec<(String, String)> {
    params.push(param("Action", action));
    params.push(param("Format", "json"));
    params.push(param("Version", API_VERSION));
    params.push(param("AccessKeyId", access_key_id));
    params.push(param("Timestamp", timestamp));
    params.push(param("SignatureMethod", "HMAC-SHA1"));
    params.push(param("SignatureNonce", nonce));
    params.push(param("SignatureVersion", "1.0"));
    let signature = rpc_signature(&params, secret);
    params.push(param("Signature", signature));
    params
}

/// Narrow `DescribeDomainRecords` results to the exact host. `RRKeyWord`
/// is a substring search, so the response can carry records for other
/// hosts that must never be touched.
fn host_records(records: Vec<Value>, subdomain: &str) -> Vec<Value> {
    records
        .into_iter()
        .filter(|r| field_str(r, "RR") == Some(subdomain))
        .collect()
}

impl AlidnsProvider {
    /// Build the provider from an access key pair.
    pub fn new(credentials: Credentials) -> Result<Self> {
        credentials.require_id()?;
        credentials.require_token()?;
        let endpoint = credentials
            .endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let transport = Transport::new(
            "alidns",
            endpoint,
            &credentials.token,
            credentials.proxy.as_deref(),
            credentials.verify_ssl,
        )?;
        Ok(Self {
            transport,
            access_key_id: credentials.id,
            access_key_secret: credentials.token,
            zones: ZoneCache::new(),
        })
    }

    async fn request(&self, action: &str, params: Vec<(String, String)>) -> Result<Value> {
        let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let nonce = Uuid::new_v4().simple().to_string();
        let params = signed_params(
            action,
            params,
            &self.access_key_id,
            &self.access_key_secret,
            &timestamp,
            &nonce,
        );
        let headers = vec![param("content-type", TYPE_FORM)];
        let body = encode_pairs(&params);
        let text = self
            .transport
            .send(Method::POST, "/", &headers, Some(body))
            .await?;
        self.transport.parse_json(&text)
    }
}

#[async_trait]
impl RecordOps for AlidnsProvider {
    fn name(&self) -> &'static str {
        "alidns"
    }

    fn zone_cache(&self) -> &ZoneCache {
        &self.zones
    }

    async fn resolve_zone(&self, main_domain: &str) -> Result<Option<String>> {
        let data = self
            .request("GetMainDomainName", vec![param("InputString", main_domain)])
            .await?;
        Ok(field_str(&data, "DomainName").map(ToString::to_string))
    }

    async fn query_record(
        &self,
        zone_id: &str,
        subdomain: &str,
        _main_domain: &str,
        record_type: &str,
        line: Option<&str>,
        extra: &Map<String, Value>,
    ) -> Result<Option<Value>> {
        let mut params = vec![
            param("DomainName", zone_id),
            param("RRKeyWord", subdomain),
            param("Type", record_type),
            param("PageSize", "500"),
        ];
        if let Some(line) = line {
            params.push(param("Line", line));
        }
        for key in ["Lang", "Status"] {
            if let Some(value) = extra.get(key).and_then(Value::as_str) {
                params.push(param(key, value));
            }
        }
        let data = self.request("DescribeDomainRecords", params).await?;
        let records = host_records(
            data.pointer("/DomainRecords/Record")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
            subdomain,
        );
        if records.is_empty() {
            log::warn!(
                "[alidns] no records for [{zone_id}] with sub {subdomain} + type {record_type} (line: {line:?})"
            );
            return Ok(None);
        }
        Ok(pick_record("alidns", records, subdomain, |r: &Value| {
            field_str(r, "RR")
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
            param("DomainName", zone_id),
            param("RR", subdomain),
            param("Value", value),
            param("Type", record_type),
        ];
        if let Some(ttl) = ttl {
            params.push(param("TTL", ttl.to_string()));
        }
        if let Some(line) = line {
            params.push(param("Line", line));
        }
        extend_params(&mut params, extra);
        let data = self.request("AddDomainRecord", params).await?;
        if record_id(&data, "RecordId").is_some() {
            log::info!("[alidns] record created: {data}");
            return Ok(true);
        }
        log::error!("[alidns] failed to create record: {data}");
        Ok(false)
    }

    async fn update_record(
        &self,
        _zone_id: &str,
        old_record: &Value,
        value: &str,
        record_type: &str,
        ttl: Option<u32>,
        line: Option<&str>,
        extra: &Map<String, Value>,
    ) -> Result<bool> {
        let mut params = vec![
            param("RecordId", record_id(old_record, "RecordId").unwrap_or_default()),
            param("Value", value),
            param("Type", record_type),
        ];
        if let Some(rr) = field_str(old_record, "RR") {
            params.push(param("RR", rr));
        }
        if let Some(ttl) = ttl {
            params.push(param("TTL", ttl.to_string()));
        }
        if let Some(line) = line.or_else(|| field_str(old_record, "Line")) {
            params.push(param("Line", line));
        }
        extend_params(&mut params, extra);
        let data = self.request("UpdateDomainRecord", params).await?;
        if record_id(&data, "RecordId").is_some() {
            log::info!("[alidns] record updated: {data}");
            return Ok(true);
        }
        log::error!("[alidns] failed to update record: {data}");
        Ok(false)
    }
}

#[async_trait]
impl DnsProvider for AlidnsProvider {
    fn name(&self) -> &'static str {
        "alidns"
    }

    async fn set_record(&self, request: &RecordRequest) -> Result<bool> {
        reconciler::set_record(self, request).await
    }
}
