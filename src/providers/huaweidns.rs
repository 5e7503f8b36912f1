//! Huawei Cloud DNS adapter.
//!
//! JSON REST API authenticated with `SDK-HMAC-SHA256` canonical-request
//! signing (see [`crate::signature::hmac_sha256_authorization`]). Record
//! sets address hosts by trailing-dot FQDNs; the update API cannot change
//! the resolution line.
//! API reference: <https://support.huaweicloud.com/api-dns/>

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Method;
use serde_json::{Map, Value, json};

use crate::cache::ZoneCache;
use crate::config::Credentials;
use crate::domain::join;
use crate::error::Result;
use crate::http::{TYPE_JSON, Transport, encode_pairs};
use crate::reconciler::{self, pick_record};
use crate::signature::{hmac_sha256_authorization, sha256_hex};
use crate::traits::{DnsProvider, MANAGED_MARKER, RecordOps, RecordRequest};

use super::{field_str, merge_extra, record_id};

const DEFAULT_ENDPOINT: &str = "https://dns.myhuaweicloud.com";
const ALGORITHM: &str = "SDK-HMAC-SHA256";

/// Huawei Cloud DNS provider (access key + secret key).
pub struct HuaweidnsProvider {
    transport: Transport,
    access_key_id: String,
    secret_key: String,
    zones: ZoneCache,
}

/// Record-set name: FQDN with the trailing dot this API insists on.
fn recordset_name(subdomain: &str, main_domain: &str) -> String {
    format!("{}.", join(subdomain, main_domain))
}

/// Build the PUT body for a record-set update. The name and any fields
/// the caller leaves unspecified carry over from the old record set.
fn update_body(
    old_record: &Value,
    value: &str,
    record_type: &str,
    ttl: Option<u32>,
    extra: &Map<String, Value>,
) -> Value {
    let mut body = json!({
        "name": field_str(old_record, "name").unwrap_or_default(),
        "type": record_type,
        "records": [value],
    });
    match ttl {
        Some(ttl) => body["ttl"] = json!(ttl),
        None => {
            if let Some(old_ttl) = old_record.get("ttl").and_then(Value::as_u64) {
                body["ttl"] = json!(old_ttl);
            }
        }
    }
    let description = extra
        .get("description")
        .and_then(Value::as_str)
        .or_else(|| field_str(old_record, "description"))
        .unwrap_or(MANAGED_MARKER);
    body["description"] = json!(description);
    if let Some(map) = body.as_object_mut() {
        merge_extra(map, extra);
    }
    body
}

impl HuaweidnsProvider {
    /// Build the provider from an AK/SK pair.
    pub fn new(credentials: Credentials) -> Result<Self> {
        credentials.require_id()?;
        credentials.require_token()?;
        let endpoint = credentials
            .endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let transport = Transport::new(
            "huaweidns",
            endpoint,
            &credentials.token,
            credentials.proxy.as_deref(),
            credentials.verify_ssl,
        )?;
        Ok(Self {
            transport,
            access_key_id: credentials.id,
            secret_key: credentials.token,
            zones: ZoneCache::new(),
        })
    }

    /// Send one signed request. GET/DELETE carry their parameters in the
    /// query string, everything else as a JSON body.
    async fn request(
        &self,
        method: Method,
        path: &str,
        mut query_params: Vec<(String, String)>,
        body: Option<&Value>,
    ) -> Result<Value> {
        // sorted query keeps the signed and transmitted forms identical
        query_params.sort();
        let query = encode_pairs(&query_params);
        let body = body.map(ToString::to_string).unwrap_or_default();

        let now = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
        let headers = vec![
            ("content-type".to_string(), TYPE_JSON.to_string()),
            ("host".to_string(), self.transport.host().to_string()),
            ("X-Sdk-Date".to_string(), now.clone()),
        ];

        // this API signs the path with a trailing slash
        let sign_path = if path.ends_with('/') {
            path.to_string()
        } else {
            format!("{path}/")
        };
        let authorization = hmac_sha256_authorization(
            self.secret_key.as_bytes(),
            method.as_str(),
            &sign_path,
            &query,
            &headers,
            &sha256_hex(body.as_bytes()),
            &format!("{ALGORITHM}\n{now}\n{{HashedCanonicalRequest}}"),
            &format!(
                "{ALGORITHM} Access={}, SignedHeaders={{SignedHeaders}}, Signature={{Signature}}",
                self.access_key_id
            ),
        );

        let mut headers = headers;
        headers.push(("Authorization".to_string(), authorization));
        let path = if query.is_empty() {
            path.to_string()
        } else {
            format!("{path}?{query}")
        };
        let send_body = if body.is_empty() { None } else { Some(body) };
        let text = self.transport.send(method, &path, &headers, send_body).await?;
        self.transport.parse_json(&text)
    }
}

#[async_trait]
impl RecordOps for HuaweidnsProvider {
    fn name(&self) -> &'static str {
        "huaweidns"
    }

    fn zone_cache(&self) -> &ZoneCache {
        &self.zones
    }

    async fn resolve_zone(&self, main_domain: &str) -> Result<Option<String>> {
        let name = format!("{main_domain}.");
        let params = vec![
            ("search_mode".to_string(), "equal".to_string()),
            ("limit".to_string(), "500".to_string()),
            ("name".to_string(), name.clone()),
        ];
        let data = self.request(Method::GET, "/v2/zones", params, None).await?;
        let zone_id = data
            .get("zones")
            .and_then(Value::as_array)
            .and_then(|zones| {
                zones
                    .iter()
                    .find(|z| field_str(z, "name") == Some(name.as_str()))
            })
            .and_then(|zone| field_str(zone, "id"))
            .map(ToString::to_string);
        Ok(zone_id)
    }

    async fn query_record(
        &self,
        zone_id: &str,
        subdomain: &str,
        main_domain: &str,
        record_type: &str,
        line: Option<&str>,
        _extra: &Map<String, Value>,
    ) -> Result<Option<Value>> {
        let name = recordset_name(subdomain, main_domain);
        let mut params = vec![
            ("limit".to_string(), "500".to_string()),
            ("name".to_string(), name.clone()),
            ("type".to_string(), record_type.to_string()),
            ("search_mode".to_string(), "equal".to_string()),
        ];
        if let Some(line) = line {
            params.push(("line_id".to_string(), line.to_string()));
        }
        let data = self
            .request(
                Method::GET,
                &format!("/v2.1/zones/{zone_id}/recordsets"),
                params,
                None,
            )
            .await?;
        let candidates: Vec<Value> = data
            .get("recordsets")
            .and_then(Value::as_array)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| field_str(r, "type") == Some(record_type))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(pick_record("huaweidns", candidates, &name, |r: &Value| {
            field_str(r, "name")
        }))
    }

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
    ) -> Result<bool> {
        let mut body = json!({
            "name": recordset_name(subdomain, main_domain),
            "type": record_type,
            "records": [value],
        });
        if let Some(ttl) = ttl {
            body["ttl"] = json!(ttl);
        }
        if let Some(line) = line {
            body["line"] = json!(line);
        }
        let description = extra
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or(MANAGED_MARKER);
        body["description"] = json!(description);
        if let Some(map) = body.as_object_mut() {
            merge_extra(map, extra);
        }
        let data = self
            .request(
                Method::POST,
                &format!("/v2.1/zones/{zone_id}/recordsets"),
                vec![],
                Some(&body),
            )
            .await?;
        if field_str(&data, "id").is_some() {
            log::info!("[huaweidns] record created");
            return Ok(true);
        }
        log::warn!("[huaweidns] failed to create record: {data}");
        Ok(false)
    }

    async fn update_record(
        &self,
        zone_id: &str,
        old_record: &Value,
        value: &str,
        record_type: &str,
        ttl: Option<u32>,
        _line: Option<&str>,
        extra: &Map<String, Value>,
    ) -> Result<bool> {
        let Some(id) = record_id(old_record, "id") else {
            log::error!("[huaweidns] old record carries no id");
            return Ok(false);
        };
        let body = update_body(old_record, value, record_type, ttl, extra);
        // the v2.1 update API has no line field: the line is immutable here
        let data = self
            .request(
                Method::PUT,
                &format!("/v2.1/zones/{zone_id}/recordsets/{id}"),
                vec![],
                Some(&body),
            )
            .await?;
        if field_str(&data, "id").is_some() {
            log::info!("[huaweidns] record updated");
            return Ok(true);
        }
        log::warn!("[huaweidns] failed to update record: {data}");
        Ok(false)
    }
}

#[async_trait]
impl DnsProvider for HuaweidnsProvider {
    fn name(&self) -> &'static str {
        "huaweidns"
    }

    async fn set_record(&self, request: &RecordRequest) -> Result<bool> {
        reconciler::set_record(self, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recordset_name_appends_dot() {
        assert_eq!(recordset_name("www", "example.com"), "www.example.com.");
        assert_eq!(recordset_name("@", "example.com"), "example.com.");
    }

    #[test]
    fn new_rejects_missing_credentials() {
        assert!(HuaweidnsProvider::new(Credentials::new("", "sk")).is_err());
        assert!(HuaweidnsProvider::new(Credentials::new("ak", "")).is_err());
        assert!(HuaweidnsProvider::new(Credentials::new("ak", "sk")).is_ok());
    }

    fn old_recordset() -> Value {
        json!({
            "id": "rs1",
            "name": "www.example.com.",
            "ttl": 300,
            "description": "keep me",
        })
    }

    #[test]
    fn update_body_carries_old_name_and_ttl() {
        let body = update_body(&old_recordset(), "192.0.2.1", "A", None, &Map::new());
        assert_eq!(body["name"], json!("www.example.com."));
        assert_eq!(body["records"], json!(["192.0.2.1"]));
        assert_eq!(body["ttl"], json!(300));
        assert_eq!(body["description"], json!("keep me"));
    }

    #[test]
    fn update_body_request_values_win() {
        let mut extra = Map::new();
        extra.insert("description".to_string(), json!("fresh"));
        let body = update_body(&old_recordset(), "192.0.2.1", "A", Some(600), &extra);
        assert_eq!(body["ttl"], json!(600));
        assert_eq!(body["description"], json!("fresh"));
    }

    #[test]
    fn update_body_marks_undescribed_recordsets() {
        let old = json!({ "id": "rs1", "name": "www.example.com." });
        let body = update_body(&old, "192.0.2.1", "A", None, &Map::new());
        assert_eq!(body["description"], json!(MANAGED_MARKER));
        assert!(body.get("ttl").is_none());
    }
}
