//! Cloudflare v4 REST adapter.
//!
//! JSON API under `/client/v4/zones`, authenticated with a bearer API token
//! or, for legacy accounts, an email + global API key pair. Responses wrap
//! the payload in `{"success", "result", "errors"}`; `success: false` under
//! HTTP 200 is a soft failure.
//! API reference: <https://developers.cloudflare.com/api/>

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{Map, Value, json};

use crate::cache::ZoneCache;
use crate::config::Credentials;
use crate::domain::join;
use crate::error::{DnsError, Result};
use crate::http::{TYPE_JSON, Transport, encode_pairs};
use crate::reconciler::{self, pick_record};
use crate::traits::{DnsProvider, MANAGED_MARKER, RecordOps, RecordRequest};

use super::{field_str, merge_extra, record_id};

const DEFAULT_ENDPOINT: &str = "https://api.cloudflare.com";

/// Build the PUT body for a record update. Unmanaged fields carry over
/// from the old record, but an explicit `extra` value wins.
fn update_body(
    old_record: &Value,
    value: &str,
    record_type: &str,
    ttl: Option<u32>,
    extra: &Map<String, Value>,
) -> Value {
    let mut body = json!({
        "type": record_type,
        "name": field_str(old_record, "name").unwrap_or_default(),
        "content": value,
    });
    if let Some(ttl) = ttl {
        body["ttl"] = json!(ttl);
    }
    for field in ["proxied", "tags", "settings"] {
        let kept = extra
            .get(field)
            .filter(|v| !v.is_null())
            .or_else(|| old_record.get(field).filter(|v| !v.is_null()));
        if let Some(kept) = kept {
            body[field] = kept.clone();
        }
    }
    let comment = extra
        .get("comment")
        .and_then(Value::as_str)
        .or_else(|| field_str(old_record, "comment"))
        .unwrap_or(MANAGED_MARKER);
    body["comment"] = json!(comment);
    if let Some(map) = body.as_object_mut() {
        merge_extra(map, extra);
    }
    body
}

/// Cloudflare provider (bearer token, or email + API key when `id` is set).
pub struct CloudflareProvider {
    transport: Transport,
    auth_email: Option<String>,
    token: String,
    zones: ZoneCache,
}

impl CloudflareProvider {
    /// Build the provider. `id` must be empty (bearer token auth) or a
    /// valid account email (global API key auth).
    pub fn new(credentials: Credentials) -> Result<Self> {
        credentials.require_token()?;
        let auth_email = if credentials.id.trim().is_empty() {
            None
        } else if credentials.id.contains('@') {
            Some(credentials.id.clone())
        } else {
            return Err(DnsError::config(
                "id must be empty or a valid email for the Cloudflare API",
            ));
        };
        let endpoint = credentials
            .endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let transport = Transport::new(
            "cloudflare",
            endpoint,
            &credentials.token,
            credentials.proxy.as_deref(),
            credentials.verify_ssl,
        )?;
        Ok(Self {
            transport,
            auth_email,
            token: credentials.token,
            zones: ZoneCache::new(),
        })
    }

    fn auth_headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![("content-type".to_string(), TYPE_JSON.to_string())];
        match &self.auth_email {
            Some(email) => {
                headers.push(("X-Auth-Email".to_string(), email.clone()));
                headers.push(("X-Auth-Key".to_string(), self.token.clone()));
            }
            None => {
                headers.push((
                    "Authorization".to_string(),
                    format!("Bearer {}", self.token),
                ));
            }
        }
        headers
    }

    /// Send one request under `/client/v4/zones`. `Ok(None)` is a soft API
    /// failure (already logged).
    async fn request(
        &self,
        method: Method,
        action: &str,
        query_params: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<Option<Value>> {
        let query = encode_pairs(query_params);
        let path = if query.is_empty() {
            format!("/client/v4/zones{action}")
        } else {
            format!("/client/v4/zones{action}?{query}")
        };
        let body = body.map(ToString::to_string);
        let text = self
            .transport
            .send(method, &path, &self.auth_headers(), body)
            .await?;
        let data: Value = self.transport.parse_json(&text)?;
        if data.get("success").and_then(Value::as_bool) == Some(true) {
            return Ok(data.get("result").cloned());
        }
        log::warn!(
            "[cloudflare] API error: {}",
            data.get("errors").unwrap_or(&Value::Null)
        );
        Ok(None)
    }
}

#[async_trait]
impl RecordOps for CloudflareProvider {
    fn name(&self) -> &'static str {
        "cloudflare"
    }

    fn zone_cache(&self) -> &ZoneCache {
        &self.zones
    }

    async fn resolve_zone(&self, main_domain: &str) -> Result<Option<String>> {
        let params = vec![
            ("name.exact".to_string(), main_domain.to_string()),
            ("per_page".to_string(), "50".to_string()),
        ];
        let Some(result) = self.request(Method::GET, "", &params, None).await? else {
            return Ok(None);
        };
        let zone_id = result
            .as_array()
            .and_then(|zones| {
                zones
                    .iter()
                    .find(|z| field_str(z, "name") == Some(main_domain))
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
        _line: Option<&str>,
        extra: &Map<String, Value>,
    ) -> Result<Option<Value>> {
        let name = join(subdomain, main_domain);
        let mut params = vec![
            ("name.exact".to_string(), name.clone()),
            ("type".to_string(), record_type.to_string()),
            ("per_page".to_string(), "10000".to_string()),
        ];
        if let Some(proxied) = extra.get("proxied").and_then(Value::as_bool) {
            params.push(("proxied".to_string(), proxied.to_string()));
        }
        let Some(result) = self
            .request(
                Method::GET,
                &format!("/{zone_id}/dns_records"),
                &params,
                None,
            )
            .await?
        else {
            return Ok(None);
        };
        let candidates: Vec<Value> = result
            .as_array()
            .map(|records| {
                records
                    .iter()
                    .filter(|r| field_str(r, "type") == Some(record_type))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(pick_record("cloudflare", candidates, &name, |r: &Value| {
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
        _line: Option<&str>,
        extra: &Map<String, Value>,
    ) -> Result<bool> {
        let mut body = json!({
            "name": join(subdomain, main_domain),
            "type": record_type,
            "content": value,
        });
        if let Some(ttl) = ttl {
            body["ttl"] = json!(ttl);
        }
        let comment = extra
            .get("comment")
            .and_then(Value::as_str)
            .unwrap_or(MANAGED_MARKER);
        body["comment"] = json!(comment);
        if let Some(map) = body.as_object_mut() {
            merge_extra(map, extra);
        }
        match self
            .request(
                Method::POST,
                &format!("/{zone_id}/dns_records"),
                &[],
                Some(&body),
            )
            .await?
        {
            Some(_) => {
                log::info!("[cloudflare] record created");
                Ok(true)
            }
            None => {
                log::error!("[cloudflare] failed to create record");
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
        _line: Option<&str>,
        extra: &Map<String, Value>,
    ) -> Result<bool> {
        let Some(id) = record_id(old_record, "id") else {
            log::error!("[cloudflare] old record carries no id");
            return Ok(false);
        };
        let body = update_body(old_record, value, record_type, ttl, extra);
        match self
            .request(
                Method::PUT,
                &format!("/{zone_id}/dns_records/{id}"),
                &[],
                Some(&body),
            )
            .await?
        {
            Some(_) => {
                log::info!("[cloudflare] record updated");
                Ok(true)
            }
            None => {
                log::error!("[cloudflare] failed to update record");
                Ok(false)
            }
        }
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    fn name(&self) -> &'static str {
        "cloudflare"
    }

    async fn set_record(&self, request: &RecordRequest) -> Result<bool> {
        reconciler::set_record(self, request).await
    }
}
