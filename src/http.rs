//! HTTP transport shared by all provider adapters.
//!
//! One [`Transport`] per provider instance: a configured `reqwest::Client`
//! (timeouts, optional proxy, TLS verification toggle), the API endpoint,
//! and the [`Masker`] applied to everything that reaches the logs. Signing
//! stays in the adapters; the transport only sends and classifies.

use std::time::Duration;

use reqwest::{Client, Method};
use serde::de::DeserializeOwned;

use crate::error::{DnsError, Result};
use crate::utils::mask::{Masker, truncate_for_log};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) const TYPE_FORM: &str = "application/x-www-form-urlencoded";
pub(crate) const TYPE_JSON: &str = "application/json";

pub(crate) struct Transport {
    client: Client,
    endpoint: String,
    provider: &'static str,
    masker: Masker,
}

impl Transport {
    /// Build a transport for one provider instance.
    ///
    /// `secret` seeds the log masker; it is never sent anywhere by the
    /// transport itself.
    pub fn new(
        provider: &'static str,
        endpoint: impl Into<String>,
        secret: &str,
        proxy: Option<&str>,
        verify_ssl: bool,
    ) -> Result<Self> {
        let mut builder = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT);
        if let Some(proxy) = proxy {
            let proxy = reqwest::Proxy::all(proxy).map_err(|e| {
                DnsError::config(format!("invalid proxy '{proxy}': {e}"))
            })?;
            builder = builder.proxy(proxy);
        }
        if !verify_ssl {
            log::warn!("[{provider}] TLS certificate verification disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }
        let client = builder
            .build()
            .map_err(|e| DnsError::config(format!("failed to build HTTP client: {e}")))?;
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            endpoint,
            provider,
            masker: Masker::new(secret),
        })
    }

    /// Host part of the endpoint, as needed for signed `host` headers.
    pub fn host(&self) -> &str {
        self.endpoint
            .split_once("://")
            .map_or(self.endpoint.as_str(), |(_, rest)| rest)
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{path}", self.endpoint)
        } else {
            format!("{}/{path}", self.endpoint)
        }
    }

    /// Send one request and return the response body as text.
    ///
    /// 2xx bodies come back as-is; 401/403 map to [`DnsError::Auth`], 400 and
    /// 5xx to [`DnsError::Http`], transport failures to [`DnsError::Network`].
    /// Structured errors inside a 2xx body are the caller's concern.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        headers: &[(String, String)],
        body: Option<String>,
    ) -> Result<String> {
        let url = self.url(path);
        log::debug!("[{}] {method} {}", self.provider, self.masker.mask(&url));

        let mut request = self.client.request(method, &url);
        for (key, value) in headers {
            request = request.header(key, value);
        }
        if let Some(body) = body {
            log::debug!(
                "[{}] request body: {}",
                self.provider,
                truncate_for_log(&self.masker.mask(&body))
            );
            request = request.body(body);
        }

        let response = request.send().await.map_err(|e| DnsError::Network {
            provider: self.provider.to_string(),
            detail: self.masker.mask(&e.to_string()),
        })?;

        let status = response.status();
        let reason = status.canonical_reason().unwrap_or("").to_string();
        let text = response.text().await.map_err(|e| DnsError::Network {
            provider: self.provider.to_string(),
            detail: format!("failed to read response body: {e}"),
        })?;

        match status.as_u16() {
            401 | 403 => {
                log::error!(
                    "[{}] authentication failed (HTTP {status}): {}",
                    self.provider,
                    truncate_for_log(&self.masker.mask(&text))
                );
                Err(DnsError::Auth {
                    provider: self.provider.to_string(),
                    status: status.as_u16(),
                    reason,
                })
            }
            400 | 500..=599 => {
                log::error!(
                    "[{}] HTTP {status}: {}",
                    self.provider,
                    truncate_for_log(&self.masker.mask(&text))
                );
                Err(DnsError::Http {
                    provider: self.provider.to_string(),
                    status: status.as_u16(),
                    reason,
                })
            }
            _ => {
                log::debug!(
                    "[{}] response body: {}",
                    self.provider,
                    truncate_for_log(&self.masker.mask(&text))
                );
                Ok(text)
            }
        }
    }

    /// Decode a JSON response body.
    pub fn parse_json<T: DeserializeOwned>(&self, text: &str) -> Result<T> {
        serde_json::from_str(text).map_err(|e| {
            log::error!(
                "[{}] failed to parse response: {e}; raw: {}",
                self.provider,
                truncate_for_log(&self.masker.mask(text))
            );
            DnsError::Parse {
                provider: self.provider.to_string(),
                detail: e.to_string(),
            }
        })
    }
}

/// Encode key/value pairs as a query or form string.
pub(crate) fn encode_pairs(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_builds_with_defaults() {
        let t = Transport::new("test", "https://api.example.com/", "secret", None, true);
        assert!(t.is_ok());
    }

    #[test]
    fn transport_rejects_bad_proxy() {
        let t = Transport::new(
            "test",
            "https://api.example.com",
            "secret",
            Some("not a proxy url"),
            true,
        );
        assert!(matches!(t, Err(DnsError::Config { .. })));
    }

    #[test]
    fn host_strips_scheme() {
        let t = Transport::new("test", "https://dnsapi.cn", "s", None, true).unwrap();
        assert_eq!(t.host(), "dnsapi.cn");
    }

    #[test]
    fn url_joins_relative_paths() {
        let t = Transport::new("test", "https://api.example.com/", "s", None, true).unwrap();
        assert_eq!(t.url("/v2/zones"), "https://api.example.com/v2/zones");
        assert_eq!(t.url("nic/update"), "https://api.example.com/nic/update");
        assert_eq!(t.url("https://other.example.com/x"), "https://other.example.com/x");
    }

    #[test]
    fn encode_pairs_escapes_values() {
        let pairs = vec![
            ("hostname".to_string(), "www.example.com".to_string()),
            ("value".to_string(), "a b&c".to_string()),
        ];
        assert_eq!(
            encode_pairs(&pairs),
            "hostname=www.example.com&value=a%20b%26c"
        );
    }

    #[test]
    fn parse_json_reports_parse_error() {
        let t = Transport::new("test", "https://api.example.com", "s", None, true).unwrap();
        let res: Result<serde_json::Value> = t.parse_json("not json");
        assert!(matches!(res, Err(DnsError::Parse { .. })));
    }
}
