//! Configuration types handed over by the caller.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{DnsError, Result};

/// Raw settings as produced by an external configuration loader.
///
/// This crate does not load configuration itself; it only defines the shape
/// a loader hands over. Unknown keys collect into `extra` and are forwarded
/// verbatim to the provider on every update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Provider key, resolved through [`crate::create_provider`].
    pub dns: String,
    /// Provider-specific account id (access key id, email, username).
    pub id: String,
    /// Provider-specific secret (access key secret, API token, password).
    pub token: String,
    /// Alternative API endpoint, for private or regional deployments.
    pub endpoint: Option<String>,
    /// Domain expressions whose A records track the IPv4 value.
    pub ipv4: Vec<String>,
    /// Domain expressions whose AAAA records track the IPv6 value.
    pub ipv6: Vec<String>,
    /// Record TTL in seconds; `None` leaves the provider default.
    pub ttl: Option<u32>,
    /// Resolution line/route (ISP routing), for providers that support it.
    pub line: Option<String>,
    /// HTTP(S) proxy URL.
    pub proxy: Option<String>,
    /// Verify TLS certificates. Defaults to `true`.
    pub ssl: Option<bool>,
    /// Free-form provider parameters forwarded with every update.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Credentials and transport options consumed at provider construction.
///
/// Immutable once the provider is built; changing credentials means building
/// a new provider instance.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Account id; what this means is provider-specific.
    pub id: String,
    /// Account secret.
    pub token: String,
    /// Endpoint override.
    pub endpoint: Option<String>,
    /// HTTP(S) proxy URL.
    pub proxy: Option<String>,
    /// Verify TLS certificates.
    pub verify_ssl: bool,
}

impl Credentials {
    /// Build credentials with default transport options.
    pub fn new(id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            token: token.into(),
            endpoint: None,
            proxy: None,
            verify_ssl: true,
        }
    }

    /// Extract the credential and transport fields from loader settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            id: settings.id.clone(),
            token: settings.token.clone(),
            endpoint: settings.endpoint.clone(),
            proxy: settings.proxy.clone(),
            verify_ssl: settings.ssl.unwrap_or(true),
        }
    }

    /// Override the API endpoint.
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Route requests through a proxy.
    #[must_use]
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Disable or enable TLS certificate verification.
    #[must_use]
    pub fn verify_ssl(mut self, verify: bool) -> Self {
        self.verify_ssl = verify;
        self
    }

    pub(crate) fn require_id(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(DnsError::config("id must be configured"));
        }
        Ok(())
    }

    pub(crate) fn require_token(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(DnsError::config("token must be configured"));
        }
        Ok(())
    }
}
