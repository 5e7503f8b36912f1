use thiserror::Error;

/// Unified error type for all record operations.
///
/// Each variant carries the name of the provider that produced it so callers
/// managing several domains can tell failures apart. Soft provider failures
/// (a structured error body under HTTP 200) are *not* errors: they are logged
/// and surfaced as `Ok(false)` by [`crate::DnsProvider::set_record`].
#[derive(Debug, Error)]
pub enum DnsError {
    /// Invalid or missing configuration. Raised at provider construction,
    /// never mid-update.
    #[error("configuration error: {detail}")]
    Config {
        /// What is wrong with the configuration.
        detail: String,
    },

    /// The authoritative zone for a domain could not be determined.
    #[error("[{provider}] no zone found for domain '{domain}'")]
    ZoneNotFound {
        /// Provider that produced the error.
        provider: String,
        /// Domain whose zone resolution failed.
        domain: String,
    },

    /// The provider rejected our credentials (HTTP 401/403).
    #[error("[{provider}] authentication failed (HTTP {status}): {reason}")]
    Auth {
        /// Provider that produced the error.
        provider: String,
        /// HTTP status code.
        status: u16,
        /// Status reason phrase or response excerpt.
        reason: String,
    },

    /// The provider rejected the request or failed serving it (HTTP 400/5xx).
    #[error("[{provider}] HTTP error {status}: {reason}")]
    Http {
        /// Provider that produced the error.
        provider: String,
        /// HTTP status code.
        status: u16,
        /// Status reason phrase or response excerpt.
        reason: String,
    },

    /// A network-level failure: connect, TLS handshake, timeout, read.
    #[error("[{provider}] network error: {detail}")]
    Network {
        /// Provider that produced the error.
        provider: String,
        /// Error details.
        detail: String,
    },

    /// The response body could not be decoded.
    #[error("[{provider}] parse error: {detail}")]
    Parse {
        /// Provider that produced the error.
        provider: String,
        /// Details about the decode failure.
        detail: String,
    },
}

impl DnsError {
    /// Shorthand for a [`DnsError::Config`] error.
    pub fn config(detail: impl Into<String>) -> Self {
        Self::Config {
            detail: detail.into(),
        }
    }
}

/// Convenience type alias for `Result<T, DnsError>`.
pub type Result<T> = std::result::Result<T, DnsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_config() {
        let e = DnsError::config("token must be configured");
        assert_eq!(
            e.to_string(),
            "configuration error: token must be configured"
        );
    }

    #[test]
    fn display_zone_not_found() {
        let e = DnsError::ZoneNotFound {
            provider: "alidns".to_string(),
            domain: "example.com".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "[alidns] no zone found for domain 'example.com'"
        );
    }

    #[test]
    fn display_auth() {
        let e = DnsError::Auth {
            provider: "cloudflare".to_string(),
            status: 403,
            reason: "Forbidden".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "[cloudflare] authentication failed (HTTP 403): Forbidden"
        );
    }

    #[test]
    fn display_http() {
        let e = DnsError::Http {
            provider: "dnspod".to_string(),
            status: 500,
            reason: "Internal Server Error".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "[dnspod] HTTP error 500: Internal Server Error"
        );
    }

    #[test]
    fn display_network() {
        let e = DnsError::Network {
            provider: "huaweidns".to_string(),
            detail: "connection refused".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "[huaweidns] network error: connection refused"
        );
    }

    #[test]
    fn display_parse() {
        let e = DnsError::Parse {
            provider: "tencentcloud".to_string(),
            detail: "expected value at line 1".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "[tencentcloud] parse error: expected value at line 1"
        );
    }
}
