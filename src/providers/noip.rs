//! No-IP dynamic-update adapter.
//!
//! The classic dynamic DNS protocol: one `GET /nic/update` with HTTP Basic
//! auth and a plaintext status token in the body. There is no zone or record
//! model to reconcile, so this provider implements
//! [`DnsProvider`] directly instead of going through the shared engine.
//! Protocol reference: <https://www.noip.com/integrate/request>

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Method;

use crate::config::Credentials;
use crate::error::{DnsError, Result};
use crate::http::{Transport, encode_pairs};
use crate::traits::{DnsProvider, RecordRequest};

const DEFAULT_ENDPOINT: &str = "https://dynupdate.no-ip.com";

/// No-IP provider (username + password).
pub struct NoipProvider {
    transport: Transport,
    basic_auth: String,
}

/// Classify a plaintext update response. `None` means an unrecognized token.
fn classify_response(response: &str) -> Option<(bool, &'static str)> {
    let table: [(&str, bool, &str); 7] = [
        ("good", true, "update successful"),
        ("nochg", true, "value already current"),
        ("nohost", false, "hostname does not exist under this account"),
        ("badauth", false, "invalid username/password combination"),
        ("badagent", false, "client disabled"),
        ("!donator", false, "feature not available on this plan"),
        ("abuse", false, "account blocked due to abuse"),
    ];
    table
        .iter()
        .find(|(token, _, _)| response.starts_with(token))
        .map(|(_, ok, detail)| (*ok, *detail))
}

impl NoipProvider {
    /// Build the provider from a username/password pair.
    pub fn new(credentials: Credentials) -> Result<Self> {
        if credentials.id.trim().is_empty() {
            return Err(DnsError::config("No-IP requires the username as 'id'"));
        }
        if credentials.token.trim().is_empty() {
            return Err(DnsError::config("No-IP requires the password as 'token'"));
        }
        let endpoint = credentials
            .endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let transport = Transport::new(
            "noip",
            endpoint,
            &credentials.token,
            credentials.proxy.as_deref(),
            credentials.verify_ssl,
        )?;
        let basic_auth = BASE64.encode(format!("{}:{}", credentials.id, credentials.token));
        Ok(Self {
            transport,
            basic_auth,
        })
    }
}

#[async_trait]
impl DnsProvider for NoipProvider {
    fn name(&self) -> &'static str {
        "noip"
    }

    async fn set_record(&self, request: &RecordRequest) -> Result<bool> {
        log::info!(
            "[noip] {} => {}({})",
            request.domain,
            request.value,
            request.record_type
        );
        let params = vec![
            ("hostname".to_string(), request.domain.clone()),
            ("myip".to_string(), request.value.clone()),
        ];
        let headers = vec![(
            "Authorization".to_string(),
            format!("Basic {}", self.basic_auth),
        )];
        let text = self
            .transport
            .send(
                Method::GET,
                &format!("/nic/update?{}", encode_pairs(&params)),
                &headers,
                None,
            )
            .await?;
        let response = text.trim();
        match classify_response(response) {
            Some((true, detail)) => {
                log::info!("[noip] {response}: {detail}");
                Ok(true)
            }
            Some((false, detail)) => {
                log::error!("[noip] {response}: {detail}");
                Ok(false)
            }
            None => {
                log::error!("[noip] unexpected response: {response}");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn good_and_nochg_succeed() {
        assert_eq!(classify_response("good 192.0.2.1").map(|(ok, _)| ok), Some(true));
        assert_eq!(classify_response("nochg 192.0.2.1").map(|(ok, _)| ok), Some(true));
    }

    #[test]
    fn documented_failures_are_soft() {
        for token in ["nohost", "badauth", "badagent", "!donator", "abuse"] {
            assert_eq!(classify_response(token).map(|(ok, _)| ok), Some(false));
        }
    }

    #[test]
    fn unknown_token_unclassified() {
        assert!(classify_response("911").is_none());
    }

    #[test]
    fn new_rejects_missing_credentials() {
        assert!(NoipProvider::new(Credentials::new("", "pw")).is_err());
        assert!(NoipProvider::new(Credentials::new("user", "")).is_err());
        assert!(NoipProvider::new(Credentials::new("user", "pw")).is_ok());
    }
}
