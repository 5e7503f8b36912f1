//! Request-signing algorithms shared by the provider adapters.
//!
//! Three schemes cover every supported cloud API:
//!
//! - [`rpc_signature`] — RPC-style query signing with HMAC-SHA1 over a
//!   sorted, percent-encoded parameter list (Aliyun DNS).
//! - [`hmac_sha256_authorization`] — template-driven canonical-request
//!   signing where the raw secret keys the final HMAC (Huawei Cloud
//!   `SDK-HMAC-SHA256`).
//! - [`tc3_authorization`] — scoped signing with a derived key chained
//!   through date, service, and a fixed terminator (Tencent Cloud TC3).
//!
//! All three are pure functions of their inputs, so adapters pass explicit
//! timestamps/nonces and tests can assert determinism.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Digest, Sha256};

#[allow(clippy::expect_used)]
pub(crate) fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

#[allow(clippy::expect_used)]
pub(crate) fn hmac_sha1(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = Hmac::<Sha1>::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

pub(crate) fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Percent-encode every reserved character (space becomes `%20`).
fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// RPC-style query signing with HMAC-SHA1.
///
/// The caller supplies the complete parameter list including the fixed RPC
/// fields (`AccessKeyId`, `Timestamp`, `SignatureNonce`, ...). Parameters
/// are sorted by name, percent-encoded into a canonical query, wrapped as
/// `POST&%2F&<encoded query>`, and signed with `HMAC-SHA1(secret + "&")`.
/// Returns the base64 `Signature` value to append to the request.
pub fn rpc_signature(params: &[(String, String)], secret: &str) -> String {
    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let canonical_query = sorted
        .iter()
        .map(|(key, value)| format!("{}={}", percent_encode(key), percent_encode(value)))
        .collect::<Vec<_>>()
        .join("&");

    let string_to_sign = format!("POST&%2F&{}", percent_encode(&canonical_query));
    log::debug!("string to sign: {string_to_sign}");

    let digest = hmac_sha1(format!("{secret}&").as_bytes(), string_to_sign.as_bytes());
    BASE64.encode(digest)
}

/// Canonical-request HMAC-SHA256 `Authorization` generator.
///
/// Every supplied header is signed: keys are lowercased and trimmed values
/// sorted by name. The canonical request is
/// `METHOD\nPATH\nQUERY\n<canonical headers>\n<signed headers>\n<body hash>`.
///
/// Templates keep the provider-specific framing out of the algorithm:
/// `signing_string_format` must contain `{HashedCanonicalRequest}`, and
/// `authorization_format` must contain `{SignedHeaders}` and `{Signature}`.
/// The raw `secret_key` keys the final HMAC; callers needing key derivation
/// do it before calling.
pub fn hmac_sha256_authorization(
    secret_key: &[u8],
    method: &str,
    path: &str,
    query: &str,
    headers: &[(String, String)],
    body_hash: &str,
    signing_string_format: &str,
    authorization_format: &str,
) -> String {
    let mut to_sign: Vec<(String, String)> = headers
        .iter()
        .map(|(key, value)| (key.to_ascii_lowercase(), value.trim().to_string()))
        .collect();
    to_sign.sort_by(|a, b| a.0.cmp(&b.0));

    let canonical_headers: String = to_sign
        .iter()
        .map(|(key, value)| format!("{key}:{value}\n"))
        .collect();
    let signed_headers = to_sign
        .iter()
        .map(|(key, _)| key.as_str())
        .collect::<Vec<_>>()
        .join(";");

    let canonical_request = [
        method.to_ascii_uppercase().as_str(),
        path,
        query,
        canonical_headers.as_str(),
        signed_headers.as_str(),
        body_hash,
    ]
    .join("\n");
    log::debug!("canonical request:\n{canonical_request}");

    let string_to_sign = signing_string_format.replace(
        "{HashedCanonicalRequest}",
        &sha256_hex(canonical_request.as_bytes()),
    );
    let signature = hex::encode(hmac_sha256(secret_key, string_to_sign.as_bytes()));

    authorization_format
        .replace("{SignedHeaders}", &signed_headers)
        .replace("{Signature}", &signature)
}

/// Scoped TC3 HMAC-SHA256 `Authorization` generator.
///
/// The canonical request is always a JSON `POST /` with canonical headers
/// limited to `content-type` and `host`. The signing key is derived by
/// chaining `HMAC(HMAC(HMAC("TC3" + secret, date), service), "tc3_request")`,
/// and the result is a complete `Authorization` header value.
pub fn tc3_authorization(
    secret_id: &str,
    secret_key: &str,
    service: &str,
    host: &str,
    content_type: &str,
    payload: &str,
    timestamp: i64,
) -> String {
    let date = DateTime::<Utc>::from_timestamp(timestamp, 0)
        .unwrap_or_else(Utc::now)
        .format("%Y-%m-%d")
        .to_string();

    let canonical_headers = format!("content-type:{content_type}\nhost:{host}\n");
    let signed_headers = "content-type;host";
    let canonical_request = format!(
        "POST\n/\n\n{canonical_headers}\n{signed_headers}\n{}",
        sha256_hex(payload.as_bytes())
    );

    let credential_scope = format!("{date}/{service}/tc3_request");
    let string_to_sign = format!(
        "TC3-HMAC-SHA256\n{timestamp}\n{credential_scope}\n{}",
        sha256_hex(canonical_request.as_bytes())
    );

    let secret_date = hmac_sha256(format!("TC3{secret_key}").as_bytes(), date.as_bytes());
    let secret_service = hmac_sha256(&secret_date, service.as_bytes());
    let secret_signing = hmac_sha256(&secret_service, b"tc3_request");
    let signature = hex::encode(hmac_sha256(&secret_signing, string_to_sign.as_bytes()));

    format!(
        "TC3-HMAC-SHA256 Credential={secret_id}/{credential_scope}, \
         SignedHeaders={signed_headers}, Signature={signature}"
    )
}
