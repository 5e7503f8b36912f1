//! Secret masking and log truncation.
//!
//! Everything that may carry a credential (request URLs, bodies, response
//! excerpts) passes through a [`Masker`] before it reaches the log output.

/// Maximum length of a logged payload before truncation.
const MAX_LOG_LEN: usize = 512;

/// Replaces occurrences of a secret with an abbreviated placeholder.
///
/// Both the verbatim secret and its percent-encoded form are replaced, since
/// query-string signing embeds the encoded variant in URLs. Secrets longer
/// than four characters keep their first and last two characters
/// (`"secret123"` becomes `"se***23"`); shorter secrets become `"***"`.
#[derive(Debug, Clone)]
pub struct Masker {
    secret: String,
    secret_encoded: String,
    placeholder: String,
}

impl Masker {
    /// Build a masker for one secret. An empty secret masks nothing.
    pub fn new(secret: &str) -> Self {
        let chars: Vec<char> = secret.chars().collect();
        let placeholder = if chars.len() > 4 {
            let head: String = chars[..2].iter().collect();
            let tail: String = chars[chars.len() - 2..].iter().collect();
            format!("{head}***{tail}")
        } else {
            "***".to_string()
        };
        Self {
            secret: secret.to_string(),
            secret_encoded: urlencoding::encode(secret).into_owned(),
            placeholder,
        }
    }

    /// Mask every occurrence of the secret in `text`.
    pub fn mask(&self, text: &str) -> String {
        if self.secret.is_empty() {
            return text.to_string();
        }
        let masked = text.replace(&self.secret, &self.placeholder);
        if self.secret_encoded == self.secret {
            masked
        } else {
            masked.replace(&self.secret_encoded, &self.placeholder)
        }
    }

    /// Mask every occurrence of the secret in a byte payload.
    pub fn mask_bytes(&self, data: &[u8]) -> Vec<u8> {
        if self.secret.is_empty() {
            return data.to_vec();
        }
        let masked = replace_bytes(data, self.secret.as_bytes(), self.placeholder.as_bytes());
        if self.secret_encoded == self.secret {
            masked
        } else {
            replace_bytes(
                &masked,
                self.secret_encoded.as_bytes(),
                self.placeholder.as_bytes(),
            )
        }
    }
}

fn replace_bytes(data: &[u8], from: &[u8], to: &[u8]) -> Vec<u8> {
    if from.is_empty() {
        return data.to_vec();
    }
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        if data[i..].starts_with(from) {
            out.extend_from_slice(to);
            i += from.len();
        } else {
            out.push(data[i]);
            i += 1;
        }
    }
    out
}

/// Truncate a payload for logging, keeping the cut on a char boundary.
pub fn truncate_for_log(text: &str) -> String {
    if text.len() <= MAX_LOG_LEN {
        return text.to_string();
    }
    let mut end = MAX_LOG_LEN;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... ({} bytes total)", &text[..end], text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_secret_in_url() {
        let m = Masker::new("secret123");
        let masked = m.mask("https://api.example.com/update?token=secret123&x=1");
        assert!(masked.contains("se***23"));
        assert!(!masked.contains("secret123"));
    }

    #[test]
    fn masks_percent_encoded_secret() {
        let m = Masker::new("p@ss w0rd");
        let encoded = urlencoding::encode("p@ss w0rd").into_owned();
        let masked = m.mask(&format!("login_token=user,{encoded}"));
        assert!(!masked.contains(&encoded));
        assert!(masked.contains("p@***rd"));
    }

    #[test]
    fn short_secret_fully_masked() {
        let m = Masker::new("abcd");
        assert_eq!(m.mask("key=abcd"), "key=***");
    }

    #[test]
    fn empty_secret_masks_nothing() {
        let m = Masker::new("");
        assert_eq!(m.mask("payload"), "payload");
    }

    #[test]
    fn masks_bytes() {
        let m = Masker::new("secret123");
        let masked = m.mask_bytes(b"body with secret123 inside");
        assert_eq!(masked, b"body with se***23 inside");
    }

    #[test]
    fn truncates_long_payloads() {
        let long = "x".repeat(2048);
        let out = truncate_for_log(&long);
        assert!(out.len() < long.len());
        assert!(out.contains("2048 bytes total"));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let long = "界".repeat(600);
        let out = truncate_for_log(&long);
        assert!(out.starts_with('界'));
    }

    #[test]
    fn short_payload_untouched() {
        assert_eq!(truncate_for_log("short"), "short");
    }
}
