//! Domain-expression parsing.
//!
//! A configured domain is more than a host name. The full syntax is
//! `[sub{~|+}]main[#zone_id[#record_id]]`:
//!
//! - `~` or `+` separates the subdomain from the main (registrable) domain,
//!   for hosts whose registrable root cannot be guessed (`sub~custom.tld`).
//! - `#` appends an explicit zone-id override, and a second `#` an explicit
//!   record-id override, skipping zone resolution and/or the record query.
//! - A bare `"@"` subdomain addresses the zone apex.

/// A parsed domain expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainExpression {
    /// Explicit subdomain, when a `~`/`+` separator was present.
    pub subdomain: Option<String>,
    /// The main domain (or the full host name when no separator was given).
    pub main_domain: String,
    /// Explicit zone-id override from the first `#` segment.
    pub zone_id: Option<String>,
    /// Explicit record-id override from the second `#` segment.
    pub record_id: Option<String>,
}

/// Split a raw domain expression into its parts.
///
/// The expression is trimmed and lowercased. Empty override segments are
/// treated as absent, so `"www.example.com#"` carries no override.
pub fn split(expression: &str) -> DomainExpression {
    let mut zone_id = None;
    let mut record_id = None;
    let mut rest = expression;

    if let Some((head, overrides)) = expression.split_once('#') {
        rest = head;
        let mut parts = overrides.splitn(2, '#');
        zone_id = parts
            .next()
            .filter(|s| !s.is_empty())
            .map(ToString::to_string);
        record_id = parts
            .next()
            .filter(|s| !s.is_empty())
            .map(ToString::to_string);
    }

    let rest = rest.trim().to_ascii_lowercase();
    for sep in ['~', '+'] {
        if let Some((sub, main)) = rest.split_once(sep) {
            return DomainExpression {
                subdomain: Some(sub.to_string()),
                main_domain: main.to_string(),
                zone_id,
                record_id,
            };
        }
    }

    DomainExpression {
        subdomain: None,
        main_domain: rest,
        zone_id,
        record_id,
    }
}

/// Join a subdomain and a main domain into a FQDN.
///
/// An empty or `"@"` subdomain yields the main domain itself. Both parts are
/// trimmed of whitespace and stray dots and lowercased.
pub fn join(subdomain: &str, main_domain: &str) -> String {
    let sub = subdomain.trim().trim_matches('.').to_ascii_lowercase();
    let main = main_domain.trim().trim_matches('.').to_ascii_lowercase();
    if sub.is_empty() || sub == "@" {
        main
    } else if main.is_empty() {
        sub
    } else {
        format!("{sub}.{main}")
    }
}
