//! The shared create-or-update engine.
//!
//! Every standard provider funnels `set_record` through this module:
//!
//! 1. lowercase and split the domain expression,
//! 2. resolve the zone id (explicit override, cache, or suffix walk),
//! 3. look up the current record (or honor an explicit record-id override),
//! 4. create when absent, update when present.
//!
//! The engine never retries and never caches failures; an unresolvable zone
//! aborts the call with [`DnsError::ZoneNotFound`].

use serde_json::{Value, json};

use crate::domain;
use crate::error::{DnsError, Result};
use crate::traits::{RecordOps, RecordRequest};

/// Resolve a zone id through the instance cache.
///
/// At most one network resolution per distinct main domain per provider
/// instance; only successes are cached.
async fn get_zone_id<P: RecordOps + ?Sized>(ops: &P, main_domain: &str) -> Result<Option<String>> {
    if let Some(zone_id) = ops.zone_cache().get(main_domain) {
        log::debug!("[{}] zone cache hit: {main_domain} => {zone_id}", ops.name());
        return Ok(Some(zone_id));
    }
    let resolved = ops.resolve_zone(main_domain).await?;
    if let Some(zone_id) = &resolved {
        ops.zone_cache().insert(main_domain, zone_id);
    }
    Ok(resolved)
}

/// Walk domain suffixes from the right until one resolves to a zone.
///
/// For `a.b.example.com` the candidates are `example.com`, `b.example.com`,
/// `a.b.example.com` in that order; the leftover labels (or `"@"`) become
/// the subdomain.
async fn split_zone_and_sub<P: RecordOps + ?Sized>(
    ops: &P,
    domain: &str,
) -> Result<Option<(String, String, String)>> {
    let labels: Vec<&str> = domain.split('.').collect();
    for take in 2..=labels.len() {
        let main = labels[labels.len() - take..].join(".");
        if let Some(zone_id) = get_zone_id(ops, &main).await? {
            let sub = labels[..labels.len() - take].join(".");
            let sub = if sub.is_empty() { "@".to_string() } else { sub };
            log::debug!("[{}] zone_id: {zone_id}, sub: {sub}", ops.name());
            return Ok(Some((zone_id, sub, main)));
        }
    }
    Ok(None)
}

/// Pick one record out of an ambiguous query result.
///
/// An exact host-name match wins; otherwise the first candidate is taken
/// and a warning is logged. This mirrors how most DNS panels behave when a
/// host has several records of one type, and it is deliberately lossy.
///
/// Callers must narrow `records` to the requested host first: the fallback
/// disambiguates duplicates of one host, it does not select across hosts.
pub fn pick_record<F>(provider: &str, records: Vec<Value>, target_name: &str, name_of: F) -> Option<Value>
where
    F: Fn(&Value) -> Option<&str>,
{
    if records.is_empty() {
        return None;
    }
    if let Some(exact) = records.iter().find(|r| name_of(r) == Some(target_name)) {
        return Some(exact.clone());
    }
    if records.len() > 1 {
        log::warn!(
            "[{provider}] {} records match '{target_name}' but none exactly; using the first",
            records.len()
        );
    }
    records.into_iter().next()
}

/// Reconcile one record to the requested state.
pub async fn set_record<P: RecordOps + ?Sized>(ops: &P, request: &RecordRequest) -> Result<bool> {
    let domain = request.domain.trim().to_ascii_lowercase();
    log::info!(
        "[{}] {domain} => {}({})",
        ops.name(),
        request.value,
        request.record_type
    );
    let expr = domain::split(&domain);

    let (zone_id, subdomain, main_domain) = match (expr.zone_id, expr.subdomain) {
        (Some(zone_id), Some(subdomain)) => (zone_id, subdomain, expr.main_domain),
        // explicit zone but no separator: the remainder is the full record
        // name inside that zone
        (Some(zone_id), None) => (zone_id, "@".to_string(), expr.main_domain),
        (None, Some(subdomain)) => {
            let zone_id = get_zone_id(ops, &expr.main_domain)
                .await?
                .ok_or_else(|| DnsError::ZoneNotFound {
                    provider: ops.name().to_string(),
                    domain: expr.main_domain.clone(),
                })?;
            (zone_id, subdomain, expr.main_domain)
        }
        (None, None) => split_zone_and_sub(ops, &expr.main_domain)
            .await?
            .ok_or_else(|| DnsError::ZoneNotFound {
                provider: ops.name().to_string(),
                domain: expr.main_domain.clone(),
            })?,
    };
    log::debug!(
        "[{}] zone_id: {zone_id}, sub: {subdomain}, main: {main_domain}",
        ops.name()
    );

    let line = request.line.as_deref();
    let old_record = if let Some(record_id) = expr.record_id {
        // pinned record id: skip the query, let the update primitive fall
        // back to request values for anything else
        Some(json!({ "id": record_id }))
    } else {
        ops.query_record(
            &zone_id,
            &subdomain,
            &main_domain,
            &request.record_type,
            line,
            &request.extra,
        )
        .await?
    };

    match old_record {
        Some(record) => {
            log::info!("[{}] updating existing record", ops.name());
            ops.update_record(
                &zone_id,
                &record,
                &request.value,
                &request.record_type,
                request.ttl,
                line,
                &request.extra,
            )
            .await
        }
        None => {
            log::warn!("[{}] no existing record found, creating a new one", ops.name());
            ops.create_record(
                &zone_id,
                &subdomain,
                &main_domain,
                &request.value,
                &request.record_type,
                request.ttl,
                line,
                &request.extra,
            )
            .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(names: &[&str]) -> Vec<Value> {
        names.iter().map(|n| json!({ "name": n })).collect()
    }

    fn by_name(record: &Value) -> Option<&str> {
        record.get("name").and_then(Value::as_str)
    }

    #[test]
    fn pick_record_empty() {
        assert_eq!(pick_record("test", vec![], "www", by_name), None);
    }

    #[test]
    fn pick_record_prefers_exact_match() {
        let candidates = records(&["wwwtest", "www", "www2"]);
        let picked = pick_record("test", candidates, "www", by_name);
        assert_eq!(picked, Some(json!({ "name": "www" })));
    }

    #[test]
    fn pick_record_falls_back_to_first() {
        let candidates = records(&["wwwtest", "www2"]);
        let picked = pick_record("test", candidates, "www", by_name);
        assert_eq!(picked, Some(json!({ "name": "wwwtest" })));
    }
}
