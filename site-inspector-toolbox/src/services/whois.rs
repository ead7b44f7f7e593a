//! WHOIS lookup and response parsing.

use std::sync::LazyLock;
use std::time::Duration;

use log::debug;
use regex::Regex;
use whois_rust::{WhoIs, WhoIsLookupOptions};

use crate::error::{ToolboxError, ToolboxResult};
use crate::types::WhoisResult;

/// Embedded WHOIS server map (TLD -> server).
const WHOIS_SERVERS: &str = include_str!("whois_servers.json");

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns.iter().filter_map(|p| Regex::new(p).ok()).collect()
}

static OWNER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?im)^\s*Registrant Organi[sz]ation:[ \t]*(.+)$",
        r"(?im)^\s*Registrant Name:[ \t]*(.+)$",
        r"(?im)^\s*Registrant:[ \t]*(.+)$",
        r"(?im)^\s*org:[ \t]*(.+)$",
    ])
});

static REGISTRAR_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?im)^\s*Registrar:[ \t]*(.+)$",
        r"(?im)^\s*Registrar Name:[ \t]*(.+)$",
        r"(?im)^\s*Sponsoring Registrar:[ \t]*(.+)$",
    ])
});

static CREATED_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?im)^\s*Creation Date:[ \t]*(.+)$",
        r"(?im)^\s*Created Date:[ \t]*(.+)$",
        r"(?im)^\s*Created:[ \t]*(.+)$",
        r"(?im)^\s*Registration Time:[ \t]*(.+)$",
        r"(?im)^\s*Registration Date:[ \t]*(.+)$",
    ])
});

static EXPIRES_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?im)^\s*Registry Expiry Date:[ \t]*(.+)$",
        r"(?im)^\s*Expir(?:y|ation) Date:[ \t]*(.+)$",
        r"(?im)^\s*Expiration Time:[ \t]*(.+)$",
        r"(?im)^\s*paid-till:[ \t]*(.+)$",
    ])
});

static UPDATED_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?im)^\s*Updated Date:[ \t]*(.+)$",
        r"(?im)^\s*Last Updated:[ \t]*(.+)$",
        r"(?im)^\s*Last Modified:[ \t]*(.+)$",
    ])
});

static NAME_SERVER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?im)^\s*Name Server:[ \t]*(\S+)",
        r"(?im)^\s*nserver:[ \t]*(\S+)",
    ])
});

static STATE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?im)^\s*Domain Status:[ \t]*(\S+)",
        r"(?im)^\s*Status:[ \t]*(\S+)",
        r"(?im)^\s*state:[ \t]*(\S+)",
    ])
});

/// Query WHOIS for `domain`, giving up after `timeout`.
pub async fn whois_lookup(domain: &str, timeout: Duration) -> ToolboxResult<WhoisResult> {
    let whois = WhoIs::from_string(WHOIS_SERVERS).map_err(|e| {
        ToolboxError::NetworkError(format!("Failed to initialize WHOIS client: {e}"))
    })?;

    let options = WhoIsLookupOptions::from_string(domain)
        .map_err(|e| ToolboxError::ValidationError(format!("Invalid domain: {e}")))?;

    debug!("[WHOIS] Looking up {domain}");
    let raw = tokio::time::timeout(timeout, whois.lookup_async(options))
        .await
        .map_err(|_| ToolboxError::Timeout(timeout.as_secs()))?
        .map_err(|e| ToolboxError::NetworkError(format!("WHOIS query failed: {e}")))?;

    Ok(parse_whois_response(domain, &raw))
}

/// Parse structured fields from a raw WHOIS response.
pub(crate) fn parse_whois_response(domain: &str, raw: &str) -> WhoisResult {
    WhoisResult {
        domain: domain.to_string(),
        owner: first_match(raw, &OWNER_PATTERNS),
        registrar: first_match(raw, &REGISTRAR_PATTERNS),
        creation_date: first_match(raw, &CREATED_PATTERNS),
        expiration_date: first_match(raw, &EXPIRES_PATTERNS),
        updated_date: first_match(raw, &UPDATED_PATTERNS),
        name_servers: all_matches(raw, &NAME_SERVER_PATTERNS, |s| {
            s.trim_end_matches('.').to_lowercase()
        }),
        states: all_matches(raw, &STATE_PATTERNS, |s| {
            s.trim_end_matches(',').to_string()
        }),
    }
}

/// The first non-empty capture across `patterns`, tried in order.
fn first_match(text: &str, patterns: &[Regex]) -> Option<String> {
    patterns.iter().find_map(|re| {
        re.captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|v| !v.is_empty())
    })
}

/// Every capture across `patterns`, normalised and deduplicated, in order of
/// first appearance.
fn all_matches(text: &str, patterns: &[Regex], normalise: impl Fn(&str) -> String) -> Vec<String> {
    let mut values: Vec<String> = Vec::new();
    for re in patterns {
        for caps in re.captures_iter(text) {
            if let Some(m) = caps.get(1) {
                let value = normalise(m.as_str().trim());
                if !value.is_empty() && !values.contains(&value) {
                    values.push(value);
                }
            }
        }
    }
    values
}
