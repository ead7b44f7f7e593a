//! Browser and proxy cache lifetimes from `Cache-Control` and `Surrogate-Control`.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use super::{Plugin, to_json};
use crate::context::ClassificationContext;
use crate::error::InspectorResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CachingReport {
    pub browser_cacheable: bool,
    pub proxy_cacheable: bool,
    pub cache_control: String,
    pub surrogate_control: String,
    pub browser_cache: i64,
    pub browser_cache_friendly: String,
    pub proxy_cache: i64,
    pub proxy_cache_friendly: String,
    pub drupal_page_cache: String,
}

#[derive(Debug, Default)]
struct Directives {
    values: HashMap<String, i64>,
    flags: Vec<String>,
}

impl Directives {
    /// `max-age=600, public, s-maxage=2764800`. The first occurrence of a
    /// valued directive wins; values keep only their leading digits.
    fn parse(header: &str) -> Self {
        let mut directives = Self::default();
        for part in header.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match part.split_once('=') {
                Some((key, value)) => {
                    directives
                        .values
                        .entry(key.trim().to_string())
                        .or_insert_with(|| leading_int(value));
                }
                None => directives.flags.push(part.to_string()),
            }
        }
        directives
    }

    fn value(&self, key: &str) -> Option<i64> {
        self.values.get(key).copied()
    }

    fn has(&self, key: &str) -> bool {
        self.flags.iter().any(|f| f == key) || self.values.contains_key(key)
    }
}

fn leading_int(value: &str) -> i64 {
    let value = value.trim().trim_matches('"');
    let digits: String = value.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}

const UNITS: &[(&str, i64)] = &[
    ("year", 12 * 4 * 7 * 86_400),
    ("month", 4 * 7 * 86_400),
    ("week", 7 * 86_400),
    ("day", 86_400),
    ("hour", 3_600),
    ("minute", 60),
    ("second", 1),
];

/// Two most significant non-zero units, e.g. `2764800` is `"1 month and 4 days"`.
/// Months are four weeks and years twelve months.
pub fn friendly_duration(seconds: i64) -> String {
    let mut remaining = seconds.max(0);
    let mut parts = Vec::with_capacity(2);
    for &(unit, size) in UNITS {
        if parts.len() == 2 {
            break;
        }
        let count = remaining / size;
        remaining %= size;
        if count > 0 {
            let plural = if count == 1 { "" } else { "s" };
            parts.push(format!("{count} {unit}{plural}"));
        }
    }
    if parts.is_empty() {
        return "0 seconds".to_string();
    }
    parts.join(" and ")
}

fn friendly(seconds: i64) -> String {
    if seconds > 0 {
        friendly_duration(seconds)
    } else {
        String::new()
    }
}

pub struct CachingHeadersPlugin;

impl CachingHeadersPlugin {
    pub fn report(ctx: &ClassificationContext) -> CachingReport {
        let cache_control = ctx.header_line("Cache-Control");
        let surrogate_control = ctx.header_line("Surrogate-Control");

        let mut browser_cache = -1;
        let mut proxy_cache = -1;
        let mut browser_cacheable = false;
        let mut proxy_cacheable = false;

        if !cache_control.is_empty() {
            let directives = Directives::parse(&cache_control);
            if let Some(max_age) = directives.value("max-age") {
                browser_cache = max_age;
                proxy_cache = max_age;
            }
            if let Some(s_maxage) = directives.value("s-maxage") {
                proxy_cache = s_maxage;
            }
            if directives.has("public") {
                browser_cacheable = true;
                proxy_cacheable = true;
            }
        }

        if !surrogate_control.is_empty() {
            let directives = Directives::parse(&surrogate_control);
            if let Some(max_age) = directives.value("max-age") {
                proxy_cache = max_age;
            }
            proxy_cacheable = directives.has("public");
        }

        CachingReport {
            browser_cacheable,
            proxy_cacheable,
            browser_cache_friendly: friendly(browser_cache),
            proxy_cache_friendly: friendly(proxy_cache),
            cache_control,
            surrogate_control,
            browser_cache,
            proxy_cache,
            drupal_page_cache: ctx.header_line("X-Drupal-Cache"),
        }
    }
}

#[async_trait]
impl Plugin for CachingHeadersPlugin {
    fn machine_name(&self) -> &'static str {
        "CachingHeaders"
    }

    async fn analyse(&self, ctx: &ClassificationContext) -> InspectorResult<Value> {
        to_json(&Self::report(ctx))
    }
}
