//! Where a redirecting homepage points.

use async_trait::async_trait;
use serde_json::{Value, json};
use url::Url;

use super::Plugin;
use crate::context::ClassificationContext;
use crate::error::InspectorResult;

const REDIRECT_STATUSES: [u16; 5] = [301, 302, 303, 307, 308];

pub struct RedirectPlugin;

/// Host a `Location` header sends visitors of `domain` to. Relative
/// locations resolve against the domain's root.
fn redirect_domain(domain: &str, location: &str) -> String {
    Url::parse(&format!("https://{domain}/"))
        .and_then(|base| base.join(location.trim()))
        .ok()
        .and_then(|target| target.host_str().map(str::to_string))
        .unwrap_or_default()
}

#[async_trait]
impl Plugin for RedirectPlugin {
    fn machine_name(&self) -> &'static str {
        "redirect"
    }

    async fn analyse(&self, ctx: &ClassificationContext) -> InspectorResult<Value> {
        let Some(response) = ctx.response() else {
            return Ok(json!({}));
        };
        if !REDIRECT_STATUSES.contains(&response.status) {
            return Ok(json!({}));
        }

        let location = response.header_line("Location");
        let target = redirect_domain(ctx.domain(), &location);
        Ok(json!({
            "redirect": location,
            "redirectDomain": target,
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use site_inspector_toolbox::{DnsAnswerSet, HomepageFetch, HttpResponse};

    use super::*;

    fn ctx(status: u16, headers: &[(&str, &str)]) -> ClassificationContext {
        ClassificationContext::new(
            "example.gov.au",
            HomepageFetch {
                response: Some(HttpResponse::new("https://example.gov.au/", status, headers, "")),
                has_ssl: true,
                connect_error: None,
            },
            DnsAnswerSet::empty(),
            DnsAnswerSet::empty(),
        )
    }

    #[tokio::test]
    async fn test_absolute_redirect() {
        let value = RedirectPlugin
            .analyse(&ctx(301, &[("Location", "https://www.example.gov.au/home")]))
            .await
            .unwrap();
        assert_eq!(value["redirect"], "https://www.example.gov.au/home");
        assert_eq!(value["redirectDomain"], "www.example.gov.au");
    }

    #[tokio::test]
    async fn test_relative_redirect_stays_on_domain() {
        let value = RedirectPlugin
            .analyse(&ctx(302, &[("Location", "/en")]))
            .await
            .unwrap();
        assert_eq!(value["redirectDomain"], "example.gov.au");
    }

    #[tokio::test]
    async fn test_not_a_redirect() {
        let value = RedirectPlugin
            .analyse(&ctx(200, &[("Location", "https://elsewhere.example/")]))
            .await
            .unwrap();
        assert_eq!(value, json!({}));
    }
}
