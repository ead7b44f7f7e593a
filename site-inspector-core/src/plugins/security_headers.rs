//! Security related response headers.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use site_inspector_toolbox::HttpResponse;

use super::{Plugin, to_json};
use crate::context::ClassificationContext;
use crate::error::InspectorResult;

/// Each header's value, or `""` when it is absent or set to a value that
/// offers no protection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SecurityHeaders {
    #[serde(rename = "Content-Security-Policy")]
    pub content_security_policy: String,
    #[serde(rename = "X-XSS-Protection")]
    pub xss_protection: String,
    #[serde(rename = "Strict-Transport-Security")]
    pub strict_transport_security: String,
    #[serde(rename = "X-Frame-Options")]
    pub frame_options: String,
    #[serde(rename = "X-Content-Type-Options")]
    pub content_type_options: String,
    #[serde(rename = "Referrer-Policy")]
    pub referrer_policy: String,
    #[serde(rename = "Feature-Policy")]
    pub feature_policy: String,
    #[serde(rename = "Permissions-Policy")]
    pub permissions_policy: String,
}

impl SecurityHeaders {
    pub fn from_response(response: &HttpResponse) -> Self {
        let xss = response.header_line("X-XSS-Protection");
        let nosniff = response
            .header_values("X-Content-Type-Options")
            .first()
            .is_some_and(|v| *v == "nosniff");

        Self {
            content_security_policy: response.header_line("Content-Security-Policy"),
            xss_protection: if xss == "1; mode=block" { xss } else { String::new() },
            strict_transport_security: response.header_line("Strict-Transport-Security"),
            frame_options: response.header_line("X-Frame-Options"),
            content_type_options: if nosniff { "nosniff".to_string() } else { String::new() },
            referrer_policy: response.header_line("Referrer-Policy"),
            feature_policy: response.header_line("Feature-Policy"),
            permissions_policy: response.header_line("Permissions-Policy"),
        }
    }
}

pub struct SecurityHeadersPlugin;

#[async_trait]
impl Plugin for SecurityHeadersPlugin {
    fn machine_name(&self) -> &'static str {
        "securityHeaders"
    }

    async fn analyse(&self, ctx: &ClassificationContext) -> InspectorResult<Value> {
        let headers = ctx
            .response()
            .map(SecurityHeaders::from_response)
            .unwrap_or_default();
        to_json(&headers)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn response(headers: &[(&str, &str)]) -> HttpResponse {
        HttpResponse::new("https://www.example.gov.au/", 200, headers, "")
    }

    #[test]
    fn test_present_headers_copied() {
        let headers = SecurityHeaders::from_response(&response(&[
            ("Strict-Transport-Security", "max-age=31536000"),
            ("X-Frame-Options", "SAMEORIGIN"),
            ("X-XSS-Protection", "1; mode=block"),
            ("X-Content-Type-Options", "nosniff"),
        ]));
        assert_eq!(headers.strict_transport_security, "max-age=31536000");
        assert_eq!(headers.frame_options, "SAMEORIGIN");
        assert_eq!(headers.xss_protection, "1; mode=block");
        assert_eq!(headers.content_type_options, "nosniff");
        assert_eq!(headers.content_security_policy, "");
    }

    #[test]
    fn test_weak_values_blanked() {
        let headers = SecurityHeaders::from_response(&response(&[
            ("X-XSS-Protection", "0"),
            ("X-Content-Type-Options", "sniff"),
            ("X-Content-Type-Options", "nosniff"),
        ]));
        assert_eq!(headers.xss_protection, "");
        assert_eq!(headers.content_type_options, "");
    }

    #[test]
    fn test_serialised_keys_in_order() {
        let value = serde_json::to_value(SecurityHeaders::default()).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            [
                "Content-Security-Policy",
                "X-XSS-Protection",
                "Strict-Transport-Security",
                "X-Frame-Options",
                "X-Content-Type-Options",
                "Referrer-Policy",
                "Feature-Policy",
                "Permissions-Policy",
            ]
        );
    }
}
