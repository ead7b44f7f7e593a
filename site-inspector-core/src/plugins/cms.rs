//! Best guess at the CMS serving the homepage.

use async_trait::async_trait;
use serde_json::Value;

use super::Plugin;
use crate::context::ClassificationContext;
use crate::error::InspectorResult;

const DRUPAL_7_SETTINGS: &str = "jQuery.extend(Drupal.settings";
const DRUPAL_8_SETTINGS: &str = r#"data-drupal-selector="drupal-settings-json""#;
const DISTRICT_THEME: &str = r",district_base\/";
const SITECORE_COOKIE: &str = "SC_ANALYTICS_GLOBAL_COOKIE";

pub struct CmsPlugin;

impl CmsPlugin {
    pub fn detect(ctx: &ClassificationContext) -> String {
        let Some(response) = ctx.response() else {
            return "Unknown".to_string();
        };
        let body = response.body.as_str();

        let generator = ctx
            .meta_tags()
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case("generator"))
            .map(|(_, value)| value.as_str());
        if let Some(generator) = generator {
            return from_generator(generator, body);
        }

        if body.contains(DRUPAL_7_SETTINGS) {
            "Drupal 7".to_string()
        } else if body.contains(DRUPAL_8_SETTINGS) {
            "Drupal 8 or 9".to_string()
        } else if response
            .header_values("set-cookie")
            .iter()
            .any(|cookie| cookie.starts_with(SITECORE_COOKIE))
        {
            "Sitecore".to_string()
        } else {
            "Unknown".to_string()
        }
    }
}

fn from_generator(generator: &str, body: &str) -> String {
    let name = match generator.to_lowercase().as_str() {
        "drupal 7 (http://drupal.org) + govcms (http://govcms.gov.au)" => "Drupal 7 (GovCMS)",
        "drupal 8 (http://drupal.org) + govcms (http://govcms.gov.au)" => "Drupal 8 (GovCMS)",
        "drupal 7 (https://www.drupal.org)" | "drupal 7 (http://drupal.org)" => "Drupal 7",
        "drupal 8 (https://www.drupal.org)" | "drupal 8 (http://drupal.org)" => {
            if body.contains(DISTRICT_THEME) {
                "Drupal 8 (District CMS)"
            } else {
                "Drupal 8"
            }
        }
        "drupal 9 (https://www.drupal.org)" => "Drupal 9",
        _ => return capitalise_words(generator),
    };
    name.to_string()
}

/// Upper-case the first character of every whitespace separated word.
fn capitalise_words(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = c.is_whitespace();
    }
    out
}

#[async_trait]
impl Plugin for CmsPlugin {
    fn machine_name(&self) -> &'static str {
        "cms"
    }

    async fn analyse(&self, ctx: &ClassificationContext) -> InspectorResult<Value> {
        Ok(Value::String(Self::detect(ctx)))
    }
}
