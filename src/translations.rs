use crate::fetch::PreviewSource;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Text domain of the analysis engine's messages
pub const TRANSLATION_DOMAIN: &str = "js-text-analysis";

/// Translation bundle handed to the analysis engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Translations {
    pub domain: String,
    pub locale_data: Map<String, Value>,
}

impl Default for Translations {
    fn default() -> Self {
        Self::empty()
    }
}

impl Translations {
    /// Bundle without any messages; the engine falls back to its built-in texts
    pub fn empty() -> Self {
        let mut domain = Map::new();
        domain.insert(String::new(), Value::Object(Map::new()));

        let mut locale_data = Map::new();
        locale_data.insert(TRANSLATION_DOMAIN.to_string(), Value::Object(domain));

        Self {
            domain: TRANSLATION_DOMAIN.to_string(),
            locale_data,
        }
    }

    /// Parses a bundle, rejecting error payloads and bundles without locale data
    /// for their domain
    pub fn from_json(body: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(body).ok()?;
        if value.get("error").is_some() {
            return None;
        }

        let bundle: Self = serde_json::from_value(value).ok()?;
        let header = bundle
            .locale_data
            .get(&bundle.domain)
            .and_then(|domain| domain.get(""))?;
        header.is_object().then_some(bundle)
    }
}

/// Fetches the translation bundle, substituting [`Translations::empty`] on any failure
pub async fn load(source: &dyn PreviewSource, url: &str) -> Translations {
    let body = match source.fetch_text(url).await {
        Ok(body) => body,
        Err(e) => {
            ::log::warn!("Could not load translations, analysing untranslated: {}", e);
            return Translations::empty();
        }
    };

    match Translations::from_json(&body) {
        Some(translations) => {
            ::log::debug!("Loaded translations for domain {}", translations.domain);
            translations
        }
        None => {
            ::log::warn!("Malformed translation bundle from {}, analysing untranslated", url);
            Translations::empty()
        }
    }
}
