use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// Strategy used to estimate the rendered width of the page title
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TitleWidthConfig {
    /// Title length multiplied by a fixed pixel width per character
    Chars { px_per_char: f64 },
    /// Per-glyph width classes scaled to a font size
    Proportional { font_size_px: f64 },
}

impl Default for TitleWidthConfig {
    fn default() -> Self {
        TitleWidthConfig::Proportional { font_size_px: 20.0 }
    }
}

/// Values the host injects into the panel for the edited document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    /// URL returning the server-rendered preview of the document
    pub preview_url: String,

    /// URL returning the translation bundle for the analysis engine
    #[serde(default)]
    pub translations_url: Option<String>,

    /// Public URL of the document
    pub page_url: String,

    /// Public base URL of the site
    #[serde(default)]
    pub base_url: String,

    /// Whether the document is the site's home page
    #[serde(default)]
    pub is_homepage: bool,

    /// CSS selector of the element holding the analysed content
    #[serde(default = "default_content_selector")]
    pub content_selector: String,

    /// Base title of the document
    #[serde(default)]
    pub title: String,

    /// Title override entered by editors, preferred over `title`
    #[serde(default)]
    pub title_override: Option<String>,

    /// Meta description of the document
    #[serde(default)]
    pub description: Option<String>,

    /// Focus keyphrase
    #[serde(default)]
    pub focus_keyword: Option<String>,

    /// URI path segment (slug) of the document
    #[serde(default)]
    pub uri_path_segment: String,

    /// Whether the document is cornerstone content (heavy analysis variant)
    #[serde(default)]
    pub is_cornerstone: bool,

    /// Locale of the editing interface
    #[serde(default = "default_ui_locale")]
    pub ui_locale: String,

    /// Default favicon used when the preview does not declare a reachable one
    #[serde(default)]
    pub favicon_src: Option<String>,

    /// Log level handed to the analysis engine
    #[serde(default = "default_engine_log_level")]
    pub engine_log_level: String,

    /// Idle time before an edited value is written to the host document
    #[serde(default = "default_field_write_debounce_ms")]
    pub field_write_debounce_ms: u64,

    /// Idle time before the preview is fetched again after a field write
    #[serde(default = "default_preview_refresh_debounce_ms")]
    pub preview_refresh_debounce_ms: u64,

    /// Title width measurement strategy
    #[serde(default)]
    pub title_width: TitleWidthConfig,

    /// Assessment identifiers hidden from the SEO result groups
    #[serde(default)]
    pub seo_result_filter: Vec<String>,
}

fn default_content_selector() -> String {
    "body".to_string()
}

fn default_ui_locale() -> String {
    "en_US".to_string()
}

fn default_engine_log_level() -> String {
    "ERROR".to_string()
}

fn default_field_write_debounce_ms() -> u64 {
    500
}

fn default_preview_refresh_debounce_ms() -> u64 {
    3000
}

impl PanelConfig {
    /// Create a configuration with default values for the given preview and page URLs
    pub fn new(preview_url: &str, page_url: &str) -> Self {
        Self {
            preview_url: preview_url.to_string(),
            translations_url: None,
            page_url: page_url.to_string(),
            base_url: String::new(),
            is_homepage: false,
            content_selector: default_content_selector(),
            title: String::new(),
            title_override: None,
            description: None,
            focus_keyword: None,
            uri_path_segment: String::new(),
            is_cornerstone: false,
            ui_locale: default_ui_locale(),
            favicon_src: None,
            engine_log_level: default_engine_log_level(),
            field_write_debounce_ms: default_field_write_debounce_ms(),
            preview_refresh_debounce_ms: default_preview_refresh_debounce_ms(),
            title_width: TitleWidthConfig::default(),
            seo_result_filter: Vec::new(),
        }
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let io_error = |source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        };

        let mut file = File::open(path).map_err(io_error)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents).map_err(io_error)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The title editors see: the override when set, the base title otherwise
    pub fn user_title(&self) -> &str {
        match self.title_override.as_deref() {
            Some(title) if !title.is_empty() => title,
            _ => &self.title,
        }
    }

    pub fn field_write_debounce(&self) -> Duration {
        Duration::from_millis(self.field_write_debounce_ms)
    }

    pub fn preview_refresh_debounce(&self) -> Duration {
        Duration::from_millis(self.preview_refresh_debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_minimal_json() {
        let config = PanelConfig::from_json(
            r#"{"preview_url": "https://cms.test/preview?node=1", "page_url": "https://site.test/home"}"#,
        )
        .unwrap();

        assert_eq!(config.content_selector, "body");
        assert_eq!(config.ui_locale, "en_US");
        assert_eq!(config.engine_log_level, "ERROR");
        assert_eq!(config.field_write_debounce(), Duration::from_millis(500));
        assert_eq!(config.preview_refresh_debounce(), Duration::from_secs(3));
        assert_eq!(config.title_width, TitleWidthConfig::default());
    }

    #[test]
    fn test_user_title_prefers_override() {
        let mut config = PanelConfig::new("https://cms.test/preview", "https://site.test/");
        config.title = "Home".to_string();
        assert_eq!(config.user_title(), "Home");

        config.title_override = Some(String::new());
        assert_eq!(config.user_title(), "Home");

        config.title_override = Some("Welcome home".to_string());
        assert_eq!(config.user_title(), "Welcome home");
    }

    #[test]
    fn test_title_width_strategy_is_tagged() {
        let config = PanelConfig::from_json(
            r#"{
                "preview_url": "https://cms.test/preview",
                "page_url": "https://site.test/",
                "title_width": {"kind": "chars", "px_per_char": 8.5}
            }"#,
        )
        .unwrap();
        assert_eq!(config.title_width, TitleWidthConfig::Chars { px_per_char: 8.5 });
    }

    #[test]
    fn test_invalid_json_is_reported() {
        assert!(matches!(
            PanelConfig::from_json("{"),
            Err(ConfigError::Json(_))
        ));
    }
}
