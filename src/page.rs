use crate::config::PanelConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Open-graph keys every snapshot carries, present or not
pub const OPEN_GRAPH_KEYS: [&str; 10] = [
    "type",
    "title",
    "site_name",
    "locale",
    "description",
    "url",
    "image",
    "image:width",
    "image:height",
    "image:alt",
];

/// Twitter card keys every snapshot carries, present or not
pub const TWITTER_KEYS: [&str; 7] = [
    "card",
    "title",
    "site",
    "description",
    "creator",
    "url",
    "image",
];

/// Social metadata declared in the head of a preview document.
///
/// Known keys are always present; a key the document does not declare maps to `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialMetadata {
    pub open_graph: BTreeMap<String, Option<String>>,
    pub twitter: BTreeMap<String, Option<String>>,
}

impl Default for SocialMetadata {
    fn default() -> Self {
        Self {
            open_graph: blank_keys(&OPEN_GRAPH_KEYS),
            twitter: blank_keys(&TWITTER_KEYS),
        }
    }
}

fn blank_keys(keys: &[&str]) -> BTreeMap<String, Option<String>> {
    keys.iter().map(|k| (k.to_string(), None)).collect()
}

impl SocialMetadata {
    pub fn open_graph(&self, key: &str) -> Option<&str> {
        self.open_graph.get(key).and_then(|v| v.as_deref())
    }

    pub fn twitter(&self, key: &str) -> Option<&str> {
        self.twitter.get(key).and_then(|v| v.as_deref())
    }
}

/// Structured data extracted from one fetch of the preview document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageSnapshot {
    /// Text of the rendered `<title>`
    pub title: String,

    /// Rendered meta description
    pub description: String,

    /// Inner markup of the content element, cleaned for analysis
    pub content: String,

    /// Locale in `xx_YY` form
    pub locale: String,

    /// Favicon declared by the page, empty when none
    pub favicon_hint: String,

    pub social: SocialMetadata,
}

/// Identity of the edited document (the host's node context path)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub String);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Editable fields of the snippet editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EditorField {
    Title,
    Description,
    Slug,
    FocusKeyword,
}

impl EditorField {
    pub const ALL: [EditorField; 4] = [
        EditorField::Title,
        EditorField::Description,
        EditorField::Slug,
        EditorField::FocusKeyword,
    ];

    /// Host document property backing this field
    pub fn host_property(self) -> &'static str {
        match self {
            // The snippet title edits the override, never the base title
            EditorField::Title => "titleOverride",
            EditorField::Description => "metaDescription",
            EditorField::Slug => "uriPathSegment",
            EditorField::FocusKeyword => "focusKeyword",
        }
    }
}

/// Working copy of the fields the user edits in the panel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorData {
    pub title: String,
    pub description: String,
    pub slug: String,
    pub url: String,
    pub focus_keyword: String,
}

impl EditorData {
    /// Build the working copy from the host's current property values
    pub fn from_config(config: &PanelConfig) -> Self {
        Self {
            title: config.user_title().to_string(),
            description: config.description.clone().unwrap_or_default(),
            slug: config.uri_path_segment.clone(),
            url: config.page_url.clone(),
            focus_keyword: config.focus_keyword.clone().unwrap_or_default(),
        }
    }

    pub fn get(&self, field: EditorField) -> &str {
        match field {
            EditorField::Title => &self.title,
            EditorField::Description => &self.description,
            EditorField::Slug => &self.slug,
            EditorField::FocusKeyword => &self.focus_keyword,
        }
    }

    pub fn set(&mut self, field: EditorField, value: String) {
        match field {
            EditorField::Title => self.title = value,
            EditorField::Description => self.description = value,
            EditorField::Slug => self.slug = value,
            EditorField::FocusKeyword => self.focus_keyword = value,
        }
    }
}
