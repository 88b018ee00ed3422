use serde::{Deserialize, Serialize};

/// Placeholder standing in for the editable title
pub const TITLE_PLACEHOLDER: &str = "{title}";

/// The chrome a site renders around a page title, with the title itself replaced by
/// [`TITLE_PLACEHOLDER`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleTemplate(String);

impl Default for TitleTemplate {
    fn default() -> Self {
        Self::identity()
    }
}

impl TitleTemplate {
    /// Template that assumes no surrounding chrome
    pub fn identity() -> Self {
        Self(TITLE_PLACEHOLDER.to_string())
    }

    /// Derives the template from the title the user entered and the rendered `<title>`.
    ///
    /// Must only run against the first preview of a document: once the user starts
    /// editing, the rendered title no longer contains the entered one.
    pub fn derive(user_title: &str, rendered_title: &str) -> Self {
        if user_title.is_empty() || !rendered_title.contains(user_title) {
            return Self::identity();
        }
        Self(rendered_title.replacen(user_title, TITLE_PLACEHOLDER, 1))
    }

    /// The rendered title `title` would produce
    pub fn render(&self, title: &str) -> String {
        self.0.replacen(TITLE_PLACEHOLDER, title, 1)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
