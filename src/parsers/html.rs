use crate::error::ExtractionError;
use crate::page::PageSnapshot;
use crate::parsers::meta;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;

/// Locale assumed when the preview's root element carries no language
pub const DEFAULT_LOCALE: &str = "en_US";

/// Selector used when the host configures none
pub const DEFAULT_CONTENT_SELECTOR: &str = "body";

// Embedded markup the analysis engine cannot cope with
static STRIPPED_ELEMENTS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script, noscript, svg").expect("static selector"));

// scraper always serializes attribute values with double quotes
static DATA_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\s+data-[^\s="'<>/]*\s*=\s*"[^"]*""#).expect("static pattern")
});

/// Parses a preview document into a page snapshot.
///
/// `content_selector` picks the element whose inner markup is analysed; `None` or a
/// blank selector falls back to the document body. The call fails when the selector
/// is invalid or matches nothing, so a snapshot is either complete or absent.
pub fn extract_page(
    html: &str,
    content_selector: Option<&str>,
) -> Result<PageSnapshot, ExtractionError> {
    let selector_text = match content_selector.map(str::trim) {
        Some(selector) if !selector.is_empty() => selector,
        _ => DEFAULT_CONTENT_SELECTOR,
    };
    let content_selector = Selector::parse(selector_text)
        .map_err(|_| ExtractionError::InvalidSelector(selector_text.to_string()))?;

    let mut doc = Html::parse_document(html);
    let stripped = strip_elements(&mut doc);
    ::log::debug!("Removed {} script/noscript/svg elements from preview", stripped);

    let content = doc
        .select(&content_selector)
        .next()
        .map(|element| element.inner_html())
        .ok_or_else(|| ExtractionError::ContentNotFound(selector_text.to_string()))?;

    let snapshot = PageSnapshot {
        title: meta::title(&doc),
        description: meta::description(&doc),
        content: strip_data_attributes(&content),
        locale: locale(&doc),
        favicon_hint: meta::favicon(&doc),
        social: meta::social(&doc),
    };

    ::log::debug!(
        "Extracted preview: title {:?}, locale {}, {} bytes of content",
        snapshot.title,
        snapshot.locale,
        snapshot.content.len()
    );

    Ok(snapshot)
}

/// Detaches every script, noscript and svg element, returning how many were removed
fn strip_elements(doc: &mut Html) -> usize {
    let ids: Vec<_> = doc.select(&STRIPPED_ELEMENTS).map(|e| e.id()).collect();
    for id in &ids {
        if let Some(mut node) = doc.tree.get_mut(*id) {
            node.detach();
        }
    }
    ids.len()
}

/// Removes `data-*="..."` attributes from serialized markup
pub fn strip_data_attributes(markup: &str) -> String {
    DATA_ATTRIBUTE.replace_all(markup, "").into_owned()
}

/// Reads the root element's language, normalized to `xx_YY`
fn locale(doc: &Html) -> String {
    match doc.root_element().value().attr("lang").map(str::trim) {
        Some(lang) if !lang.is_empty() => lang.replace('-', "_"),
        _ => DEFAULT_LOCALE.to_string(),
    }
}
