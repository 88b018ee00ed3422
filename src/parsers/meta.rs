use crate::page::SocialMetadata;
use scraper::{Html, Selector};
use std::collections::BTreeMap;
use std::sync::LazyLock;

const TWITTER_PREFIX: &str = "twitter:";
const OPEN_GRAPH_PREFIX: &str = "og:";

static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("head title").expect("static selector"));
static DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"head meta[name="description"]"#).expect("static selector"));
static FAVICON: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"head link[rel="shortcut icon"], head link[rel="icon"]"#)
        .expect("static selector")
});
static TWITTER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"head meta[name^="twitter:"]"#).expect("static selector"));
static OPEN_GRAPH: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"head meta[property^="og:"]"#).expect("static selector"));

/// Text of the document title, empty when there is none
pub fn title(doc: &Html) -> String {
    doc.select(&TITLE)
        .next()
        .map(|e| e.text().collect())
        .unwrap_or_default()
}

/// Content of the description meta tag, empty when there is none
pub fn description(doc: &Html) -> String {
    first_attr(doc, &DESCRIPTION, "content")
}

/// Href of the first shortcut icon or icon link, empty when there is none
pub fn favicon(doc: &Html) -> String {
    first_attr(doc, &FAVICON, "href")
}

/// Open-graph and twitter card metadata, known keys defaulting to `None`
pub fn social(doc: &Html) -> SocialMetadata {
    let mut social = SocialMetadata::default();
    collect_prefixed(doc, &TWITTER, "name", TWITTER_PREFIX, &mut social.twitter);
    collect_prefixed(
        doc,
        &OPEN_GRAPH,
        "property",
        OPEN_GRAPH_PREFIX,
        &mut social.open_graph,
    );
    social
}

fn first_attr(doc: &Html, selector: &Selector, attr: &str) -> String {
    doc.select(selector)
        .next()
        .and_then(|e| e.value().attr(attr))
        .unwrap_or_default()
        .to_string()
}

fn collect_prefixed(
    doc: &Html,
    selector: &Selector,
    key_attr: &str,
    prefix: &str,
    target: &mut BTreeMap<String, Option<String>>,
) {
    for tag in doc.select(selector) {
        let element = tag.value();
        let Some(key) = element.attr(key_attr).and_then(|k| k.strip_prefix(prefix)) else {
            continue;
        };
        // Later declarations of the same key win
        target.insert(
            key.to_string(),
            element.attr("content").map(str::to_string),
        );
    }
}
