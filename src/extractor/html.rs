//! HTML extraction via a DOM walk.

use super::{
    clean_text, content_hash, truncate_chars, ExtractedContent, MAX_ANCHOR_CHARS,
    MAX_DESCRIPTION_CHARS, MAX_KEYWORDS, MAX_LANGUAGE_CHARS, MAX_TITLE_CHARS,
};
use crate::models::DocumentLink;
use crate::urls::normalize_url;
use scraper::{ElementRef, Html, Selector};
use std::collections::{HashMap, HashSet};
use url::Url;

/// Tags whose subtrees never contribute to extracted text
const EXCLUDED_TAGS: [&str; 5] = ["script", "style", "nav", "footer", "aside"];

/// Class names that mark boilerplate containers
const EXCLUDED_CLASSES: [&str; 5] = ["advertisement", "ads", "sidebar", "menu", "navigation"];

/// Containers tried, in order, for the main content block
const CONTENT_SELECTORS: [&str; 8] = [
    "main",
    "article",
    ".content",
    ".main-content",
    ".post-content",
    ".article-content",
    "#content",
    ".page-content",
];

/// Minimum cleaned length for a container to count as main content
const MIN_CONTENT_CHARS: usize = 100;

pub(super) fn extract_html(body: &str, url: &str) -> ExtractedContent {
    let document = Html::parse_document(body);

    let metadata = extract_metadata(&document);
    let title = extract_title(&document);
    let description = extract_description(&document);
    let content = extract_main_content(&document);
    let keywords = extract_keywords(&document);
    let links = extract_links(&document, url);
    let language = extract_language(&document, &metadata);

    let word_count = content.split_whitespace().count();
    let content_hash = content_hash(&content);

    ExtractedContent {
        title,
        description,
        content,
        keywords,
        links,
        metadata,
        language,
        word_count,
        content_hash,
    }
}

fn sel(selector: &str) -> Selector {
    Selector::parse(selector).unwrap()
}

fn is_excluded(element: &scraper::node::Element) -> bool {
    if EXCLUDED_TAGS.contains(&element.name()) {
        return true;
    }
    element
        .classes()
        .any(|class| EXCLUDED_CLASSES.contains(&class))
}

/// Recursively collect text, skipping excluded subtrees
fn collect_text(element: ElementRef, out: &mut String) {
    if is_excluded(element.value()) {
        return;
    }
    for node in element.children() {
        if let Some(text) = node.value().as_text() {
            out.push_str(text);
            out.push(' ');
        } else if let Some(child) = ElementRef::wrap(node) {
            collect_text(child, out);
        }
    }
}

fn cleaned_text_of(element: ElementRef) -> String {
    let mut raw = String::new();
    collect_text(element, &mut raw);
    clean_text(&raw)
}

/// First non-empty cleaned text among elements matching `selector`
fn select_text(document: &Html, selector: &str) -> Option<String> {
    document
        .select(&sel(selector))
        .map(cleaned_text_of)
        .find(|text| !text.is_empty())
}

fn meta_content(document: &Html, selector: &str) -> Option<String> {
    document
        .select(&sel(selector))
        .filter_map(|el| el.value().attr("content"))
        .map(|content| content.trim().to_string())
        .find(|content| !content.is_empty())
}

fn extract_title(document: &Html) -> Option<String> {
    let candidates = [
        select_text(document, "title"),
        select_text(document, "h1"),
        meta_content(document, "meta[property='og:title']"),
        meta_content(document, "meta[name='twitter:title']"),
        select_text(document, ".title"),
        select_text(document, ".page-title"),
    ];

    candidates
        .into_iter()
        .flatten()
        .map(|t| truncate_chars(t.trim(), MAX_TITLE_CHARS))
        .find(|t| !t.is_empty())
}

fn extract_description(document: &Html) -> Option<String> {
    let candidates = [
        meta_content(document, "meta[name='description']"),
        meta_content(document, "meta[property='og:description']"),
        meta_content(document, "meta[name='twitter:description']"),
        select_text(document, ".description"),
        select_text(document, ".summary"),
    ];

    candidates
        .into_iter()
        .flatten()
        .map(|d| truncate_chars(d.trim(), MAX_DESCRIPTION_CHARS))
        .find(|d| !d.is_empty())
}

fn extract_main_content(document: &Html) -> String {
    for selector in CONTENT_SELECTORS {
        if let Some(element) = document.select(&sel(selector)).next() {
            let text = cleaned_text_of(element);
            if text.chars().count() > MIN_CONTENT_CHARS {
                return text;
            }
        }
    }

    // No designated container was substantial enough; use the whole body
    if let Some(body) = document.select(&sel("body")).next() {
        return cleaned_text_of(body);
    }
    cleaned_text_of(document.root_element())
}

fn extract_keywords(document: &Html) -> Vec<String> {
    let raw = match meta_content(document, "meta[name='keywords']") {
        Some(raw) => raw,
        None => return Vec::new(),
    };

    let mut seen = HashSet::new();
    raw.split(',')
        .map(|k| k.trim().to_lowercase())
        .filter(|k| k.len() > 2)
        .filter(|k| seen.insert(k.clone()))
        .take(MAX_KEYWORDS)
        .collect()
}

fn extract_links(document: &Html, page_url: &str) -> Vec<DocumentLink> {
    let base = match Url::parse(page_url) {
        Ok(base) => base,
        Err(_) => return Vec::new(),
    };

    let mut links = Vec::new();
    for anchor in document.select(&sel("a[href]")) {
        let href = match anchor.value().attr("href") {
            Some(href) => href.trim(),
            None => continue,
        };
        if href.is_empty() || href.starts_with("mailto:") || href.starts_with('#') {
            continue;
        }

        let text = clean_text(&anchor.text().collect::<String>());
        if text.is_empty() {
            continue;
        }

        let resolved = match normalize_url(href, Some(&base)) {
            Ok(resolved) => resolved,
            Err(_) => continue,
        };

        links.push(DocumentLink {
            url: resolved,
            text: truncate_chars(&text, MAX_ANCHOR_CHARS),
            title: anchor.value().attr("title").map(|t| t.to_string()),
        });
    }
    links
}

/// Open Graph / Twitter Card properties plus a schema.org type marker
fn extract_metadata(document: &Html) -> HashMap<String, String> {
    let mut metadata = HashMap::new();

    for meta in document.select(&sel("meta")) {
        let content = match meta.value().attr("content") {
            Some(content) => content.trim(),
            None => continue,
        };
        if content.is_empty() {
            continue;
        }

        if let Some(property) = meta.value().attr("property") {
            if property.starts_with("og:") {
                metadata
                    .entry(property.to_string())
                    .or_insert_with(|| content.to_string());
            }
        }
        if let Some(name) = meta.value().attr("name") {
            if name.starts_with("twitter:") {
                metadata
                    .entry(name.to_string())
                    .or_insert_with(|| content.to_string());
            }
        }
    }

    if let Some(element) = document.select(&sel("[itemtype], [typeof]")).next() {
        let value = element
            .value()
            .attr("itemtype")
            .or_else(|| element.value().attr("typeof"));
        if let Some(value) = value {
            metadata.insert("schemaType".to_string(), value.trim().to_string());
        }
    }

    metadata
}

fn extract_language(document: &Html, metadata: &HashMap<String, String>) -> String {
    let candidates = [
        document
            .select(&sel("html"))
            .next()
            .and_then(|el| el.value().attr("lang"))
            .map(|l| l.to_string()),
        meta_content(document, "meta[http-equiv='content-language']"),
        meta_content(document, "meta[name='language']"),
        metadata.get("og:locale").cloned(),
    ];

    candidates
        .into_iter()
        .flatten()
        .map(|l| truncate_chars(l.trim().to_lowercase().as_str(), MAX_LANGUAGE_CHARS))
        .find(|l| !l.is_empty())
        .unwrap_or_else(|| "en".to_string())
}
