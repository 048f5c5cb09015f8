use crate::extractor::ContentExtractor;

const PAGE: &str = r##"
<!DOCTYPE html>
<html lang="EN-us">
<head>
    <title>  Example Title  </title>
    <meta name="description" content="A page about examples.">
    <meta name="keywords" content="Rust, crawling, Web, ab, rust, indexing">
    <meta property="og:title" content="OG Title">
    <meta property="og:locale" content="en_US">
    <meta name="twitter:card" content="summary">
</head>
<body>
    <nav><a href="/nav">Navigation link</a></nav>
    <div class="sidebar">sidebar noise</div>
    <article itemtype="https://schema.org/Article">
        <h1>Heading</h1>
        <p>This is the main body of the page. It talks about crawling the web,
        politely and at scale, with enough prose to pass the minimum content
        threshold that separates real articles from boilerplate shells.</p>
        <a href="/relative/path">A relative link</a>
        <a href="https://other.example.org/abs">An absolute link</a>
        <a href="mailto:someone@example.com">Mail someone</a>
        <a href="#section">Jump</a>
        <a href="/no-text"></a>
    </article>
    <script>var ignored = true;</script>
    <footer>footer noise</footer>
</body>
</html>
"##;

fn extract() -> crate::extractor::ExtractedContent {
    ContentExtractor::new()
        .extract(PAGE, "text/html", "https://example.com/dir/page")
        .expect("extraction should succeed")
}

#[test]
fn test_title_prefers_title_tag() {
    let extracted = extract();
    assert_eq!(extracted.title.as_deref(), Some("Example Title"));
}

#[test]
fn test_title_falls_back_to_h1_then_og() {
    let extractor = ContentExtractor::new();

    let no_title = "<html><body><h1>Fallback Heading</h1></body></html>";
    let extracted = extractor
        .extract(no_title, "text/html", "https://example.com")
        .unwrap();
    assert_eq!(extracted.title.as_deref(), Some("Fallback Heading"));

    let only_og = r#"<html><head><meta property="og:title" content="Social Title"></head><body></body></html>"#;
    let extracted = extractor
        .extract(only_og, "text/html", "https://example.com")
        .unwrap();
    assert_eq!(extracted.title.as_deref(), Some("Social Title"));
}

#[test]
fn test_description_extraction() {
    let extracted = extract();
    assert_eq!(
        extracted.description.as_deref(),
        Some("A page about examples.")
    );
}

#[test]
fn test_excluded_regions_do_not_leak_into_content() {
    let extracted = extract();
    assert!(extracted.content.contains("main body of the page"));
    assert!(!extracted.content.contains("sidebar noise"));
    assert!(!extracted.content.contains("footer noise"));
    assert!(!extracted.content.contains("ignored"));
    assert!(!extracted.content.contains("Navigation link"));
}

#[test]
fn test_keywords_lowercased_deduped_and_length_filtered() {
    let extracted = extract();
    // "ab" dropped (too short), "rust" deduped
    assert_eq!(
        extracted.keywords,
        vec!["rust", "crawling", "web", "indexing"]
    );
}

#[test]
fn test_links_resolved_and_filtered() {
    let extracted = extract();
    let urls: Vec<&str> = extracted.links.iter().map(|l| l.url.as_str()).collect();

    assert!(urls.contains(&"https://example.com/relative/path"));
    assert!(urls.contains(&"https://other.example.org/abs"));
    // Links are taken from every anchor, including navigation chrome
    assert!(urls.contains(&"https://example.com/nav"));
    // mailto:, fragment-only and empty-text anchors are skipped
    assert_eq!(urls.len(), 3);
}

#[test]
fn test_anchor_text_is_captured() {
    let extracted = extract();
    let link = extracted
        .links
        .iter()
        .find(|l| l.url == "https://example.com/relative/path")
        .unwrap();
    assert_eq!(link.text, "A relative link");
}

#[test]
fn test_open_graph_and_schema_metadata() {
    let extracted = extract();
    assert_eq!(
        extracted.metadata.get("og:title").map(String::as_str),
        Some("OG Title")
    );
    assert_eq!(
        extracted.metadata.get("twitter:card").map(String::as_str),
        Some("summary")
    );
    assert_eq!(
        extracted.metadata.get("schemaType").map(String::as_str),
        Some("https://schema.org/Article")
    );
}

#[test]
fn test_language_from_html_lang_lowercased_and_capped() {
    let extracted = extract();
    assert_eq!(extracted.language, "en-us");
}

#[test]
fn test_language_defaults_to_en() {
    let extracted = ContentExtractor::new()
        .extract("<html><body>hi</body></html>", "text/html", "https://e.com")
        .unwrap();
    assert_eq!(extracted.language, "en");
}

#[test]
fn test_content_hash_is_stable_across_runs() {
    let a = extract();
    let b = extract();
    assert_eq!(a.content_hash, b.content_hash);
    assert_eq!(a.content_hash.len(), 64);
}

#[test]
fn test_word_count_counts_whitespace_runs() {
    let extracted = ContentExtractor::new()
        .extract(
            "<html><body><main>one  two\tthree\nfour five six seven eight nine ten \
             eleven twelve thirteen fourteen fifteen sixteen seventeen eighteen \
             nineteen twenty twentyone twentytwo twentythree</main></body></html>",
            "text/html",
            "https://e.com",
        )
        .unwrap();
    assert_eq!(extracted.word_count, extracted.content.split_whitespace().count());
}

#[test]
fn test_whole_body_fallback_when_no_container_is_substantial() {
    let extracted = ContentExtractor::new()
        .extract(
            "<html><body><div>short</div><p>also short</p></body></html>",
            "text/html",
            "https://e.com",
        )
        .unwrap();
    assert!(extracted.content.contains("short"));
    assert!(extracted.content.contains("also short"));
}
