use crate::extractor::{clean_text, content_hash, truncate_chars, ContentExtractor};

#[test]
fn test_plain_text_cleaning_and_counting() {
    let extracted = ContentExtractor::new()
        .extract("  hello\tworld\r\n  again  ", "text/plain", "https://e.com")
        .unwrap();

    assert_eq!(extracted.content, "hello world again");
    assert_eq!(extracted.word_count, 3);
    assert!(extracted.title.is_none());
    assert!(extracted.links.is_empty());
}

#[test]
fn test_plain_text_hash_matches_cleaned_text() {
    let extracted = ContentExtractor::new()
        .extract("a   b", "text/plain", "https://e.com")
        .unwrap();
    assert_eq!(extracted.content_hash, content_hash(&clean_text("a   b")));
}

#[test]
fn test_json_is_reserialized_pretty() {
    let extracted = ContentExtractor::new()
        .extract(r#"{"b":1,"a":[1,2]}"#, "application/json", "https://e.com")
        .unwrap();

    // Two-space indentation from the pretty printer
    assert!(extracted.content.contains("\n  \"a\""));
    assert!(extracted.word_count > 0);
}

#[test]
fn test_invalid_json_returns_none() {
    let result = ContentExtractor::new().extract("{not json", "application/json", "https://e.com");
    assert!(result.is_none());
}

#[test]
fn test_pdf_returns_empty_stub() {
    let extracted = ContentExtractor::new()
        .extract("%PDF-1.4 ...", "application/pdf", "https://e.com")
        .unwrap();
    assert!(extracted.content.is_empty());
    assert_eq!(extracted.word_count, 0);
}

#[test]
fn test_unknown_content_type_returns_none() {
    let result = ContentExtractor::new().extract("GIF89a", "image/gif", "https://e.com");
    assert!(result.is_none());
}

#[test]
fn test_content_type_parameters_are_ignored() {
    let extracted =
        ContentExtractor::new().extract("plain", "text/plain; charset=utf-8", "https://e.com");
    assert!(extracted.is_some());
}

#[test]
fn test_truncate_chars_respects_boundaries() {
    assert_eq!(truncate_chars("héllo", 2), "hé");
    assert_eq!(truncate_chars("abc", 10), "abc");
}
