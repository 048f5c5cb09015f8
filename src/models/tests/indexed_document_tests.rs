use crate::models::document_id;

#[test]
fn test_document_id_is_sha256_hex_of_url() {
    let id = document_id("https://example.com");
    assert_eq!(id.len(), 64);
    assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(id, id.to_lowercase());
}

#[test]
fn test_document_id_is_deterministic() {
    assert_eq!(
        document_id("https://example.com/path"),
        document_id("https://example.com/path")
    );
}

#[test]
fn test_distinct_urls_get_distinct_ids() {
    assert_ne!(
        document_id("https://example.com/a"),
        document_id("https://example.com/b")
    );
}
