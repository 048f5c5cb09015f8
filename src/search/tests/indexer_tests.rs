use crate::models::{document_id, DocumentLink, IndexedDocument};
use crate::search::{DocumentSink, SearchQuery, TantivySink};
use chrono::Utc;
use std::collections::HashMap;

fn sample_document(url: &str, content: &str) -> IndexedDocument {
    IndexedDocument {
        id: document_id(url),
        url: url.to_string(),
        title: Some("Sample Title".to_string()),
        description: Some("A sample description".to_string()),
        content: content.to_string(),
        keywords: vec!["sample".to_string(), "testing".to_string()],
        domain: "example.com".to_string(),
        crawl_date: Utc::now(),
        last_modified: None,
        content_type: "text/html".to_string(),
        language: "en".to_string(),
        word_count: content.split_whitespace().count(),
        content_hash: "0".repeat(64),
        links: vec![DocumentLink {
            url: "https://example.com/next".to_string(),
            text: "next".to_string(),
            title: None,
        }],
        metadata: HashMap::new(),
    }
}

#[tokio::test]
async fn test_indexed_document_is_searchable() {
    let dir = tempfile::tempdir().unwrap();
    let sink = TantivySink::new(dir.path()).unwrap();

    sink.index(sample_document(
        "https://example.com/page",
        "rust makes systems programming approachable",
    ))
    .await
    .unwrap();

    let query = SearchQuery::for_index(sink.tantivy_index().clone()).unwrap();
    let hits = query.search("systems programming", 10).unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].url, "https://example.com/page");
    assert_eq!(hits[0].title.as_deref(), Some("Sample Title"));
    assert_eq!(hits[0].domain, "example.com");
}

#[tokio::test]
async fn test_reindexing_same_url_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let sink = TantivySink::new(dir.path()).unwrap();

    let url = "https://example.com/evolving";
    sink.index(sample_document(url, "first version of the page"))
        .await
        .unwrap();
    sink.index(sample_document(url, "second version of the page"))
        .await
        .unwrap();

    let query = SearchQuery::for_index(sink.tantivy_index().clone()).unwrap();
    let hits = query.search("version", 10).unwrap();

    // One document, not two: the id term is deterministic per URL
    assert_eq!(hits.len(), 1);
}

#[tokio::test]
async fn test_bulk_index_commits_everything() {
    let dir = tempfile::tempdir().unwrap();
    let sink = TantivySink::new(dir.path()).unwrap();

    let documents = (0..5)
        .map(|i| {
            sample_document(
                &format!("https://example.com/bulk/{}", i),
                "bulk indexed corpus entry",
            )
        })
        .collect();
    sink.bulk_index(documents).await.unwrap();

    let query = SearchQuery::for_index(sink.tantivy_index().clone()).unwrap();
    let hits = query.search("corpus", 10).unwrap();
    assert_eq!(hits.len(), 5);
}

#[tokio::test]
async fn test_domain_filter_excludes_other_hosts() {
    let dir = tempfile::tempdir().unwrap();
    let sink = TantivySink::new(dir.path()).unwrap();

    let mut other = sample_document("https://other.org/page", "shared token content");
    other.domain = "other.org".to_string();
    sink.index(other).await.unwrap();
    sink.index(sample_document(
        "https://example.com/page",
        "shared token content",
    ))
    .await
    .unwrap();

    let query = SearchQuery::for_index(sink.tantivy_index().clone()).unwrap();
    let hits = query
        .search_in_domain("shared token", Some("example.com"), 10)
        .unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].domain, "example.com");
}
