use super::schema::SearchSchema;
use super::{DocumentSink, Result};
use crate::models::IndexedDocument;
use async_trait::async_trait;
use std::path::Path;
use tantivy::{doc, Index, IndexWriter, TantivyDocument, Term};
use tokio::sync::Mutex;
use tracing::{debug, info};

const WRITER_HEAP_BYTES: usize = 50_000_000;

/// Tantivy-backed document sink.
///
/// Every submit deletes the previous version of the document (matched on
/// the deterministic id term) before adding, so retries and re-crawls
/// overwrite rather than duplicate.
pub struct TantivySink {
    index: Index,
    writer: Mutex<IndexWriter>,
    search_schema: SearchSchema,
}

impl TantivySink {
    pub fn new(index_path: &Path) -> Result<Self> {
        let index = SearchSchema::open_or_create(index_path)?;
        let writer = index.writer(WRITER_HEAP_BYTES)?;
        let search_schema = SearchSchema::build();

        Ok(Self {
            index,
            writer: Mutex::new(writer),
            search_schema,
        })
    }

    pub fn tantivy_index(&self) -> &Index {
        &self.index
    }

    fn to_document(&self, document: &IndexedDocument) -> Result<TantivyDocument> {
        let s = &self.search_schema;

        let mut doc = doc!(
            s.id_field => document.id.clone(),
            s.url_field => document.url.clone(),
            s.content_field => document.content.clone(),
            s.keywords_field => document.keywords.join(" "),
            s.domain_field => document.domain.clone(),
            s.crawl_date_field => document.crawl_date.timestamp(),
            s.content_type_field => document.content_type.clone(),
            s.language_field => document.language.clone(),
            s.word_count_field => document.word_count as u64,
            s.content_hash_field => document.content_hash.clone(),
            s.links_field => serde_json::to_string(&document.links)?,
            s.metadata_field => serde_json::to_string(&document.metadata)?,
        );

        if let Some(title) = &document.title {
            doc.add_text(s.title_field, title);
        }
        if let Some(description) = &document.description {
            doc.add_text(s.description_field, description);
        }
        if let Some(last_modified) = document.last_modified {
            doc.add_i64(s.last_modified_field, last_modified.timestamp());
        }

        Ok(doc)
    }

    fn submit(&self, writer: &IndexWriter, document: &IndexedDocument) -> Result<()> {
        let id_term = Term::from_field_text(self.search_schema.id_field, &document.id);
        writer.delete_term(id_term);
        writer.add_document(self.to_document(document)?)?;
        debug!("Indexed document {} ({})", document.id, document.url);
        Ok(())
    }
}

#[async_trait]
impl DocumentSink for TantivySink {
    async fn index(&self, document: IndexedDocument) -> Result<()> {
        let mut writer = self.writer.lock().await;
        self.submit(&writer, &document)?;
        writer.commit()?;
        Ok(())
    }

    async fn bulk_index(&self, documents: Vec<IndexedDocument>) -> Result<()> {
        if documents.is_empty() {
            return Ok(());
        }

        let count = documents.len();
        let mut writer = self.writer.lock().await;
        for document in &documents {
            self.submit(&writer, document)?;
        }
        writer.commit()?;

        info!("Bulk indexed {} documents", count);
        Ok(())
    }
}
