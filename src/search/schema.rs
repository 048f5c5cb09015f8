use std::path::Path;
use tantivy::schema::*;
use tantivy::Index;

/// Field handles for the document index
#[derive(Debug, Clone)]
pub struct SearchSchema {
    pub schema: Schema,
    pub id_field: Field,
    pub url_field: Field,
    pub title_field: Field,
    pub description_field: Field,
    pub content_field: Field,
    pub keywords_field: Field,
    pub domain_field: Field,
    pub crawl_date_field: Field,
    pub last_modified_field: Field,
    pub content_type_field: Field,
    pub language_field: Field,
    pub word_count_field: Field,
    pub content_hash_field: Field,
    pub links_field: Field,
    pub metadata_field: Field,
}

impl SearchSchema {
    pub fn build() -> Self {
        let mut schema_builder = Schema::builder();

        // Deterministic document id; raw so delete_term matches exactly
        let id_field = schema_builder.add_text_field("id", STRING | STORED);

        let url_field = schema_builder.add_text_field("url", STRING | STORED);
        let title_field = schema_builder.add_text_field("title", TEXT | STORED);
        let description_field = schema_builder.add_text_field("description", TEXT | STORED);
        let content_field = schema_builder.add_text_field("content", TEXT | STORED);
        let keywords_field = schema_builder.add_text_field("keywords", TEXT | STORED);

        // Host kept raw for exact filtering
        let domain_field = schema_builder.add_text_field("domain", STRING | STORED);

        let crawl_date_field = schema_builder.add_i64_field("crawl_date", FAST | STORED);
        let last_modified_field = schema_builder.add_i64_field("last_modified", STORED);
        let content_type_field = schema_builder.add_text_field("content_type", STRING | STORED);
        let language_field = schema_builder.add_text_field("language", STRING | STORED);
        let word_count_field = schema_builder.add_u64_field("word_count", FAST | STORED);
        let content_hash_field = schema_builder.add_text_field("content_hash", STRING | STORED);

        // Stored only; serialized JSON payloads
        let links_field = schema_builder.add_text_field("links", STORED);
        let metadata_field = schema_builder.add_text_field("metadata", STORED);

        let schema = schema_builder.build();

        Self {
            schema,
            id_field,
            url_field,
            title_field,
            description_field,
            content_field,
            keywords_field,
            domain_field,
            crawl_date_field,
            last_modified_field,
            content_type_field,
            language_field,
            word_count_field,
            content_hash_field,
            links_field,
            metadata_field,
        }
    }

    pub fn create_index(index_path: &Path) -> tantivy::Result<Index> {
        let search_schema = Self::build();

        if !index_path.exists() {
            std::fs::create_dir_all(index_path)?;
        }

        Index::create_in_dir(index_path, search_schema.schema)
    }

    pub fn open_or_create(index_path: &Path) -> tantivy::Result<Index> {
        if index_path.exists() && index_path.read_dir()?.next().is_some() {
            Index::open_in_dir(index_path)
        } else {
            Self::create_index(index_path)
        }
    }
}
