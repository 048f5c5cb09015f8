use super::schema::SearchSchema;
use super::Result;
use serde::{Deserialize, Serialize};
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::Value;
use tantivy::{Index, IndexReader, ReloadPolicy, TantivyDocument};
use tracing::info;

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchHit {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub domain: String,
    pub score: f32,
    pub word_count: u64,
}

pub struct SearchQuery {
    index: Index,
    reader: IndexReader,
    search_schema: SearchSchema,
}

impl SearchQuery {
    pub fn for_index(index: Index) -> Result<Self> {
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()?;

        Ok(Self {
            index,
            reader,
            search_schema: SearchSchema::build(),
        })
    }

    pub fn open(index_path: &std::path::Path) -> Result<Self> {
        let index = Index::open_in_dir(index_path)?;
        Self::for_index(index)
    }

    /// Full-text search over titles, content, descriptions and keywords
    pub fn search(&self, query_str: &str, limit: usize) -> Result<Vec<SearchHit>> {
        self.search_in_domain(query_str, None, limit)
    }

    /// Search restricted to a single host when `domain` is given
    pub fn search_in_domain(
        &self,
        query_str: &str,
        domain: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SearchHit>> {
        let searcher = self.reader.searcher();

        let query_parser = QueryParser::for_index(
            &self.index,
            vec![
                self.search_schema.title_field,
                self.search_schema.content_field,
                self.search_schema.description_field,
                self.search_schema.keywords_field,
            ],
        );
        let query = query_parser.parse_query(query_str)?;

        // Over-fetch when a domain filter will drop results
        let fetch_limit = if domain.is_some() { limit * 10 } else { limit };
        let top_docs = searcher.search(&query, &TopDocs::with_limit(fetch_limit.max(1)))?;

        let mut hits = Vec::new();
        for (score, doc_address) in top_docs {
            let retrieved: TantivyDocument = searcher.doc(doc_address)?;

            let field_text = |field| {
                retrieved
                    .get_first(field)
                    .and_then(|v| v.as_str())
                    .map(String::from)
            };

            let hit_domain = field_text(self.search_schema.domain_field).unwrap_or_default();
            if let Some(wanted) = domain {
                if hit_domain != wanted {
                    continue;
                }
            }

            hits.push(SearchHit {
                url: field_text(self.search_schema.url_field).unwrap_or_default(),
                title: field_text(self.search_schema.title_field),
                description: field_text(self.search_schema.description_field),
                domain: hit_domain,
                score,
                word_count: retrieved
                    .get_first(self.search_schema.word_count_field)
                    .and_then(|v| v.as_u64())
                    .unwrap_or(0),
            });

            if hits.len() >= limit {
                break;
            }
        }

        info!("Found {} results for query: '{}'", hits.len(), query_str);
        Ok(hits)
    }
}
