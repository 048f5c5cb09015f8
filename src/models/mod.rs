mod crawl_job;
mod crawled_page;
mod indexed_document;
mod url_record;

#[cfg(test)]
mod tests;

pub use crawl_job::{CrawlJob, JobStatus};
pub use crawled_page::CrawledPage;
pub use indexed_document::{document_id, DocumentLink, IndexedDocument};
pub use url_record::{UrlRecord, UrlStatus, MAX_ATTEMPTS};
