//! Unit tests for the tantivy sink and query path

#[cfg(test)]
mod indexer_tests;
