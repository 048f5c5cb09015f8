//! Unit tests for domain models

#[cfg(test)]
mod indexed_document_tests;
#[cfg(test)]
mod url_record_tests;
