// storage module for the metadata store

pub mod database;
pub mod jobs;
pub mod pages;
mod tests;

pub use database::{Database, DatabasePool};
pub use jobs::JobRepository;
pub use pages::PageRepository;

// storage errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;
