//! Configuration loading for crawler processes

pub mod crawler_config;
mod tests;

pub use crawler_config::{
    CrawlerConfig, CrawlerSettings, NetworkSettings, PolitenessSettings, StorageSettings,
};
