use crate::checkpoint::CheckpointError;
use thiserror::Error;
use wikicrawl_scanner::FetchError;

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("checkpoint failed: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, CrawlError>;
