//! Record source abstraction for paginated collections
//!
//! A record source hands out one fixed-size page of records at a time together
//! with the size of the whole collection. The selection controller only ever
//! talks to this trait; where the records actually come from is the source's
//! business.
//!
//! # Architecture
//!
//! ```text
//! RecordSource trait
//! ├── ArticSource (artworks HTTP API via reqwest)
//! └── InMemorySource (generated collection for demo mode and tests)
//! ```

mod artic;
mod memory;

pub use artic::ArticSource;
pub use memory::InMemorySource;

use crate::config::Config;
use futures::future::BoxFuture;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Stable, comparable record identifier
pub type RecordId = u64;

/// A single row of the collection
///
/// Only `id` matters for selection; the remaining fields are display data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub id: RecordId,
    pub title: String,
    pub place_of_origin: String,
    pub artist_display: String,
    pub inscriptions: String,
    pub date_start: i64,
    pub date_end: i64,
}

/// One fetched page
#[derive(Debug, Clone, Default)]
pub struct RecordPage {
    /// Records in the order the source returned them
    pub records: Vec<Record>,
    /// Total records in the collection, as reported (may be approximate or capped)
    pub total_count: u64,
}

/// Errors a record source can report
///
/// All of them mean the page is unavailable; the variants only exist so the
/// message shown to the user is specific.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Transport failure (DNS, connect, timeout, ...)
    Network(String),
    /// Upstream answered with a non-success status
    Api { status: u16, message: String },
    /// Response body could not be decoded
    Malformed(String),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::Api { status, message } => {
                if message.is_empty() {
                    write!(f, "API error ({})", status)
                } else {
                    write!(f, "API error ({}): {}", status, message)
                }
            }
            Self::Malformed(msg) => write!(f, "Malformed response: {}", msg),
        }
    }
}

impl std::error::Error for SourceError {}

/// Paginated record provider
///
/// Pages are 1-based. A page past the end of the collection is not an error;
/// it simply comes back with no records.
pub trait RecordSource: Send + Sync {
    /// Short name for logs and the title bar
    fn name(&self) -> &'static str;

    /// Fixed number of records per page
    fn page_size(&self) -> u32;

    /// Fetch one page
    fn fetch_page(&self, page: u32) -> BoxFuture<'_, Result<RecordPage, SourceError>>;
}

/// Create the record source described by the configuration
pub fn create_source(config: &Config) -> anyhow::Result<Arc<dyn RecordSource>> {
    if config.demo_mode {
        tracing::info!("Demo mode: using generated in-memory collection");
        return Ok(Arc::new(InMemorySource::demo(config.page_size)));
    }

    let source = ArticSource::new(
        &config.api_url,
        config.page_size,
        config.record_ceiling,
        config.request_timeout,
    )?;
    Ok(Arc::new(source))
}
