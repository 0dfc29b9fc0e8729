// In-memory record source
//
// Generates a deterministic collection of artworks. Used by demo mode
// (PAGESEL_DEMO=1 or --demo) and by the controller tests, which rely on the
// fetch log to check how many pages were requested and in which order.

use super::{Record, RecordId, RecordPage, RecordSource, SourceError};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

const TITLES: &[&str] = &[
    "Still Life with Pears",
    "Evening on the River",
    "Portrait of a Young Woman",
    "The Harvest",
    "Mountain Pass in Snow",
    "Study for a Fountain",
    "Untitled (Blue)",
    "Market Day",
];

const PLACES: &[&str] = &["France", "Japan", "United States", "Italy", "Netherlands"];

const ARTISTS: &[&str] = &[
    "Claude Monet\nFrench, 1840-1926",
    "Katsushika Hokusai\nJapanese, 1760-1849",
    "Mary Cassatt\nAmerican, 1844-1926",
    "Unknown",
];

/// Generated, fixed-size collection
pub struct InMemorySource {
    records: Vec<Record>,
    page_size: u32,
    /// Total to report instead of the real collection size
    reported_total: Option<u64>,
    /// Pages that fail with a network error
    failing_pages: HashSet<u32>,
    latency: Duration,
    /// Every requested page number, in request order
    fetch_log: Mutex<Vec<u32>>,
}

impl InMemorySource {
    /// Collection of `total` records with ids `1..=total`
    pub fn new(total: u64, page_size: u32) -> Self {
        let records = (1..=total).map(generate_record).collect();
        Self {
            records,
            page_size,
            reported_total: None,
            failing_pages: HashSet::new(),
            latency: Duration::ZERO,
            fetch_log: Mutex::new(Vec::new()),
        }
    }

    /// Source used by demo mode: a few hundred records and a visible fetch delay
    pub fn demo(page_size: u32) -> Self {
        Self::new(240, page_size).with_latency(Duration::from_millis(250))
    }

    #[allow(dead_code)] // Test fixtures
    /// Report `total` as the collection size regardless of the generated records
    pub fn with_reported_total(mut self, total: u64) -> Self {
        self.reported_total = Some(total);
        self
    }

    #[allow(dead_code)] // Test fixtures
    /// Make every fetch of `page` fail
    pub fn failing_on(mut self, page: u32) -> Self {
        self.failing_pages.insert(page);
        self
    }

    /// Delay every fetch by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    #[allow(dead_code)] // Test fixtures
    /// Pages requested so far, in order
    pub fn fetch_log(&self) -> Vec<u32> {
        self.fetch_log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[allow(dead_code)] // Test fixtures
    /// Number of fetches issued so far
    pub fn fetch_count(&self) -> usize {
        self.fetch_log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[allow(dead_code)] // Test fixtures
    /// Ids of `page` in source order (convenience for assertions)
    pub fn ids_on_page(&self, page: u32) -> Vec<RecordId> {
        self.slice(page).iter().map(|r| r.id).collect()
    }

    fn slice(&self, page: u32) -> &[Record] {
        if page == 0 {
            return &[];
        }
        let size = self.page_size as usize;
        let start = (page as usize - 1).saturating_mul(size);
        if start >= self.records.len() {
            return &[];
        }
        let end = (start + size).min(self.records.len());
        &self.records[start..end]
    }

    async fn serve(&self, page: u32) -> Result<RecordPage, SourceError> {
        self.fetch_log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(page);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if self.failing_pages.contains(&page) {
            return Err(SourceError::Network(format!(
                "simulated failure on page {}",
                page
            )));
        }

        Ok(RecordPage {
            records: self.slice(page).to_vec(),
            total_count: self
                .reported_total
                .unwrap_or(self.records.len() as u64),
        })
    }
}

impl RecordSource for InMemorySource {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn page_size(&self) -> u32 {
        self.page_size
    }

    fn fetch_page(&self, page: u32) -> BoxFuture<'_, Result<RecordPage, SourceError>> {
        self.serve(page).boxed()
    }
}

fn generate_record(id: u64) -> Record {
    let i = id as usize;
    let start = 1500 + (id as i64 * 37) % 500;
    Record {
        id,
        title: format!("{} No. {}", TITLES[i % TITLES.len()], id),
        place_of_origin: PLACES[i % PLACES.len()].to_string(),
        artist_display: ARTISTS[i % ARTISTS.len()].to_string(),
        inscriptions: if id % 3 == 0 {
            format!("signed lower right: {}", id)
        } else {
            String::new()
        },
        date_start: start,
        date_end: start + (id as i64 % 4),
    }
}
