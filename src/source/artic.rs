// Art Institute of Chicago artworks API
//
// GET {api_url}?page=N&limit=SIZE&fields=... returns
// { "pagination": { "total": ... }, "data": [ { "id": ..., ... } ] }

use super::{Record, RecordPage, RecordSource, SourceError};
use anyhow::Context;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Deserialize;
use std::time::Duration;

/// Fields requested from the API (keeps responses small)
const FIELDS: &str = "id,title,place_of_origin,artist_display,inscriptions,date_start,date_end";

/// Record source backed by the public artworks API
pub struct ArticSource {
    client: reqwest::Client,
    api_url: String,
    page_size: u32,
    /// Upper bound applied to the reported total (the API refuses deep pages)
    record_ceiling: Option<u64>,
}

impl ArticSource {
    pub fn new(
        api_url: &str,
        page_size: u32,
        record_ceiling: Option<u64>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pagesel/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_url: api_url.to_string(),
            page_size,
            record_ceiling,
        })
    }

    async fn request_page(&self, page: u32) -> Result<RecordPage, SourceError> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("page", page.to_string()),
                ("limit", self.page_size.to_string()),
                ("fields", FIELDS.to_string()),
            ])
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to read response: {}", e)))?;

        decode_response(status.as_u16(), &body, self.record_ceiling)
    }
}

/// Turn a status code and response body into a page or a source error
fn decode_response(
    status: u16,
    body: &str,
    record_ceiling: Option<u64>,
) -> Result<RecordPage, SourceError> {
    if !(200..300).contains(&status) {
        return Err(SourceError::Api {
            status,
            message: truncate_message(body),
        });
    }

    let parsed: ArtworksResponse =
        serde_json::from_str(body).map_err(|e| SourceError::Malformed(e.to_string()))?;
    Ok(parsed.into_page(record_ceiling))
}

impl RecordSource for ArticSource {
    fn name(&self) -> &'static str {
        "artic"
    }

    fn page_size(&self) -> u32 {
        self.page_size
    }

    fn fetch_page(&self, page: u32) -> BoxFuture<'_, Result<RecordPage, SourceError>> {
        self.request_page(page).boxed()
    }
}

/// Keep upstream error bodies short enough for a toast
fn truncate_message(body: &str) -> String {
    const MAX: usize = 200;
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}…", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire format
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ArtworksResponse {
    #[serde(default)]
    pagination: Option<Pagination>,
    data: Vec<Artwork>,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    total: u64,
}

#[derive(Debug, Deserialize)]
struct Artwork {
    id: u64,
    title: Option<String>,
    place_of_origin: Option<String>,
    artist_display: Option<String>,
    inscriptions: Option<String>,
    date_start: Option<i64>,
    date_end: Option<i64>,
}

impl ArtworksResponse {
    fn into_page(self, record_ceiling: Option<u64>) -> RecordPage {
        let reported = self
            .pagination
            .map(|p| p.total)
            .unwrap_or(self.data.len() as u64);
        let total_count = match record_ceiling {
            Some(ceiling) => reported.min(ceiling),
            None => reported,
        };

        RecordPage {
            records: self.data.into_iter().map(Record::from).collect(),
            total_count,
        }
    }
}

impl From<Artwork> for Record {
    fn from(art: Artwork) -> Self {
        Record {
            id: art.id,
            title: art.title.unwrap_or_default(),
            place_of_origin: non_empty_or(art.place_of_origin, "Unknown"),
            artist_display: non_empty_or(art.artist_display, "Unknown"),
            inscriptions: art.inscriptions.unwrap_or_default(),
            date_start: art.date_start.unwrap_or(0),
            date_end: art.date_end.unwrap_or(0),
        }
    }
}

fn non_empty_or(value: Option<String>, fallback: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => fallback.to_string(),
    }
}
