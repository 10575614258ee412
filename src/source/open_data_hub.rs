//! [`ParkingSource`] backed by the South Tyrol Open Data Hub mobility API.
//!
//! Both endpoints are paginated with `limit`/`offset`; pages are requested until one
//! comes back short.

use crate::config::collector_config::CollectorConfig;
use crate::source::error::TransportError;
use crate::source::parking_source::{ParkingSource, SourceBatch};
use crate::types::raw_record::RawRecord;
use bon::bon;
use chrono::{Days, NaiveDate, Utc};
use log::{debug, info, warn};
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://mobility.api.opendatahub.com/v2/flat/ParkingStation";
pub const DEFAULT_PAGE_LIMIT: usize = 200;
// Guards against a server that keeps returning full pages.
const MAX_PAGES: usize = 500;

#[derive(Debug, Clone)]
pub struct OpenDataHubClient {
    client: Client,
    api_base: String,
    origins: Vec<String>,
    page_limit: usize,
    page_delay: Duration,
}

#[bon]
impl OpenDataHubClient {
    /// Creates a client.
    ///
    /// `request_timeout` bounds every HTTP request so that a stalled connection surfaces
    /// as a [`TransportError::Network`] instead of hanging the poll loop.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ClientBuild`] if the TLS backend cannot be initialised.
    #[builder]
    pub fn new(
        request_timeout: Duration,
        api_base: Option<String>,
        origins: Option<Vec<String>>,
        page_limit: Option<usize>,
        page_delay: Option<Duration>,
        user_agent: Option<String>,
    ) -> Result<Self, TransportError> {
        let user_agent = user_agent
            .unwrap_or_else(|| format!("parking-collector/{}", env!("CARGO_PKG_VERSION")));
        let client = Client::builder()
            .timeout(request_timeout)
            .user_agent(user_agent)
            .gzip(true)
            .build()
            .map_err(TransportError::ClientBuild)?;

        Ok(Self {
            client,
            api_base: api_base
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            origins: origins.unwrap_or_else(|| vec!["GARDENA".to_string(), "skidata".to_string()]),
            page_limit: page_limit.unwrap_or(DEFAULT_PAGE_LIMIT).max(1),
            page_delay: page_delay.unwrap_or(Duration::from_millis(100)),
        })
    }

    pub fn from_config(config: &CollectorConfig) -> Result<Self, TransportError> {
        Self::builder()
            .request_timeout(config.request_timeout())
            .api_base(config.api_base.clone())
            .origins(config.origins.clone())
            .page_limit(config.page_limit)
            .page_delay(config.page_delay())
            .user_agent(config.user_agent.clone())
            .build()
    }

    pub(crate) fn latest_url(&self) -> String {
        format!("{}/*/latest", self.api_base)
    }

    /// The API treats the upper date as exclusive, so the day after `end` is sent.
    pub(crate) fn range_url(&self, start: NaiveDate, end: NaiveDate) -> String {
        let end_exclusive = end.checked_add_days(Days::new(1)).unwrap_or(end);
        format!(
            "{}/free/{}/{}",
            self.api_base,
            start.format("%Y-%m-%d"),
            end_exclusive.format("%Y-%m-%d")
        )
    }

    pub(crate) fn page_query(&self, offset: usize, distinct: bool) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("limit", self.page_limit.to_string()),
            ("offset", offset.to_string()),
            ("shownull", "false".to_string()),
        ];
        if !self.origins.is_empty() {
            query.push(("where", format!("sorigin.in.({})", self.origins.join(","))));
        }
        if distinct {
            query.push(("distinct", "true".to_string()));
        }
        query
    }

    async fn fetch_all_pages(
        &self,
        url: &str,
        distinct: bool,
    ) -> Result<Vec<RawRecord>, TransportError> {
        paginate(self.page_limit, self.page_delay, MAX_PAGES, url, move |offset| {
            self.fetch_page(url, offset, distinct)
        })
        .await
    }

    async fn fetch_page(
        &self,
        url: &str,
        offset: usize,
        distinct: bool,
    ) -> Result<Vec<RawRecord>, TransportError> {
        let response = self
            .client
            .get(url)
            .query(&self.page_query(offset, distinct))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| TransportError::Network(url.to_string(), e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("HTTP error for {}: {}", url, status);
            return Err(TransportError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Network(url.to_string(), e))?;
        parse_page(url, &body)
    }
}

impl ParkingSource for OpenDataHubClient {
    async fn fetch_latest(&self) -> Result<SourceBatch, TransportError> {
        let url = self.latest_url();
        let records = self.fetch_all_pages(&url, true).await?;
        info!("Retrieved {} latest station records", records.len());
        Ok(SourceBatch::new(Utc::now(), records))
    }

    async fn fetch_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<SourceBatch, TransportError> {
        if start > end {
            return Err(TransportError::InvalidRange { start, end });
        }
        let url = self.range_url(start, end);
        let records = self.fetch_all_pages(&url, false).await?;
        info!(
            "Retrieved {} historical records for {} to {}",
            records.len(),
            start,
            end
        );
        Ok(SourceBatch::new(Utc::now(), records))
    }
}

/// Requests pages at `offset = 0, limit, 2 * limit, ...` until one holds fewer than
/// `page_limit` records, or `max_pages` pages have been read.
pub(crate) async fn paginate<F, Fut>(
    page_limit: usize,
    page_delay: Duration,
    max_pages: usize,
    url: &str,
    mut fetch_page: F,
) -> Result<Vec<RawRecord>, TransportError>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<Vec<RawRecord>, TransportError>>,
{
    let mut records = Vec::new();
    let mut offset = 0;

    for page in 0..max_pages {
        if page > 0 && !page_delay.is_zero() {
            tokio::time::sleep(page_delay).await;
        }
        let page_records = fetch_page(offset).await?;
        let page_len = page_records.len();
        debug!("Page {} of {} returned {} records", page + 1, url, page_len);
        records.extend(page_records);

        if page_len < page_limit {
            return Ok(records);
        }
        offset += page_limit;
    }

    warn!(
        "Stopped paging {} after {} pages; results may be incomplete",
        url, max_pages
    );
    Ok(records)
}

/// Extracts the `data` array of a flat API response.
pub(crate) fn parse_page(url: &str, body: &str) -> Result<Vec<RawRecord>, TransportError> {
    let malformed = |message: String| TransportError::MalformedBody {
        url: url.to_string(),
        message,
    };

    let mut document: Value = serde_json::from_str(body).map_err(|e| malformed(e.to_string()))?;
    match document.get_mut("data").map(Value::take) {
        Some(Value::Array(items)) => Ok(items.into_iter().map(RawRecord::new).collect()),
        Some(other) => Err(malformed(format!(
            "expected 'data' to be an array, found {}",
            json_type_name(&other)
        ))),
        None => Err(malformed("missing 'data' field".to_string())),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
