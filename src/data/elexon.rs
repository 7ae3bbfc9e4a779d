//! Elexon BMRS Insights API integration.

use std::time::Duration;

use log::{debug, info, warn};
use reqwest::blocking::{Client, ClientBuilder, Request};

use crate::data::strategies::{self, ParseFn};
use crate::domain::{Dataset, DateRange, SettlementRecord};
use crate::error::{AppError, EXIT_INPUT, EXIT_RESOURCE, FetchError};

pub const DEFAULT_BASE_URL: &str = "https://data.elexon.co.uk/bmrs/api/v1/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

const BASIC_AUTH_USER: &str = "apikey";
const BODY_SNIPPET_CHARS: usize = 200;

/// Static description of one dataset's endpoint.
#[derive(Debug, Clone, Copy)]
pub struct EndpointDescriptor {
    pub dataset: Dataset,
    /// Path relative to the API base URL.
    pub path: &'static str,
    pub from_param: &'static str,
    pub to_param: &'static str,
    pub table: &'static str,
    pub parse: ParseFn,
}

const ENDPOINTS: [EndpointDescriptor; 3] = [
    EndpointDescriptor {
        dataset: Dataset::Temperature,
        path: "temperature",
        from_param: "from",
        to_param: "to",
        table: "temperature",
        parse: strategies::parse_temperature,
    },
    EndpointDescriptor {
        dataset: Dataset::Generation,
        path: "generation/actual/per-type",
        from_param: "from",
        to_param: "to",
        table: "generation",
        parse: strategies::parse_generation,
    },
    EndpointDescriptor {
        dataset: Dataset::Demand,
        path: "demand/outturn",
        from_param: "settlementDateFrom",
        to_param: "settlementDateTo",
        table: "demand",
        parse: strategies::parse_demand,
    },
];

impl Dataset {
    pub fn endpoint(self) -> &'static EndpointDescriptor {
        match self {
            Dataset::Temperature => &ENDPOINTS[0],
            Dataset::Generation => &ENDPOINTS[1],
            Dataset::Demand => &ENDPOINTS[2],
        }
    }
}

/// Anything that can produce records for a dataset and date range.
pub trait DatasetSource {
    fn fetch(&self, dataset: Dataset, range: &DateRange) -> Result<Fetched, FetchError>;
}

/// Records returned for one dataset, already restricted to the requested range.
#[derive(Debug, Clone, Default)]
pub struct Fetched {
    pub records: Vec<SettlementRecord>,
    /// Rows the API returned that fell outside the requested range.
    pub dropped: usize,
}

impl Fetched {
    /// Keep only records whose effective date lies in `range`, preserving order.
    pub fn within(records: Vec<SettlementRecord>, range: &DateRange) -> Self {
        let total = records.len();
        let records: Vec<_> = records
            .into_iter()
            .filter(|r| range.contains(r.effective_date()))
            .collect();
        Self {
            dropped: total - records.len(),
            records,
        }
    }
}

pub struct ElexonClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ElexonClient {
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        Self::with_builder(api_key, base_url, Client::builder().timeout(timeout))
    }

    fn with_builder(
        api_key: &str,
        base_url: &str,
        builder: ClientBuilder,
    ) -> Result<Self, AppError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(AppError::new(EXIT_INPUT, "API key must not be empty."));
        }

        let mut base_url = base_url.trim().to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        let client = builder.build().map_err(|e| {
            AppError::new(EXIT_RESOURCE, format!("Failed to build HTTP client: {e}"))
        })?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the GET request for `dataset` without sending it.
    pub fn build_request(
        &self,
        dataset: Dataset,
        range: &DateRange,
    ) -> Result<Request, FetchError> {
        let endpoint = dataset.endpoint();
        let url = format!("{}{}", self.base_url, endpoint.path);
        let from = range.from.to_string();
        let to = range.to.to_string();

        self.client
            .get(&url)
            .query(&[
                (endpoint.from_param, from.as_str()),
                (endpoint.to_param, to.as_str()),
                ("format", "json"),
            ])
            .basic_auth(BASIC_AUTH_USER, Some(&self.api_key))
            .build()
            .map_err(|e| FetchError::Network {
                url,
                message: e.to_string(),
            })
    }
}

impl DatasetSource for ElexonClient {
    fn fetch(&self, dataset: Dataset, range: &DateRange) -> Result<Fetched, FetchError> {
        let request = self.build_request(dataset, range)?;
        let url = request.url().to_string();
        // The key travels in the Authorization header, so the URL is safe to log.
        debug!("GET {url}");

        let resp = self.client.execute(request).map_err(|e| FetchError::Network {
            url: url.clone(),
            message: e.to_string(),
        })?;

        let status = resp.status();
        let body = resp.text().map_err(|e| FetchError::Network {
            url: url.clone(),
            message: format!("failed to read response body: {e}"),
        })?;

        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
                body: snippet(&body),
            });
        }

        let records = (dataset.endpoint().parse)(&body)
            .map_err(|message| FetchError::Malformed { url: url.clone(), message })?;

        let fetched = Fetched::within(records, range);
        if fetched.dropped > 0 {
            warn!(
                "{dataset}: dropped {} record(s) outside {}..={}",
                fetched.dropped, range.from, range.to
            );
        }
        info!("{dataset}: fetched {} record(s)", fetched.records.len());
        Ok(fetched)
    }
}

fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= BODY_SNIPPET_CHARS {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(BODY_SNIPPET_CHARS).collect();
    out.push('…');
    out
}
