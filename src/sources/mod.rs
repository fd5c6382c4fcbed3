mod fetch_error;
mod http;
mod page_scrape;
mod paginate;
mod realtor;
mod retry;
mod url_search;
mod zpid;

pub use fetch_error::FetchError;
pub use page_scrape::PageScrapeSource;
pub use paginate::Paginator;
pub use realtor::RealtorSource;
pub use retry::{Backoff, RetryPolicy};
pub use url_search::UrlSearchSource;
pub use zpid::ZpidSource;

use crate::config::{AppConfig, SourceKind};
use crate::domain::FieldMap;
use crate::errors::ConfigError;
use serde_json::Value;

/// One backend record, schema unknown until normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct RawListing(Value);

impl RawListing {
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        self.0.pointer(pointer)
    }
}

impl From<Value> for RawListing {
    fn from(value: Value) -> Self {
        RawListing(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: usize,
    pub limit: usize,
}

impl PageRequest {
    /// 1-based page number for backends that page by number.
    pub fn page_number(&self) -> usize {
        self.offset / self.limit.max(1) + 1
    }
}

/// A backend that yields listings one page at a time.
pub trait ListingSource {
    fn name(&self) -> &str;

    /// Fetches a single page. Errors are retried by the caller.
    fn fetch_page(&self, page: PageRequest) -> Result<Vec<RawListing>, FetchError>;

    /// Where this backend keeps each canonical field.
    fn field_map(&self) -> &FieldMap;

    /// Page size actually served for a requested size. Backends with a
    /// fixed page length override this so end-of-results detection works.
    fn page_size(&self, requested: usize) -> usize {
        requested
    }

    /// Extra per-listing check run after all pages are fetched.
    fn qualifies(&self, _raw: &RawListing) -> bool {
        true
    }
}

/// Builds the backend selected in config. Missing credentials or inputs
/// fail here, before any request is made.
pub fn build_source(config: &AppConfig) -> Result<Box<dyn ListingSource>, ConfigError> {
    let settings = &config.source;
    let host = config
        .api
        .host
        .clone()
        .unwrap_or_else(|| settings.kind.default_host().to_string());
    let api_key = || config.api.key.clone().ok_or(ConfigError::Missing("RAPIDAPI_KEY"));
    let client_error = |e: FetchError| ConfigError::Invalid {
        key: "LISTING_SOURCE".to_string(),
        value: format!("{:?}", settings.kind),
        reason: e.to_string(),
    };

    let source: Box<dyn ListingSource> = match settings.kind {
        SourceKind::Realtor => Box::new(
            RealtorSource::new(
                &api_key()?,
                &host,
                config.filters.clone(),
                config.api.results_path.clone(),
                settings
                    .require_central_ac
                    .then(|| config.fetch.retry.clone()),
            )
            .map_err(client_error)?,
        ),
        SourceKind::UrlSearch => {
            let search_url = settings
                .search_url
                .clone()
                .ok_or(ConfigError::Missing("SEARCH_URL"))?;
            Box::new(
                UrlSearchSource::new(&api_key()?, &host, search_url, config.api.results_path.clone())
                    .map_err(client_error)?,
            )
        }
        SourceKind::Zpid => {
            if settings.zpids.is_empty() {
                return Err(ConfigError::Missing("ZPIDS"));
            }
            Box::new(
                ZpidSource::new(
                    &api_key()?,
                    &host,
                    settings.zpids.clone(),
                    config.fetch.retry.clone(),
                )
                .map_err(client_error)?,
            )
        }
        SourceKind::Scrape => Box::new(
            PageScrapeSource::new(
                &settings.location,
                &config.filters,
                settings.zenrows_key.clone(),
            )
            .map_err(client_error)?,
        ),
    };

    Ok(source)
}
