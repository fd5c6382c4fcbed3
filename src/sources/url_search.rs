// sources/url_search.rs
//
// Replays a saved zillow.com search URL through the Zillow API on RapidAPI.

use crate::domain::{CanonicalField, FieldMap};
use crate::sources::http::{build_client, get_json, rapidapi_headers, results_at};
use crate::sources::{FetchError, ListingSource, PageRequest, RawListing};
use reqwest::blocking::Client;
use reqwest::header::HeaderMap;
use url::Url;

const DEFAULT_RESULTS_PATH: &str = "/props";
pub(crate) const ZILLOW_ORIGIN: &str = "https://www.zillow.com";

// searchByUrl always answers with pages of this length.
const SERVED_PAGE_SIZE: usize = 41;

pub struct UrlSearchSource {
    client: Client,
    headers: HeaderMap,
    base_url: String,
    search_url: String,
    results_path: String,
    field_map: FieldMap,
}

impl UrlSearchSource {
    pub fn new(
        api_key: &str,
        host: &str,
        search_url: String,
        results_path: Option<String>,
    ) -> Result<Self, FetchError> {
        Url::parse(&search_url)
            .map_err(|e| FetchError::Config(format!("SEARCH_URL is not a URL: {e}")))?;

        Ok(Self {
            client: build_client()?,
            headers: rapidapi_headers(api_key, host)?,
            base_url: format!("https://{host}"),
            search_url,
            results_path: results_path.unwrap_or_else(|| DEFAULT_RESULTS_PATH.to_string()),
            field_map: zillow_search_field_map(),
        })
    }
}

impl ListingSource for UrlSearchSource {
    fn name(&self) -> &str {
        "zillow url search"
    }

    fn fetch_page(&self, page: PageRequest) -> Result<Vec<RawListing>, FetchError> {
        let body = get_json(
            &self.client,
            &format!("{}/searchByUrl", self.base_url),
            &self.headers,
            &[
                ("url", self.search_url.clone()),
                ("page", page.page_number().to_string()),
            ],
        )?;
        results_at(&body, &self.results_path)
    }

    fn field_map(&self) -> &FieldMap {
        &self.field_map
    }

    fn page_size(&self, _requested: usize) -> usize {
        SERVED_PAGE_SIZE
    }
}

// Search results carry the address as one line; city/state/zip only
// appear when the API splits them out.
fn zillow_search_field_map() -> FieldMap {
    let map = FieldMap::new()
        .map(CanonicalField::Address, &["/streetAddress", "/address"])
        .map(CanonicalField::City, &["/city"])
        .map(CanonicalField::State, &["/state"])
        .map(CanonicalField::PostalCode, &["/zipcode"])
        .map(CanonicalField::Price, &["/price", "/unformattedPrice"])
        .map(CanonicalField::Beds, &["/bedrooms", "/beds"])
        .map(CanonicalField::Baths, &["/bathrooms", "/baths"])
        .map(CanonicalField::PropertyType, &["/propertyType", "/homeType"])
        .map(CanonicalField::Url, &["/detailUrl"]);

    match Url::parse(ZILLOW_ORIGIN) {
        Ok(origin) => map.with_url_origin(origin),
        Err(_) => map,
    }
}
