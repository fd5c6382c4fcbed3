// sources/page_scrape.rs
//
// Scrapes realtor.com search result pages. Listings are read from the
// page's embedded `__NEXT_DATA__` JSON rather than from the markup.

use crate::domain::{FieldMap, SearchFilters};
use crate::sources::http::{build_client, get_text};
use crate::sources::realtor::realtor_field_map;
use crate::sources::{FetchError, ListingSource, PageRequest, RawListing};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, REFERER};
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

const SEARCH_BASE: &str = "https://www.realtor.com/realestateandhomes-search";
const ZENROWS_ENDPOINT: &str = "https://api.zenrows.com/v1/";
const PROPERTIES_PATH: &str = "/props/pageProps/properties";

// realtor.com renders this many cards per result page.
const SERVED_PAGE_SIZE: usize = 42;

pub struct PageScrapeSource {
    client: Client,
    search_url: String,
    /// Routes requests through the ZenRows proxy when set.
    zenrows_key: Option<String>,
    field_map: FieldMap,
}

impl PageScrapeSource {
    pub fn new(
        location: &str,
        filters: &SearchFilters,
        zenrows_key: Option<String>,
    ) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_client()?,
            search_url: search_url(location, filters),
            zenrows_key,
            field_map: realtor_field_map(),
        })
    }

    fn page_url(&self, page: PageRequest) -> String {
        match page.page_number() {
            1 => self.search_url.clone(),
            n => format!("{}/pg-{n}", self.search_url),
        }
    }

    fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(REFERER, HeaderValue::from_static("https://www.google.com/"));

        let html = match &self.zenrows_key {
            Some(key) => {
                let params = [
                    ("url", url.to_string()),
                    ("apikey", key.clone()),
                    ("original_status", "true".to_string()),
                    ("mode", "auto".to_string()),
                ];
                get_text(&self.client, ZENROWS_ENDPOINT, &headers, &params)?
            }
            None => get_text(&self.client, url, &headers, &[])?,
        };

        // ZenRows reports its own failures as a JSON body with a `code`.
        if html.starts_with('{') {
            if let Ok(json) = serde_json::from_str::<Value>(&html) {
                if json.get("code").is_some() {
                    return Err(FetchError::Network(format!("ZenRows API error: {html}")));
                }
            }
        }

        Ok(html)
    }
}

impl ListingSource for PageScrapeSource {
    fn name(&self) -> &str {
        "realtor.com pages"
    }

    fn fetch_page(&self, page: PageRequest) -> Result<Vec<RawListing>, FetchError> {
        let url = self.page_url(page);
        debug!(url = url.as_str(), "Scraping search page");

        let html = self.fetch_html(&url)?;
        let data = extract_next_data(&html)?;
        extract_properties(&data)
    }

    fn field_map(&self) -> &FieldMap {
        &self.field_map
    }

    fn page_size(&self, _requested: usize) -> usize {
        SERVED_PAGE_SIZE
    }
}

/// `<base>/<location>/beds-2/baths-1/price-200000-400000`
fn search_url(location: &str, filters: &SearchFilters) -> String {
    format!(
        "{SEARCH_BASE}/{}/beds-{}/baths-{}/price-{}-{}",
        location.trim_matches('/'),
        filters.beds_min,
        filters.baths_min,
        filters.price_min,
        filters.price_max
    )
}

fn extract_next_data(html: &str) -> Result<Value, FetchError> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"script[id="__NEXT_DATA__"]"#)
        .map_err(|e| FetchError::HtmlParse(e.to_string()))?;

    let element = document
        .select(&selector)
        .next()
        .ok_or(FetchError::MissingNextData)?;

    let json_text: String = element.text().collect();
    serde_json::from_str(&json_text).map_err(|e| FetchError::JsonParse(e.to_string()))
}

fn extract_properties(data: &Value) -> Result<Vec<RawListing>, FetchError> {
    match data.pointer(PROPERTIES_PATH) {
        Some(Value::Array(items)) => Ok(items.iter().cloned().map(RawListing::from).collect()),
        Some(Value::Null) | None => Ok(Vec::new()),
        Some(_) => Err(FetchError::UnexpectedShape("properties is not an array".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html><head><title>Sebring, FL homes for sale</title></head>
<body>
<div id="__next"></div>
<script id="__NEXT_DATA__" type="application/json">
{"props":{"pageProps":{"properties":[
  {"property_id":"1","list_price":250000,"permalink":"10-Elm-St_Sebring_FL_33870_M1",
   "description":{"beds":3,"baths":2,"type":"single_family"},
   "location":{"address":{"line":"10 Elm St","city":"Sebring","state_code":"FL","postal_code":"33870"}}},
  {"property_id":"2","list_price":310000}
]}}}
</script>
</body></html>"#;

    fn source() -> PageScrapeSource {
        PageScrapeSource::new("Sebring_FL", &SearchFilters::default(), None).unwrap()
    }

    #[test]
    fn builds_paged_search_urls() {
        let s = source();
        assert_eq!(
            s.page_url(PageRequest { offset: 0, limit: 42 }),
            "https://www.realtor.com/realestateandhomes-search/Sebring_FL/beds-2/baths-1/price-200000-400000"
        );
        assert!(s
            .page_url(PageRequest { offset: 84, limit: 42 })
            .ends_with("/price-200000-400000/pg-3"));
    }

    #[test]
    fn reads_listings_from_next_data() {
        let data = extract_next_data(PAGE).unwrap();
        let listings = extract_properties(&data).unwrap();

        assert_eq!(listings.len(), 2);
        let row = crate::domain::normalize::normalize(&listings[0], source().field_map());
        assert_eq!(row.full_address(), "10 Elm St, Sebring, FL 33870");
        assert_eq!(
            row.url.as_deref(),
            Some("https://www.realtor.com/realestateandhomes-detail/10-Elm-St_Sebring_FL_33870_M1")
        );
    }

    #[test]
    fn page_without_next_data_is_an_error() {
        let err = extract_next_data("<html><body>Access denied</body></html>").unwrap_err();
        assert!(matches!(err, FetchError::MissingNextData));
        assert!(!err.is_transient());
    }

    #[test]
    fn missing_properties_is_an_empty_page() {
        let data: Value = serde_json::from_str(r#"{"props":{"pageProps":{}}}"#).unwrap();
        assert!(extract_properties(&data).unwrap().is_empty());
    }
}
