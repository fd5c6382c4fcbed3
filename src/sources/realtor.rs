// sources/realtor.rs
//
// Coordinate/radius search against the Realtor API on RapidAPI.

use crate::domain::{CanonicalField, FieldMap, SearchFilters};
use crate::sources::http::{build_client, get_json, rapidapi_headers, results_at};
use crate::sources::retry::{retry, RetryPolicy};
use crate::sources::{FetchError, ListingSource, PageRequest, RawListing};
use reqwest::blocking::Client;
use reqwest::header::HeaderMap;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

const DEFAULT_RESULTS_PATH: &str = "/home_search/results";
const DETAIL_ORIGIN: &str = "https://www.realtor.com/realestateandhomes-detail/";

// Largest `limit` the list endpoint accepts.
const MAX_PAGE_SIZE: usize = 200;

pub struct RealtorSource {
    client: Client,
    headers: HeaderMap,
    base_url: String,
    filters: SearchFilters,
    results_path: String,
    field_map: FieldMap,
    /// Set when every candidate must be checked for central air.
    central_ac_retry: Option<RetryPolicy>,
}

impl RealtorSource {
    pub fn new(
        api_key: &str,
        host: &str,
        filters: SearchFilters,
        results_path: Option<String>,
        central_ac_retry: Option<RetryPolicy>,
    ) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_client()?,
            headers: rapidapi_headers(api_key, host)?,
            base_url: format!("https://{host}"),
            filters,
            results_path: results_path.unwrap_or_else(|| DEFAULT_RESULTS_PATH.to_string()),
            field_map: realtor_field_map(),
            central_ac_retry,
        })
    }

    fn search_params(&self, page: PageRequest) -> Vec<(&'static str, String)> {
        let f = &self.filters;
        let mut params = vec![
            ("latitude", f.latitude.to_string()),
            ("longitude", f.longitude.to_string()),
            ("radius", f.radius_miles.to_string()),
            ("price_min", f.price_min.to_string()),
            ("price_max", f.price_max.to_string()),
            ("beds_min", f.beds_min.to_string()),
            ("baths_min", f.baths_min.to_string()),
        ];
        if let Some(prop_type) = &f.property_type {
            params.push(("prop_type", prop_type.clone()));
        }
        params.push(("limit", page.limit.to_string()));
        params.push(("offset", page.offset.to_string()));
        params.push(("sort", "newest".to_string()));
        params
    }

    fn has_central_ac(&self, property_id: &str) -> Result<bool, FetchError> {
        let body = get_json(
            &self.client,
            &format!("{}/properties/v3/detail", self.base_url),
            &self.headers,
            &[("property_id", property_id.to_string())],
        )?;
        Ok(cooling_mentions_central(&body))
    }
}

impl ListingSource for RealtorSource {
    fn name(&self) -> &str {
        "realtor coordinate search"
    }

    fn fetch_page(&self, page: PageRequest) -> Result<Vec<RawListing>, FetchError> {
        let body = get_json(
            &self.client,
            &format!("{}/properties/v3/list", self.base_url),
            &self.headers,
            &self.search_params(page),
        )?;
        results_at(&body, &self.results_path)
    }

    fn field_map(&self) -> &FieldMap {
        &self.field_map
    }

    fn page_size(&self, requested: usize) -> usize {
        requested.min(MAX_PAGE_SIZE)
    }

    fn qualifies(&self, raw: &RawListing) -> bool {
        let Some(policy) = &self.central_ac_retry else {
            return true;
        };
        let Some(property_id) = raw.pointer("/property_id").and_then(Value::as_str) else {
            debug!("Listing without property_id, cannot verify cooling");
            return false;
        };

        match retry(
            policy,
            &format!("detail {property_id}"),
            |_| self.has_central_ac(property_id),
            FetchError::is_transient,
        ) {
            Ok(has_ac) => has_ac,
            Err(e) => {
                warn!(property_id, "Excluding listing, cooling lookup failed: {e}");
                false
            }
        }
    }
}

pub fn realtor_field_map() -> FieldMap {
    let map = FieldMap::new()
        .map(CanonicalField::Address, &["/location/address/line"])
        .map(CanonicalField::City, &["/location/address/city"])
        .map(CanonicalField::State, &["/location/address/state_code"])
        .map(CanonicalField::PostalCode, &["/location/address/postal_code"])
        .map(CanonicalField::Price, &["/list_price", "/price"])
        .map(CanonicalField::Beds, &["/description/beds"])
        .map(CanonicalField::Baths, &["/description/baths", "/description/baths_consolidated"])
        .map(CanonicalField::PropertyType, &["/description/type", "/prop_type"])
        .map(CanonicalField::Url, &["/href", "/permalink"]);

    match Url::parse(DETAIL_ORIGIN) {
        Ok(origin) => map.with_url_origin(origin),
        Err(_) => map,
    }
}

/// Looks for "central" in the cooling details of a detail response.
/// The home record sits under `properties[0]` or `data.home`.
pub fn cooling_mentions_central(body: &Value) -> bool {
    let Some(home) = body
        .pointer("/properties/0")
        .or_else(|| body.pointer("/data/home"))
    else {
        return false;
    };

    let mut cooling = Vec::new();
    for pointer in ["/features/cooling", "/property/cooling", "/description/cooling"] {
        match home.pointer(pointer) {
            Some(Value::String(s)) => cooling.push(s.as_str()),
            Some(Value::Array(items)) => cooling.extend(items.iter().filter_map(Value::as_str)),
            _ => {}
        }
    }

    cooling.join(" ").to_lowercase().contains("central")
}
