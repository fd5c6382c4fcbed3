// sources/zpid.rs
//
// Looks up a fixed list of Zillow property ids, one request per id.
// Each id is retried on its own; an id that keeps failing is skipped.

use crate::domain::{CanonicalField, FieldMap};
use crate::sources::http::{build_client, get_json, rapidapi_headers};
use crate::sources::retry::{retry, RetryPolicy};
use crate::sources::url_search::ZILLOW_ORIGIN;
use crate::sources::{FetchError, ListingSource, PageRequest, RawListing};
use reqwest::blocking::Client;
use reqwest::header::HeaderMap;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

pub struct ZpidSource {
    client: Client,
    headers: HeaderMap,
    base_url: String,
    zpids: Vec<String>,
    retry: RetryPolicy,
    field_map: FieldMap,
}

impl ZpidSource {
    pub fn new(
        api_key: &str,
        host: &str,
        zpids: Vec<String>,
        retry: RetryPolicy,
    ) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_client()?,
            headers: rapidapi_headers(api_key, host)?,
            base_url: format!("https://{host}"),
            zpids,
            retry,
            field_map: zpid_field_map(),
        })
    }

    fn lookup(&self, zpid: &str) -> Result<RawListing, FetchError> {
        let body = get_json(
            &self.client,
            &format!("{}/property", self.base_url),
            &self.headers,
            &[("zpid", zpid.to_string())],
        )?;

        match body {
            Value::Object(_) => Ok(RawListing::from(body)),
            other => Err(FetchError::UnexpectedShape(format!(
                "property {zpid} is not an object: {other}"
            ))),
        }
    }
}

/// Looks up every id in order. Ids that still fail after retrying are
/// logged and left out so one delisted property cannot empty the page.
fn lookup_each<F>(ids: &[String], policy: &RetryPolicy, mut lookup: F) -> Vec<RawListing>
where
    F: FnMut(&str) -> Result<RawListing, FetchError>,
{
    let mut found = Vec::with_capacity(ids.len());

    for zpid in ids {
        debug!(zpid = zpid.as_str(), "Looking up property");
        let label = format!("zpid {zpid}");
        match retry(policy, &label, |_| lookup(zpid), FetchError::is_transient) {
            Ok(raw) => found.push(raw),
            Err(e) => warn!(zpid = zpid.as_str(), "⚠️ Skipping property: {e}"),
        }
    }

    found
}

fn page_slice(ids: &[String], page: PageRequest) -> &[String] {
    let start = page.offset.min(ids.len());
    let end = page.offset.saturating_add(page.limit).min(ids.len());
    &ids[start..end]
}

impl ListingSource for ZpidSource {
    fn name(&self) -> &str {
        "zpid lookup"
    }

    fn fetch_page(&self, page: PageRequest) -> Result<Vec<RawListing>, FetchError> {
        let ids = page_slice(&self.zpids, page);
        Ok(lookup_each(ids, &self.retry, |zpid| self.lookup(zpid)))
    }

    // Skipped ids shorten a page, so every id goes on the first page and a
    // short page never hides later ids.
    fn page_size(&self, _requested: usize) -> usize {
        self.zpids.len().max(1)
    }

    fn field_map(&self) -> &FieldMap {
        &self.field_map
    }
}

fn zpid_field_map() -> FieldMap {
    let map = FieldMap::new()
        .map(CanonicalField::Address, &["/address/streetAddress", "/streetAddress"])
        .map(CanonicalField::City, &["/address/city", "/city"])
        .map(CanonicalField::State, &["/address/state", "/state"])
        .map(CanonicalField::PostalCode, &["/address/zipcode", "/zipcode"])
        .map(CanonicalField::Price, &["/price"])
        .map(CanonicalField::Beds, &["/bedrooms"])
        .map(CanonicalField::Baths, &["/bathrooms"])
        .map(CanonicalField::PropertyType, &["/homeType"])
        .map(CanonicalField::Url, &["/hdpUrl", "/url"]);

    match Url::parse(ZILLOW_ORIGIN) {
        Ok(origin) => map.with_url_origin(origin),
        Err(_) => map,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::normalize::normalize;
    use serde_json::json;
    use std::cell::RefCell;
    use std::time::Duration;

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            ..RetryPolicy::default()
        }
    }

    #[test]
    fn failing_id_is_skipped_and_the_rest_kept() {
        let ids: Vec<String> = ["111", "222", "333"].iter().map(|s| s.to_string()).collect();
        let calls = RefCell::new(Vec::new());

        let found = lookup_each(&ids, &fast_retry(), |zpid| {
            calls.borrow_mut().push(zpid.to_string());
            if zpid == "222" {
                Err(FetchError::Status {
                    status: 404,
                    body: "Property not found".to_string(),
                })
            } else {
                Ok(RawListing::from(json!({ "zpid": zpid })))
            }
        });

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].pointer("/zpid"), Some(&json!("111")));
        assert_eq!(found[1].pointer("/zpid"), Some(&json!("333")));
        // the bad id used its full retry budget, the others one call each
        assert_eq!(calls.borrow().iter().filter(|z| *z == "222").count(), 3);
        assert_eq!(calls.borrow().len(), 5);
    }

    #[test]
    fn malformed_record_is_not_retried() {
        let ids = vec!["111".to_string()];
        let mut calls = 0;

        let found = lookup_each(&ids, &fast_retry(), |_| {
            calls += 1;
            Err(FetchError::UnexpectedShape("not an object".to_string()))
        });

        assert!(found.is_empty());
        assert_eq!(calls, 1);
    }

    #[test]
    fn all_ids_share_one_page() {
        let ids: Vec<String> = (1..=250).map(|i| i.to_string()).collect();
        let source = ZpidSource::new("key", "zillow-com1.p.rapidapi.com", ids, fast_retry()).unwrap();
        assert_eq!(source.page_size(200), 250);
    }

    #[test]
    fn pages_slice_the_id_list() {
        let ids: Vec<String> = (1..=5).map(|i| i.to_string()).collect();

        assert_eq!(page_slice(&ids, PageRequest { offset: 0, limit: 2 }), ["1", "2"]);
        assert_eq!(page_slice(&ids, PageRequest { offset: 4, limit: 2 }), ["5"]);
        assert!(page_slice(&ids, PageRequest { offset: 6, limit: 2 }).is_empty());
    }

    #[test]
    fn property_record_normalizes() {
        let raw = RawListing::from(json!({
            "zpid": 46110345,
            "price": 299900,
            "bedrooms": 4,
            "bathrooms": 3,
            "homeType": "MULTI_FAMILY",
            "hdpUrl": "/homedetails/118-Oak-St-Lake-Placid-FL-33852/46110345_zpid/",
            "address": {
                "streetAddress": "118 Oak St",
                "city": "Lake Placid",
                "state": "FL",
                "zipcode": "33852"
            }
        }));

        let row = normalize(&raw, &zpid_field_map());
        assert_eq!(row.full_address(), "118 Oak St, Lake Placid, FL 33852");
        assert_eq!(row.baths, Some(3.0));
        assert_eq!(
            row.url.as_deref(),
            Some("https://www.zillow.com/homedetails/118-Oak-St-Lake-Placid-FL-33852/46110345_zpid/")
        );
    }
}
