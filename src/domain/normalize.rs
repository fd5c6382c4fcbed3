use crate::domain::listing::{CanonicalRow, ListingBatch};
use crate::domain::schema::{CanonicalField, FieldMap};
use crate::sources::RawListing;
use serde_json::Value;
use url::Url;

/// Flattens one backend record into the canonical row shape.
/// Never fails: anything missing or unusable becomes `None`.
pub fn normalize(raw: &RawListing, map: &FieldMap) -> CanonicalRow {
    let text_of = |field| lookup(raw, map.paths(field)).and_then(text);
    let number_of = |field| lookup(raw, map.paths(field)).and_then(number);

    CanonicalRow {
        address: text_of(CanonicalField::Address),
        city: text_of(CanonicalField::City),
        state: text_of(CanonicalField::State),
        postal_code: text_of(CanonicalField::PostalCode),
        price: number_of(CanonicalField::Price),
        beds: number_of(CanonicalField::Beds),
        baths: number_of(CanonicalField::Baths),
        property_type: text_of(CanonicalField::PropertyType).map(|t| humanize(&t)),
        url: lookup(raw, map.paths(CanonicalField::Url))
            .and_then(Value::as_str)
            .and_then(|u| absolute_url(u.trim(), map.url_origin())),
    }
}

pub fn normalize_all<'a, I>(raws: I, map: &FieldMap) -> ListingBatch
where
    I: IntoIterator<Item = &'a RawListing>,
{
    raws.into_iter().map(|raw| normalize(raw, map)).collect()
}

fn lookup<'a>(raw: &'a RawListing, paths: &[String]) -> Option<&'a Value> {
    paths
        .iter()
        .filter_map(|p| raw.pointer(p))
        .find(|v| !v.is_null())
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// Accepts 250000, 2.5, "250000", "$250,000" and "3+".
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| !matches!(c, '$' | ',' | '+' | ' '))
                .collect();
            cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
        }
        _ => None,
    }
}

// "multi_family" -> "Multi Family"
fn humanize(raw: &str) -> String {
    if raw.contains(' ') || (!raw.contains(['_', '-']) && raw.chars().any(|c| c.is_uppercase())) {
        return raw.to_string();
    }

    raw.split(['_', '-'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

// Only web links survive; "tel:", "javascript:" and the like become None.
fn absolute_url(link: &str, origin: Option<&Url>) -> Option<String> {
    if link.is_empty() {
        return None;
    }
    let url = match Url::parse(link) {
        Ok(url) => url,
        Err(_) => origin?.join(link).ok()?,
    };
    matches!(url.scheme(), "http" | "https").then(|| url.to_string())
}
