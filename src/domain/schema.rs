// src/domain/schema.rs

use url::Url;

/// Columns of the report, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    Address,
    City,
    State,
    PostalCode,
    Price,
    Beds,
    Baths,
    PropertyType,
    Url,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 9] = [
        CanonicalField::Address,
        CanonicalField::City,
        CanonicalField::State,
        CanonicalField::PostalCode,
        CanonicalField::Price,
        CanonicalField::Beds,
        CanonicalField::Baths,
        CanonicalField::PropertyType,
        CanonicalField::Url,
    ];

    pub fn header(self) -> &'static str {
        match self {
            CanonicalField::Address => "Address",
            CanonicalField::City => "City",
            CanonicalField::State => "State",
            CanonicalField::PostalCode => "ZIP",
            CanonicalField::Price => "Price",
            CanonicalField::Beds => "Beds",
            CanonicalField::Baths => "Baths",
            CanonicalField::PropertyType => "Property Type",
            CanonicalField::Url => "URL",
        }
    }
}

/// Declares where each canonical field lives in one backend's records.
///
/// Paths are JSON pointers (`/location/address/line`). When several paths are
/// given for a field the first one holding a non-null value wins.
/// A field with no paths always normalizes to `None`.
#[derive(Debug, Clone, Default)]
pub struct FieldMap {
    entries: Vec<(CanonicalField, Vec<String>)>,
    url_origin: Option<Url>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map(mut self, field: CanonicalField, paths: &[&str]) -> Self {
        let paths = paths.iter().map(|p| p.to_string()).collect();
        match self.entries.iter_mut().find(|(f, _)| *f == field) {
            Some(entry) => entry.1 = paths,
            None => self.entries.push((field, paths)),
        }
        self
    }

    /// Site origin that relative permalinks are joined onto.
    pub fn with_url_origin(mut self, origin: Url) -> Self {
        self.url_origin = Some(origin);
        self
    }

    pub fn paths(&self, field: CanonicalField) -> &[String] {
        self.entries
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, paths)| paths.as_slice())
            .unwrap_or(&[])
    }

    pub fn url_origin(&self) -> Option<&Url> {
        self.url_origin.as_ref()
    }
}
