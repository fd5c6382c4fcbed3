use std::collections::HashMap;

/// One property flattened to the fixed report schema.
/// Every field is always present; missing source data is `None`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CanonicalRow {
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,

    pub price: Option<f64>,
    pub beds: Option<f64>,
    pub baths: Option<f64>,

    pub property_type: Option<String>,
    pub url: Option<String>,
}

impl CanonicalRow {
    /// "line, city, ST zip" with absent parts skipped.
    pub fn full_address(&self) -> String {
        let state_zip = [self.state.as_deref(), self.postal_code.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");

        [self.address.as_deref(), self.city.as_deref(), Some(state_zip.as_str())]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Rows in discovery order across all fetched pages. Duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingBatch {
    rows: Vec<CanonicalRow>,
}

impl ListingBatch {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[CanonicalRow] {
        &self.rows
    }

    pub fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&CanonicalRow) -> bool,
    {
        self.rows.retain(keep);
    }

    /// Number of rows whose full address already appeared earlier in the batch.
    /// Rows without any address data are not counted.
    pub fn duplicate_addresses(&self) -> usize {
        let mut seen: HashMap<String, usize> = HashMap::new();
        for row in &self.rows {
            let key = row.full_address().to_ascii_lowercase();
            if !key.is_empty() {
                *seen.entry(key).or_default() += 1;
            }
        }
        seen.values().map(|n| n - 1).sum()
    }
}

impl FromIterator<CanonicalRow> for ListingBatch {
    fn from_iter<I: IntoIterator<Item = CanonicalRow>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ListingBatch {
    type Item = &'a CanonicalRow;
    type IntoIter = std::slice::Iter<'a, CanonicalRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// "$250,000" style rendering used in mail text.
pub fn format_price(price: f64) -> String {
    let whole = price.round().abs() as u64;
    let digits = whole.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 2);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    if price < 0.0 {
        format!("-${out}")
    } else {
        format!("${out}")
    }
}
