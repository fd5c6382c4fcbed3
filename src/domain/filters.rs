use crate::domain::listing::CanonicalRow;

/// Search criteria shared by every backend.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchFilters {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_miles: u32,

    pub price_min: u64,
    pub price_max: u64,
    pub beds_min: u32,
    pub baths_min: u32,

    pub property_type: Option<String>,
}

impl Default for SearchFilters {
    // Sebring, FL
    fn default() -> Self {
        Self {
            latitude: 27.4956,
            longitude: -81.4409,
            radius_miles: 105,
            price_min: 200_000,
            price_max: 400_000,
            beds_min: 2,
            baths_min: 1,
            property_type: Some("multi_family".to_string()),
        }
    }
}

impl SearchFilters {
    /// Secondary check on a normalized row. Backends do not always honour
    /// server-side minimums; rows with unknown counts are kept.
    pub fn admits(&self, row: &CanonicalRow) -> bool {
        let beds_ok = row.beds.map_or(true, |b| b >= f64::from(self.beds_min));
        let baths_ok = row.baths.map_or(true, |b| b >= f64::from(self.baths_min));
        beds_ok && baths_ok
    }
}
