pub mod filters;
pub mod listing;
pub mod normalize;
pub mod schema;

pub use filters::SearchFilters;
pub use listing::{format_price, CanonicalRow, ListingBatch};
pub use normalize::normalize_all;
pub use schema::{CanonicalField, FieldMap};
