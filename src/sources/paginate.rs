// sources/paginate.rs
use crate::config::FetchSettings;
use crate::sources::retry::retry;
use crate::sources::{FetchError, ListingSource, PageRequest, RawListing};
use tracing::{info, warn};

/// Walks a source page by page, retrying each page with backoff.
pub struct Paginator<'a> {
    source: &'a dyn ListingSource,
    settings: &'a FetchSettings,
}

impl<'a> Paginator<'a> {
    pub fn new(source: &'a dyn ListingSource, settings: &'a FetchSettings) -> Self {
        Self { source, settings }
    }

    /// One page, or an empty page once retries are used up.
    /// Fetch failures and "no more data" look the same to the caller.
    pub fn fetch_page(&self, page: PageRequest) -> Vec<RawListing> {
        let label = format!("{} offset {}", self.source.name(), page.offset);

        match retry(
            &self.settings.retry,
            &label,
            |_| self.source.fetch_page(page),
            FetchError::is_transient,
        ) {
            Ok(listings) => listings,
            Err(e) => {
                warn!(source = self.source.name(), offset = page.offset, "⚠️ Treating page as empty: {e}");
                Vec::new()
            }
        }
    }

    /// Every page in order, until a short or empty page.
    pub fn fetch_all(&self) -> Vec<RawListing> {
        let limit = self.source.page_size(self.settings.page_size).max(1);
        let mut all = Vec::new();
        let mut offset = 0;

        for page_no in 1..=self.settings.max_pages {
            let page = self.fetch_page(PageRequest { offset, limit });
            let count = page.len();
            info!(source = self.source.name(), page = page_no, offset, count, "📄 Page fetched");
            all.extend(page);

            if count < limit {
                info!(total = all.len(), "🏁 End of results");
                break;
            }
            if page_no == self.settings.max_pages {
                warn!(max_pages = self.settings.max_pages, "Page cap reached, stopping");
                break;
            }

            offset += limit;
            if !self.settings.page_delay.is_zero() {
                std::thread::sleep(self.settings.page_delay);
            }
        }

        all
    }
}
