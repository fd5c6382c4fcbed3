// src/pipeline.rs

use crate::config::AppConfig;
use crate::domain::{format_price, normalize_all, ListingBatch};
use crate::mailer::{MailTransport, Notifier, ReportEmail};
use crate::sources::{build_source, ListingSource, Paginator};
use crate::spreadsheets::write_report;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// What one run got through. Later stages are skipped once an earlier
/// one comes up empty or fails.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunSummary {
    pub fetched: usize,
    pub qualified: usize,
    pub rows: usize,
    pub report: Option<PathBuf>,
    pub notified: bool,
}

pub struct Pipeline<'a, T: MailTransport> {
    config: &'a AppConfig,
    notifier: &'a Notifier<T>,
}

impl<'a, T: MailTransport> Pipeline<'a, T> {
    pub fn new(config: &'a AppConfig, notifier: &'a Notifier<T>) -> Self {
        Self { config, notifier }
    }

    /// Builds the configured source and runs once. A source that cannot be
    /// built (missing API key etc.) skips the run.
    pub fn run_configured(&self) -> Option<RunSummary> {
        match build_source(self.config) {
            Ok(source) => Some(self.run(source.as_ref())),
            Err(e) => {
                error!("❌ Configuration error, skipping this run: {e}");
                None
            }
        }
    }

    /// Fetch -> normalize -> write -> notify.
    pub fn run(&self, source: &dyn ListingSource) -> RunSummary {
        info!(source = source.name(), "🚀 Pipeline run started");
        let mut summary = RunSummary::default();

        let raws = Paginator::new(source, &self.config.fetch).fetch_all();
        summary.fetched = raws.len();

        let raws: Vec<_> = raws.into_iter().filter(|raw| source.qualifies(raw)).collect();
        summary.qualified = raws.len();

        let mut batch = normalize_all(&raws, source.field_map());
        batch.retain(|row| self.config.filters.admits(row));
        summary.rows = batch.len();

        info!(
            fetched = summary.fetched,
            qualified = summary.qualified,
            rows = summary.rows,
            "✅ Listings normalized"
        );

        let duplicates = batch.duplicate_addresses();
        if duplicates > 0 {
            warn!(duplicates, "Duplicate addresses kept in report");
        }

        if batch.is_empty() {
            info!("No listings this run, skipping report and email");
            return summary;
        }

        let report = match write_report(&batch, Some(self.config.report_path.as_path())) {
            Ok(Some(path)) => path,
            Ok(None) => return summary,
            Err(e) => {
                error!("❌ Failed to write report: {e}");
                return summary;
            }
        };
        summary.report = Some(report.clone());

        let email = report_email(&batch, &report);
        match self.notifier.send(&email) {
            Ok(()) => summary.notified = true,
            Err(e) if e.is_config() => error!("❌ Email skipped, configuration error: {e}"),
            Err(e) => error!("❌ Email failed: {e}"),
        }

        info!(notified = summary.notified, "🏁 Pipeline run finished");
        summary
    }
}

pub fn report_email<'p>(batch: &ListingBatch, report: &'p Path) -> ReportEmail<'p> {
    let count = batch.len();
    let prices: Vec<f64> = batch.rows().iter().filter_map(|r| r.price).collect();

    let mut body = format!("Attached is your weekly property report.\n\n{count} listings found.");
    if let (Some(low), Some(high)) = (
        prices.iter().copied().reduce(f64::min),
        prices.iter().copied().reduce(f64::max),
    ) {
        body.push_str(&format!("\nPrices range from {} to {}.", format_price(low), format_price(high)));
    }

    ReportEmail {
        subject: format!("Weekly Property Report: {count} listings"),
        body,
        attachment: Some(report),
    }
}
