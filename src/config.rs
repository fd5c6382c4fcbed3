// src/config.rs
//
// Everything the bot needs, read from the environment exactly once at
// startup and handed to each stage when it is constructed.

use crate::domain::SearchFilters;
use crate::errors::ConfigError;
use crate::scheduler::WeeklySchedule;
use crate::sources::{Backoff, RetryPolicy};
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_REPORT_PATH: &str = "zillow_report.xlsx";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Coordinate/radius search (Realtor API on RapidAPI).
    Realtor,
    /// Search-results URL lookup (Zillow API on RapidAPI).
    UrlSearch,
    /// One lookup per configured ZPID (Zillow API on RapidAPI).
    Zpid,
    /// Search result pages scraped from realtor.com.
    Scrape,
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "realtor" | "coordinates" => Ok(SourceKind::Realtor),
            "url" | "url_search" => Ok(SourceKind::UrlSearch),
            "zpid" => Ok(SourceKind::Zpid),
            "scrape" => Ok(SourceKind::Scrape),
            other => Err(format!("unknown source '{other}' (expected realtor|url|zpid|scrape)")),
        }
    }
}

impl SourceKind {
    pub fn default_host(self) -> &'static str {
        match self {
            SourceKind::Realtor | SourceKind::Scrape => "realtor.p.rapidapi.com",
            SourceKind::UrlSearch | SourceKind::Zpid => "zillow-com1.p.rapidapi.com",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ApiConfig {
    pub key: Option<String>,
    pub host: Option<String>,
    /// JSON pointer to the results array, overriding the backend default.
    pub results_path: Option<String>,
}

/// Backend choice plus the inputs only some backends use.
#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub kind: SourceKind,
    pub search_url: Option<String>,
    pub zpids: Vec<String>,
    pub location: String,
    pub require_central_ac: bool,
    pub zenrows_key: Option<String>,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            kind: SourceKind::Realtor,
            search_url: None,
            zpids: Vec::new(),
            location: "Sebring_FL".to_string(),
            require_central_ac: false,
            zenrows_key: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub page_size: usize,
    pub retry: RetryPolicy,
    /// Courtesy pause between successful pages.
    pub page_delay: Duration,
    pub max_pages: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            page_size: 200,
            retry: RetryPolicy::default(),
            page_delay: Duration::from_secs(1),
            max_pages: 50,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub sender: Option<String>,
    pub secret: Option<String>,
    pub recipient: Option<String>,
    pub smtp_host: String,
    pub smtp_port: u16,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            sender: None,
            secret: None,
            recipient: None,
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 465,
        }
    }
}

impl MailConfig {
    /// Explicit recipient, or the sender mailing themselves.
    pub fn effective_recipient(&self) -> Option<&str> {
        self.recipient.as_deref().or(self.sender.as_deref())
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub source: SourceSettings,
    pub filters: SearchFilters,
    pub fetch: FetchSettings,
    pub mail: MailConfig,
    pub report_path: PathBuf,
    pub schedule: WeeklySchedule,
    /// Run one pipeline and exit (CI); otherwise loop on `schedule`.
    pub one_shot: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            source: SourceSettings::default(),
            filters: SearchFilters::default(),
            fetch: FetchSettings::default(),
            mail: MailConfig::default(),
            report_path: PathBuf::from(DEFAULT_REPORT_PATH),
            schedule: WeeklySchedule::default(),
            one_shot: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };
        let defaults = AppConfig::default();

        let api = ApiConfig {
            key: env.text("RAPIDAPI_KEY"),
            host: env.text("RAPIDAPI_HOST"),
            results_path: env.text("LISTINGS_RESULTS_PATH"),
        };

        let source = SourceSettings {
            kind: env.parsed("LISTING_SOURCE", defaults.source.kind)?,
            search_url: env.text("SEARCH_URL"),
            zpids: env
                .text("ZPIDS")
                .map(|list| {
                    list.split(',')
                        .map(str::trim)
                        .filter(|z| !z.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            location: env.text("SEARCH_LOCATION").unwrap_or(defaults.source.location),
            require_central_ac: env.flag("REQUIRE_CENTRAL_AC")?,
            zenrows_key: env.text("ZENROWS_API_KEY"),
        };

        let d = &defaults.filters;
        let filters = SearchFilters {
            latitude: env.parsed("SEARCH_LAT", d.latitude)?,
            longitude: env.parsed("SEARCH_LON", d.longitude)?,
            radius_miles: env.parsed("SEARCH_RADIUS_MILES", d.radius_miles)?,
            price_min: env.parsed("PRICE_MIN", d.price_min)?,
            price_max: env.parsed("PRICE_MAX", d.price_max)?,
            beds_min: env.parsed("BEDS_MIN", d.beds_min)?,
            baths_min: env.parsed("BATHS_MIN", d.baths_min)?,
            property_type: env.text("PROPERTY_TYPE").or(d.property_type.clone()),
        };
        if filters.price_min > filters.price_max {
            return Err(ConfigError::Invalid {
                key: "PRICE_MIN".to_string(),
                value: filters.price_min.to_string(),
                reason: format!("greater than PRICE_MAX ({})", filters.price_max),
            });
        }

        let f = &defaults.fetch;
        let fetch = FetchSettings {
            page_size: env.parsed("PAGE_SIZE", f.page_size)?.max(1),
            retry: RetryPolicy {
                max_attempts: env.parsed("MAX_RETRIES", f.retry.max_attempts)?.max(1),
                base_delay: Duration::from_millis(
                    env.parsed("RETRY_BASE_DELAY_MS", f.retry.base_delay.as_millis() as u64)?,
                ),
                backoff: env.parsed::<Backoff>("RETRY_BACKOFF", f.retry.backoff)?,
            },
            page_delay: Duration::from_millis(
                env.parsed("PAGE_DELAY_MS", f.page_delay.as_millis() as u64)?,
            ),
            max_pages: env.parsed("MAX_PAGES", f.max_pages)?.max(1),
        };

        let mail = MailConfig {
            sender: env.text("GMAIL_USER"),
            secret: env.text("GMAIL_PASS"),
            recipient: env.text("REPORT_RECIPIENT"),
            smtp_host: env.text("SMTP_HOST").unwrap_or(defaults.mail.smtp_host),
            smtp_port: env.parsed("SMTP_PORT", defaults.mail.smtp_port)?,
        };

        Ok(AppConfig {
            api,
            source,
            filters,
            fetch,
            mail,
            report_path: env
                .text("REPORT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.report_path),
            schedule: env.parsed("REPORT_SCHEDULE", defaults.schedule)?,
            one_shot: env.text("CI").is_some() || env.text("GITHUB_ACTIONS").is_some(),
        })
    }
}

struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn text(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parsed<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.text(key) {
            None => Ok(default),
            Some(raw) => raw.parse::<T>().map_err(|e| ConfigError::Invalid {
                key: key.to_string(),
                value: raw.clone(),
                reason: e.to_string(),
            }),
        }
    }

    fn flag(&self, key: &str) -> Result<bool, ConfigError> {
        match self.text(key).map(|v| v.to_ascii_lowercase()) {
            None => Ok(false),
            Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(true),
            Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => Ok(false),
            Some(v) => Err(ConfigError::Invalid {
                key: key.to_string(),
                value: v,
                reason: "expected a boolean".to_string(),
            }),
        }
    }
}
