// Shared fakes for pipeline, report and mailer tests.

use crate::config::{AppConfig, FetchSettings, MailConfig};
use crate::domain::{CanonicalField, FieldMap};
use crate::errors::NotifyError;
use crate::mailer::{MailCredentials, MailTransport};
use crate::sources::{Backoff, FetchError, ListingSource, PageRequest, RawListing, RetryPolicy};
use lettre::Message;
use serde_json::{json, Value};
use std::cell::{Cell, Ref, RefCell};
use std::io::Read;
use std::path::Path;
use std::time::Duration;

pub struct SentMail {
    pub user: String,
    pub raw: String,
}

/// Counts submissions and keeps the formatted messages.
#[derive(Default)]
pub struct RecordingTransport {
    calls: Cell<usize>,
    sent: RefCell<Vec<SentMail>>,
    fail: bool,
}

impl RecordingTransport {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn sent(&self) -> Ref<'_, Vec<SentMail>> {
        self.sent.borrow()
    }
}

impl MailTransport for RecordingTransport {
    fn submit(&self, credentials: &MailCredentials, message: &Message) -> Result<(), NotifyError> {
        self.calls.set(self.calls.get() + 1);
        if self.fail {
            return Err(NotifyError::Send("connection refused".to_string()));
        }
        self.sent.borrow_mut().push(SentMail {
            user: credentials.user.clone(),
            raw: String::from_utf8_lossy(&message.formatted()).into_owned(),
        });
        Ok(())
    }
}

/// Realtor-shaped listing number `i`.
pub fn sample_listing(i: usize) -> Value {
    json!({
        "property_id": format!("{}", 9_000_000 + i),
        "list_price": 200_000 + i * 1_000,
        "permalink": format!("{i}-Lakeview-Dr_Sebring_FL_33870_M{i}"),
        "description": { "beds": 3, "baths": 2, "type": "multi_family" },
        "location": { "address": {
            "line": format!("{i} Lakeview Dr"),
            "city": "Sebring",
            "state_code": "FL",
            "postal_code": "33870"
        }}
    })
}

pub fn sample_field_map() -> FieldMap {
    FieldMap::new()
        .map(CanonicalField::Address, &["/location/address/line"])
        .map(CanonicalField::City, &["/location/address/city"])
        .map(CanonicalField::State, &["/location/address/state_code"])
        .map(CanonicalField::PostalCode, &["/location/address/postal_code"])
        .map(CanonicalField::Price, &["/list_price"])
        .map(CanonicalField::Beds, &["/description/beds"])
        .map(CanonicalField::Baths, &["/description/baths"])
        .map(CanonicalField::PropertyType, &["/description/type"])
        .map(CanonicalField::Url, &["/permalink"])
        .with_url_origin(
            url::Url::parse("https://www.realtor.com/realestateandhomes-detail/").unwrap(),
        )
}

/// Serves a fixed list of listings by offset/limit, failing the first
/// `failures` calls with a 503.
pub struct ScriptedSource {
    listings: Vec<Value>,
    failures: usize,
    calls: RefCell<Vec<PageRequest>>,
    map: FieldMap,
}

impl ScriptedSource {
    pub fn new(listings: Vec<Value>) -> Self {
        Self {
            listings,
            failures: 0,
            calls: RefCell::new(Vec::new()),
            map: sample_field_map(),
        }
    }

    pub fn with_listings(count: usize) -> Self {
        Self::new((0..count).map(sample_listing).collect())
    }

    pub fn failing_first(mut self, failures: usize) -> Self {
        self.failures = failures;
        self
    }

    pub fn calls(&self) -> Vec<PageRequest> {
        self.calls.borrow().clone()
    }
}

impl ListingSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    fn fetch_page(&self, page: PageRequest) -> Result<Vec<RawListing>, FetchError> {
        self.calls.borrow_mut().push(page);
        if self.calls.borrow().len() <= self.failures {
            return Err(FetchError::Status {
                status: 503,
                body: "Service Unavailable".to_string(),
            });
        }

        let start = page.offset.min(self.listings.len());
        let end = (page.offset + page.limit).min(self.listings.len());
        Ok(self.listings[start..end]
            .iter()
            .cloned()
            .map(RawListing::from)
            .collect())
    }

    fn field_map(&self) -> &FieldMap {
        &self.map
    }
}

/// Config with fast retries and mail fully set up, writing into `dir`.
pub fn test_config(dir: &Path, page_size: usize) -> AppConfig {
    AppConfig {
        fetch: FetchSettings {
            page_size,
            retry: RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::from_millis(5),
                backoff: Backoff::Exponential,
            },
            page_delay: Duration::ZERO,
            max_pages: 20,
        },
        mail: MailConfig {
            sender: Some("bot@example.com".to_string()),
            secret: Some("app-password".to_string()),
            recipient: Some("owner@example.com".to_string()),
            ..MailConfig::default()
        },
        report_path: dir.join("zillow_report.xlsx"),
        ..AppConfig::default()
    }
}

/// Worksheet XML and shared strings of a written report.
pub struct SheetContents {
    pub sheet_xml: String,
    pub shared: Vec<String>,
}

impl SheetContents {
    pub fn read(path: &Path) -> Self {
        let file = std::fs::File::open(path).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();

        let mut read_entry = |name: &str| {
            let mut text = String::new();
            archive.by_name(name).unwrap().read_to_string(&mut text).unwrap();
            text
        };

        let sheet_xml = read_entry("xl/worksheets/sheet1.xml");
        let shared_xml = read_entry("xl/sharedStrings.xml");

        let shared = shared_xml
            .split("<si>")
            .skip(1)
            .map(|si| {
                let start = si.find("<t").unwrap();
                let open_end = start + si[start..].find('>').unwrap() + 1;
                let close = si.find("</t>").unwrap();
                si[open_end..close].to_string()
            })
            .collect();

        Self { sheet_xml, shared }
    }

    pub fn row_count(&self) -> usize {
        self.sheet_xml.matches("<row ").count()
    }

    /// Displayed value of `cell` ("E2"), resolving shared strings.
    pub fn cell(&self, cell: &str) -> Option<String> {
        let marker = format!("<c r=\"{cell}\"");
        let start = self.sheet_xml.find(&marker)?;
        let rest = &self.sheet_xml[start..];
        let open_end = rest.find('>')?;
        if rest[..open_end].ends_with('/') {
            return None;
        }
        let cell_xml = &rest[..rest.find("</c>")?];

        let v_start = cell_xml.find("<v>")? + 3;
        let v_end = cell_xml.find("</v>")?;
        let value = &cell_xml[v_start..v_end];

        if cell_xml.contains("t=\"s\"") {
            let index: usize = value.parse().ok()?;
            self.shared.get(index).cloned()
        } else {
            Some(value.to_string())
        }
    }

    /// Cells of row 1, A to I.
    pub fn headers(&self) -> Vec<String> {
        COLUMNS
            .iter()
            .filter_map(|col| self.cell(&format!("{col}1")))
            .collect()
    }
}

pub const COLUMNS: [char; 9] = ['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I'];

