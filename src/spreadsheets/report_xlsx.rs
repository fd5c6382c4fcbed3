use crate::config::DEFAULT_REPORT_PATH;
use crate::domain::{CanonicalField, CanonicalRow, ListingBatch};
use crate::errors::ReportError;
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const SHEET_NAME: &str = "Listings";

/// Writes one header row plus one row per listing, columns in canonical
/// order. An empty batch writes nothing and returns `Ok(None)`.
pub fn write_report(batch: &ListingBatch, path: Option<&Path>) -> Result<Option<PathBuf>, ReportError> {
    if batch.is_empty() {
        warn!("⚠️ No data to write. Excel file will not be generated.");
        return Ok(None);
    }

    let path = path.unwrap_or_else(|| Path::new(DEFAULT_REPORT_PATH));

    let header_format = Format::new().set_bold();
    let price_format = Format::new().set_num_format("$#,##0");

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, field) in CanonicalField::ALL.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, field.header(), &header_format)?;
    }

    for (i, row) in batch.rows().iter().enumerate() {
        let r = (i + 1) as u32;
        for (col, field) in CanonicalField::ALL.iter().enumerate() {
            write_cell(worksheet, r, col as u16, row, *field, &price_format)?;
        }
    }

    worksheet.set_freeze_panes(1, 0)?;
    worksheet.autofit();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    workbook.save(path)?;

    info!("✅ Excel report saved to: {} ({} rows)", path.display(), batch.len());
    Ok(Some(path.to_path_buf()))
}

enum Cell<'a> {
    Text(Option<&'a str>),
    Count(Option<f64>),
    Money(Option<f64>),
    Link(Option<&'a str>),
}

fn cell(row: &CanonicalRow, field: CanonicalField) -> Cell<'_> {
    match field {
        CanonicalField::Address => Cell::Text(row.address.as_deref()),
        CanonicalField::City => Cell::Text(row.city.as_deref()),
        CanonicalField::State => Cell::Text(row.state.as_deref()),
        CanonicalField::PostalCode => Cell::Text(row.postal_code.as_deref()),
        CanonicalField::Price => Cell::Money(row.price),
        CanonicalField::Beds => Cell::Count(row.beds),
        CanonicalField::Baths => Cell::Count(row.baths),
        CanonicalField::PropertyType => Cell::Text(row.property_type.as_deref()),
        CanonicalField::Url => Cell::Link(row.url.as_deref()),
    }
}

// Absent values leave the cell blank.
fn write_cell(
    worksheet: &mut Worksheet,
    r: u32,
    col: u16,
    row: &CanonicalRow,
    field: CanonicalField,
    price_format: &Format,
) -> Result<(), ReportError> {
    match cell(row, field) {
        Cell::Text(Some(text)) => {
            worksheet.write_string(r, col, text)?;
        }
        Cell::Count(Some(n)) => {
            worksheet.write_number(r, col, n)?;
        }
        Cell::Money(Some(price)) => {
            worksheet.write_number_with_format(r, col, price, price_format)?;
        }
        Cell::Link(Some(url)) => {
            // Links Excel will not accept are kept as plain text.
            if let Err(e) = worksheet.write_url(r, col, url) {
                warn!(url, "Writing link as text: {e}");
                worksheet.write_string(r, col, url)?;
            }
        }
        Cell::Text(None) | Cell::Count(None) | Cell::Money(None) | Cell::Link(None) => {}
    }
    Ok(())
}
