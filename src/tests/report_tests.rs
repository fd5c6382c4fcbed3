use crate::domain::{normalize_all, CanonicalField, CanonicalRow, ListingBatch};
use crate::sources::RawListing;
use crate::spreadsheets::write_report;
use crate::tests::utils::{sample_field_map, sample_listing, SheetContents};
use serde_json::json;

fn sample_batch(count: usize) -> ListingBatch {
    let raws: Vec<RawListing> = (0..count).map(|i| sample_listing(i).into()).collect();
    normalize_all(&raws, &sample_field_map())
}

#[test]
fn one_header_row_plus_one_row_per_listing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.xlsx");

    let written = write_report(&sample_batch(25), Some(&path)).unwrap();

    assert_eq!(written.as_deref(), Some(path.as_path()));
    let sheet = SheetContents::read(&path);
    assert_eq!(sheet.row_count(), 26);
}

#[test]
fn headers_follow_canonical_column_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.xlsx");
    write_report(&sample_batch(1), Some(&path)).unwrap();

    let expected: Vec<String> = CanonicalField::ALL
        .iter()
        .map(|f| f.header().to_string())
        .collect();
    assert_eq!(SheetContents::read(&path).headers(), expected);
}

#[test]
fn values_land_under_their_headers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.xlsx");
    write_report(&sample_batch(3), Some(&path)).unwrap();

    let sheet = SheetContents::read(&path);
    assert_eq!(sheet.cell("A2").as_deref(), Some("0 Lakeview Dr"));
    assert_eq!(sheet.cell("B2").as_deref(), Some("Sebring"));
    assert_eq!(sheet.cell("C2").as_deref(), Some("FL"));
    assert_eq!(sheet.cell("D2").as_deref(), Some("33870"));
    assert_eq!(sheet.cell("E2").as_deref(), Some("200000"));
    assert_eq!(sheet.cell("F2").as_deref(), Some("3"));
    assert_eq!(sheet.cell("G2").as_deref(), Some("2"));
    assert_eq!(sheet.cell("H2").as_deref(), Some("Multi Family"));
    assert_eq!(
        sheet.cell("I2").as_deref(),
        Some("https://www.realtor.com/realestateandhomes-detail/0-Lakeview-Dr_Sebring_FL_33870_M0")
    );

    // third listing, second data row after it
    assert_eq!(sheet.cell("A4").as_deref(), Some("2 Lakeview Dr"));
    assert_eq!(sheet.cell("E4").as_deref(), Some("202000"));
}

#[test]
fn missing_fields_leave_blank_cells() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.xlsx");

    let sparse = json!({ "location": { "address": { "line": "7 Pine Ave" } }, "list_price": null });
    let batch = normalize_all(&[RawListing::from(sparse)], &sample_field_map());
    write_report(&batch, Some(&path)).unwrap();

    let sheet = SheetContents::read(&path);
    assert_eq!(sheet.row_count(), 2);
    assert_eq!(sheet.cell("A2").as_deref(), Some("7 Pine Ave"));
    for col in ['B', 'C', 'D', 'E', 'F', 'G', 'H', 'I'] {
        assert_eq!(sheet.cell(&format!("{col}2")), None, "column {col}");
    }
}

#[test]
fn duplicates_are_written_twice() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.xlsx");

    let row = CanonicalRow {
        address: Some("12 Lake Dr".to_string()),
        price: Some(250_000.0),
        ..Default::default()
    };
    let batch: ListingBatch = vec![row.clone(), row].into_iter().collect();
    write_report(&batch, Some(&path)).unwrap();

    let sheet = SheetContents::read(&path);
    assert_eq!(sheet.row_count(), 3);
    assert_eq!(sheet.cell("A3").as_deref(), Some("12 Lake Dr"));
}

#[test]
fn unsupported_link_is_written_as_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.xlsx");

    let odd = CanonicalRow {
        address: Some("5 Palm Ct".to_string()),
        url: Some("tel:8635551234".to_string()),
        ..Default::default()
    };
    let batch: ListingBatch = vec![odd].into_iter().chain(sample_batch(1).rows().to_vec()).collect();

    let written = write_report(&batch, Some(&path)).unwrap();

    assert!(written.is_some());
    let sheet = SheetContents::read(&path);
    assert_eq!(sheet.row_count(), 3);
    assert_eq!(sheet.cell("I2").as_deref(), Some("tel:8635551234"));
    assert_eq!(sheet.cell("A3").as_deref(), Some("0 Lakeview Dr"));
}

#[test]
fn cell_lookup_does_not_confuse_row_prefixes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.xlsx");
    write_report(&sample_batch(12), Some(&path)).unwrap();

    let sheet = SheetContents::read(&path);
    assert_eq!(sheet.cell("A10").as_deref(), Some("8 Lakeview Dr"));
    assert_eq!(sheet.cell("A1").as_deref(), Some("Address"));
    assert_eq!(sheet.cell("A13").as_deref(), Some("11 Lakeview Dr"));
    assert_eq!(sheet.cell("A14"), None);
}

#[test]
fn empty_batch_writes_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.xlsx");

    let written = write_report(&ListingBatch::default(), Some(&path)).unwrap();

    assert!(written.is_none());
    assert!(!path.exists());
}

#[test]
fn missing_parent_directories_are_created() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("weekly").join("2024").join("report.xlsx");

    write_report(&sample_batch(2), Some(&path)).unwrap();

    assert!(path.exists());
}

#[test]
fn rerun_overwrites_previous_report() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.xlsx");

    write_report(&sample_batch(10), Some(&path)).unwrap();
    write_report(&sample_batch(4), Some(&path)).unwrap();

    assert_eq!(SheetContents::read(&path).row_count(), 5);
}
