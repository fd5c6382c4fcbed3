pub mod report_xlsx;

pub use report_xlsx::write_report;
