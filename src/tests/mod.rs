mod report_tests;
pub mod utils;
