//! End-to-end tests of the scanner system

pub mod auto_scan_test;
pub mod error_scenarios;
pub mod passive_scan_test;
