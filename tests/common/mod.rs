#![allow(dead_code)]

pub use metricdag_test_utils::init_tracing;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;
