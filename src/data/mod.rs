//! Data domain: examples, stream schema and stream sources.

pub mod domain;
pub mod repo_fs;
pub mod service;

pub use domain::{Example, ExampleStream, StreamHeader};
pub use repo_fs::CsvFileStream;
pub use service::VecStream;
