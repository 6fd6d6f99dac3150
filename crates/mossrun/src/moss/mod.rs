//! Access to the MOSS similarity service.

pub mod client;
pub mod error;
pub mod report;
#[cfg(test)]
pub mod testing;
pub mod types;
pub mod url;

pub use client::{wire_name, MossClient};
pub use error::{FailureKind, MossError};
pub use report::{parse_index, parse_line_matches, ReportClient};
pub use types::{LineMatch, LineRange, RawMatch, Report, SubmissionRequest};
pub use self::url::is_valid_report_url;

/// Submits a batch and returns the location of the generated report.
///
/// Every call re-uploads the whole batch.
pub trait UrlGenerator: Send + Sync {
    fn generate_url(&self, request: &SubmissionRequest) -> Result<String, MossError>;
}

/// Turns a report location into structured matches.
pub trait ReportParser: Send + Sync {
    fn parse_report(&self, url: &str) -> Result<Report, MossError>;
}
