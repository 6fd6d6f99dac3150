//! Scripted service doubles for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use super::error::MossError;
use super::types::{RawMatch, Report, SubmissionRequest};
use super::{ReportParser, UrlGenerator};

pub const URL: &str = "http://moss.stanford.edu/results/1/123456789";

/// Replays a fixed list of answers, one per call.
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<String, MossError>>>,
    requests: Mutex<Vec<SubmissionRequest>>,
}

impl ScriptedGenerator {
    pub fn new(script: Vec<Result<String, MossError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn ok() -> Self {
        Self::new(vec![Ok(URL.to_string())])
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<SubmissionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl UrlGenerator for ScriptedGenerator {
    fn generate_url(&self, request: &SubmissionRequest) -> Result<String, MossError> {
        self.requests.lock().unwrap().push(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(MossError::unclassified("generator script exhausted")))
    }
}

pub struct ScriptedParser {
    script: Mutex<VecDeque<Result<Report, MossError>>>,
    urls: Mutex<Vec<String>>,
}

impl ScriptedParser {
    pub fn new(script: Vec<Result<Report, MossError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            urls: Mutex::new(Vec::new()),
        }
    }

    pub fn returning(matches: Vec<RawMatch>) -> Self {
        Self::new(vec![Ok(report(matches))])
    }

    pub fn calls(&self) -> usize {
        self.urls.lock().unwrap().len()
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

impl ReportParser for ScriptedParser {
    fn parse_report(&self, url: &str) -> Result<Report, MossError> {
        self.urls.lock().unwrap().push(url.to_string());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(MossError::unclassified("parser script exhausted")))
    }
}

pub fn report(matches: Vec<RawMatch>) -> Report {
    Report {
        url: URL.to_string(),
        matches,
    }
}

pub fn raw_match(first: &str, second: &str) -> RawMatch {
    RawMatch {
        first_name: first.to_string(),
        second_name: second.to_string(),
        first_percentage: 44.0,
        second_percentage: 43.0,
        lines_matched: 12,
        line_matches: Vec::new(),
    }
}
