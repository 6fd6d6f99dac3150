//! Scripted implementations of the MOSS service traits.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use mossrun::moss::{MossError, RawMatch, Report, ReportParser, SubmissionRequest, UrlGenerator};

pub const REPORT_URL: &str = "http://moss.stanford.edu/results/3/918273645";

/// Answers `generate_url` from a fixed script and records every request.
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

    /// Succeeds once with [`REPORT_URL`].
    pub fn succeeding() -> Self {
        Self::new(vec![Ok(REPORT_URL.to_string())])
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<SubmissionRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

impl UrlGenerator for ScriptedGenerator {
    fn generate_url(&self, request: &SubmissionRequest) -> Result<String, MossError> {
        self.requests.lock().unwrap().push(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(MossError::unclassified("no scripted URL left")))
    }
}

/// Answers `parse_report` from a fixed script.
pub struct ScriptedParser {
    script: Mutex<VecDeque<Result<Vec<RawMatch>, MossError>>>,
    calls: Mutex<usize>,
}

impl ScriptedParser {
    pub fn new(script: Vec<Result<Vec<RawMatch>, MossError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(0),
        }
    }

    pub fn returning(matches: Vec<RawMatch>) -> Self {
        Self::new(vec![Ok(matches)])
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl ReportParser for ScriptedParser {
    fn parse_report(&self, url: &str) -> Result<Report, MossError> {
        *self.calls.lock().unwrap() += 1;
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(MossError::unclassified("no scripted report left")))?;
        Ok(Report {
            url: url.to_string(),
            matches: next,
        })
    }
}

pub fn raw_match(first: &str, second: &str, first_pct: f64, second_pct: f64) -> RawMatch {
    RawMatch {
        first_name: first.to_string(),
        second_name: second.to_string(),
        first_percentage: first_pct,
        second_percentage: second_pct,
        lines_matched: 20,
        line_matches: Vec::new(),
    }
}
