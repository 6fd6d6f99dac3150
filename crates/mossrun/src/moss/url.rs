use std::sync::LazyLock;

use regex::Regex;

static RE_REPORT_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://[A-Za-z0-9.\-]+(:\d+)?/results/(\d+/)?\d+/?$").unwrap()
});

/// Syntactic check that `url` looks like a MOSS report location.
///
/// Says nothing about whether the report is reachable.
pub fn is_valid_report_url(url: Option<&str>) -> bool {
    url.map(|u| RE_REPORT_URL.is_match(u.trim())).unwrap_or(false)
}
