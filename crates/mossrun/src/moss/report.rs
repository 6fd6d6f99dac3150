//! Fetching and parsing of MOSS HTML reports.

use std::sync::LazyLock;
use std::time::Duration;

use log::debug;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::error::MossError;
use super::types::{LineMatch, LineRange, RawMatch, Report};
use super::ReportParser;
use crate::config::MossConfig;

static RE_NAME_PERCENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<name>.+) \((?P<pct>\d+(?:\.\d+)?)%\)$").unwrap());

static RE_LINE_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<start>\d+)-(?P<end>\d+)$").unwrap());

/// One row of the report index, before line details are fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub first_name: String,
    pub first_percentage: f64,
    pub second_name: String,
    pub second_percentage: f64,
    pub lines_matched: u32,
    /// Link to the side-by-side match page (`matchN.html`).
    pub href: String,
}

/// Parses the index page of a report into its match rows.
///
/// A page without a table is an error; a table with no data rows is a
/// valid report with zero matches.
pub fn parse_index(html: &str) -> Result<Vec<IndexEntry>, MossError> {
    let document = Html::parse_document(html);
    let table_sel = selector("table")?;
    let row_sel = selector("tr")?;
    let cell_sel = selector("td")?;
    let link_sel = selector("a")?;

    let table = document
        .select(&table_sel)
        .next()
        .ok_or_else(|| MossError::fatal("report has no match table"))?;

    let mut entries = Vec::new();
    for (index, row) in table.select(&row_sel).enumerate() {
        let cells: Vec<ElementRef> = row.select(&cell_sel).collect();
        if cells.is_empty() {
            // Header row uses <th>.
            continue;
        }
        if cells.len() != 3 {
            return Err(MossError::fatal(format!(
                "report row {} has {} cells, expected 3",
                index,
                cells.len()
            )));
        }

        let (first_name, first_percentage) = name_and_percentage(&cells[0], index)?;
        let (second_name, second_percentage) = name_and_percentage(&cells[1], index)?;

        let lines_text = cell_text(&cells[2]);
        let lines_matched = lines_text.parse::<u32>().map_err(|_| {
            MossError::fatal(format!(
                "report row {} has invalid line count '{}'",
                index, lines_text
            ))
        })?;

        let href = cells[0]
            .select(&link_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
            .ok_or_else(|| MossError::fatal(format!("report row {} has no match link", index)))?
            .to_string();

        entries.push(IndexEntry {
            first_name,
            first_percentage,
            second_name,
            second_percentage,
            lines_matched,
            href,
        });
    }

    Ok(entries)
}

/// Parses the `matchN-top.html` frame into line ranges, in report order.
pub fn parse_line_matches(html: &str) -> Result<Vec<LineMatch>, MossError> {
    let document = Html::parse_document(html);
    let row_sel = selector("tr")?;
    let cell_sel = selector("td")?;

    let mut matches = Vec::new();
    for row in document.select(&row_sel) {
        let ranges: Vec<LineRange> = row
            .select(&cell_sel)
            .filter_map(|cell| parse_range(&cell_text(&cell)))
            .collect();

        match ranges.as_slice() {
            [] => continue,
            [first, second] => matches.push(LineMatch {
                first: *first,
                second: *second,
            }),
            other => {
                return Err(MossError::fatal(format!(
                    "match detail row has {} line ranges, expected 2",
                    other.len()
                )))
            }
        }
    }

    Ok(matches)
}

/// Location of the line-range frame for a match page link.
pub fn top_page_url(report: &Url, href: &str) -> Result<Url, MossError> {
    let page = report
        .join(href)
        .map_err(|e| MossError::fatal(format!("invalid match link '{}': {}", href, e)))?;

    let path = page.path();
    let top = match path.strip_suffix(".html") {
        Some(stem) => format!("{}-top.html", stem),
        None => return Err(MossError::fatal(format!("unexpected match link '{}'", href))),
    };

    let mut top_url = page.clone();
    top_url.set_path(&top);
    top_url.set_fragment(None);
    Ok(top_url)
}

fn selector(css: &str) -> Result<Selector, MossError> {
    Selector::parse(css).map_err(|e| MossError::unclassified(format!("bad selector '{}': {}", css, e)))
}

fn cell_text(cell: &ElementRef) -> String {
    cell.text().collect::<String>().trim().to_string()
}

fn name_and_percentage(cell: &ElementRef, row: usize) -> Result<(String, f64), MossError> {
    let text = cell_text(cell);
    let caps = RE_NAME_PERCENT.captures(&text).ok_or_else(|| {
        MossError::fatal(format!("report row {} has malformed entry '{}'", row, text))
    })?;

    let pct: f64 = caps["pct"]
        .parse()
        .map_err(|_| MossError::fatal(format!("report row {} has invalid percentage", row)))?;
    if !(0.0..=100.0).contains(&pct) {
        return Err(MossError::fatal(format!(
            "report row {} has percentage {} out of range",
            row, pct
        )));
    }

    Ok((caps["name"].trim().to_string(), pct))
}

fn parse_range(text: &str) -> Option<LineRange> {
    let caps = RE_LINE_RANGE.captures(text)?;
    Some(LineRange {
        start: caps["start"].parse().ok()?,
        end: caps["end"].parse().ok()?,
    })
}

/// Fetches reports over HTTP and turns them into [`Report`]s.
pub struct ReportClient {
    http: reqwest::blocking::Client,
}

impl ReportClient {
    pub fn new(timeout: Duration) -> Result<Self, MossError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MossError::unclassified(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { http })
    }

    pub fn from_config(config: &MossConfig) -> Result<Self, MossError> {
        Self::new(Duration::from_secs(config.http_timeout_secs))
    }

    fn fetch(&self, url: &Url) -> Result<String, MossError> {
        let response = self
            .http
            .get(url.clone())
            .send()
            .map_err(|e| MossError::from_http(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MossError::from_status(status, url.as_str()));
        }
        response.text().map_err(|e| MossError::from_http(&e))
    }
}

impl ReportParser for ReportClient {
    fn parse_report(&self, url: &str) -> Result<Report, MossError> {
        let mut base = Url::parse(url.trim())
            .map_err(|e| MossError::fatal(format!("invalid report URL '{}': {}", url, e)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let index = self.fetch(&base)?;
        let entries = parse_index(&index)?;
        debug!("Report {} lists {} matches", url, entries.len());

        let mut matches = Vec::with_capacity(entries.len());
        for entry in entries {
            let top_url = top_page_url(&base, &entry.href)?;
            let line_matches = parse_line_matches(&self.fetch(&top_url)?)?;

            matches.push(RawMatch {
                first_name: entry.first_name,
                second_name: entry.second_name,
                first_percentage: entry.first_percentage,
                second_percentage: entry.second_percentage,
                lines_matched: entry.lines_matched,
                line_matches,
            });
        }

        Ok(Report {
            url: url.trim().to_string(),
            matches,
        })
    }
}
