//! Analysis results and their matches.

use rusqlite::{params, OptionalExtension, Row};

use super::{job_repo, Database, DatabaseError};
use crate::jobs::model::JobStatus;
use crate::moss::LineMatch;

#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub id: i64,
    pub job_id: String,
    pub url: String,
    pub created_at: String,
}

/// A match ready to be stored; submissions are referenced by row id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMatch {
    pub first_submission: i64,
    pub second_submission: i64,
    pub first_percentage: f64,
    pub second_percentage: f64,
    pub lines_matched: u32,
    pub line_matches: Vec<LineMatch>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchRow {
    pub id: i64,
    pub result_id: i64,
    pub first_submission: i64,
    pub second_submission: i64,
    pub first_percentage: f64,
    pub second_percentage: f64,
    pub lines_matched: u32,
    pub line_matches: Vec<LineMatch>,
}

/// Stores the result, all of its matches and the `completed` transition in
/// one transaction. Nothing is written unless the job is still processing.
pub fn complete_job(
    db: &Database,
    job_id: &str,
    url: &str,
    matches: &[NewMatch],
    completion_date: &str,
) -> Result<i64, DatabaseError> {
    db.with_transaction(|tx| {
        if !job_repo::finish(tx, job_id, JobStatus::Completed, completion_date, None)? {
            return Err(DatabaseError::Conflict(format!(
                "job {} is not processing",
                job_id
            )));
        }

        tx.execute(
            "INSERT INTO analysis_results (job_id, url, created_at) VALUES (?1, ?2, ?3)",
            params![job_id, url, completion_date],
        )?;
        let result_id = tx.last_insert_rowid();

        let mut stmt = tx.prepare(
            "INSERT INTO matches (result_id, first_submission, second_submission,
             first_percentage, second_percentage, lines_matched, line_matches)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for m in matches {
            stmt.execute(params![
                result_id,
                m.first_submission,
                m.second_submission,
                m.first_percentage,
                m.second_percentage,
                m.lines_matched,
                serde_json::to_string(&m.line_matches)?,
            ])?;
        }

        Ok(result_id)
    })
}

pub fn find_by_job(db: &Database, job_id: &str) -> Result<Option<ResultRow>, DatabaseError> {
    db.with_conn(|conn| {
        let row = conn
            .query_row(
                "SELECT id, job_id, url, created_at FROM analysis_results WHERE job_id = ?1",
                params![job_id],
                |r| {
                    Ok(ResultRow {
                        id: r.get(0)?,
                        job_id: r.get(1)?,
                        url: r.get(2)?,
                        created_at: r.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    })
}

pub fn matches_for_result(db: &Database, result_id: i64) -> Result<Vec<MatchRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM matches WHERE result_id = ?1 ORDER BY id")?;
        let raw = stmt
            .query_map(params![result_id], raw_match_row)?
            .collect::<Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(|(mut row, json)| {
                row.line_matches = serde_json::from_str(&json)?;
                Ok::<_, DatabaseError>(row)
            })
            .collect()
    })
}

fn raw_match_row(row: &Row<'_>) -> Result<(MatchRow, String), rusqlite::Error> {
    Ok((
        MatchRow {
            id: row.get("id")?,
            result_id: row.get("result_id")?,
            first_submission: row.get("first_submission")?,
            second_submission: row.get("second_submission")?,
            first_percentage: row.get("first_percentage")?,
            second_percentage: row.get("second_percentage")?,
            lines_matched: row.get("lines_matched")?,
            line_matches: Vec::new(),
        },
        row.get("line_matches")?,
    ))
}
