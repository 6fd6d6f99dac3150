//! Job repository. Status changes go through guarded updates so that a
//! job is claimed once and reaches a terminal state once.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{Database, DatabaseError};
use crate::jobs::model::JobStatus;

/// A raw job row from the database.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRow {
    pub job_id: String,
    pub user_id: i64,
    pub language: String,
    pub max_until_ignored: u32,
    pub max_displayed_matches: u32,
    pub comment: Option<String>,
    pub status: String,
    pub created_at: String,
    pub start_date: Option<String>,
    pub completion_date: Option<String>,
    pub error: Option<String>,
}

impl JobRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            job_id: row.get("job_id")?,
            user_id: row.get("user_id")?,
            language: row.get("language")?,
            max_until_ignored: row.get("max_until_ignored")?,
            max_displayed_matches: row.get("max_displayed_matches")?,
            comment: row.get("comment")?,
            status: row.get("status")?,
            created_at: row.get("created_at")?,
            start_date: row.get("start_date")?,
            completion_date: row.get("completion_date")?,
            error: row.get("error")?,
        })
    }
}

/// Inserts a new job row.
pub fn insert(db: &Database, job: &JobRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO jobs (job_id, user_id, language, max_until_ignored,
             max_displayed_matches, comment, status, created_at, start_date,
             completion_date, error)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                job.job_id,
                job.user_id,
                job.language,
                job.max_until_ignored,
                job.max_displayed_matches,
                job.comment,
                job.status,
                job.created_at,
                job.start_date,
                job.completion_date,
                job.error,
            ],
        )?;
        Ok(())
    })
}

/// Finds a job by its ID.
pub fn find_by_id(db: &Database, job_id: &str) -> Result<Option<JobRow>, DatabaseError> {
    db.with_conn(|conn| {
        let row = conn
            .query_row(
                "SELECT * FROM jobs WHERE job_id = ?1",
                params![job_id],
                JobRow::from_row,
            )
            .optional()?;
        Ok(row)
    })
}

/// Moves a queued job to processing and stamps its start date.
///
/// Returns `false` when the job is missing or not queued; nothing changes then.
pub fn claim(db: &Database, job_id: &str, start_date: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE jobs SET status = ?2, start_date = ?3
             WHERE job_id = ?1 AND status = ?4",
            params![
                job_id,
                JobStatus::Processing.as_str(),
                start_date,
                JobStatus::Queued.as_str()
            ],
        )?;
        Ok(changed == 1)
    })
}

/// Terminal transition to `failed`, recording the reason.
pub fn mark_failed(
    db: &Database,
    job_id: &str,
    completion_date: &str,
    error: &str,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| finish(conn, job_id, JobStatus::Failed, completion_date, Some(error)))
}

/// Terminal transition on an open connection or transaction.
///
/// Only a processing job without a completion date is updated, so the
/// completion date is written at most once.
pub fn finish(
    conn: &Connection,
    job_id: &str,
    status: JobStatus,
    completion_date: &str,
    error: Option<&str>,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE jobs SET status = ?2, completion_date = ?3, error = ?4
         WHERE job_id = ?1 AND status = ?5 AND completion_date IS NULL",
        params![
            job_id,
            status.as_str(),
            completion_date,
            error,
            JobStatus::Processing.as_str()
        ],
    )?;
    Ok(changed == 1)
}

/// IDs of jobs with the given status, oldest first.
pub fn list_ids_by_status(db: &Database, status: JobStatus) -> Result<Vec<String>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt =
            conn.prepare("SELECT job_id FROM jobs WHERE status = ?1 ORDER BY created_at ASC")?;
        let ids = stmt
            .query_map(params![status.as_str()], |r| r.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    })
}

/// Counts jobs with the given status.
pub fn count_by_status(db: &Database, status: JobStatus) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM jobs WHERE status = ?1",
            params![status.as_str()],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}
