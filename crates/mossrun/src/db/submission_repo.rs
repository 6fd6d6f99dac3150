use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DatabaseError};

#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionRow {
    pub id: i64,
    pub job_id: String,
    /// Identifier unique within the job; MOSS reports refer to it.
    pub submission_id: String,
    /// Upload directory the file lives in (`base_files` or `files`).
    pub file_type: String,
    pub name: String,
    pub file_path: String,
}

impl SubmissionRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            job_id: row.get("job_id")?,
            submission_id: row.get("submission_id")?,
            file_type: row.get("file_type")?,
            name: row.get("name")?,
            file_path: row.get("file_path")?,
        })
    }
}

/// Inserts a submission and returns its row id. `row.id` is ignored.
pub fn insert(db: &Database, row: &SubmissionRow) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO submissions (job_id, submission_id, file_type, name, file_path)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                row.job_id,
                row.submission_id,
                row.file_type,
                row.name,
                row.file_path
            ],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

/// All submissions of a job, in insertion order.
pub fn list_for_job(db: &Database, job_id: &str) -> Result<Vec<SubmissionRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM submissions WHERE job_id = ?1 ORDER BY id")?;
        let rows = stmt
            .query_map(params![job_id], SubmissionRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

pub fn find(
    db: &Database,
    job_id: &str,
    submission_id: &str,
) -> Result<Option<SubmissionRow>, DatabaseError> {
    db.with_conn(|conn| {
        let row = conn
            .query_row(
                "SELECT * FROM submissions WHERE job_id = ?1 AND submission_id = ?2",
                params![job_id, submission_id],
                SubmissionRow::from_row,
            )
            .optional()?;
        Ok(row)
    })
}
