//! User repository. Users only carry their MOSS account identifier.

use rusqlite::{params, OptionalExtension};

use super::{Database, DatabaseError};

#[derive(Debug, Clone, PartialEq)]
pub struct UserRow {
    pub id: i64,
    pub moss_id: String,
}

/// Inserts a user and returns its row id.
pub fn insert(db: &Database, moss_id: &str) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| {
        conn.execute("INSERT INTO users (moss_id) VALUES (?1)", params![moss_id])?;
        Ok(conn.last_insert_rowid())
    })
}

pub fn find_by_id(db: &Database, id: i64) -> Result<Option<UserRow>, DatabaseError> {
    db.with_conn(|conn| {
        let row = conn
            .query_row(
                "SELECT id, moss_id FROM users WHERE id = ?1",
                params![id],
                |r| {
                    Ok(UserRow {
                        id: r.get(0)?,
                        moss_id: r.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    })
}
