// crates/db/src/adhoc.rs
//! Execution of analyst-generated SQL into an untyped table.
//!
//! Only single `SELECT`/`WITH` statements are accepted, and they run on a
//! connection switched to `query_only` for the duration of the call. A
//! connection that cannot be switched back is closed, never reused.

use async_trait::async_trait;
use serde_json::{Number, Value};
use sqlx::pool::PoolConnection;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, Sqlite, TypeInfo, ValueRef};

use retail_hub_core::chat::{QueryError, QueryRunner};
use retail_hub_core::Table;

use crate::{Database, DbError, DbResult};

/// Reject anything but a single read statement.
///
/// Returns the statement without its trailing semicolon.
pub fn check_read_only(statement: &str) -> DbResult<&str> {
    let trimmed = statement.trim();
    let (head, tail) = match statement_end(trimmed) {
        Some(i) => (&trimmed[..i], &trimmed[i + 1..]),
        None => (trimmed, ""),
    };
    let head = head.trim_end();
    if head.is_empty() {
        return Err(DbError::Rejected("empty statement".into()));
    }
    if !tail.trim_matches(|c: char| c == ';' || c.is_whitespace()).is_empty() {
        return Err(DbError::Rejected("multiple statements are not allowed".into()));
    }
    let first = head
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase();
    if first != "SELECT" && first != "WITH" {
        return Err(DbError::Rejected(format!(
            "only SELECT queries may be run, got {first}"
        )));
    }
    Ok(head)
}

/// Byte offset of the first `;` outside string literals, quoted
/// identifiers and comments.
fn statement_end(sql: &str) -> Option<usize> {
    let bytes = sql.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b';' => return Some(i),
            // A doubled quote closes and reopens, which skips it correctly.
            quote @ (b'\'' | b'"' | b'`') => {
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    i += 1;
                }
            }
            b'[' => {
                while i < bytes.len() && bytes[i] != b']' {
                    i += 1;
                }
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i < bytes.len() && !(bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/')) {
                    i += 1;
                }
                i += 1;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// A pooled connection switched to `query_only`.
///
/// Unless [`ReadOnlyConn::release`] switches it back, dropping the guard
/// closes the connection instead of returning it to the pool.
struct ReadOnlyConn {
    conn: PoolConnection<Sqlite>,
    writable: bool,
}

impl ReadOnlyConn {
    async fn acquire(db: &Database) -> DbResult<Self> {
        let mut guard = Self {
            conn: db.pool().acquire().await?,
            writable: false,
        };
        sqlx::query("PRAGMA query_only = ON")
            .execute(&mut *guard.conn)
            .await?;
        Ok(guard)
    }

    async fn fetch_all(&mut self, sql: &str) -> Result<Vec<SqliteRow>, sqlx::Error> {
        sqlx::query(sql).fetch_all(&mut *self.conn).await
    }

    async fn release(mut self) -> DbResult<()> {
        sqlx::query("PRAGMA query_only = OFF")
            .execute(&mut *self.conn)
            .await?;
        self.writable = true;
        Ok(())
    }
}

impl Drop for ReadOnlyConn {
    fn drop(&mut self) {
        if !self.writable {
            tracing::debug!("closing connection left in query_only mode");
            self.conn.close_on_drop();
        }
    }
}

impl Database {
    /// Run a read-only statement and collect every row.
    pub async fn run_read_only(&self, statement: &str) -> DbResult<Table> {
        let sql = check_read_only(statement)?;
        let mut conn = ReadOnlyConn::acquire(self).await?;
        let result = conn.fetch_all(sql).await;
        conn.release().await?;
        let rows = result?;

        let mut table = Table::new(match rows.first() {
            Some(row) => row.columns().iter().map(|c| c.name().to_string()).collect(),
            None => Vec::new(),
        });
        for row in &rows {
            table.rows.push(row_values(row)?);
        }
        tracing::debug!(rows = table.row_count(), "ad-hoc query complete");
        Ok(table)
    }
}

#[async_trait]
impl QueryRunner for Database {
    async fn run_sql(&self, statement: &str) -> Result<Table, QueryError> {
        self.run_read_only(statement).await.map_err(|e| match e {
            DbError::Rejected(reason) => QueryError::Rejected(reason),
            other => QueryError::Failed(other.to_string()),
        })
    }
}

fn row_values(row: &SqliteRow) -> DbResult<Vec<Value>> {
    (0..row.len()).map(|i| cell(row, i)).collect()
}

fn cell(row: &SqliteRow, i: usize) -> DbResult<Value> {
    let raw = row.try_get_raw(i)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let type_name = raw.type_info().name().to_ascii_uppercase();
    let value = match type_name.as_str() {
        "INTEGER" | "INT" | "INT8" | "BIGINT" | "BOOLEAN" => {
            Value::from(row.try_get_unchecked::<i64, _>(i)?)
        }
        "REAL" | "FLOAT" | "DOUBLE" | "NUMERIC" => Number::from_f64(row.try_get_unchecked::<f64, _>(i)?)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        "BLOB" => Value::String(format!(
            "<{} bytes>",
            row.try_get_unchecked::<Vec<u8>, _>(i)?.len()
        )),
        _ => Value::String(row.try_get_unchecked::<String, _>(i)?),
    };
    Ok(value)
}
