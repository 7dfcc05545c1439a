use std::collections::HashMap;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row, SqlitePool, TypeInfo, ValueRef};

use crate::db::models::SampleRow;
use crate::error::{AppError, Result};
use crate::types::MarketDataset;

/// A positional parameter for `run_sql`, covering SQLite's storage classes.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    Null,
}

/// How many rows a SELECT should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    All,
    One,
}

#[derive(Debug)]
pub enum SqlOutcome {
    /// SELECT with `FetchMode::All`.
    Rows(Vec<HashMap<String, SqlValue>>),
    /// SELECT with `FetchMode::One`.
    Row(Option<HashMap<String, SqlValue>>),
    /// Any write statement: affected-row count.
    Affected(u64),
}

/// Append-only store for flattened trade-history rows.
pub struct HistoryStore {
    pool: SqlitePool,
}

impl HistoryStore {
    /// Open (or create) the SQLite database at `db_path`. The pipeline is a
    /// single sequential writer, so one connection is enough — this also
    /// keeps `:memory:` databases coherent.
    pub async fn connect(db_path: &str) -> Result<Self> {
        let opts = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the samples table if absent. Never alters an existing schema.
    pub async fn ensure_schema(&self, table: &str) -> Result<()> {
        let table = checked_table_name(table)?;
        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                event_title TEXT,
                question TEXT,
                price REAL,
                timestamp TEXT
            )"
        );
        sqlx::query(&ddl).execute(&self.pool).await?;
        Ok(())
    }

    /// Append one dataset: one row per sample, event title and question
    /// repeated, timestamp rendered as text, all in one transaction. There
    /// is no uniqueness constraint — re-appending the same dataset
    /// duplicates rows (append-only log semantics).
    pub async fn append(&self, table: &str, dataset: &MarketDataset) -> Result<u64> {
        let table = checked_table_name(table)?;
        let sql = format!(
            "INSERT INTO {table} (event_title, question, price, timestamp) VALUES (?, ?, ?, ?)"
        );

        let mut tx = self.pool.begin().await?;
        for sample in &dataset.samples {
            sqlx::query(&sql)
                .bind(&dataset.event_title)
                .bind(&dataset.question)
                .bind(sample.price)
                .bind(sample.timestamp.to_string())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        Ok(dataset.samples.len() as u64)
    }

    /// Run an arbitrary parameterized statement. SELECTs return row maps per
    /// `fetch`; everything else returns the affected-row count.
    pub async fn run_sql(
        &self,
        sql: &str,
        params: &[SqlValue],
        fetch: FetchMode,
    ) -> Result<SqlOutcome> {
        let is_select = sql.trim_start().to_ascii_lowercase().starts_with("select");

        let mut query = sqlx::query(sql);
        for p in params {
            query = match p {
                SqlValue::Integer(v) => query.bind(*v),
                SqlValue::Real(v) => query.bind(*v),
                SqlValue::Text(v) => query.bind(v.clone()),
                SqlValue::Blob(v) => query.bind(v.clone()),
                SqlValue::Null => query.bind(Option::<String>::None),
            };
        }

        if is_select {
            match fetch {
                FetchMode::One => {
                    let row = query.fetch_optional(&self.pool).await?;
                    Ok(SqlOutcome::Row(row.map(|r| row_to_map(&r)).transpose()?))
                }
                FetchMode::All => {
                    let rows = query.fetch_all(&self.pool).await?;
                    let maps = rows.iter().map(row_to_map).collect::<Result<Vec<_>>>()?;
                    Ok(SqlOutcome::Rows(maps))
                }
            }
        } else {
            let done = query.execute(&self.pool).await?;
            Ok(SqlOutcome::Affected(done.rows_affected()))
        }
    }

    /// Read back persisted rows in insertion order.
    pub async fn fetch_samples(&self, table: &str, limit: i64) -> Result<Vec<SampleRow>> {
        let table = checked_table_name(table)?;
        let sql = format!(
            "SELECT id, event_title, question, price, timestamp FROM {table} ORDER BY id LIMIT ?"
        );
        let rows = sqlx::query_as::<_, SampleRow>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn count_rows(&self, table: &str) -> Result<i64> {
        let table = checked_table_name(table)?;
        let sql = format!("SELECT COUNT(*) FROM {table}");
        let (count,): (i64,) = sqlx::query_as(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }
}

/// Table names are interpolated into SQL text, so restrict them to
/// identifier characters before use.
fn checked_table_name(name: &str) -> Result<&str> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(name)
    } else {
        Err(AppError::Config(format!("invalid table name '{name}'")))
    }
}

fn row_to_map(row: &SqliteRow) -> Result<HashMap<String, SqlValue>> {
    let mut map = HashMap::with_capacity(row.columns().len());
    for col in row.columns() {
        let i = col.ordinal();
        let raw = row.try_get_raw(i)?;
        let value = if raw.is_null() {
            SqlValue::Null
        } else {
            match raw.type_info().name() {
                "INTEGER" | "BOOLEAN" => SqlValue::Integer(row.try_get::<i64, _>(i)?),
                "REAL" => SqlValue::Real(row.try_get::<f64, _>(i)?),
                "BLOB" => SqlValue::Blob(row.try_get::<Vec<u8>, _>(i)?),
                _ => SqlValue::Text(row.try_get::<String, _>(i)?),
            }
        };
        map.insert(col.name().to_string(), value);
    }
    Ok(map)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
