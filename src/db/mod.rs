//! SQLite access with per-query logging.
//!
//! # Responsibilities
//! - Open the connection pool described by [`DatabaseConfig`]
//! - Run parameterized queries, returning rows as JSON objects
//! - Log every query under its own `query:<id>` logger
//!
//! # Design Decisions
//! - Rows are untyped JSON maps keyed by column name
//! - An in-memory database is pinned to one connection so all queries see
//!   the same data

pub mod locations;

use std::str::FromStr;
use std::time::Instant;

use serde_json::{Map, Number, Value};
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{query::Query, Column, Row, Sqlite, TypeInfo, ValueRef};

use crate::config::DatabaseConfig;
use crate::observability::{LoggerFactory, Palette};

pub use locations::{Location, LocationStore, SearchOptions, SqliteLocations, StoreError};

/// Path that selects a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// A value bound to a `?` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Text(String),
    Int(i64),
}

impl std::fmt::Display for Param {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Param::Text(text) => write!(f, "{text:?}"),
            Param::Int(value) => write!(f, "{value}"),
        }
    }
}

/// Connection pool plus the logger factory for queries.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    queries: LoggerFactory,
}

impl Database {
    /// Open the database at `config.path`, creating the file if needed.
    pub async fn connect(config: &DatabaseConfig, palette: &Palette) -> Result<Self, sqlx::Error> {
        let pool = if config.path == IN_MEMORY {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(SqliteConnectOptions::from_str("sqlite::memory:")?)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(
                    SqliteConnectOptions::new()
                        .filename(&config.path)
                        .create_if_missing(true),
                )
                .await?
        };

        Ok(Self::from_pool(pool, palette.factory("query")))
    }

    pub fn from_pool(pool: SqlitePool, queries: LoggerFactory) -> Self {
        Self { pool, queries }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run `sql` and collect every row.
    pub async fn fetch_all(
        &self,
        sql: &str,
        params: &[Param],
    ) -> Result<Vec<Map<String, Value>>, sqlx::Error> {
        let logger = self.queries.child();
        tracing::debug!(parent: logger.span(), "{sql}");
        tracing::trace!(
            parent: logger.span(),
            "[{}]",
            params.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
        );

        let start = Instant::now();
        let result = bind_all(sqlx::query(sql), params).fetch_all(&self.pool).await;
        tracing::debug!(parent: logger.span(), "Done in {}ms", start.elapsed().as_millis());

        let rows = result.inspect_err(|error| {
            tracing::error!(parent: logger.span(), error = %error, "Query failed");
        })?;
        tracing::trace!(parent: logger.span(), "{} row(s) returned", rows.len());

        rows.iter().map(row_to_json).collect()
    }

    /// Run a statement that returns no rows.
    pub async fn execute(&self, sql: &str, params: &[Param]) -> Result<u64, sqlx::Error> {
        let logger = self.queries.child();
        tracing::debug!(parent: logger.span(), "{sql}");

        let result = bind_all(sqlx::query(sql), params)
            .execute(&self.pool)
            .await
            .inspect_err(|error| {
                tracing::error!(parent: logger.span(), error = %error, "Statement failed");
            })?;
        Ok(result.rows_affected())
    }
}

fn bind_all<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &'q [Param],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for param in params {
        query = match param {
            Param::Text(text) => query.bind(text.as_str()),
            Param::Int(value) => query.bind(*value),
        };
    }
    query
}

fn row_to_json(row: &SqliteRow) -> Result<Map<String, Value>, sqlx::Error> {
    let mut object = Map::new();
    for column in row.columns() {
        let index = column.ordinal();
        let raw = row.try_get_raw(index)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            match raw.type_info().name() {
                "INTEGER" => Value::from(row.try_get::<i64, _>(index)?),
                "REAL" => Number::from_f64(row.try_get::<f64, _>(index)?)
                    .map_or(Value::Null, Value::Number),
                "BLOB" => Value::from(row.try_get::<Vec<u8>, _>(index)?),
                _ => Value::from(row.try_get::<String, _>(index)?),
            }
        };
        object.insert(column.name().to_string(), value);
    }
    Ok(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn memory() -> Database {
        let config = DatabaseConfig {
            path: IN_MEMORY.to_string(),
            ..DatabaseConfig::default()
        };
        Database::connect(&config, &Palette::plain()).await.unwrap()
    }

    #[tokio::test]
    async fn test_rows_become_json_objects() {
        let db = memory().await;
        db.execute("CREATE TABLE t (a TEXT, b INTEGER, c REAL, d TEXT)", &[])
            .await
            .unwrap();
        db.execute(
            "INSERT INTO t VALUES (?, ?, 1.5, NULL)",
            &[Param::Text("x".into()), Param::Int(7)],
        )
        .await
        .unwrap();

        let rows = db.fetch_all("SELECT * FROM t", &[]).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(
            Value::Object(rows[0].clone()),
            json!({"a": "x", "b": 7, "c": 1.5, "d": null})
        );
    }

    #[tokio::test]
    async fn test_in_memory_is_shared_across_queries() {
        let db = memory().await;
        db.execute("CREATE TABLE t (a TEXT)", &[]).await.unwrap();
        let rows = db.fetch_all("SELECT count(*) AS n FROM t", &[]).await.unwrap();
        assert_eq!(rows[0]["n"], json!(0));
    }

    #[tokio::test]
    async fn test_bad_sql_is_an_error() {
        let db = memory().await;
        assert!(db.fetch_all("SELECT * FROM missing", &[]).await.is_err());
    }

    #[test]
    fn test_param_display() {
        assert_eq!(Param::Text("lon%".into()).to_string(), "\"lon%\"");
        assert_eq!(Param::Int(100).to_string(), "100");
    }
}
