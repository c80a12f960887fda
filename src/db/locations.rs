//! Location search over the geonames table.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::db::{Database, Param};

/// Rows returned when no limit is requested.
pub const DEFAULT_LIMIT: u32 = 100;

/// Every column of the locations table, in schema order.
pub const LOCATION_COLUMNS: [&str; 19] = [
    "geonameid",
    "name",
    "asciiname",
    "alternatenames",
    "latitude",
    "longitude",
    "feature_class",
    "feature_code",
    "country_code",
    "cc2",
    "admin1_code",
    "admin2_code",
    "admin3_code",
    "admin4_code",
    "population",
    "elevation",
    "dem",
    "timezone",
    "modification_date",
];

/// A location row keyed by column name.
pub type Location = Map<String, Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unknown location field: {0}")]
    UnknownField(String),

    #[error(transparent)]
    Sql(#[from] sqlx::Error),
}

/// Options for [`LocationStore::search`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOptions {
    /// Columns to return; empty means all of them.
    pub fields: Vec<String>,
    /// Defaults to [`DEFAULT_LIMIT`].
    pub limit: Option<u32>,
    /// Defaults to 0.
    pub offset: Option<u32>,
}

#[async_trait]
pub trait LocationStore: Send + Sync {
    /// Locations whose ascii name starts with `term`, shortest names first.
    async fn search(&self, term: &str, options: SearchOptions) -> Result<Vec<Location>, StoreError>;

    /// The location with the given geonames id.
    async fn find(&self, geonameid: &str) -> Result<Option<Location>, StoreError>;
}

/// A parameterized statement ready to run.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Param>,
}

/// Escape LIKE wildcards so `term` only matches literally.
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Build the prefix search statement for `table`.
pub fn build_search_query(
    table: &str,
    term: &str,
    options: &SearchOptions,
) -> Result<Statement, StoreError> {
    let projection = if options.fields.is_empty() {
        "*".to_string()
    } else {
        options
            .fields
            .iter()
            .map(|field| {
                if LOCATION_COLUMNS.contains(&field.as_str()) {
                    Ok(format!("\"{field}\""))
                } else {
                    Err(StoreError::UnknownField(field.clone()))
                }
            })
            .collect::<Result<Vec<_>, _>>()?
            .join(", ")
    };

    let sql = format!(
        "SELECT {projection} FROM \"{table}\" \
         WHERE asciiname LIKE ? ESCAPE '\\' \
         ORDER BY length(name) ASC, name ASC \
         LIMIT ? OFFSET ?"
    );
    Ok(Statement {
        sql,
        params: vec![
            Param::Text(format!("{}%", escape_like(term))),
            Param::Int(i64::from(options.limit.unwrap_or(DEFAULT_LIMIT))),
            Param::Int(i64::from(options.offset.unwrap_or(0))),
        ],
    })
}

/// [`LocationStore`] backed by a SQLite table.
#[derive(Debug, Clone)]
pub struct SqliteLocations {
    db: Database,
    table: String,
}

impl SqliteLocations {
    pub fn new(db: Database, table: impl Into<String>) -> Self {
        Self {
            db,
            table: table.into(),
        }
    }

    /// Create the table if it does not exist. Every column is TEXT.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        let columns = LOCATION_COLUMNS
            .iter()
            .map(|column| {
                if *column == "geonameid" {
                    format!("\"{column}\" TEXT PRIMARY KEY")
                } else {
                    format!("\"{column}\" TEXT")
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("CREATE TABLE IF NOT EXISTS \"{}\" ({columns})", self.table);
        self.db.execute(&sql, &[]).await?;
        Ok(())
    }

    /// Insert one location; unknown keys are rejected, missing ones are NULL.
    pub async fn insert(&self, location: &Location) -> Result<(), StoreError> {
        if let Some(unknown) = location
            .keys()
            .find(|key| !LOCATION_COLUMNS.contains(&key.as_str()))
        {
            return Err(StoreError::UnknownField(unknown.clone()));
        }

        let columns: Vec<&str> = location.keys().map(String::as_str).collect();
        let params: Vec<Param> = location
            .values()
            .map(|value| match value {
                Value::String(text) => Param::Text(text.clone()),
                other => Param::Text(other.to_string()),
            })
            .collect();
        let sql = format!(
            "INSERT INTO \"{}\" ({}) VALUES ({})",
            self.table,
            columns
                .iter()
                .map(|c| format!("\"{c}\""))
                .collect::<Vec<_>>()
                .join(", "),
            vec!["?"; columns.len()].join(", ")
        );
        self.db.execute(&sql, &params).await?;
        Ok(())
    }
}

#[async_trait]
impl LocationStore for SqliteLocations {
    async fn search(&self, term: &str, options: SearchOptions) -> Result<Vec<Location>, StoreError> {
        let statement = build_search_query(&self.table, term, &options)?;
        Ok(self.db.fetch_all(&statement.sql, &statement.params).await?)
    }

    async fn find(&self, geonameid: &str) -> Result<Option<Location>, StoreError> {
        let sql = format!("SELECT * FROM \"{}\" WHERE geonameid = ? LIMIT 1", self.table);
        let mut rows = self
            .db
            .fetch_all(&sql, &[Param::Text(geonameid.to_string())])
            .await?;
        Ok(rows.pop())
    }
}
