//! MySQL backend.
//!
//! Reads table, column and index metadata from `information_schema` of
//! the current database and assembles it into a [`SchemaSnapshot`].

use std::collections::HashMap;

use async_trait::async_trait;
use dbdiff_core::{Comparator, Delta, Field, Index, SchemaSnapshot, Table};
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use sqlx::Connection;
use tracing::{debug, info};

use crate::differ::{Differ, DifferConfig};
use crate::error::Result;

const TABLES_QUERY: &str = "\
    SELECT CAST(TABLE_NAME AS CHAR) AS name, \
           CAST(ENGINE AS CHAR) AS engine, \
           CAST(VERSION AS CHAR) AS version, \
           CAST(ROW_FORMAT AS CHAR) AS row_format, \
           CAST(CREATE_OPTIONS AS CHAR) AS create_options, \
           CAST(TABLE_COMMENT AS CHAR) AS comment, \
           CAST(TABLE_COLLATION AS CHAR) AS collation \
    FROM information_schema.TABLES \
    WHERE TABLE_SCHEMA = DATABASE() AND TABLE_TYPE = 'BASE TABLE' AND TABLE_NAME LIKE ? \
    ORDER BY TABLE_NAME";

const COLUMNS_QUERY: &str = "\
    SELECT CAST(TABLE_NAME AS CHAR) AS table_name, \
           CAST(COLUMN_NAME AS CHAR) AS name, \
           CAST(COLUMN_TYPE AS CHAR) AS column_type, \
           CAST(COLLATION_NAME AS CHAR) AS collation, \
           CAST(IS_NULLABLE AS CHAR) AS is_nullable, \
           CAST(COLUMN_KEY AS CHAR) AS column_key, \
           CAST(COLUMN_DEFAULT AS CHAR) AS column_default, \
           CAST(EXTRA AS CHAR) AS extra, \
           CAST(COLUMN_COMMENT AS CHAR) AS comment \
    FROM information_schema.COLUMNS \
    WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME LIKE ? \
    ORDER BY TABLE_NAME, ORDINAL_POSITION";

const INDEXES_QUERY: &str = "\
    SELECT CAST(TABLE_NAME AS CHAR) AS table_name, \
           CAST(NON_UNIQUE AS SIGNED) AS non_unique, \
           CAST(INDEX_NAME AS CHAR) AS key_name, \
           CAST(COLUMN_NAME AS CHAR) AS column_name, \
           CAST(COLLATION AS CHAR) AS collation, \
           CAST(INDEX_TYPE AS CHAR) AS index_type, \
           CAST(COMMENT AS CHAR) AS comment, \
           CAST(INDEX_COMMENT AS CHAR) AS index_comment \
    FROM information_schema.STATISTICS \
    WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME LIKE ? \
    ORDER BY TABLE_NAME, INDEX_NAME, SEQ_IN_INDEX";

/// One row of `information_schema.TABLES`.
#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct TableRow {
    /// `TABLE_NAME`.
    pub name: String,
    /// `ENGINE`.
    pub engine: Option<String>,
    /// `VERSION`, as text.
    pub version: Option<String>,
    /// `ROW_FORMAT`.
    pub row_format: Option<String>,
    /// `CREATE_OPTIONS`.
    pub create_options: Option<String>,
    /// `TABLE_COMMENT`.
    pub comment: Option<String>,
    /// `TABLE_COLLATION`.
    pub collation: Option<String>,
}

/// One row of `information_schema.COLUMNS`.
#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct ColumnRow {
    /// `TABLE_NAME`.
    pub table_name: String,
    /// `COLUMN_NAME`.
    pub name: String,
    /// `COLUMN_TYPE`, the full type string.
    pub column_type: String,
    /// `COLLATION_NAME`; `NULL` for non-character types.
    pub collation: Option<String>,
    /// `IS_NULLABLE`: `YES` or `NO`.
    pub is_nullable: String,
    /// `COLUMN_KEY`.
    pub column_key: Option<String>,
    /// `COLUMN_DEFAULT`; `NULL` when there is no default.
    pub column_default: Option<String>,
    /// `EXTRA`.
    pub extra: Option<String>,
    /// `COLUMN_COMMENT`.
    pub comment: Option<String>,
}

/// One row of `information_schema.STATISTICS`, i.e. one column of one index.
#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct IndexRow {
    /// `TABLE_NAME`.
    pub table_name: String,
    /// `NON_UNIQUE`: 0 for unique indexes.
    pub non_unique: i64,
    /// `INDEX_NAME`.
    pub key_name: String,
    /// `COLUMN_NAME`; `NULL` for functional key parts.
    pub column_name: Option<String>,
    /// `COLLATION`: `A`, `D` or `NULL`.
    pub collation: Option<String>,
    /// `INDEX_TYPE`.
    pub index_type: Option<String>,
    /// `COMMENT`.
    pub comment: Option<String>,
    /// `INDEX_COMMENT`.
    pub index_comment: Option<String>,
}

impl From<TableRow> for Table {
    fn from(row: TableRow) -> Self {
        Self {
            name: row.name,
            engine: row.engine.unwrap_or_default(),
            version: row.version.unwrap_or_default(),
            row_format: row.row_format.unwrap_or_default(),
            options: row.create_options.unwrap_or_default(),
            comment: row.comment.unwrap_or_default(),
            collation: row.collation.unwrap_or_default(),
            ..Self::default()
        }
    }
}

impl From<ColumnRow> for Field {
    fn from(row: ColumnRow) -> Self {
        Self {
            name: row.name,
            column_type: row.column_type,
            collation: row.collation,
            nullable: row.is_nullable.eq_ignore_ascii_case("YES"),
            key: row.column_key.unwrap_or_default(),
            default: row.column_default,
            extra: row.extra.unwrap_or_default(),
            comment: row.comment.unwrap_or_default(),
            after: None,
        }
    }
}

/// Folds per-column index rows into one [`Index`] per key name.
///
/// Rows must arrive grouped by table and ordered by sequence within each
/// index; columns are appended in arrival order.
#[must_use]
pub fn assemble_indexes(rows: Vec<IndexRow>) -> Vec<Index> {
    let mut indexes: Vec<Index> = Vec::new();
    let mut positions: HashMap<(String, String), usize> = HashMap::new();

    for row in rows {
        let key = (row.table_name.clone(), row.key_name.clone());
        let position = *positions.entry(key).or_insert_with(|| {
            indexes.push(Index {
                table: row.table_name,
                non_unique: row.non_unique,
                key_name: row.key_name,
                columns: Vec::new(),
                collation: row.collation.unwrap_or_default(),
                index_type: row.index_type.unwrap_or_default(),
                comment: row.comment.unwrap_or_default(),
                index_comment: row.index_comment.unwrap_or_default(),
            });
            indexes.len() - 1
        });
        if let Some(column) = row.column_name {
            indexes[position].columns.push(column);
        }
    }

    indexes
}

/// Builds a snapshot from metadata rows.
///
/// Columns and indexes of tables absent from `tables` (views, or tables
/// created between queries) are ignored.
pub fn assemble_snapshot(
    tables: Vec<TableRow>,
    columns: Vec<ColumnRow>,
    indexes: Vec<IndexRow>,
) -> Result<SchemaSnapshot> {
    let mut assembled: Vec<Table> = tables.into_iter().map(Table::from).collect();
    let positions: HashMap<String, usize> = assembled
        .iter()
        .enumerate()
        .map(|(i, t)| (t.name.clone(), i))
        .collect();

    for row in columns {
        if let Some(&i) = positions.get(&row.table_name) {
            assembled[i].try_push_field(Field::from(row))?;
        }
    }
    for index in assemble_indexes(indexes) {
        if let Some(&i) = positions.get(&index.table) {
            assembled[i].try_push_index(index)?;
        }
    }

    let mut snapshot = SchemaSnapshot::new();
    for table in assembled {
        snapshot.try_push_table(table)?;
    }
    Ok(snapshot)
}

/// `LIKE` pattern matching every name that starts with `prefix`.
#[must_use]
pub fn prefix_pattern(prefix: Option<&str>) -> String {
    let mut pattern = String::new();
    for c in prefix.unwrap_or_default().chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Reads the structure of the pool's current database.
pub async fn fetch_snapshot(pool: &MySqlPool, prefix: Option<&str>) -> Result<SchemaSnapshot> {
    let pattern = prefix_pattern(prefix);

    let tables: Vec<TableRow> = sqlx::query_as(TABLES_QUERY)
        .bind(&pattern)
        .fetch_all(pool)
        .await?;
    let columns: Vec<ColumnRow> = sqlx::query_as(COLUMNS_QUERY)
        .bind(&pattern)
        .fetch_all(pool)
        .await?;
    let indexes: Vec<IndexRow> = sqlx::query_as(INDEXES_QUERY)
        .bind(&pattern)
        .fetch_all(pool)
        .await?;
    debug!(
        tables = tables.len(),
        columns = columns.len(),
        index_columns = indexes.len(),
        "Fetched metadata rows"
    );

    assemble_snapshot(tables, columns, indexes)
}

/// Opens a pool and checks the server answers.
///
/// The pool is closed again if the server does not answer the ping.
pub async fn connect_pool(dsn: &str, max_connections: u32) -> Result<MySqlPool> {
    let pool = MySqlPoolOptions::new()
        .max_connections(max_connections)
        .connect(dsn)
        .await?;
    if let Err(err) = ping(&pool).await {
        pool.close().await;
        return Err(err.into());
    }
    Ok(pool)
}

async fn ping(pool: &MySqlPool) -> sqlx::Result<()> {
    pool.acquire().await?.ping().await
}

/// Diff backend over two live MySQL databases.
#[derive(Debug)]
pub struct MySqlDiffer {
    newer: MySqlPool,
    older: MySqlPool,
    table_prefix: Option<String>,
    comparator: Comparator,
}

impl MySqlDiffer {
    /// Backend identifier.
    pub const NAME: &'static str = "mysql";

    /// Connects to both databases named in `config`.
    pub async fn connect(config: &DifferConfig) -> Result<Self> {
        let newer = connect_pool(&config.newer, config.max_connections).await?;
        Self::connect_older(newer, config).await
    }

    /// Connects to the older database and pairs it with an open `newer`
    /// pool. On failure `newer` is closed before the error is returned.
    pub async fn connect_older(newer: MySqlPool, config: &DifferConfig) -> Result<Self> {
        let older = match connect_pool(&config.older, config.max_connections).await {
            Ok(pool) => pool,
            Err(err) => {
                newer.close().await;
                return Err(err);
            }
        };
        info!("Connected to both databases");
        Ok(Self::from_pools(newer, older, config))
    }

    /// Wraps pools the caller already opened.
    #[must_use]
    pub fn from_pools(newer: MySqlPool, older: MySqlPool, config: &DifferConfig) -> Self {
        Self {
            newer,
            older,
            table_prefix: config.table_prefix.clone(),
            comparator: Comparator::with_options(config.comparator.clone()),
        }
    }
}

#[async_trait]
impl Differ for MySqlDiffer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn close(&self) -> Result<()> {
        self.newer.close().await;
        self.older.close().await;
        Ok(())
    }

    async fn diff(&self) -> Result<Delta> {
        let prefix = self.table_prefix.as_deref();
        let newer = fetch_snapshot(&self.newer, prefix).await?;
        let older = fetch_snapshot(&self.older, prefix).await?;
        info!(
            newer_tables = newer.tables.len(),
            older_tables = older.tables.len(),
            "Fetched schemas"
        );
        Ok(self.comparator.compare(&older, &newer))
    }
}
