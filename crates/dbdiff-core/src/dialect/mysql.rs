//! MySQL DDL generation.
//!
//! Statements are emitted in dependency order:
//!
//! 1. `DROP TABLE` for every dropped table
//! 2. `CREATE TABLE` for every new table
//! 3. per changed table: attribute `ALTER`, index drops, column drops,
//!    column additions, column changes, index additions
//!
//! Index drops run before column drops so no index references a missing
//! column; index additions run last so they may reference columns added or
//! changed just before.

use tracing::{debug, info};

use crate::delta::{Delta, TableAttributes, TableChange};
use crate::error::{DiffError, Result};
use crate::schema::{Field, Index, Table};

use super::{charset_of, is_string_type, quote_string, strip_synthetic_extra, upper_type};

/// MySQL statement renderer.
#[derive(Debug, Clone, Default)]
pub struct MySqlDialect;

impl MySqlDialect {
    /// Creates a new MySQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Returns the dialect name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        "mysql"
    }

    /// Renders a delta into an ordered list of statements.
    ///
    /// Fails without producing any statement if a table queued for creation
    /// has no fields.
    pub fn generate(&self, delta: &Delta) -> Result<Vec<String>> {
        if let Some(table) = delta.create_tables.iter().find(|t| t.fields.is_empty()) {
            return Err(DiffError::MissingFields {
                table: table.name.clone(),
            });
        }

        let mut statements = Vec::new();
        if delta.is_empty() {
            return Ok(statements);
        }

        for table in &delta.drop_tables {
            statements.push(self.drop_table(table));
        }
        for table in &delta.create_tables {
            statements.push(self.create_table(table));
        }
        for change in &delta.change_tables {
            statements.extend(self.alter_table(change));
        }

        for sql in &statements {
            debug!(sql = %sql, "Generated statement");
        }
        info!(count = statements.len(), "Generated DDL statements");
        Ok(statements)
    }

    /// Renders the statements for one changed table.
    #[must_use]
    pub fn alter_table(&self, change: &TableChange) -> Vec<String> {
        let table = change.table.as_str();
        let mut statements = Vec::new();

        if let Some(sql) = change
            .attributes
            .as_ref()
            .and_then(|attributes| self.alter_attributes(table, attributes))
        {
            statements.push(sql);
        }
        for index in &change.indexes.drop {
            statements.push(self.drop_index(table, index));
        }
        for field in &change.fields.drop {
            statements.push(self.drop_column(table, field));
        }
        for field in &change.fields.add {
            statements.push(self.add_column(table, field));
        }
        for field in &change.fields.change {
            statements.push(self.change_column(table, field));
        }
        for index in &change.indexes.add {
            statements.push(self.add_index(table, index));
        }

        statements
    }

    /// Generates SQL for DROP TABLE.
    #[must_use]
    pub fn drop_table(&self, table: &Table) -> String {
        format!("DROP TABLE {};", self.quote_identifier(&table.name))
    }

    /// Generates SQL for CREATE TABLE: columns in declared order, then
    /// index definitions, then table options.
    #[must_use]
    pub fn create_table(&self, table: &Table) -> String {
        let definitions: Vec<String> = table
            .fields
            .iter()
            .map(|f| self.column_definition(f))
            .chain(table.indexes.iter().map(|i| self.index_definition(i)))
            .collect();

        let mut sql = format!(
            "CREATE TABLE {} ({})",
            self.quote_identifier(&table.name),
            definitions.join(", ")
        );
        if !table.engine.is_empty() {
            sql.push_str(&format!(" ENGINE = {}", table.engine));
        }
        if !table.collation.is_empty() {
            sql.push_str(&format!(
                " DEFAULT CHARSET = {} COLLATE = {}",
                charset_of(&table.collation),
                table.collation
            ));
        }
        if !table.comment.is_empty() {
            sql.push_str(&format!(" COMMENT = {}", quote_string(&table.comment)));
        }
        sql.push(';');
        sql
    }

    /// Generates the attribute ALTER for a table, or `None` if no clause
    /// applies.
    #[must_use]
    pub fn alter_attributes(&self, table: &str, attributes: &TableAttributes) -> Option<String> {
        let mut clauses = Vec::new();
        if let Some(engine) = attributes.engine.as_deref().filter(|e| !e.is_empty()) {
            clauses.push(format!("ENGINE = {engine}"));
        }
        if let Some(row_format) = attributes.row_format.as_deref().filter(|r| !r.is_empty()) {
            clauses.push(format!("ROW_FORMAT = {}", row_format.to_uppercase()));
        }
        if let Some(comment) = attributes.comment.as_deref() {
            clauses.push(format!("COMMENT = {}", quote_string(comment)));
        }
        if let Some(collation) = attributes.collation.as_deref().filter(|c| !c.is_empty()) {
            clauses.push(format!(
                "DEFAULT CHARACTER SET {} COLLATE {}",
                charset_of(collation),
                collation
            ));
        }

        if clauses.is_empty() {
            return None;
        }
        Some(format!(
            "ALTER TABLE {} {};",
            self.quote_identifier(table),
            clauses.join(" ")
        ))
    }

    /// Generates SQL for dropping an index.
    #[must_use]
    pub fn drop_index(&self, table: &str, index: &Index) -> String {
        if index.is_primary() {
            format!(
                "ALTER TABLE {} DROP PRIMARY KEY;",
                self.quote_identifier(table)
            )
        } else {
            format!(
                "ALTER TABLE {} DROP INDEX {};",
                self.quote_identifier(table),
                self.quote_identifier(&index.key_name)
            )
        }
    }

    /// Generates SQL for adding an index.
    #[must_use]
    pub fn add_index(&self, table: &str, index: &Index) -> String {
        format!(
            "ALTER TABLE {} ADD {};",
            self.quote_identifier(table),
            self.index_definition(index)
        )
    }

    /// Generates SQL for dropping a column.
    #[must_use]
    pub fn drop_column(&self, table: &str, field: &Field) -> String {
        format!(
            "ALTER TABLE {} DROP {};",
            self.quote_identifier(table),
            self.quote_identifier(&field.name)
        )
    }

    /// Generates SQL for adding a column after its predecessor.
    #[must_use]
    pub fn add_column(&self, table: &str, field: &Field) -> String {
        let mut sql = format!(
            "ALTER TABLE {} ADD {}",
            self.quote_identifier(table),
            self.column_definition(field)
        );
        if let Some(after) = field.after.as_deref().filter(|a| !a.is_empty()) {
            sql.push_str(&format!(" AFTER {}", self.quote_identifier(after)));
        }
        sql.push(';');
        sql
    }

    /// Generates SQL for redefining a column under the same name.
    #[must_use]
    pub fn change_column(&self, table: &str, field: &Field) -> String {
        format!(
            "ALTER TABLE {} CHANGE {} {};",
            self.quote_identifier(table),
            self.quote_identifier(&field.name),
            self.column_definition(field)
        )
    }

    /// Generates a column definition.
    #[must_use]
    pub fn column_definition(&self, field: &Field) -> String {
        let mut parts = vec![
            self.quote_identifier(&field.name),
            upper_type(&field.column_type),
        ];

        if let Some(collation) = &field.collation {
            parts.push(format!(
                "CHARACTER SET {} COLLATE {}",
                charset_of(collation),
                collation
            ));
        }

        parts.push(if field.nullable { "NULL" } else { "NOT NULL" }.to_string());

        if let Some(default) = self.default_value(field) {
            parts.push(format!("DEFAULT {default}"));
        }

        let extra = strip_synthetic_extra(&field.extra);
        if !extra.is_empty() {
            parts.push(extra.to_uppercase());
        }

        if !field.comment.is_empty() {
            parts.push(format!("COMMENT {}", quote_string(&field.comment)));
        }

        parts.join(" ")
    }

    /// Renders a column's default: quoted for string types, raw otherwise.
    #[must_use]
    pub fn default_value(&self, field: &Field) -> Option<String> {
        let default = field.default.as_deref()?;
        if is_string_type(&field.column_type) {
            Some(quote_string(default))
        } else {
            Some(default.to_string())
        }
    }

    /// Generates an index definition as used inside CREATE TABLE and
    /// after `ADD`.
    #[must_use]
    pub fn index_definition(&self, index: &Index) -> String {
        let columns: Vec<String> = index
            .columns
            .iter()
            .map(|c| self.quote_identifier(c))
            .collect();

        let mut sql = if index.is_primary() {
            format!("PRIMARY KEY ({})", columns.join(", "))
        } else {
            format!(
                "{} {} ({})",
                self.uniqueness_keyword(index),
                self.quote_identifier(&index.key_name),
                columns.join(", ")
            )
        };
        if !index.index_comment.is_empty() {
            sql.push_str(&format!(" COMMENT {}", quote_string(&index.index_comment)));
        }
        sql
    }

    /// `UNIQUE` for a zero non-unique flag, `INDEX` otherwise.
    #[must_use]
    pub const fn uniqueness_keyword(&self, index: &Index) -> &'static str {
        if index.is_unique() {
            "UNIQUE"
        } else {
            "INDEX"
        }
    }

    /// Quotes an identifier with backticks.
    #[must_use]
    pub fn quote_identifier(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }
}
