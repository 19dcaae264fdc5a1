//! Schema snapshot types.
//!
//! A [`SchemaSnapshot`] is a fully materialized description of one
//! database's tables, their columns and their indexes. Tables, fields and
//! indexes are kept in declared order inside a [`NamedList`], which pairs
//! the ordered sequence with a name-to-position map so lookups never depend
//! on a map's iteration order.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{DiffError, Result};

/// Key name reserved for the primary-key constraint.
pub const PRIMARY_KEY_NAME: &str = "PRIMARY";

/// Something identified by name within its owning scope.
pub trait Named {
    /// Human-readable kind used in error messages.
    const KIND: &'static str;

    /// The identifying name.
    fn name(&self) -> &str;
}

/// Ordered sequence of named entries with O(1) lookup by name.
#[derive(Debug, Clone)]
pub struct NamedList<T> {
    items: Vec<T>,
    positions: HashMap<String, usize>,
}

impl<T> Default for NamedList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            positions: HashMap::new(),
        }
    }
}

impl<T: Named> NamedList<T> {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry, failing if its name is already taken.
    pub fn try_push(&mut self, item: T) -> Result<()> {
        if self.positions.contains_key(item.name()) {
            return Err(DiffError::DuplicateName {
                kind: T::KIND,
                name: item.name().to_string(),
            });
        }
        self.positions
            .insert(item.name().to_string(), self.items.len());
        self.items.push(item);
        Ok(())
    }

    /// Appends an entry, or replaces the existing entry of the same name
    /// while keeping its position.
    pub fn upsert(&mut self, item: T) {
        match self.positions.get(item.name()) {
            Some(&pos) => self.items[pos] = item,
            None => {
                self.positions
                    .insert(item.name().to_string(), self.items.len());
                self.items.push(item);
            }
        }
    }

    /// Gets an entry by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&T> {
        self.positions.get(name).map(|&pos| &self.items[pos])
    }

    /// Returns whether an entry with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    /// Returns the declared position of an entry.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Returns the entry declared immediately before `name`.
    ///
    /// `None` when `name` is the first entry or is absent.
    #[must_use]
    pub fn predecessor_of(&self, name: &str) -> Option<&T> {
        match self.position(name)? {
            0 => None,
            pos => self.items.get(pos - 1),
        }
    }

    /// Entry names in declared order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(T::name)
    }
}

impl<T> NamedList<T> {
    /// Iterates entries in declared order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` when the list holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The entries as a slice, in declared order.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Returns the last declared entry.
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }
}

impl<T: PartialEq> PartialEq for NamedList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<T: Eq> Eq for NamedList<T> {}

impl<T: Named> TryFrom<Vec<T>> for NamedList<T> {
    type Error = DiffError;

    fn try_from(items: Vec<T>) -> Result<Self> {
        let mut list = Self::new();
        for item in items {
            list.try_push(item)?;
        }
        Ok(list)
    }
}

impl<T: Named> FromIterator<T> for NamedList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::new();
        for item in iter {
            list.upsert(item);
        }
        list
    }
}

impl<'a, T> IntoIterator for &'a NamedList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Serialize> Serialize for NamedList<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de> + Named> Deserialize<'de> for NamedList<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let items = Vec::<T>::deserialize(deserializer)?;
        Self::try_from(items).map_err(serde::de::Error::custom)
    }
}

const fn default_nullable() -> bool {
    true
}

/// A table column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Column name.
    pub name: String,
    /// Full type string as reported by the server (e.g. `varchar(255)`).
    #[serde(rename = "type")]
    pub column_type: String,
    /// Column collation; absent for non-character types.
    #[serde(default)]
    pub collation: Option<String>,
    /// Whether the column accepts NULL.
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    /// Key role (`PRI`, `UNI`, `MUL` or empty). Derived from index
    /// membership and never compared.
    #[serde(default)]
    pub key: String,
    /// Default value; `None` means no default, distinct from `Some("")`.
    #[serde(default)]
    pub default: Option<String>,
    /// Extra attributes (e.g. `auto_increment`).
    #[serde(default)]
    pub extra: String,
    /// Column comment.
    #[serde(default)]
    pub comment: String,
    /// Name of the column declared immediately before this one; `None`
    /// for the first column.
    #[serde(default)]
    pub after: Option<String>,
}

impl Field {
    /// Creates a nullable column with no default.
    #[must_use]
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            collation: None,
            nullable: true,
            key: String::new(),
            default: None,
            extra: String::new(),
            comment: String::new(),
            after: None,
        }
    }

    /// Marks the column NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Sets the column collation.
    #[must_use]
    pub fn collation(mut self, collation: impl Into<String>) -> Self {
        self.collation = Some(collation.into());
        self
    }

    /// Sets the key role.
    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Sets the extra attribute string.
    #[must_use]
    pub fn extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = extra.into();
        self
    }

    /// Sets the column comment.
    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Sets the predecessor column.
    #[must_use]
    pub fn after(mut self, predecessor: Option<String>) -> Self {
        self.after = predecessor;
        self
    }

    /// Compares the declared definition of two columns.
    ///
    /// Key role and predecessor are not part of a column's definition.
    #[must_use]
    pub fn same_definition(&self, other: &Self) -> bool {
        self.name == other.name
            && self.column_type == other.column_type
            && self.collation == other.collation
            && self.nullable == other.nullable
            && self.default == other.default
            && self.extra == other.extra
            && self.comment == other.comment
    }
}

impl Named for Field {
    const KIND: &'static str = "field";

    fn name(&self) -> &str {
        &self.name
    }
}

/// A table index, one record per key name.
///
/// Two indexes are equal only if every attribute matches, column order
/// included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    /// Owning table.
    #[serde(default)]
    pub table: String,
    /// 0 for unique indexes, nonzero otherwise.
    pub non_unique: i64,
    /// Key name; [`PRIMARY_KEY_NAME`] for the primary key.
    pub key_name: String,
    /// Participating columns in index order.
    pub columns: Vec<String>,
    /// Sort collation (`A`, `D` or empty).
    #[serde(default)]
    pub collation: String,
    /// Index type (`BTREE`, `HASH`, `FULLTEXT`, ...).
    #[serde(default)]
    pub index_type: String,
    /// Server-side comment.
    #[serde(default)]
    pub comment: String,
    /// User-declared index comment.
    #[serde(default)]
    pub index_comment: String,
}

impl Index {
    /// Creates a non-unique BTREE index.
    #[must_use]
    pub fn new(
        table: impl Into<String>,
        key_name: impl Into<String>,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            table: table.into(),
            non_unique: 1,
            key_name: key_name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            collation: "A".to_string(),
            index_type: "BTREE".to_string(),
            comment: String::new(),
            index_comment: String::new(),
        }
    }

    /// Creates the primary-key index.
    #[must_use]
    pub fn primary(
        table: impl Into<String>,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self::new(table, PRIMARY_KEY_NAME, columns).unique()
    }

    /// Marks the index unique.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.non_unique = 0;
        self
    }

    /// Sets the index type.
    #[must_use]
    pub fn index_type(mut self, index_type: impl Into<String>) -> Self {
        self.index_type = index_type.into();
        self
    }

    /// Sets the user-declared index comment.
    #[must_use]
    pub fn index_comment(mut self, comment: impl Into<String>) -> Self {
        self.index_comment = comment.into();
        self
    }

    /// Returns whether this is the primary-key constraint.
    #[must_use]
    pub fn is_primary(&self) -> bool {
        self.key_name == PRIMARY_KEY_NAME
    }

    /// Returns whether the index enforces uniqueness.
    #[must_use]
    pub const fn is_unique(&self) -> bool {
        self.non_unique == 0
    }
}

impl Named for Index {
    const KIND: &'static str = "index";

    fn name(&self) -> &str {
        &self.key_name
    }
}

/// A table with its ordered fields and its indexes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Table {
    /// Table name.
    pub name: String,
    /// Storage engine.
    #[serde(default)]
    pub engine: String,
    /// Storage format version.
    #[serde(default)]
    pub version: String,
    /// Row format.
    #[serde(default)]
    pub row_format: String,
    /// Free-form create options. Never compared.
    #[serde(default)]
    pub options: String,
    /// Table comment.
    #[serde(default)]
    pub comment: String,
    /// Default collation.
    #[serde(default)]
    pub collation: String,
    /// Fields in declared order.
    #[serde(default)]
    pub fields: NamedList<Field>,
    /// Indexes keyed by key name.
    #[serde(default)]
    pub indexes: NamedList<Index>,
}

impl Table {
    /// Creates an empty table.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the storage engine.
    #[must_use]
    pub fn engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = engine.into();
        self
    }

    /// Sets the row format.
    #[must_use]
    pub fn row_format(mut self, row_format: impl Into<String>) -> Self {
        self.row_format = row_format.into();
        self
    }

    /// Sets the default collation.
    #[must_use]
    pub fn collation(mut self, collation: impl Into<String>) -> Self {
        self.collation = collation.into();
        self
    }

    /// Sets the table comment.
    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Sets the create options.
    #[must_use]
    pub fn options(mut self, options: impl Into<String>) -> Self {
        self.options = options.into();
        self
    }

    /// Appends a field, linking it to the current last field.
    ///
    /// A field whose name already exists replaces the earlier one in place.
    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.push_field(field);
        self
    }

    /// Adds an index owned by this table.
    #[must_use]
    pub fn index(mut self, index: Index) -> Self {
        self.indexes.upsert(self.own_index(index));
        self
    }

    /// Appends a field, failing on a duplicate name.
    pub fn try_push_field(&mut self, mut field: Field) -> Result<()> {
        field.after = self.fields.last().map(|f| f.name.clone());
        self.fields.try_push(field)
    }

    /// Adds an index, failing on a duplicate key name.
    pub fn try_push_index(&mut self, index: Index) -> Result<()> {
        let index = self.own_index(index);
        self.indexes.try_push(index)
    }

    fn push_field(&mut self, mut field: Field) {
        if let Some(pos) = self.fields.position(&field.name) {
            field.after = pos
                .checked_sub(1)
                .and_then(|p| self.fields.as_slice().get(p))
                .map(|f| f.name.clone());
        } else {
            field.after = self.fields.last().map(|f| f.name.clone());
        }
        self.fields.upsert(field);
    }

    fn own_index(&self, mut index: Index) -> Index {
        if index.table.is_empty() {
            index.table.clone_from(&self.name);
        }
        index
    }

    /// Name of the field declared immediately before `field`.
    #[must_use]
    pub fn predecessor_of(&self, field: &str) -> Option<&str> {
        self.fields.predecessor_of(field).map(|f| f.name.as_str())
    }
}

impl Named for Table {
    const KIND: &'static str = "table";

    fn name(&self) -> &str {
        &self.name
    }
}

/// The structure of one database at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    /// Tables in declared order.
    pub tables: NamedList<Table>,
}

impl SchemaSnapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table, replacing any earlier table of the same name.
    #[must_use]
    pub fn table(mut self, table: Table) -> Self {
        self.tables.upsert(table);
        self
    }

    /// Adds a table, failing on a duplicate name.
    pub fn try_push_table(&mut self, table: Table) -> Result<()> {
        self.tables.try_push(table)
    }

    /// Gets a table by name.
    #[must_use]
    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Returns table names in declared order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.names()
    }

    /// Keeps only tables whose names start with `prefix`.
    #[must_use]
    pub fn filter_prefix(&self, prefix: &str) -> Self {
        Self {
            tables: self
                .tables
                .iter()
                .filter(|t| t.name.starts_with(prefix))
                .cloned()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> Table {
        Table::new("users")
            .engine("InnoDB")
            .collation("utf8mb4_general_ci")
            .field(Field::new("id", "int").not_null().key("PRI"))
            .field(Field::new("name", "varchar(255)"))
            .field(Field::new("email", "varchar(255)"))
            .index(Index::primary("", ["id"]))
    }

    #[test]
    fn test_field_predecessor_chain() {
        let table = users();
        let fields: Vec<_> = table.fields.iter().collect();
        assert_eq!(fields[0].after, None);
        assert_eq!(fields[1].after.as_deref(), Some("id"));
        assert_eq!(fields[2].after.as_deref(), Some("name"));
        assert_eq!(table.predecessor_of("email"), Some("name"));
        assert_eq!(table.predecessor_of("id"), None);
        assert_eq!(table.predecessor_of("missing"), None);
    }

    #[test]
    fn test_field_replace_keeps_position() {
        let table = users().field(Field::new("name", "text"));
        let names: Vec<_> = table.fields.names().collect();
        assert_eq!(names, vec!["id", "name", "email"]);
        let name = table.fields.get("name").unwrap();
        assert_eq!(name.column_type, "text");
        assert_eq!(name.after.as_deref(), Some("id"));
    }

    #[test]
    fn test_index_inherits_table_name() {
        let table = users();
        let pk = table.indexes.get(PRIMARY_KEY_NAME).unwrap();
        assert_eq!(pk.table, "users");
        assert!(pk.is_primary());
        assert!(pk.is_unique());
    }

    #[test]
    fn test_try_push_rejects_duplicates() {
        let mut table = Table::new("t");
        table.try_push_field(Field::new("a", "int")).unwrap();
        let err = table.try_push_field(Field::new("a", "int")).unwrap_err();
        assert_eq!(
            err,
            DiffError::DuplicateName {
                kind: "field",
                name: "a".to_string()
            }
        );
    }

    #[test]
    fn test_same_definition_ignores_key_and_predecessor() {
        let a = Field::new("id", "int").key("PRI").after(None);
        let b = Field::new("id", "int").key("").after(Some("x".into()));
        assert!(a.same_definition(&b));
        assert!(!a.same_definition(&Field::new("id", "bigint")));
        let defaulted = Field::new("id", "int").default_value("");
        assert!(!a.same_definition(&defaulted));
    }

    #[test]
    fn test_absent_and_empty_default_differ() {
        let none = Field::new("c", "varchar(10)");
        let empty = Field::new("c", "varchar(10)").default_value("");
        assert!(!none.same_definition(&empty));
    }

    #[test]
    fn test_index_equality_is_order_sensitive() {
        let ab = Index::new("t", "idx", ["a", "b"]);
        let ba = Index::new("t", "idx", ["b", "a"]);
        assert_ne!(ab, ba);
        assert_eq!(ab, Index::new("t", "idx", ["a", "b"]));
    }

    #[test]
    fn test_filter_prefix() {
        let snapshot = SchemaSnapshot::new()
            .table(Table::new("app_users"))
            .table(Table::new("audit_log"))
            .table(Table::new("app_posts"));
        let filtered = snapshot.filter_prefix("app_");
        let names: Vec<_> = filtered.table_names().collect();
        assert_eq!(names, vec!["app_users", "app_posts"]);
    }

    #[test]
    fn test_json_keeps_order_and_rebuilds_lookup() {
        let snapshot = SchemaSnapshot::new().table(users());
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: SchemaSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
        let table = back.get_table("users").unwrap();
        assert_eq!(table.fields.position("email"), Some(2));
    }

    #[test]
    fn test_json_rejects_duplicate_names() {
        let json = r#"{"tables":[{"name":"t"},{"name":"t"}]}"#;
        let err = serde_json::from_str::<SchemaSnapshot>(json).unwrap_err();
        assert!(err.to_string().contains("Duplicate table name: t"));
    }
}
