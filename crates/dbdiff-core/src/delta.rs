//! The classified differences between two snapshots.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schema::{Field, Index, Table};

/// Table attributes that changed. Each `Some` holds the newer value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableAttributes {
    /// New storage engine.
    pub engine: Option<String>,
    /// New row format.
    pub row_format: Option<String>,
    /// New table comment.
    pub comment: Option<String>,
    /// New default collation.
    pub collation: Option<String>,
}

impl TableAttributes {
    /// Returns `true` if no attribute is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.engine.is_none()
            && self.row_format.is_none()
            && self.comment.is_none()
            && self.collation.is_none()
    }

    /// All four attributes of `table`, regardless of what changed.
    #[must_use]
    pub fn all_of(table: &Table) -> Self {
        Self {
            engine: Some(table.engine.clone()),
            row_format: Some(table.row_format.clone()),
            comment: Some(table.comment.clone()),
            collation: Some(table.collation.clone()),
        }
    }
}

/// Column-level differences within one table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDiff {
    /// Columns to drop (older definitions).
    pub drop: Vec<Field>,
    /// Columns to add, each carrying its predecessor in the newer table.
    pub add: Vec<Field>,
    /// Columns that survive with a different definition (newer definitions).
    pub change: Vec<Field>,
}

impl FieldDiff {
    /// Returns `true` if there are no column changes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.drop.is_empty() && self.add.is_empty() && self.change.is_empty()
    }
}

/// Index-level differences within one table.
///
/// A modified index appears in both `drop` (older version) and `add`
/// (newer version).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDiff {
    /// Indexes to drop (older definitions).
    pub drop: Vec<Index>,
    /// Indexes to add (newer definitions).
    pub add: Vec<Index>,
}

impl IndexDiff {
    /// Returns `true` if there are no index changes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.drop.is_empty() && self.add.is_empty()
    }
}

/// Changes to a table present in both snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableChange {
    /// Table name.
    pub table: String,
    /// Attribute changes, if any.
    pub attributes: Option<TableAttributes>,
    /// Column changes.
    pub fields: FieldDiff,
    /// Index changes.
    pub indexes: IndexDiff,
}

impl TableChange {
    /// Creates an empty change record for `table`.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            attributes: None,
            fields: FieldDiff::default(),
            indexes: IndexDiff::default(),
        }
    }

    /// Returns `true` if this record describes no change at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let attributes = self.attributes.as_ref();
        attributes.is_none_or(TableAttributes::is_empty)
            && self.fields.is_empty()
            && self.indexes.is_empty()
    }
}

/// Everything needed to bring the older schema in line with the newer one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delta {
    /// Tables present only in the older snapshot.
    pub drop_tables: Vec<Table>,
    /// Tables present only in the newer snapshot, with full field and
    /// index lists.
    pub create_tables: Vec<Table>,
    /// Tables present in both snapshots that differ.
    pub change_tables: Vec<TableChange>,
}

impl Delta {
    /// Returns `true` if the delta holds no table records.
    ///
    /// A delta carrying a change record that itself describes nothing is
    /// not empty; [`Comparator`](crate::Comparator) never produces one.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.drop_tables.is_empty()
            && self.create_tables.is_empty()
            && self.change_tables.is_empty()
    }

    /// Looks up the change record for a table.
    #[must_use]
    pub fn change_for(&self, table: &str) -> Option<&TableChange> {
        self.change_tables.iter().find(|c| c.table == table)
    }

    /// Counts per change category.
    #[must_use]
    pub fn summary(&self) -> DeltaSummary {
        let mut summary = DeltaSummary {
            drop_tables: self.drop_tables.len(),
            create_tables: self.create_tables.len(),
            change_tables: self.change_tables.len(),
            ..DeltaSummary::default()
        };
        for change in &self.change_tables {
            summary.drop_fields += change.fields.drop.len();
            summary.add_fields += change.fields.add.len();
            summary.change_fields += change.fields.change.len();
            summary.drop_indexes += change.indexes.drop.len();
            summary.add_indexes += change.indexes.add.len();
        }
        summary
    }
}

/// Per-category counts of a [`Delta`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeltaSummary {
    /// Tables dropped.
    pub drop_tables: usize,
    /// Tables created.
    pub create_tables: usize,
    /// Tables altered.
    pub change_tables: usize,
    /// Columns dropped across altered tables.
    pub drop_fields: usize,
    /// Columns added across altered tables.
    pub add_fields: usize,
    /// Columns changed across altered tables.
    pub change_fields: usize,
    /// Indexes dropped across altered tables.
    pub drop_indexes: usize,
    /// Indexes added across altered tables.
    pub add_indexes: usize,
}

impl fmt::Display for DeltaSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tables: -{} +{} ~{}, fields: -{} +{} ~{}, indexes: -{} +{}",
            self.drop_tables,
            self.create_tables,
            self.change_tables,
            self.drop_fields,
            self.add_fields,
            self.change_fields,
            self.drop_indexes,
            self.add_indexes
        )
    }
}
