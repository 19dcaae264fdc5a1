//! Snapshot comparator.
//!
//! Compares an "older" (the database to upgrade) and a "newer" (the
//! reference database) [`SchemaSnapshot`] and produces the [`Delta`]
//! needed to bring the older structure in line with the newer one.
//!
//! Iteration follows declared order: drops walk the older snapshot,
//! creates, changes and additions walk the newer one. The result is
//! therefore deterministic for a given pair of snapshots.

use tracing::debug;

use crate::delta::{Delta, FieldDiff, IndexDiff, TableAttributes, TableChange};
use crate::schema::{SchemaSnapshot, Table};

/// How changed table attributes are recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AttributePolicy {
    /// Record only the attributes whose values differ.
    #[default]
    ChangedOnly,
    /// Record all four attributes as soon as any one differs. The
    /// generated ALTER then repeats unchanged attributes as no-op clauses.
    Full,
}

/// Options for the comparator.
#[derive(Debug, Clone, Default)]
pub struct ComparatorOptions {
    /// Attribute change granularity.
    pub attribute_policy: AttributePolicy,
}

impl ComparatorOptions {
    /// Creates default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the attribute change granularity.
    #[must_use]
    pub fn with_attribute_policy(mut self, policy: AttributePolicy) -> Self {
        self.attribute_policy = policy;
        self
    }
}

/// Computes structural differences between two snapshots.
#[derive(Debug, Default)]
pub struct Comparator {
    options: ComparatorOptions,
}

impl Comparator {
    /// Creates a comparator with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a comparator with custom options.
    #[must_use]
    pub const fn with_options(options: ComparatorOptions) -> Self {
        Self { options }
    }

    /// Compares two snapshots and returns what must change in `older`.
    #[must_use]
    pub fn compare(&self, older: &SchemaSnapshot, newer: &SchemaSnapshot) -> Delta {
        let mut delta = Delta::default();

        for old_table in &older.tables {
            if !newer.tables.contains(&old_table.name) {
                debug!(table = %old_table.name, "Table dropped");
                delta.drop_tables.push(old_table.clone());
            }
        }

        for new_table in &newer.tables {
            match older.get_table(&new_table.name) {
                None => {
                    debug!(
                        table = %new_table.name,
                        fields = new_table.fields.len(),
                        indexes = new_table.indexes.len(),
                        "Table created"
                    );
                    delta.create_tables.push(new_table.clone());
                }
                Some(old_table) => {
                    let change = self.compare_table(old_table, new_table);
                    if !change.is_empty() {
                        debug!(table = %new_table.name, "Table changed");
                        delta.change_tables.push(change);
                    }
                }
            }
        }

        delta
    }

    /// Compares a table present in both snapshots.
    fn compare_table(&self, old: &Table, new: &Table) -> TableChange {
        TableChange {
            table: new.name.clone(),
            attributes: self.compare_attributes(old, new),
            fields: compare_fields(old, new),
            indexes: compare_indexes(old, new),
        }
    }

    /// Compares engine, row format, comment and collation. Create options
    /// are not compared.
    fn compare_attributes(&self, old: &Table, new: &Table) -> Option<TableAttributes> {
        let changed = |a: &str, b: &str| (a != b).then(|| b.to_string());
        let attributes = TableAttributes {
            engine: changed(&old.engine, &new.engine),
            row_format: changed(&old.row_format, &new.row_format),
            comment: changed(&old.comment, &new.comment),
            collation: changed(&old.collation, &new.collation),
        };

        if attributes.is_empty() {
            return None;
        }
        debug!(table = %new.name, ?attributes, "Table attributes changed");
        match self.options.attribute_policy {
            AttributePolicy::ChangedOnly => Some(attributes),
            AttributePolicy::Full => Some(TableAttributes::all_of(new)),
        }
    }
}

/// Compares two snapshots with default options.
#[must_use]
pub fn compare(older: &SchemaSnapshot, newer: &SchemaSnapshot) -> Delta {
    Comparator::new().compare(older, newer)
}

fn compare_fields(old: &Table, new: &Table) -> FieldDiff {
    let mut diff = FieldDiff::default();

    for field in &old.fields {
        if !new.fields.contains(&field.name) {
            diff.drop.push(field.clone());
        }
    }

    for field in &new.fields {
        match old.fields.get(&field.name) {
            None => {
                let mut added = field.clone();
                added.after = new.predecessor_of(&field.name).map(str::to_string);
                debug!(
                    table = %new.name,
                    field = %added.name,
                    after = ?added.after,
                    "Field added"
                );
                diff.add.push(added);
            }
            Some(old_field) if !old_field.same_definition(field) => {
                debug!(table = %new.name, field = %field.name, "Field changed");
                diff.change.push(field.clone());
            }
            Some(_) => {}
        }
    }

    diff
}

fn compare_indexes(old: &Table, new: &Table) -> IndexDiff {
    let mut diff = IndexDiff::default();

    for index in &old.indexes {
        match new.indexes.get(&index.key_name) {
            None => diff.drop.push(index.clone()),
            Some(new_index) if new_index != index => {
                debug!(table = %new.name, index = %index.key_name, "Index replaced");
                diff.drop.push(index.clone());
            }
            Some(_) => {}
        }
    }

    for index in &new.indexes {
        match old.indexes.get(&index.key_name) {
            Some(old_index) if old_index == index => {}
            _ => diff.add.push(index.clone()),
        }
    }

    diff
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Field, Index};

    fn users_v1() -> Table {
        Table::new("users")
            .engine("InnoDB")
            .collation("utf8mb4_general_ci")
            .field(Field::new("id", "int").not_null().key("PRI"))
            .field(Field::new("name", "varchar(255)"))
            .index(Index::primary("users", ["id"]))
    }

    #[test]
    fn test_detect_new_table() {
        let older = SchemaSnapshot::new();
        let newer = SchemaSnapshot::new().table(users_v1());

        let delta = compare(&older, &newer);
        assert_eq!(delta.create_tables.len(), 1);
        assert_eq!(delta.create_tables[0].fields.len(), 2);
        assert_eq!(delta.create_tables[0].indexes.len(), 1);
        assert!(delta.drop_tables.is_empty());
        assert!(delta.change_tables.is_empty());
    }

    #[test]
    fn test_detect_dropped_table() {
        let older = SchemaSnapshot::new().table(users_v1());
        let newer = SchemaSnapshot::new();

        let delta = compare(&older, &newer);
        assert_eq!(delta.drop_tables.len(), 1);
        assert_eq!(delta.drop_tables[0].name, "users");
        assert!(delta.create_tables.is_empty());
    }

    #[test]
    fn test_no_changes() {
        let snapshot = SchemaSnapshot::new().table(users_v1());
        assert!(compare(&snapshot, &snapshot).is_empty());
    }

    #[test]
    fn test_options_are_ignored() {
        let older = SchemaSnapshot::new().table(users_v1().options("row_format=DYNAMIC"));
        let newer = SchemaSnapshot::new().table(users_v1());
        assert!(compare(&older, &newer).is_empty());
    }

    #[test]
    fn test_added_field_carries_predecessor() {
        let older = SchemaSnapshot::new().table(users_v1());
        let newer = SchemaSnapshot::new().table(
            Table::new("users")
                .engine("InnoDB")
                .collation("utf8mb4_general_ci")
                .field(Field::new("id", "int").not_null().key("PRI"))
                .field(Field::new("created", "datetime"))
                .field(Field::new("name", "varchar(255)"))
                .index(Index::primary("users", ["id"])),
        );

        let delta = compare(&older, &newer);
        let change = delta.change_for("users").unwrap();
        assert_eq!(change.fields.add.len(), 1);
        assert_eq!(change.fields.add[0].name, "created");
        assert_eq!(change.fields.add[0].after.as_deref(), Some("id"));
        assert!(change.fields.change.is_empty());
    }

    #[test]
    fn test_predecessor_recomputed_from_order() {
        let older = SchemaSnapshot::new().table(users_v1());
        let mut stale = Field::new("email", "varchar(255)");
        stale.after = Some("bogus".into());
        let mut table = users_v1();
        table.fields.upsert(stale);
        let newer = SchemaSnapshot::new().table(table);

        let delta = compare(&older, &newer);
        let added = &delta.change_for("users").unwrap().fields.add[0];
        assert_eq!(added.after.as_deref(), Some("name"));
    }

    #[test]
    fn test_key_role_alone_is_not_a_change() {
        let older = SchemaSnapshot::new().table(users_v1());
        let indexed = Field::new("name", "varchar(255)").key("MUL");
        let newer = SchemaSnapshot::new().table(users_v1().field(indexed));
        assert!(compare(&older, &newer).is_empty());
    }

    #[test]
    fn test_changed_field_carries_new_definition() {
        let older = SchemaSnapshot::new().table(users_v1());
        let widened = Field::new("name", "varchar(512)").not_null();
        let newer = SchemaSnapshot::new().table(users_v1().field(widened));

        let delta = compare(&older, &newer);
        let change = delta.change_for("users").unwrap();
        assert_eq!(change.fields.change.len(), 1);
        assert_eq!(change.fields.change[0].column_type, "varchar(512)");
        assert!(!change.fields.change[0].nullable);
    }

    #[test]
    fn test_dropped_field_and_index() {
        let older = SchemaSnapshot::new().table(
            users_v1()
                .field(Field::new("legacy", "int"))
                .index(Index::new("users", "legacy_idx", ["legacy"])),
        );
        let newer = SchemaSnapshot::new().table(users_v1());

        let delta = compare(&older, &newer);
        let change = delta.change_for("users").unwrap();
        assert_eq!(change.fields.drop[0].name, "legacy");
        assert_eq!(change.indexes.drop[0].key_name, "legacy_idx");
        assert!(change.indexes.add.is_empty());
    }

    #[test]
    fn test_primary_key_change_is_drop_and_add() {
        let older = SchemaSnapshot::new().table(users_v1());
        let primary = Index::primary("users", ["id", "name"]);
        let newer = SchemaSnapshot::new().table(users_v1().index(primary));

        let delta = compare(&older, &newer);
        let change = delta.change_for("users").unwrap();
        assert_eq!(change.indexes.drop.len(), 1);
        assert_eq!(change.indexes.drop[0].columns, vec!["id"]);
        assert_eq!(change.indexes.add.len(), 1);
        assert_eq!(change.indexes.add[0].columns, vec!["id", "name"]);
    }

    #[test]
    fn test_changed_only_attributes() {
        let older = SchemaSnapshot::new().table(users_v1());
        let newer = SchemaSnapshot::new().table(users_v1().engine("MyISAM"));

        let delta = compare(&older, &newer);
        let attributes = delta.change_for("users").unwrap().attributes.clone();
        assert_eq!(
            attributes,
            Some(TableAttributes {
                engine: Some("MyISAM".into()),
                ..TableAttributes::default()
            })
        );
    }

    #[test]
    fn test_full_attributes_policy() {
        let older = SchemaSnapshot::new().table(users_v1());
        let newer = SchemaSnapshot::new().table(users_v1().comment("accounts"));

        let options = ComparatorOptions::new().with_attribute_policy(AttributePolicy::Full);
        let delta = Comparator::with_options(options).compare(&older, &newer);
        let change = delta.change_for("users").unwrap();
        let attributes = change.attributes.clone().unwrap();
        assert_eq!(attributes.engine.as_deref(), Some("InnoDB"));
        assert_eq!(attributes.row_format.as_deref(), Some(""));
        assert_eq!(attributes.comment.as_deref(), Some("accounts"));
        assert_eq!(attributes.collation.as_deref(), Some("utf8mb4_general_ci"));
    }

    #[test]
    fn test_drop_order_follows_older_declaration() {
        let older = SchemaSnapshot::new()
            .table(Table::new("c"))
            .table(Table::new("a"))
            .table(Table::new("b"));
        let delta = compare(&older, &SchemaSnapshot::new());
        let names: Vec<_> = delta.drop_tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }
}
