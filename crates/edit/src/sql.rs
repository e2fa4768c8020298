// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # SQL object editors
//!
//! Dialect-aware DDL for the generic entities. Identifiers are quoted only
//! when the server would not read them back unchanged.
//!
//! ## Dialect differences
//!
//! | Change | MySQL family | PostgreSQL family / standard |
//! |--------|--------------|------------------------------|
//! | Comments | inline `COMMENT '...'` | separate `COMMENT ON ... IS` |
//! | Column alter | one `MODIFY COLUMN` | one `ALTER COLUMN` per property |
//! | Table rename | `RENAME TABLE a TO s.b` | `ALTER TABLE a RENAME TO b` |
//! | Index drop | `DROP INDEX i ON t` | `DROP INDEX s.i` |

use crate::editor::{EditorCapabilities, ObjectEditor};
use crate::error::{EditError, EditResult};
use crate::persist::PersistAction;
use sqlmeta_cache::TableCache;
use sqlmeta_model::{
    CatalogObject, Column, Dialect, DialectFamily, DialectFeature, Index, ObjectKind, ObjectPath,
    Table, TypedObject,
};
use std::sync::Arc;

fn qualify_path(dialect: Dialect, path: &ObjectPath) -> String {
    dialect.qualify(path.segments().iter().map(String::as_str))
}

fn comment_literal(dialect: Dialect, comment: Option<&str>) -> String {
    match comment {
        Some(text) => dialect.quote_literal(text),
        None => "NULL".to_string(),
    }
}

fn column_definition(dialect: Dialect, column: &Column) -> String {
    let mut sql = format!(
        "{} {}",
        dialect.quote_identifier(&column.name),
        column.full_type_name()
    );
    if !column.nullable {
        sql.push_str(" NOT NULL");
    }
    if let Some(default) = &column.default_value {
        sql.push_str(" DEFAULT ");
        sql.push_str(default);
    }
    if dialect.supports(DialectFeature::InlineComment) {
        if let Some(comment) = &column.comment {
            sql.push_str(" COMMENT ");
            sql.push_str(&dialect.quote_literal(comment));
        }
    }
    sql
}

fn column_comment_action(dialect: Dialect, column: &Column) -> PersistAction {
    PersistAction::new(
        format!("Comment on column {}", column.name),
        format!(
            "COMMENT ON COLUMN {} IS {}",
            qualify_path(dialect, &column.path()),
            comment_literal(dialect, column.comment.as_deref())
        ),
    )
}

/// Tables: create with nested columns, comment alter, rename, drop
///
/// Creating a table aggregates later edits of the table and of its columns,
/// so the CREATE statement always reflects the final in-memory state.
pub struct TableEditor {
    dialect: Dialect,
    tables: Arc<TableCache>,
}

impl TableEditor {
    pub fn new(dialect: Dialect, tables: Arc<TableCache>) -> Self {
        Self { dialect, tables }
    }

    fn qualified(&self, table: &Table) -> String {
        qualify_path(self.dialect, &table.path())
    }

    fn table_comment_action(&self, table: &Table) -> PersistAction {
        PersistAction::new(
            format!("Comment on table {}", table.name),
            format!(
                "COMMENT ON TABLE {} IS {}",
                self.qualified(table),
                comment_literal(self.dialect, table.comment.as_deref())
            ),
        )
    }
}

impl ObjectEditor<Table> for TableEditor {
    fn capabilities(&self) -> EditorCapabilities {
        EditorCapabilities::ALL
    }

    fn aggregates(&self) -> bool {
        true
    }

    fn absorbs(&self, kind: ObjectKind) -> bool {
        kind == ObjectKind::Column
    }

    fn create_actions(&self, table: &Table) -> EditResult<Vec<PersistAction>> {
        if table.table_type.is_view() {
            return Err(EditError::NotSupported(format!(
                "view '{}' cannot be created from a column list",
                table.name
            )));
        }
        let columns = self.tables.get_children_cache(table).cached_objects();
        if columns.is_empty() {
            return Err(EditError::Validation(format!(
                "table '{}' must have at least one column",
                table.name
            )));
        }

        let definitions: Vec<String> = columns
            .iter()
            .map(|c| column_definition(self.dialect, c))
            .collect();
        let mut sql = format!(
            "CREATE TABLE {} (\n    {}\n)",
            self.qualified(table),
            definitions.join(",\n    ")
        );

        let mut actions = Vec::new();
        if self.dialect.supports(DialectFeature::InlineComment) {
            if let Some(comment) = &table.comment {
                sql.push_str(" COMMENT=");
                sql.push_str(&self.dialect.quote_literal(comment));
            }
            actions.push(PersistAction::new(format!("Create table {}", table.name), sql));
        } else {
            actions.push(PersistAction::new(format!("Create table {}", table.name), sql));
            if self.dialect.supports(DialectFeature::CommentOn) {
                if table.comment.is_some() {
                    actions.push(self.table_comment_action(table));
                }
                actions.extend(
                    columns
                        .iter()
                        .filter(|c| c.comment.is_some())
                        .map(|c| column_comment_action(self.dialect, c)),
                );
            }
        }
        Ok(actions)
    }

    fn alter_actions(&self, old: &Table, new: &Table) -> EditResult<Vec<PersistAction>> {
        if old.table_type != new.table_type {
            return Err(EditError::NotSupported(format!(
                "cannot change the type of table '{}'",
                old.name
            )));
        }
        if old.comment == new.comment {
            return Ok(Vec::new());
        }
        let action = if self.dialect.supports(DialectFeature::InlineComment) {
            PersistAction::new(
                format!("Alter table {}", new.name),
                format!(
                    "ALTER TABLE {} COMMENT = {}",
                    self.qualified(new),
                    self.dialect
                        .quote_literal(new.comment.as_deref().unwrap_or_default())
                ),
            )
        } else if self.dialect.supports(DialectFeature::CommentOn) {
            self.table_comment_action(new)
        } else {
            return Err(EditError::NotSupported(format!(
                "{:?} has no table comments",
                self.dialect
            )));
        };
        Ok(vec![action])
    }

    fn rename_actions(&self, table: &Table, new_name: &str) -> EditResult<Vec<PersistAction>> {
        let sql = match self.dialect.family() {
            DialectFamily::MySQL => {
                let target = table.parent().child(new_name);
                format!(
                    "RENAME TABLE {} TO {}",
                    self.qualified(table),
                    qualify_path(self.dialect, &target)
                )
            }
            DialectFamily::PostgreSQL | DialectFamily::Standard => format!(
                "ALTER TABLE {} RENAME TO {}",
                self.qualified(table),
                self.dialect.quote_identifier(new_name)
            ),
        };
        Ok(vec![PersistAction::new(
            format!("Rename table {} to {}", table.name, new_name),
            sql,
        )])
    }

    fn delete_actions(&self, table: &Table) -> EditResult<Vec<PersistAction>> {
        let keyword = if table.table_type.is_view() {
            "VIEW"
        } else {
            "TABLE"
        };
        Ok(vec![PersistAction::new(
            format!("Drop {} {}", keyword.to_lowercase(), table.name),
            format!("DROP {keyword} {}", self.qualified(table)),
        )])
    }
}

/// Columns of existing tables
pub struct ColumnEditor {
    dialect: Dialect,
}

impl ColumnEditor {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    fn alter_table(&self, column: &Column) -> String {
        format!("ALTER TABLE {}", qualify_path(self.dialect, column.parent()))
    }

    // One statement per changed property.
    fn alter_column_actions(&self, old: &Column, new: &Column) -> Vec<PersistAction> {
        let prefix = format!(
            "{} ALTER COLUMN {}",
            self.alter_table(new),
            self.dialect.quote_identifier(&new.name)
        );
        let mut actions = Vec::new();
        if old.full_type_name() != new.full_type_name() {
            actions.push(PersistAction::new(
                format!("Change type of {}", new.name),
                format!("{prefix} TYPE {}", new.full_type_name()),
            ));
        }
        if old.nullable != new.nullable {
            let clause = if new.nullable {
                "DROP NOT NULL"
            } else {
                "SET NOT NULL"
            };
            actions.push(PersistAction::new(
                format!("Change nullability of {}", new.name),
                format!("{prefix} {clause}"),
            ));
        }
        if old.default_value != new.default_value {
            let clause = match &new.default_value {
                Some(default) => format!("SET DEFAULT {default}"),
                None => "DROP DEFAULT".to_string(),
            };
            actions.push(PersistAction::new(
                format!("Change default of {}", new.name),
                format!("{prefix} {clause}"),
            ));
        }
        if old.comment != new.comment && self.dialect.supports(DialectFeature::CommentOn) {
            actions.push(column_comment_action(self.dialect, new));
        }
        actions
    }
}

impl ObjectEditor<Column> for ColumnEditor {
    fn capabilities(&self) -> EditorCapabilities {
        EditorCapabilities::ALL
    }

    fn validate(&self, column: &Column) -> EditResult<()> {
        if column.name.trim().is_empty() {
            return Err(EditError::Validation("column name must not be empty".into()));
        }
        if column.type_name.trim().is_empty() {
            return Err(EditError::Validation(format!(
                "column '{}' has no data type",
                column.name
            )));
        }
        Ok(())
    }

    fn create_actions(&self, column: &Column) -> EditResult<Vec<PersistAction>> {
        let mut actions = vec![PersistAction::new(
            format!("Add column {}", column.name),
            format!(
                "{} ADD COLUMN {}",
                self.alter_table(column),
                column_definition(self.dialect, column)
            ),
        )];
        if column.comment.is_some() && self.dialect.supports(DialectFeature::CommentOn) {
            actions.push(column_comment_action(self.dialect, column));
        }
        Ok(actions)
    }

    fn alter_actions(&self, old: &Column, new: &Column) -> EditResult<Vec<PersistAction>> {
        let changed = old.full_type_name() != new.full_type_name()
            || old.nullable != new.nullable
            || old.default_value != new.default_value
            || old.comment != new.comment;
        if !changed {
            return Ok(Vec::new());
        }
        if self.dialect.supports(DialectFeature::ModifyColumn) {
            return Ok(vec![PersistAction::new(
                format!("Modify column {}", new.name),
                format!(
                    "{} MODIFY COLUMN {}",
                    self.alter_table(new),
                    column_definition(self.dialect, new)
                ),
            )]);
        }
        Ok(self.alter_column_actions(old, new))
    }

    fn rename_actions(&self, column: &Column, new_name: &str) -> EditResult<Vec<PersistAction>> {
        if !self.dialect.supports(DialectFeature::RenameColumn) {
            return Err(EditError::NotSupported(format!(
                "{:?} cannot rename columns",
                self.dialect
            )));
        }
        Ok(vec![PersistAction::new(
            format!("Rename column {} to {}", column.name, new_name),
            format!(
                "{} RENAME COLUMN {} TO {}",
                self.alter_table(column),
                self.dialect.quote_identifier(&column.name),
                self.dialect.quote_identifier(new_name)
            ),
        )])
    }

    fn delete_actions(&self, column: &Column) -> EditResult<Vec<PersistAction>> {
        Ok(vec![PersistAction::new(
            format!("Drop column {}", column.name),
            format!(
                "{} DROP COLUMN {}",
                self.alter_table(column),
                self.dialect.quote_identifier(&column.name)
            ),
        )])
    }
}

/// Indexes: create and drop only
pub struct IndexEditor {
    dialect: Dialect,
}

impl IndexEditor {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }
}

impl ObjectEditor<Index> for IndexEditor {
    fn capabilities(&self) -> EditorCapabilities {
        EditorCapabilities::CREATE_DROP
    }

    fn validate(&self, index: &Index) -> EditResult<()> {
        if index.name.trim().is_empty() {
            return Err(EditError::Validation("index name must not be empty".into()));
        }
        if index.columns.is_empty() {
            return Err(EditError::Validation(format!(
                "index '{}' has no columns",
                index.name
            )));
        }
        Ok(())
    }

    fn create_actions(&self, index: &Index) -> EditResult<Vec<PersistAction>> {
        let columns: Vec<String> = index
            .columns
            .iter()
            .map(|c| self.dialect.quote_identifier(c))
            .collect();
        let unique = if index.unique { "UNIQUE " } else { "" };
        Ok(vec![PersistAction::new(
            format!("Create index {}", index.name),
            format!(
                "CREATE {unique}INDEX {} ON {} ({})",
                self.dialect.quote_identifier(&index.name),
                qualify_path(self.dialect, index.parent()),
                columns.join(", ")
            ),
        )])
    }

    fn delete_actions(&self, index: &Index) -> EditResult<Vec<PersistAction>> {
        let name = self.dialect.quote_identifier(&index.name);
        let sql = match self.dialect.family() {
            DialectFamily::MySQL => format!(
                "DROP INDEX {name} ON {}",
                qualify_path(self.dialect, index.parent())
            ),
            DialectFamily::PostgreSQL => {
                // indexes live in the schema of their table
                let schema = index.parent().parent().unwrap_or_default();
                format!(
                    "DROP INDEX {}",
                    qualify_path(self.dialect, &schema.child(index.name.clone()))
                )
            }
            DialectFamily::Standard => format!("DROP INDEX {name}"),
        };
        Ok(vec![PersistAction::new(format!("Drop index {}", index.name), sql)])
    }
}
