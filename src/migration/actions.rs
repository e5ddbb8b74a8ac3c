//! Single-column migration steps.

use crate::columns::{Changes, Column, ColumnAttribute, ColumnKind, ColumnScope};
use crate::error::{Error, Result};

/// One change to one column of a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationAction {
    Add { scope: ColumnScope, column: Column },
    /// Adding a date column also needs its date dimension.
    AddDate { scope: ColumnScope, column: Column },
    Delete { scope: ColumnScope, column: Column },
    Alter {
        scope: ColumnScope,
        old: Column,
        new: Column,
        changes: Changes,
    },
}

/// How an existing column turns into its new definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alteration {
    /// Nothing GoodData stores differs.
    Unchanged,
    /// Title and data type statements on the existing column.
    InPlace(Changes),
    /// Drop the column and create it again.
    Rebuild,
}

/// Old and new are the same variant, or a label turning into a hyperlink
/// and back.
pub fn same_columns(old: &Column, new: &Column) -> bool {
    old.kind() == new.kind() || (old.kind().is_label() && new.kind().is_label())
}

/// Only attributes that can be altered in place differ.
pub fn is_simple(old: &Column, new: &Column) -> bool {
    old.changed_attributes(new).iter().all(|attr| {
        matches!(
            attr,
            ColumnAttribute::Title | ColumnAttribute::DataType | ColumnAttribute::Folder
        )
    })
}

fn invalid(column: &str, reason: &str) -> Error {
    Error::InvalidAlteration {
        column: column.to_string(),
        reason: reason.to_string(),
    }
}

/// Decide how `old` becomes `new`.
///
/// # Errors
///
/// Returns `Error::InvalidAlteration` for changes GoodData refuses: moving
/// a reference to another element, or giving a date a data type.
pub fn classify(name: &str, old: &Column, new: &Column) -> Result<Alteration> {
    let changed = old.changed_attributes(new);
    if old.kind() == ColumnKind::Reference && new.kind() == ColumnKind::Reference {
        if changed.contains(&ColumnAttribute::Reference)
            || changed.contains(&ColumnAttribute::SchemaReference)
        {
            return Err(invalid(name, "references cannot be redirected"));
        }
    }
    if new.kind() == ColumnKind::Date && new.data_type().is_some() {
        return Err(invalid(name, "dates have no data type"));
    }

    if !(same_columns(old, new) && is_simple(old, new)) {
        return Ok(Alteration::Rebuild);
    }

    let mut changes = Changes::default();
    if changed.contains(&ColumnAttribute::Title) {
        changes.title = Some(new.title().to_string());
    }
    if changed.contains(&ColumnAttribute::DataType) {
        // Dropping a declared type goes back to the platform default.
        changes.data_type = new
            .data_type()
            .or_else(|| new.default_data_type())
            .map(String::from);
    }
    if old.kind() != new.kind() {
        changes.hyperlink = Some(new.kind() == ColumnKind::HyperLink);
    }

    if changes.is_empty() {
        Ok(Alteration::Unchanged)
    } else {
        Ok(Alteration::InPlace(changes))
    }
}

impl MigrationAction {
    /// Add a column, routing dates through their dimension.
    pub fn add(scope: ColumnScope, column: Column) -> Self {
        if column.kind() == ColumnKind::Date {
            Self::AddDate { scope, column }
        } else {
            Self::Add { scope, column }
        }
    }

    pub fn delete(scope: ColumnScope, column: Column) -> Self {
        Self::Delete { scope, column }
    }

    /// Actions turning `old` into `new`: none, one alter, or a delete
    /// followed by an add.
    pub fn alter(scope: ColumnScope, old: Column, new: Column) -> Result<Vec<Self>> {
        Ok(match classify(&scope.name, &old, &new)? {
            Alteration::Unchanged => Vec::new(),
            Alteration::InPlace(changes) => vec![Self::Alter {
                scope,
                old,
                new,
                changes,
            }],
            Alteration::Rebuild => {
                log::debug!("rebuilding column {}.{}", scope.dataset, scope.name);
                vec![
                    Self::delete(scope.clone(), old),
                    Self::add(scope, new),
                ]
            }
        })
    }

    pub fn scope(&self) -> &ColumnScope {
        match self {
            Self::Add { scope, .. }
            | Self::AddDate { scope, .. }
            | Self::Delete { scope, .. }
            | Self::Alter { scope, .. } => scope,
        }
    }

    pub fn dataset(&self) -> &str {
        &self.scope().dataset
    }

    /// The column as it is after the action.
    pub fn column(&self) -> &Column {
        match self {
            Self::Add { column, .. } | Self::AddDate { column, .. } | Self::Delete { column, .. } => {
                column
            }
            Self::Alter { new, .. } => new,
        }
    }

    /// Date dimension needed by the action and whether it carries time.
    pub fn date_dimension(&self) -> Option<(&str, bool)> {
        match self {
            Self::AddDate {
                column: Column::Date(date),
                ..
            } => Some((date.schema_reference.as_str(), date.datetime)),
            _ => None,
        }
    }

    /// MAQL performing the action.
    pub fn maql(&self) -> String {
        match self {
            Self::Add { scope, column } | Self::AddDate { scope, column } => column.maql(scope),
            Self::Delete { scope, column } => column.drop_maql(scope),
            Self::Alter {
                scope,
                old,
                changes,
                ..
            } => old.alter_maql(scope, changes),
        }
    }
}
