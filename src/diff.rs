//! Column-level difference between a remote dataset and its declaration.

use indexmap::IndexMap;

use crate::columns::{Column, ColumnKind};
use crate::dataset::FACTSOF;

/// A column present on both sides with different definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Altered {
    pub old: Column,
    pub new: Column,
}

/// Added, altered and deleted columns, keyed by column name.
///
/// Added and altered keep the local declaration order, deleted keeps the
/// remote order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetDiff {
    pub added: IndexMap<String, Column>,
    pub altered: IndexMap<String, Altered>,
    pub deleted: IndexMap<String, Column>,
}

impl DatasetDiff {
    /// Compare the remote columns (`old`) with the local ones (`new`).
    ///
    /// The implicit `factsof` key is never reported deleted unless a
    /// connection point is added to replace it.
    pub fn compute(remote: &IndexMap<String, Column>, local: &IndexMap<String, Column>) -> Self {
        let mut diff = DatasetDiff::default();

        for (name, column) in local {
            match remote.get(name) {
                None => {
                    diff.added.insert(name.clone(), column.clone());
                }
                Some(old) if !old.is_equivalent(column) => {
                    diff.altered.insert(
                        name.clone(),
                        Altered {
                            old: old.clone(),
                            new: column.clone(),
                        },
                    );
                }
                Some(_) => {}
            }
        }

        for (name, column) in remote {
            if !local.contains_key(name) {
                diff.deleted.insert(name.clone(), column.clone());
            }
        }

        let cp_added = diff
            .added
            .values()
            .any(|c| c.kind() == ColumnKind::ConnectionPoint);
        if !cp_added {
            diff.deleted.shift_remove(FACTSOF);
        }

        diff
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.altered.is_empty() && self.deleted.is_empty()
    }

    /// Number of changed columns.
    pub fn len(&self) -> usize {
        self.added.len() + self.altered.len() + self.deleted.len()
    }
}
