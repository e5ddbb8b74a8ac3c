//! Migration planning and execution.

use indexmap::IndexMap;

use crate::columns::{Column, ColumnKind, ColumnScope};
use crate::dataset::Dataset;
use crate::diff::DatasetDiff;
use crate::error::{Error, Result};
use crate::project::Project;
use crate::state::RemoteState;
use crate::text::to_identifier;

use super::actions::MigrationAction;
use super::chain::MigrationChain;
use super::MigrationOptions;

/// Brings remote datasets in line with their declarations.
pub struct MigrationEngine<'p, 'c> {
    project: &'p Project<'c>,
    options: MigrationOptions,
}

/// Label reference of an action's column, if it is a label.
fn label_reference(action: &MigrationAction) -> Option<String> {
    let column = action.column();
    if column.kind().is_label() {
        column.reference_name().map(to_identifier)
    } else {
        None
    }
}

impl<'p, 'c> MigrationEngine<'p, 'c> {
    pub fn new(project: &'p Project<'c>, options: MigrationOptions) -> Self {
        Self { project, options }
    }

    /// Chain turning the `remote` columns into the declared `dataset`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidAlteration` when a column change cannot be
    /// expressed on GoodData.
    pub fn plan(dataset: &Dataset, remote: &IndexMap<String, Column>) -> Result<MigrationChain> {
        let diff = DatasetDiff::compute(remote, &dataset.column_map());
        let mut chain = MigrationChain::new(&dataset.identifier());

        let mut adds: Vec<MigrationAction> = diff
            .added
            .iter()
            .map(|(name, column)| MigrationAction::add(dataset.scope(name), column.clone()))
            .collect();

        let mut alters = Vec::new();
        let mut rebuilt: Vec<String> = Vec::new();
        for (name, altered) in &diff.altered {
            let actions = MigrationAction::alter(
                dataset.scope(name),
                altered.old.clone(),
                altered.new.clone(),
            )?;
            let drops_old = actions
                .iter()
                .any(|action| matches!(action, MigrationAction::Delete { .. }));
            if drops_old && altered.old.kind().is_attribute() {
                rebuilt.push(name.clone());
            }
            alters.extend(actions);
        }

        // Labels of a rebuilt attribute go down with it and are created again
        // once the attribute exists.
        if !rebuilt.is_empty() {
            let on_rebuilt = |action: &MigrationAction| {
                !matches!(action, MigrationAction::Delete { .. })
                    && label_reference(action).is_some_and(|r| rebuilt.contains(&r))
            };
            adds.retain(|action| !on_rebuilt(action));
            alters.retain(|action| !on_rebuilt(action));
            for (name, column) in dataset.columns() {
                let references_rebuilt = column.kind().is_label()
                    && column
                        .reference_name()
                        .is_some_and(|r| rebuilt.contains(&to_identifier(r)));
                if references_rebuilt {
                    alters.push(MigrationAction::add(dataset.scope(name), column.clone()));
                }
            }
        }

        let deletes = diff.deleted.iter().map(|(name, column)| {
            let references_cp = column
                .reference_name()
                .and_then(|r| remote.get(&to_identifier(r)))
                .is_some_and(|target| target.kind() == ColumnKind::ConnectionPoint);
            let scope = ColumnScope::new(dataset.name(), name)
                .references_cp(column.kind().is_label() && references_cp);
            MigrationAction::delete(scope, column.clone())
        });

        chain.extend(adds);
        chain.extend(alters);
        chain.extend(deletes);
        chain.fold_cascades();

        log::info!(
            "planned migration of {}: {} added, {} altered, {} deleted, {} actions",
            dataset.name(),
            diff.added.len(),
            diff.altered.len(),
            diff.deleted.len(),
            chain.len()
        );
        Ok(chain)
    }

    /// Reconstruct the remote dataset, plan against the declaration and run
    /// the chain.
    ///
    /// # Errors
    ///
    /// Any failure is wrapped in `Error::Migration`.
    pub fn migrate(&self, dataset: &Dataset) -> Result<MigrationChain> {
        let wrap = |source: Error| match source {
            Error::Migration { .. } => source,
            source => Error::Migration {
                name: dataset.identifier(),
                source: Box::new(source),
            },
        };

        let remote = RemoteState::new(self.project, dataset.name())
            .remote_columns()
            .map_err(wrap)?;
        let chain = Self::plan(dataset, &remote).map_err(wrap)?;
        chain.execute(self.project, &self.options)?;
        Ok(chain)
    }
}
