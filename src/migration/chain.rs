//! Ordered migration actions rendered into one MAQL script.

use std::fs;

use crate::date_dimension::DateDimension;
use crate::error::{Error, Result};
use crate::maql;
use crate::project::Project;
use crate::text::to_identifier;

use super::actions::MigrationAction;
use super::MigrationOptions;

/// Actions applied together, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationChain {
    name: String,
    actions: Vec<MigrationAction>,
}

impl MigrationChain {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            actions: Vec::new(),
        }
    }

    pub fn push(&mut self, action: MigrationAction) {
        self.actions.push(action);
    }

    pub fn extend(&mut self, actions: impl IntoIterator<Item = MigrationAction>) {
        self.actions.extend(actions);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn actions(&self) -> &[MigrationAction] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Drop label deletions already covered by the cascade of their
    /// attribute's deletion.
    pub fn fold_cascades(&mut self) {
        let dropped: Vec<(String, String)> = self
            .actions
            .iter()
            .filter_map(|action| match action {
                MigrationAction::Delete { scope, column } if column.kind().is_attribute() => {
                    Some((scope.dataset.clone(), scope.name.clone()))
                }
                _ => None,
            })
            .collect();

        self.actions.retain(|action| {
            let MigrationAction::Delete { scope, column } = action else {
                return true;
            };
            if !column.kind().is_label() {
                return true;
            }
            let reference = column.reference_name().map(to_identifier).unwrap_or_default();
            let cascaded = dropped
                .iter()
                .any(|(dataset, name)| *dataset == scope.dataset && *name == reference);
            if cascaded {
                log::debug!("label {} is dropped with {reference}", scope.name);
            }
            !cascaded
        });
    }

    /// Datasets touched by the chain, in first-seen order.
    pub fn datasets(&self) -> Vec<&str> {
        let mut datasets: Vec<&str> = Vec::new();
        for action in &self.actions {
            if !datasets.contains(&action.dataset()) {
                datasets.push(action.dataset());
            }
        }
        datasets
    }

    /// Date dimensions the chain needs, with whether any user wants time.
    pub fn date_dimensions(&self) -> Vec<(String, bool)> {
        let mut dimensions: Vec<(String, bool)> = Vec::new();
        for (name, datetime) in self.actions.iter().filter_map(MigrationAction::date_dimension) {
            match dimensions.iter_mut().find(|(known, _)| known == name) {
                Some((_, time)) => *time |= datetime,
                None => dimensions.push((name.to_string(), datetime)),
            }
        }
        dimensions
    }

    /// Every action's MAQL, then one synchronisation per dataset.
    pub fn maql(&self) -> String {
        let mut out: String = self.actions.iter().map(MigrationAction::maql).collect();
        for dataset in self.datasets() {
            out.push_str(&maql::synchronize_preserve(dataset));
        }
        out
    }

    /// Run the chain against a project.
    ///
    /// The MAQL is written to `dump_path` before anything is sent. A dry
    /// run stops there. Returns the generated MAQL.
    ///
    /// # Errors
    ///
    /// Every failure is wrapped in `Error::Migration` with the chain's name.
    pub fn execute(&self, project: &Project<'_>, options: &MigrationOptions) -> Result<String> {
        self.run(project, options).map_err(|source| Error::Migration {
            name: self.name.clone(),
            source: Box::new(source),
        })
    }

    fn run(&self, project: &Project<'_>, options: &MigrationOptions) -> Result<String> {
        let maql = self.maql();
        log::info!(
            "migration {}: {} actions, {} bytes of MAQL",
            self.name,
            self.len(),
            maql.len()
        );

        if let Some(path) = &options.dump_path {
            fs::write(path, &maql).map_err(|source| Error::Io {
                path: path.clone(),
                source,
            })?;
        }
        if options.dry_run || self.is_empty() {
            return Ok(maql);
        }

        let dimensions = DateDimension::new(project);
        for (name, datetime) in self.date_dimensions() {
            if dimensions.ensure(&name, datetime)? {
                log::info!("created date dimension {name}");
            }
        }

        project.execute_maql(&maql)?;
        Ok(maql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::{Column, ColumnScope};

    fn scope(name: &str) -> ColumnScope {
        ColumnScope::new("Department", name)
    }

    #[test]
    fn one_synchronisation_per_dataset() {
        let mut chain = MigrationChain::new("department");
        chain.push(MigrationAction::add(scope("windows"), Column::fact("Windows")));
        chain.push(MigrationAction::add(scope("doors"), Column::fact("Doors")));
        chain.push(MigrationAction::add(
            ColumnScope::new("Salary", "bonus"),
            Column::fact("Bonus"),
        ));

        let maql = chain.maql();
        assert_eq!(maql.matches("SYNCHRONIZE {dataset.department} PRESERVE DATA;").count(), 1);
        assert!(maql.ends_with(
            "SYNCHRONIZE {dataset.department} PRESERVE DATA;\nSYNCHRONIZE {dataset.salary} PRESERVE DATA;\n"
        ));
        assert_eq!(chain.datasets(), vec!["department", "salary"]);
    }

    #[test]
    fn label_deletion_folds_into_attribute_cascade() {
        let mut chain = MigrationChain::new("department");
        chain.push(MigrationAction::delete(
            scope("city_name"),
            Column::label("City name", "city"),
        ));
        chain.push(MigrationAction::delete(scope("city"), Column::attribute("City")));
        chain.push(MigrationAction::delete(
            scope("boss_name"),
            Column::label("Boss name", "boss"),
        ));
        chain.fold_cascades();

        let names: Vec<&str> = chain.actions().iter().map(|a| a.scope().name.as_str()).collect();
        assert_eq!(names, vec!["city", "boss_name"]);
    }

    #[test]
    fn date_dimensions_are_merged() {
        let mut chain = MigrationChain::new("salary");
        chain.push(MigrationAction::add(
            ColumnScope::new("Salary", "paid"),
            Column::date("Paid", "payment"),
        ));
        chain.push(MigrationAction::add(
            ColumnScope::new("Salary", "booked"),
            Column::date("Booked", "payment").with_time(),
        ));
        chain.push(MigrationAction::add(
            ColumnScope::new("Salary", "hired"),
            Column::date("Hired", "hiring"),
        ));
        assert_eq!(
            chain.date_dimensions(),
            vec![("payment".to_string(), true), ("hiring".to_string(), false)]
        );
    }

    #[test]
    fn empty_chain_has_no_maql() {
        assert_eq!(MigrationChain::new("department").maql(), "");
    }
}
