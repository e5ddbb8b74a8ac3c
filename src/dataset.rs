//! Dataset declarations.
//!
//! A [`Dataset`] is an explicit, ordered list of named columns. It renders
//! the MAQL creating it on GoodData and the SLI manifest its uploads use.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::archiver::{create_archive, UploadData};
use crate::columns::{Column, ColumnKind, ColumnScope, DateColumn};
use crate::error::{Error, Result};
use crate::manifest::{SliManifest, UploadMode};
use crate::maql;
use crate::text::{to_identifier, to_title, Literal};

/// Name of the implicit key of datasets without a connection point.
pub const FACTSOF: &str = "factsof";

/// A named, ordered collection of columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    name: String,
    columns: Vec<(String, Column)>,
}

/// Row selection of a `DELETE FROM` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowFilter {
    /// A raw MAQL condition.
    Clause(String),
    /// Rows whose value of the column is one of these.
    Values(Vec<Literal>),
}

/// Folders used by a dataset, as `(identifier, title)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Folders {
    pub attribute: Vec<(String, String)>,
    pub fact: Vec<(String, String)>,
}

impl Folders {
    pub fn is_empty(&self) -> bool {
        self.attribute.is_empty() && self.fact.is_empty()
    }
}

#[derive(Serialize, Deserialize)]
struct DatasetFile {
    name: String,
    columns: Vec<DatasetColumn>,
}

#[derive(Serialize, Deserialize)]
struct DatasetColumn {
    name: String,
    #[serde(flatten)]
    column: Column,
}

impl Dataset {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: Vec::new(),
        }
    }

    /// Append a column.
    pub fn column(mut self, name: &str, column: Column) -> Self {
        self.columns.push((name.to_string(), column));
        self
    }

    /// Parse a JSON declaration and validate it.
    ///
    /// ```json
    /// {"name": "Department", "columns": [
    ///     {"name": "department", "ldmType": "CONNECTION_POINT", "title": "Department"},
    ///     {"name": "name", "ldmType": "LABEL", "title": "Name", "reference": "department"}
    /// ]}
    /// ```
    pub fn from_json_str(content: &str) -> Result<Self> {
        let file: DatasetFile = serde_json::from_str(content)?;
        let dataset = file
            .columns
            .into_iter()
            .fold(Dataset::new(&file.name), |dataset, col| {
                dataset.column(&col.name, col.column)
            });
        dataset.validate()?;
        Ok(dataset)
    }

    /// Load a JSON declaration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Serialize back to the JSON declaration format.
    pub fn to_json(&self) -> Result<String> {
        let file = DatasetFile {
            name: self.name.clone(),
            columns: self
                .columns
                .iter()
                .map(|(name, column)| DatasetColumn {
                    name: name.clone(),
                    column: column.clone(),
                })
                .collect(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    /// Schema name, as declared.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lower-cased name used in every GoodData identifier.
    pub fn identifier(&self) -> String {
        to_identifier(&self.name)
    }

    pub fn title(&self) -> String {
        to_title(&self.name)
    }

    pub fn columns(&self) -> &[(String, Column)] {
        &self.columns
    }

    /// Columns keyed by identifier, in declaration order.
    pub fn column_map(&self) -> IndexMap<String, Column> {
        self.columns
            .iter()
            .map(|(name, column)| (to_identifier(name), column.clone()))
            .collect()
    }

    /// Look a column up by name, ignoring case.
    pub fn get(&self, name: &str) -> Option<&Column> {
        let name = to_identifier(name);
        self.columns
            .iter()
            .find(|(n, _)| to_identifier(n) == name)
            .map(|(_, column)| column)
    }

    /// Check the structural rules of a dataset.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| Error::InvalidDataset {
            dataset: self.name.clone(),
            message,
        };

        if self.name.trim().is_empty() {
            return Err(invalid("dataset name is empty".into()));
        }

        let mut seen = std::collections::HashSet::new();
        for (name, _) in &self.columns {
            if name.is_empty() {
                return Err(invalid("column name is empty".into()));
            }
            if !seen.insert(to_identifier(name)) {
                return Err(invalid(format!("duplicate column {name}")));
            }
        }

        let connection_points = self
            .columns
            .iter()
            .filter(|(_, c)| c.kind() == ColumnKind::ConnectionPoint)
            .count();
        if connection_points > 1 {
            return Err(invalid(format!(
                "{connection_points} connection points, at most one allowed"
            )));
        }

        for (name, column) in &self.columns {
            match column {
                Column::Label(l) | Column::HyperLink(l) => {
                    let target = self.get(&l.reference).map(Column::kind);
                    if !target.is_some_and(|kind| kind.is_attribute()) {
                        return Err(invalid(format!(
                            "label {name} references {}, which is not an attribute of this dataset",
                            l.reference
                        )));
                    }
                }
                Column::Reference(r) => {
                    if to_identifier(&r.schema_reference) == self.identifier() {
                        return Err(invalid(format!(
                            "reference {name} must point to another dataset"
                        )));
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Scope of a column of this dataset.
    pub fn scope(&self, name: &str) -> ColumnScope {
        let references_cp = match self.get(name) {
            Some(Column::Label(l)) | Some(Column::HyperLink(l)) => {
                matches!(self.get(&l.reference), Some(Column::ConnectionPoint(_)))
            }
            _ => false,
        };
        ColumnScope::new(&self.name, name).references_cp(references_cp)
    }

    /// The connection point, if any, with its name.
    pub fn connection_point(&self) -> Option<(&str, &Column)> {
        self.columns
            .iter()
            .find(|(_, c)| c.kind() == ColumnKind::ConnectionPoint)
            .map(|(name, column)| (name.as_str(), column))
    }

    pub fn date_columns(&self) -> Vec<(&str, &DateColumn)> {
        self.columns
            .iter()
            .filter_map(|(name, column)| match column {
                Column::Date(date) => Some((name.as_str(), date)),
                _ => None,
            })
            .collect()
    }

    /// Names of date columns, split into plain dates and datetimes.
    pub fn date_column_names(&self) -> (Vec<String>, Vec<String>) {
        let (datetimes, dates): (Vec<_>, Vec<_>) = self
            .date_columns()
            .into_iter()
            .partition(|(_, date)| date.datetime);
        (
            dates.into_iter().map(|(n, _)| n.to_string()).collect(),
            datetimes.into_iter().map(|(n, _)| n.to_string()).collect(),
        )
    }

    /// Folders used by the columns, deduplicated in declaration order.
    pub fn folders(&self) -> Folders {
        let mut folders = Folders::default();
        for (_, column) in &self.columns {
            let Some(folder) = column.folder() else {
                continue;
            };
            let entry = (to_identifier(folder), to_title(folder));
            let bucket = match column.kind() {
                ColumnKind::Fact | ColumnKind::Date => &mut folders.fact,
                _ => &mut folders.attribute,
            };
            if !bucket.contains(&entry) {
                bucket.push(entry);
            }
        }
        folders
    }

    fn columns_of<'a>(
        &'a self,
        kinds: &'a [ColumnKind],
    ) -> impl Iterator<Item = (&'a str, &'a Column)> + 'a {
        self.columns
            .iter()
            .filter(move |(_, c)| kinds.contains(&c.kind()))
            .map(|(name, column)| (name.as_str(), column))
    }

    /// MAQL creating the dataset and its columns.
    ///
    /// Statements come in dependency order: dataset, folders, attributes,
    /// facts and dates, references, labels, the connection point's
    /// original label (or the implicit `factsof` key), synchronisation.
    pub fn maql(&self) -> String {
        let dataset = self.identifier();
        let mut maql = vec![maql::create_dataset(&dataset, &self.title())];

        let folders = self.folders();
        if !folders.is_empty() {
            maql.push("# CREATE THE FOLDERS THAT GROUP ATTRIBUTES AND FACTS".into());
            for (folder, title) in &folders.attribute {
                maql.push(maql::create_attribute_folder(folder, title));
            }
            maql.push(String::new());
            for (folder, title) in &folders.fact {
                maql.push(maql::create_fact_folder(folder, title));
            }
            maql.push(String::new());
        }

        maql.push("# CREATE ATTRIBUTES.".into());
        for (name, column) in self.columns_of(&[ColumnKind::Attribute, ColumnKind::ConnectionPoint]) {
            maql.push(column.create_maql(&self.scope(name)));
        }

        maql.push("# CREATE FACTS AND DATE FACTS".into());
        for (name, column) in self.columns_of(&[ColumnKind::Fact, ColumnKind::Date]) {
            maql.push(column.create_maql(&self.scope(name)));
        }

        maql.push("# CREATE REFERENCES".into());
        for (name, column) in self.columns_of(&[ColumnKind::Reference]) {
            maql.push(column.create_maql(&self.scope(name)));
        }

        // The first label of each attribute becomes its default one.
        let mut defaulted: Vec<String> = Vec::new();
        for (name, column) in self.columns_of(&[ColumnKind::Label, ColumnKind::HyperLink]) {
            let scope = self.scope(name);
            maql.push(column.create_maql(&scope));
            let reference = column.reference_name().map(to_identifier).unwrap_or_default();
            if !defaulted.contains(&reference) {
                if let Some(default) = column.default_label_maql(&scope) {
                    maql.push(default);
                }
                defaulted.push(reference);
            }
        }

        match self.connection_point() {
            Some((name, column)) => {
                maql.push("# ADD LABEL TO CONNECTION POINT".into());
                maql.push(column.original_label_maql(&self.scope(name)));
            }
            None => maql.push(maql::factsof_create(&dataset, &self.title())),
        }

        maql.push(maql::synchronize(&dataset));
        maql.join("\n")
    }

    /// SLI manifest loading every column.
    pub fn manifest(&self, mode: UploadMode) -> SliManifest {
        let parts = self
            .columns
            .iter()
            .flat_map(|(name, column)| column.manifest_parts(&self.scope(name), mode))
            .collect();
        SliManifest::new(&self.identifier(), parts)
    }

    /// Zip archive loading `data` into the dataset.
    pub fn archive(
        &self,
        data: &UploadData,
        mode: UploadMode,
        keep_csv: Option<&Path>,
    ) -> Result<Vec<u8>> {
        let (dates, datetimes) = self.date_column_names();
        create_archive(data, &self.manifest(mode), &dates, &datetimes, keep_csv)
    }

    pub fn synchronize_statement(&self) -> String {
        maql::synchronize(&self.identifier())
    }

    /// MAQL deleting rows of the dataset.
    ///
    /// Without `column`, rows are matched on the connection point. With an
    /// attribute column, only that attribute's elements are deleted.
    pub fn delete_rows_maql(&self, column: Option<&str>, filter: &RowFilter) -> Result<String> {
        let fail = |message: String| Error::RowDeletion {
            dataset: self.name.clone(),
            message,
        };
        let dataset = self.identifier();

        let selected = match column {
            Some(name) => {
                let col = self
                    .get(name)
                    .ok_or_else(|| fail(format!("unknown column {name}")))?;
                if !col.kind().is_attribute() {
                    return Err(fail(format!("{name} is not an attribute")));
                }
                Some((name, col))
            }
            None => self.connection_point(),
        };

        let target = match selected {
            Some((name, col)) if col.kind() == ColumnKind::Attribute => {
                format!("label.{dataset}.{}", to_identifier(name))
            }
            Some((name, _)) => format!("attr.{dataset}.{}", to_identifier(name)),
            None => format!("attr.{dataset}.{FACTSOF}"),
        };

        let clause = match filter {
            RowFilter::Clause(clause) if clause.trim().is_empty() => {
                return Err(fail("empty where clause".into()));
            }
            RowFilter::Clause(clause) => clause.clone(),
            RowFilter::Values(values) => {
                if values.is_empty() {
                    return Err(fail("no values to match".into()));
                }
                let Some((name, _)) = selected else {
                    return Err(fail(
                        "matching values needs a column when there is no connection point".into(),
                    ));
                };
                let values: Vec<String> = values.iter().map(Literal::to_maql).collect();
                format!(
                    "{{label.{dataset}.{}}} IN ({})",
                    to_identifier(name),
                    values.join(", ")
                )
            }
        };

        Ok(maql::delete_rows(&target, &clause))
    }
}
