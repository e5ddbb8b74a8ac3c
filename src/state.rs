//! Remote state of a dataset.

use indexmap::IndexMap;
use serde_json::Value;

use crate::columns::{Column, ColumnKind};
use crate::dataset::Dataset;
use crate::diff::DatasetDiff;
use crate::error::Result;
use crate::project::Project;
use crate::reconstruct::{
    column_detail, foreign_references, identifier_of, is_connection_point, reconstruct,
    RemoteAttribute, RemoteReference, RemoteSnapshot,
};
use crate::text::to_identifier;

/// Object URIs grouped the way a dataset lists them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnUris {
    pub attributes: Vec<String>,
    pub facts: Vec<String>,
    pub data_loading_columns: Vec<String>,
}

fn uris(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

/// Reads what a dataset looks like on GoodData.
pub struct RemoteState<'p, 'c> {
    project: &'p Project<'c>,
    dataset: String,
}

impl<'p, 'c> RemoteState<'p, 'c> {
    pub fn new(project: &'p Project<'c>, dataset: &str) -> Self {
        Self {
            project,
            dataset: to_identifier(dataset),
        }
    }

    pub fn column_uris(&self, dataset: &str) -> Result<ColumnUris> {
        let metadata = self.project.dataset_metadata(dataset)?;
        let uri = metadata["meta"]["uri"].as_str().unwrap_or_default();
        let object = self.project.connection().get_json(uri)?;
        let content = &object["dataSet"]["content"];
        Ok(ColumnUris {
            attributes: uris(&content["attributes"]),
            facts: uris(&content["facts"]),
            data_loading_columns: uris(&content["dataLoadingColumns"]),
        })
    }

    /// Body of an attribute, fact or data loading column.
    pub fn column_detail(&self, uri: &str) -> Result<Value> {
        let object = self.project.connection().get_json(uri)?;
        Ok(column_detail(&object).clone())
    }

    /// Identifier of the column holding an attribute's primary key.
    pub fn pk_identifier(&self, detail: &Value) -> Result<Option<String>> {
        let Some(pk_uri) = detail["content"]["pk"][0]["data"].as_str() else {
            return Ok(None);
        };
        let pk = self.project.connection().get_json(pk_uri)?;
        Ok(pk["column"]["meta"]["identifier"].as_str().map(String::from))
    }

    /// URI of a dataset's connection point attribute.
    fn connection_point_uri(&self, dataset: &str, connection_point: &str) -> Result<Option<String>> {
        let identifier = format!("attr.{dataset}.{connection_point}");
        for uri in self.column_uris(dataset)?.attributes {
            let detail = self.column_detail(&uri)?;
            if identifier_of(&detail) != identifier {
                continue;
            }
            let pk = self.pk_identifier(&detail)?;
            if is_connection_point(dataset, pk.as_deref()) {
                return Ok(Some(uri));
            }
        }
        Ok(None)
    }

    /// Foreign keys of the manifest, kept when the referenced connection
    /// point is actually used by this dataset.
    fn references(&self, snapshot: &RemoteSnapshot) -> Result<Vec<RemoteReference>> {
        let Some(manifest) = &snapshot.manifest else {
            return Ok(Vec::new());
        };
        let user = format!("dataset.{}", self.dataset);
        let column_prefix = format!("col.f_{}.", self.dataset);

        let mut references = Vec::new();
        for (name, dataset, connection_point) in foreign_references(&self.dataset, manifest) {
            let Some(cp_uri) = self.connection_point_uri(&dataset, &connection_point)? else {
                log::debug!("no connection point {dataset}.{connection_point} for reference {name}");
                continue;
            };
            let used = self.project.used_by(&cp_uri)?.iter().any(|entry| {
                let identifier = entry["identifier"].as_str().unwrap_or_default();
                identifier == user || identifier.starts_with(&column_prefix)
            });
            if used {
                references.push(RemoteReference {
                    name,
                    dataset,
                    connection_point,
                });
            }
        }
        Ok(references)
    }

    /// Fetch everything needed to rebuild the dataset's columns.
    pub fn snapshot(&self) -> Result<RemoteSnapshot> {
        let uris = self.column_uris(&self.dataset)?;
        let mut snapshot = RemoteSnapshot {
            dataset: self.dataset.clone(),
            manifest: Some(self.project.sli_manifest(&self.dataset)?),
            ..RemoteSnapshot::default()
        };

        for uri in &uris.attributes {
            let detail = self.column_detail(uri)?;
            let pk_identifier = self.pk_identifier(&detail)?;
            snapshot.attributes.push(RemoteAttribute {
                detail,
                pk_identifier,
            });
        }
        for uri in &uris.facts {
            snapshot.facts.push(self.column_detail(uri)?);
        }
        for uri in &uris.data_loading_columns {
            snapshot.data_loading_columns.push(self.column_detail(uri)?);
        }
        snapshot.references = self.references(&snapshot)?;

        log::debug!(
            "fetched {}: {} attributes, {} facts, {} data loading columns",
            self.dataset,
            snapshot.attributes.len(),
            snapshot.facts.len(),
            snapshot.data_loading_columns.len()
        );
        Ok(snapshot)
    }

    /// Columns as they exist on GoodData.
    pub fn remote_columns(&self) -> Result<IndexMap<String, Column>> {
        Ok(reconstruct(&self.snapshot()?))
    }

    /// Difference between the remote dataset and a declaration of it.
    pub fn diff(&self, dataset: &Dataset) -> Result<DatasetDiff> {
        let remote = self.remote_columns()?;
        Ok(DatasetDiff::compute(&remote, &dataset.column_map()))
    }

    pub fn is_synchronised(&self, dataset: &Dataset) -> Result<bool> {
        Ok(self.diff(dataset)?.is_empty())
    }

    fn has(&self, name: &str, kinds: &[ColumnKind], title: Option<&str>) -> Result<bool> {
        let columns = self.remote_columns()?;
        Ok(columns.get(&to_identifier(name)).is_some_and(|column| {
            kinds.contains(&column.kind()) && title.map_or(true, |t| column.title() == t)
        }))
    }

    pub fn has_attribute(&self, name: &str, title: Option<&str>) -> Result<bool> {
        self.has(
            name,
            &[ColumnKind::Attribute, ColumnKind::ConnectionPoint],
            title,
        )
    }

    pub fn has_fact(&self, name: &str, title: Option<&str>) -> Result<bool> {
        self.has(name, &[ColumnKind::Fact], title)
    }

    pub fn has_date(&self, name: &str, title: Option<&str>) -> Result<bool> {
        self.has(name, &[ColumnKind::Date], title)
    }

    pub fn has_reference(&self, name: &str) -> Result<bool> {
        self.has(name, &[ColumnKind::Reference], None)
    }

    /// Labels include hyperlinks.
    pub fn has_label(&self, name: &str, title: Option<&str>) -> Result<bool> {
        self.has(name, &[ColumnKind::Label, ColumnKind::HyperLink], title)
    }

    pub fn has_hyperlink(&self, name: &str, title: Option<&str>) -> Result<bool> {
        self.has(name, &[ColumnKind::HyperLink], title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_uri_lists() {
        assert_eq!(uris(&json!(["/a", "/b", 3])), vec!["/a", "/b"]);
        assert!(uris(&Value::Null).is_empty());
    }
}
