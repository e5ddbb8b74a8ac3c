//! Rebuild typed columns from GoodData metadata.
//!
//! GoodData does not store the declaration a dataset was created from. It
//! is recovered from the identifiers of the objects the MAQL created:
//!
//! | identifier                 | column                          |
//! |----------------------------|---------------------------------|
//! | `attr.D.N`                 | attribute, or connection point  |
//! | `label.D.R.N`              | label / hyperlink of `R`        |
//! | `fact.D.N`                 | fact                            |
//! | `dt.D.N` / `tm.dt.D.N`     | date / its time                 |
//! | manifest `label.X.Y`       | reference to dataset `X`        |
//!
//! Everything here is pure; fetching lives in [`crate::state`].

use std::collections::HashMap;

use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;

use crate::columns::{Column, ColumnKind, DEFAULT_ATTRIBUTE_TYPE, DEFAULT_FACT_TYPE};
use crate::dataset::FACTSOF;
use crate::manifest::SliManifest;

/// Display form type of hyperlinks.
pub const HYPERLINK_TYPE: &str = "GDC.link";

/// An attribute's detail with the identifier of its primary key column.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteAttribute {
    pub detail: Value,
    pub pk_identifier: Option<String>,
}

/// A foreign key confirmed by the referenced connection point's users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteReference {
    /// Column name in this dataset.
    pub name: String,
    /// Referenced dataset identifier.
    pub dataset: String,
    /// Referenced connection point.
    pub connection_point: String,
}

/// Everything fetched about one dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteSnapshot {
    /// Dataset identifier (`department`, not `dataset.department`).
    pub dataset: String,
    pub attributes: Vec<RemoteAttribute>,
    pub facts: Vec<Value>,
    pub data_loading_columns: Vec<Value>,
    pub manifest: Option<SliManifest>,
    pub references: Vec<RemoteReference>,
}

/// Unwrap the body of a metadata object (`dataLoadingColumn`, `attribute`
/// or `fact`).
pub fn column_detail(object: &Value) -> &Value {
    ["dataLoadingColumn", "attribute", "fact"]
        .iter()
        .find_map(|key| object.get(*key))
        .unwrap_or(object)
}

pub fn identifier_of(detail: &Value) -> &str {
    detail["meta"]["identifier"].as_str().unwrap_or_default()
}

fn title_of(detail: &Value) -> String {
    detail["meta"]["title"].as_str().unwrap_or_default().to_string()
}

/// Whether an attribute keyed on this primary key is the dataset's
/// connection point.
pub fn is_connection_point(dataset: &str, pk_identifier: Option<&str>) -> bool {
    pk_identifier == Some(format!("col.f_{dataset}.id").as_str())
}

/// Columns of the manifest loading another dataset's connection point,
/// as `(column, dataset, connection point)`.
pub fn foreign_references(dataset: &str, manifest: &SliManifest) -> Vec<(String, String, String)> {
    manifest
        .parts()
        .iter()
        .filter_map(|part| {
            let populates = part.populates.first()?;
            match populates.split('.').collect::<Vec<_>>().as_slice() {
                ["label", other, cp] if *other != dataset => Some((
                    part.column_name.clone(),
                    other.to_string(),
                    cp.to_string(),
                )),
                _ => None,
            }
        })
        .collect()
}

/// Date dimension of each date column, read from the manifest.
pub fn date_references(manifest: &SliManifest) -> HashMap<String, String> {
    manifest
        .parts()
        .iter()
        .filter_map(|part| {
            let dimension = part.populates.first()?.strip_suffix(".date.mdyy")?;
            Some((part.column_name.clone(), dimension.to_string()))
        })
        .collect()
}

/// Render the storage type of a data loading column.
pub fn composite_data_type(detail: &Value) -> Option<String> {
    let content = &detail["content"];
    let column_type = content["columnType"].as_str()?.to_uppercase();
    let length = content["columnLength"].as_u64();
    let precision = content["columnPrecision"].as_u64();
    Some(match (column_type.as_str(), length, precision) {
        ("VARCHAR", Some(length), _) => format!("VARCHAR({length})"),
        ("DECIMAL", Some(length), Some(precision)) => format!("DECIMAL({length},{precision})"),
        _ => column_type,
    })
}

/// Data types keyed by column name, from the data loading columns.
///
/// Only label-like (`nm_`) and fact (`f_`) storage carries a declared type.
pub fn data_types(dataset: &str, data_loading_columns: &[Value]) -> HashMap<String, String> {
    let dataset = regex::escape(dataset);
    let patterns = [
        format!(r"^(?:dlc\.)?(?:d_{dataset}_\w+?|f_{dataset})\.nm_(\w+)$"),
        format!(r"^(?:dlc\.)?f_{dataset}\.f_(\w+)$"),
    ];
    let patterns: Vec<Regex> = patterns
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect();

    let mut types = HashMap::new();
    for dlc in data_loading_columns {
        let detail = column_detail(dlc);
        let identifier = identifier_of(detail);
        let Some(name) = patterns
            .iter()
            .find_map(|re| re.captures(identifier))
            .and_then(|caps| caps.get(1))
        else {
            continue;
        };
        if let Some(data_type) = composite_data_type(detail) {
            types.insert(name.as_str().to_string(), data_type);
        }
    }
    types
}

/// Platform defaults read back as "undeclared".
fn declared_type(kind: ColumnKind, data_type: Option<&String>) -> Option<String> {
    let data_type = data_type?;
    let default = match kind {
        ColumnKind::Fact => DEFAULT_FACT_TYPE,
        ColumnKind::Date | ColumnKind::Reference => return None,
        _ => DEFAULT_ATTRIBUTE_TYPE,
    };
    (data_type != default).then(|| data_type.clone())
}

fn with_declared_type(column: Column, data_type: Option<&String>) -> Column {
    match declared_type(column.kind(), data_type) {
        Some(data_type) => column.with_data_type(&data_type),
        None => column,
    }
}

fn attribute_columns(
    dataset: &str,
    attribute: &RemoteAttribute,
    types: &HashMap<String, String>,
) -> Vec<(String, Column)> {
    let detail = column_detail(&attribute.detail);
    let (attr_dataset, name) = match identifier_of(detail).split('.').collect::<Vec<_>>()[..] {
        ["attr", d, n] => (d, n.to_string()),
        _ => return Vec::new(),
    };
    if attr_dataset != dataset {
        return Vec::new();
    }

    let title = title_of(detail);
    let column = if name == FACTSOF {
        Column::attribute(&title)
    } else if is_connection_point(dataset, attribute.pk_identifier.as_deref()) {
        with_declared_type(Column::connection_point(&title), types.get(&name))
    } else {
        with_declared_type(Column::attribute(&title), types.get(&name))
    };
    let mut columns = vec![(name.clone(), column)];

    let default_label = format!("label.{dataset}.{name}");
    let display_forms = detail["content"]["displayForms"]
        .as_array()
        .map(Vec::as_slice)
        .unwrap_or_default();
    for form in display_forms {
        let identifier = identifier_of(form);
        if identifier == default_label {
            continue;
        }
        let ["label", d, reference, label] = identifier.split('.').collect::<Vec<_>>()[..] else {
            continue;
        };
        if d != dataset {
            continue;
        }
        let title = title_of(form);
        let label_column = if form["content"]["type"].as_str() == Some(HYPERLINK_TYPE) {
            Column::hyperlink(&title, reference)
        } else {
            Column::label(&title, reference)
        };
        columns.push((
            label.to_string(),
            with_declared_type(label_column, types.get(label)),
        ));
    }
    columns
}

/// Rebuild the `{name: Column}` mapping a local declaration would produce.
pub fn reconstruct(snapshot: &RemoteSnapshot) -> IndexMap<String, Column> {
    let dataset = snapshot.dataset.as_str();
    let types = data_types(dataset, &snapshot.data_loading_columns);
    let dates = snapshot
        .manifest
        .as_ref()
        .map(date_references)
        .unwrap_or_default();

    let mut columns = IndexMap::new();
    for reference in &snapshot.references {
        columns.insert(
            reference.name.clone(),
            Column::reference("", &reference.connection_point, &reference.dataset),
        );
    }

    for attribute in &snapshot.attributes {
        columns.extend(attribute_columns(dataset, attribute, &types));
    }

    let mut timed = Vec::new();
    for fact in &snapshot.facts {
        let detail = column_detail(fact);
        let title = title_of(detail);
        match identifier_of(detail).split('.').collect::<Vec<_>>()[..] {
            ["fact", d, name] if d == dataset => {
                let column = with_declared_type(Column::fact(&title), types.get(name));
                columns.insert(name.to_string(), column);
            }
            ["dt", d, name] if d == dataset => {
                let title = title.strip_suffix(" (Date)").unwrap_or(&title);
                let dimension = dates.get(name).map(String::as_str).unwrap_or_default();
                columns.insert(name.to_string(), Column::date(title, dimension));
            }
            ["tm", "dt", d, name] if d == dataset => timed.push(name.to_string()),
            _ => {}
        }
    }

    for name in timed {
        if let Some(date) = columns.get_mut(&name) {
            *date = date.clone().with_time();
        }
    }
    columns
}
