//! Logical data model columns.
//!
//! A [`Column`] is a closed set of variants sharing a [`Common`] core. Each
//! variant knows how to render its MAQL (create, drop, alter) and its SLI
//! manifest parts once placed in a dataset through a [`ColumnScope`].
//!
//! A date column with `datetime` set owns a time sub-column: it is created,
//! altered, dropped and uploaded together with the date.

use serde::{Deserialize, Serialize};

use crate::manifest::{ManifestPart, UploadMode};
use crate::maql;
use crate::text::{to_identifier, to_title};

/// Type given by GoodData to attribute-like columns declared without one.
pub const DEFAULT_ATTRIBUTE_TYPE: &str = "VARCHAR(128)";

/// Type given by GoodData to facts declared without one.
pub const DEFAULT_FACT_TYPE: &str = "DECIMAL(12,2)";

/// Upload format of date columns.
pub const DATE_FORMAT: &str = "yyyy-MM-dd";

/// Upload format of date columns carrying a time.
pub const DATETIME_FORMAT: &str = "yyyy-MM-dd HH:mm:SS";

/// Fields shared by every column.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Common {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
}

impl Common {
    pub fn new(title: &str) -> Self {
        Self {
            title: to_title(title),
            folder: None,
            data_type: None,
        }
    }
}

/// A date fact connected to a date dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateColumn {
    #[serde(flatten)]
    pub common: Common,
    /// Name of the date dimension.
    pub schema_reference: String,
    /// Whether the date carries a time of day.
    #[serde(default)]
    pub datetime: bool,
}

/// A foreign key to another dataset's connection point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceColumn {
    #[serde(flatten)]
    pub common: Common,
    /// Connection point name in the referenced dataset.
    pub reference: String,
    /// Referenced dataset.
    pub schema_reference: String,
}

/// A secondary representation of an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelColumn {
    #[serde(flatten)]
    pub common: Common,
    /// Attribute or connection point of the same dataset.
    pub reference: String,
}

/// A column of a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "ldmType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Column {
    Attribute(Common),
    /// The unique key of a dataset.
    ConnectionPoint(Common),
    Fact(Common),
    Date(DateColumn),
    Reference(ReferenceColumn),
    Label(LabelColumn),
    /// A label rendered as a clickable URL.
    #[serde(rename = "HYPERLINK")]
    HyperLink(LabelColumn),
}

/// Variant tag of a [`Column`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Attribute,
    ConnectionPoint,
    Fact,
    Date,
    Reference,
    Label,
    HyperLink,
}

impl ColumnKind {
    /// The `ldmType` name used in dataset declarations.
    pub fn ldm_type(&self) -> &'static str {
        match self {
            ColumnKind::Attribute => "ATTRIBUTE",
            ColumnKind::ConnectionPoint => "CONNECTION_POINT",
            ColumnKind::Fact => "FACT",
            ColumnKind::Date => "DATE",
            ColumnKind::Reference => "REFERENCE",
            ColumnKind::Label => "LABEL",
            ColumnKind::HyperLink => "HYPERLINK",
        }
    }

    /// Labels and hyperlinks convert into each other in place.
    pub fn is_label(&self) -> bool {
        matches!(self, ColumnKind::Label | ColumnKind::HyperLink)
    }

    /// Attribute-like columns own labels.
    pub fn is_attribute(&self) -> bool {
        matches!(self, ColumnKind::Attribute | ColumnKind::ConnectionPoint)
    }
}

/// Attribute of a column that can differ between two states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnAttribute {
    Title,
    Folder,
    DataType,
    Reference,
    SchemaReference,
    Datetime,
}

/// Where a column lives: dataset identifier and column name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnScope {
    pub dataset: String,
    pub name: String,
    /// Set when a label hangs off the dataset's connection point.
    pub label_references_cp: bool,
}

impl ColumnScope {
    pub fn new(dataset: &str, name: &str) -> Self {
        Self {
            dataset: to_identifier(dataset),
            name: to_identifier(name),
            label_references_cp: false,
        }
    }

    pub fn references_cp(mut self, references_cp: bool) -> Self {
        self.label_references_cp = references_cp;
        self
    }
}

/// Alterations requested on an existing column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changes {
    /// New title.
    pub title: Option<String>,
    /// New data type, already resolved to a concrete type.
    pub data_type: Option<String>,
    /// Target kind of a label/hyperlink conversion (true = hyperlink).
    pub hyperlink: Option<bool>,
}

impl Changes {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.data_type.is_none() && self.hyperlink.is_none()
    }
}

impl Column {
    pub fn attribute(title: &str) -> Self {
        Column::Attribute(Common::new(title))
    }

    pub fn connection_point(title: &str) -> Self {
        Column::ConnectionPoint(Common::new(title))
    }

    pub fn fact(title: &str) -> Self {
        Column::Fact(Common::new(title))
    }

    pub fn date(title: &str, schema_reference: &str) -> Self {
        Column::Date(DateColumn {
            common: Common::new(title),
            schema_reference: schema_reference.to_string(),
            datetime: false,
        })
    }

    pub fn reference(title: &str, reference: &str, schema_reference: &str) -> Self {
        Column::Reference(ReferenceColumn {
            common: Common::new(title),
            reference: reference.to_string(),
            schema_reference: schema_reference.to_string(),
        })
    }

    pub fn label(title: &str, reference: &str) -> Self {
        Column::Label(LabelColumn {
            common: Common::new(title),
            reference: reference.to_string(),
        })
    }

    pub fn hyperlink(title: &str, reference: &str) -> Self {
        Column::HyperLink(LabelColumn {
            common: Common::new(title),
            reference: reference.to_string(),
        })
    }

    /// Put the column in a folder.
    pub fn with_folder(mut self, folder: &str) -> Self {
        self.common_mut().folder = Some(folder.to_string());
        self
    }

    /// Declare the column's storage type (e.g. `VARCHAR(20)`, `INT`).
    pub fn with_data_type(mut self, data_type: &str) -> Self {
        self.common_mut().data_type = Some(data_type.to_string());
        self
    }

    /// Attach a time of day to a date column. No effect on other variants.
    pub fn with_time(mut self) -> Self {
        if let Column::Date(date) = &mut self {
            date.datetime = true;
        }
        self
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            Column::Attribute(_) => ColumnKind::Attribute,
            Column::ConnectionPoint(_) => ColumnKind::ConnectionPoint,
            Column::Fact(_) => ColumnKind::Fact,
            Column::Date(_) => ColumnKind::Date,
            Column::Reference(_) => ColumnKind::Reference,
            Column::Label(_) => ColumnKind::Label,
            Column::HyperLink(_) => ColumnKind::HyperLink,
        }
    }

    pub fn common(&self) -> &Common {
        match self {
            Column::Attribute(c) | Column::ConnectionPoint(c) | Column::Fact(c) => c,
            Column::Date(d) => &d.common,
            Column::Reference(r) => &r.common,
            Column::Label(l) | Column::HyperLink(l) => &l.common,
        }
    }

    pub fn common_mut(&mut self) -> &mut Common {
        match self {
            Column::Attribute(c) | Column::ConnectionPoint(c) | Column::Fact(c) => c,
            Column::Date(d) => &mut d.common,
            Column::Reference(r) => &mut r.common,
            Column::Label(l) | Column::HyperLink(l) => &mut l.common,
        }
    }

    pub fn title(&self) -> &str {
        &self.common().title
    }

    pub fn folder(&self) -> Option<&str> {
        self.common().folder.as_deref()
    }

    pub fn data_type(&self) -> Option<&str> {
        self.common().data_type.as_deref()
    }

    /// Column this one depends on (label target or referenced connection point).
    pub fn reference_name(&self) -> Option<&str> {
        match self {
            Column::Reference(r) => Some(&r.reference),
            Column::Label(l) | Column::HyperLink(l) => Some(&l.reference),
            _ => None,
        }
    }

    /// Dataset or date dimension this column depends on.
    pub fn schema_reference(&self) -> Option<&str> {
        match self {
            Column::Date(d) => Some(&d.schema_reference),
            Column::Reference(r) => Some(&r.schema_reference),
            _ => None,
        }
    }

    pub fn datetime(&self) -> bool {
        matches!(self, Column::Date(d) if d.datetime)
    }

    /// Type GoodData assigns when none is declared.
    ///
    /// Dates and references have no type of their own.
    pub fn default_data_type(&self) -> Option<&'static str> {
        match self.kind() {
            ColumnKind::Fact => Some(DEFAULT_FACT_TYPE),
            ColumnKind::Date | ColumnKind::Reference => None,
            _ => Some(DEFAULT_ATTRIBUTE_TYPE),
        }
    }

    /// Declared type, or the one GoodData stores when none is declared.
    pub fn effective_data_type(&self) -> Option<&str> {
        self.data_type().or(self.default_data_type())
    }

    /// Attributes that differ between `self` (old) and `new`.
    ///
    /// Reference titles and data types are not stored by GoodData, so they
    /// never count. Data types compare after resolving platform defaults.
    /// References to other elements compare by identifier.
    pub fn changed_attributes(&self, new: &Column) -> Vec<ColumnAttribute> {
        let mut changed = Vec::new();
        let both_references =
            self.kind() == ColumnKind::Reference && new.kind() == ColumnKind::Reference;
        if self.title() != new.title() && !both_references {
            changed.push(ColumnAttribute::Title);
        }
        if self.folder() != new.folder() {
            changed.push(ColumnAttribute::Folder);
        }
        if self.effective_data_type() != new.effective_data_type() && !both_references {
            changed.push(ColumnAttribute::DataType);
        }
        let ident = |value: Option<&str>| value.map(to_identifier);
        if ident(self.reference_name()) != ident(new.reference_name()) {
            changed.push(ColumnAttribute::Reference);
        }
        if ident(self.schema_reference()) != ident(new.schema_reference()) {
            changed.push(ColumnAttribute::SchemaReference);
        }
        if self.datetime() != new.datetime() {
            changed.push(ColumnAttribute::Datetime);
        }
        changed
    }

    /// Structural equality used by the diff engine.
    ///
    /// Folders are not part of the remote model and are ignored.
    pub fn is_equivalent(&self, other: &Column) -> bool {
        self.kind() == other.kind()
            && self
                .changed_attributes(other)
                .iter()
                .all(|attr| *attr == ColumnAttribute::Folder)
    }

    /// Physical identifier of the column's storage.
    pub fn identifier(&self, scope: &ColumnScope) -> String {
        let (d, n) = (&scope.dataset, &scope.name);
        match self {
            Column::Attribute(_) => format!("d_{d}_{n}.nm_{n}"),
            Column::ConnectionPoint(_) => format!("f_{d}.nm_{n}"),
            Column::Fact(_) => format!("f_{d}.f_{n}"),
            Column::Date(_) => format!("f_{d}.dt_{n}"),
            Column::Reference(_) => format!("f_{d}.{n}_id"),
            Column::Label(l) | Column::HyperLink(l) => {
                if scope.label_references_cp {
                    format!("f_{d}.nm_{n}")
                } else {
                    format!("d_{d}_{}.nm_{n}", to_identifier(&l.reference))
                }
            }
        }
    }

    fn folder_clause(&self) -> String {
        let Some(folder) = self.folder() else {
            return String::new();
        };
        let folder = to_identifier(folder);
        match self.kind() {
            ColumnKind::Fact | ColumnKind::Date => maql::fact_folder_clause(&folder),
            _ => maql::attribute_folder_clause(&folder),
        }
    }

    /// MAQL creating the column's structure.
    ///
    /// For a connection point this leaves out its original label, which a
    /// dataset creates after all other labels.
    pub fn create_maql(&self, scope: &ColumnScope) -> String {
        let (d, n) = (scope.dataset.as_str(), scope.name.as_str());
        let title = self.title();
        let folder = self.folder_clause();
        let identifier = self.identifier(scope);
        let mut out = match self {
            Column::Attribute(_) => maql::attribute_create(d, n, title, &folder, &identifier),
            Column::ConnectionPoint(_) => maql::connection_point_create(d, n, title, &folder),
            Column::Fact(_) => maql::fact_create(d, n, title, &folder, &identifier),
            Column::Date(date) => {
                let schema_ref = to_identifier(&date.schema_reference);
                let mut out = maql::date_create(d, n, title, &folder, &schema_ref);
                if date.datetime {
                    out.push_str(&maql::time_create(d, n, title, &folder, &schema_ref));
                }
                out
            }
            Column::Reference(r) => maql::reference_create(
                &to_identifier(&r.schema_reference),
                &to_identifier(&r.reference),
                &identifier,
            ),
            Column::Label(l) | Column::HyperLink(l) => {
                maql::label_create(d, &to_identifier(&l.reference), n, title, &identifier)
            }
        };

        match self {
            Column::Attribute(c) | Column::Fact(c) => {
                if let Some(data_type) = &c.data_type {
                    out.push_str(&maql::datatype(&identifier, data_type));
                }
            }
            Column::Label(l) | Column::HyperLink(l) => {
                if let Some(data_type) = &l.common.data_type {
                    out.push_str(&maql::datatype(&identifier, data_type));
                }
                if let Column::HyperLink(_) = self {
                    out.push_str(&maql::hyperlink_create(d, &to_identifier(&l.reference), n));
                }
            }
            _ => {}
        }
        out
    }

    /// MAQL adding the label a connection point is displayed with.
    ///
    /// Empty for every other variant.
    pub fn original_label_maql(&self, scope: &ColumnScope) -> String {
        let Column::ConnectionPoint(c) = self else {
            return String::new();
        };
        let identifier = self.identifier(scope);
        let mut out = maql::connection_point_label(&scope.dataset, &scope.name, &c.title, &identifier);
        if let Some(data_type) = &c.data_type {
            out.push_str(&maql::datatype(&identifier, data_type));
        }
        out
    }

    /// MAQL making a label the default one of its attribute.
    pub fn default_label_maql(&self, scope: &ColumnScope) -> Option<String> {
        match self {
            Column::Label(l) | Column::HyperLink(l) => Some(maql::label_default(
                &scope.dataset,
                &to_identifier(&l.reference),
                &scope.name,
            )),
            _ => None,
        }
    }

    /// Complete MAQL creating the column in an existing dataset.
    pub fn maql(&self, scope: &ColumnScope) -> String {
        let mut out = self.create_maql(scope);
        out.push_str(&self.original_label_maql(scope));
        out
    }

    /// MAQL removing the column.
    ///
    /// Dropping an attribute or a connection point cascades to its labels.
    pub fn drop_maql(&self, scope: &ColumnScope) -> String {
        let (d, n) = (scope.dataset.as_str(), scope.name.as_str());
        match self {
            Column::Attribute(_) | Column::ConnectionPoint(_) => maql::attribute_drop(d, n),
            Column::Fact(_) => maql::fact_drop(d, n),
            Column::Date(date) => {
                let schema_ref = to_identifier(&date.schema_reference);
                let mut out = String::new();
                if date.datetime {
                    out.push_str(&maql::time_drop(d, n, &schema_ref));
                }
                out.push_str(&maql::date_drop(d, n, &schema_ref));
                out
            }
            Column::Reference(r) => maql::reference_drop(
                &to_identifier(&r.schema_reference),
                &to_identifier(&r.reference),
                &self.identifier(scope),
            ),
            Column::Label(l) | Column::HyperLink(l) => {
                maql::label_drop(d, &to_identifier(&l.reference), n)
            }
        }
    }

    /// MAQL applying title / data type changes in place.
    ///
    /// References are immutable and dates have no data type; the migration
    /// layer rejects those requests before they reach this point.
    pub fn alter_maql(&self, scope: &ColumnScope, changes: &Changes) -> String {
        let (d, n) = (scope.dataset.as_str(), scope.name.as_str());
        let mut out = String::new();
        match self {
            Column::Attribute(_) | Column::ConnectionPoint(_) => {
                if let Some(title) = &changes.title {
                    out.push_str(&maql::attribute_alter_title(d, n, title));
                }
            }
            Column::Fact(_) => {
                if let Some(title) = &changes.title {
                    out.push_str(&maql::fact_alter_title(d, n, title));
                }
            }
            Column::Date(date) => {
                if let Some(title) = &changes.title {
                    if date.datetime {
                        out.push_str(&maql::time_alter_title(d, n, title));
                    }
                    out.push_str(&maql::date_alter_title(d, n, title));
                }
                return out;
            }
            Column::Reference(_) => return out,
            Column::Label(l) | Column::HyperLink(l) => {
                let reference = to_identifier(&l.reference);
                let to_hyperlink = changes
                    .hyperlink
                    .unwrap_or(self.kind() == ColumnKind::HyperLink);
                if changes.title.is_some() || changes.hyperlink.is_some() {
                    let title = changes.title.as_deref().unwrap_or(&l.common.title);
                    if to_hyperlink {
                        out.push_str(&maql::hyperlink_alter_title(d, &reference, n, title));
                    } else {
                        out.push_str(&maql::label_alter_title(d, &reference, n, title));
                    }
                }
            }
        }
        if let Some(data_type) = &changes.data_type {
            out.push_str(&maql::datatype(&self.identifier(scope), data_type));
        }
        out
    }

    /// SLI manifest parts loading the column.
    ///
    /// Most columns map to a single CSV column; dates expand to two parts,
    /// four when they carry a time.
    pub fn manifest_parts(&self, scope: &ColumnScope, mode: UploadMode) -> Vec<ManifestPart> {
        let (d, n) = (scope.dataset.as_str(), scope.name.as_str());
        match self {
            Column::Attribute(_) | Column::ConnectionPoint(_) => {
                vec![ManifestPart::new(n, mode, format!("label.{d}.{n}")).reference_key()]
            }
            Column::Fact(_) => vec![ManifestPart::new(n, mode, format!("fact.{d}.{n}"))],
            Column::Date(date) => {
                let schema_ref = to_identifier(&date.schema_reference);
                let format = if date.datetime {
                    DATETIME_FORMAT
                } else {
                    DATE_FORMAT
                };
                let mut parts = vec![
                    ManifestPart::new(n, mode, format!("{schema_ref}.date.mdyy"))
                        .reference_key()
                        .date_format(format),
                    ManifestPart::new(format!("{n}_dt"), mode, format!("dt.{d}.{n}")),
                ];
                if date.datetime {
                    parts.push(ManifestPart::new(format!("{n}_tm"), mode, format!("tm.dt.{d}.{n}")));
                    parts.push(
                        ManifestPart::new(
                            format!("tm_{n}_id"),
                            mode,
                            format!("label.time.second.of.day.{schema_ref}"),
                        )
                        .reference_key(),
                    );
                }
                parts
            }
            Column::Reference(r) => vec![ManifestPart::new(
                n,
                mode,
                format!(
                    "label.{}.{}",
                    to_identifier(&r.schema_reference),
                    to_identifier(&r.reference)
                ),
            )
            .reference_key()],
            Column::Label(l) | Column::HyperLink(l) => vec![ManifestPart::new(
                n,
                mode,
                format!("label.{d}.{}.{n}", to_identifier(&l.reference)),
            )],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(name: &str) -> ColumnScope {
        ColumnScope::new("Department", name)
    }

    #[test]
    fn scope_lowercases() {
        let s = ColumnScope::new("Department", "City");
        assert_eq!(s.dataset, "department");
        assert_eq!(s.name, "city");
    }

    #[test]
    fn attribute_maql_with_datatype() {
        let city = Column::attribute("City")
            .with_folder("Department")
            .with_data_type("VARCHAR(20)");
        let maql = city.maql(&scope("city"));
        assert!(maql.starts_with(
            "CREATE ATTRIBUTE {attr.department.city} VISUAL(TITLE \"City\", FOLDER {folder.department.attr}) \
             AS KEYS {d_department_city.id} FULLSET, {f_department.city_id};\n"
        ));
        assert!(maql.contains("ADD LABELS {label.department.city} VISUAL(TITLE \"City\") AS {d_department_city.nm_city};"));
        assert!(maql.ends_with("ALTER DATATYPE {d_department_city.nm_city} VARCHAR(20);\n"));
    }

    #[test]
    fn connection_point_maql_includes_original_label() {
        let cp = Column::connection_point("Department").with_data_type("VARCHAR(128)");
        let s = scope("department");
        assert!(!cp.create_maql(&s).contains("ADD LABELS"));
        let maql = cp.maql(&s);
        assert!(maql.contains("AS KEYS {f_department.id} FULLSET;"));
        assert!(maql.contains(
            "ADD LABELS {label.department.department} VISUAL(TITLE \"Department\") AS {f_department.nm_department};"
        ));
        assert!(maql.ends_with("ALTER DATATYPE {f_department.nm_department} VARCHAR(128);\n"));
    }

    #[test]
    fn label_identifier_depends_on_connection_point() {
        let name = Column::label("Name", "department");
        assert_eq!(name.identifier(&scope("name")), "d_department_department.nm_name");
        assert_eq!(
            name.identifier(&scope("name").references_cp(true)),
            "f_department.nm_name"
        );
    }

    #[test]
    fn hyperlink_maql() {
        let url = Column::hyperlink("Website", "department");
        let maql = url.maql(&scope("website").references_cp(true));
        assert!(maql.contains("ADD LABELS {label.department.department.website} VISUAL(TITLE \"Website\") AS {f_department.nm_website};"));
        assert!(maql.ends_with(
            "ALTER ATTRIBUTE {attr.department.department} ALTER LABELS {label.department.department.website} HYPERLINK;\n"
        ));
    }

    #[test]
    fn date_maql_with_time() {
        let payday = Column::date("Pay Day", "Payment").with_folder("Salary").with_time();
        let maql = payday.maql(&ColumnScope::new("salary", "payday"));
        assert!(maql.contains(
            "CREATE FACT {dt.salary.payday} VISUAL(TITLE \"Pay Day (Date)\", FOLDER {folder.salary.fact})AS {f_salary.dt_payday};"
        ));
        assert!(maql.contains("ALTER ATTRIBUTE {payment.date} ADD KEYS {f_salary.dt_payday_id};"));
        assert!(maql.contains("CREATE FACT {tm.dt.salary.payday} VISUAL(TITLE \"Pay Day (Time)\""));
        assert!(maql.contains(
            "ALTER ATTRIBUTE {attr.time.second.of.day.payment} ADD KEYS {f_salary.tm_payday_id};"
        ));
    }

    #[test]
    fn reference_maql() {
        let department = Column::reference("Department", "department", "Department");
        let s = ColumnScope::new("worker", "department");
        assert_eq!(
            department.maql(&s),
            "# CONNECT THE REFERENCE TO THE APPROPRIATE DIMENSION\n\
             ALTER ATTRIBUTE {attr.department.department} ADD KEYS {f_worker.department_id};\n"
        );
        assert_eq!(
            department.drop_maql(&s),
            "ALTER ATTRIBUTE {attr.department.department} DROP KEYS {f_worker.department_id};\n"
        );
    }

    #[test]
    fn drop_statements() {
        assert_eq!(
            Column::connection_point("Department").drop_maql(&scope("department")),
            "DROP ALL IN {attr.department.department} CASCADE;\n"
        );
        assert_eq!(
            Column::fact("Payment").drop_maql(&ColumnScope::new("salary", "payment")),
            "DROP {fact.salary.payment} CASCADE;\n"
        );
        assert_eq!(
            Column::label("Name", "department").drop_maql(&scope("name")),
            "ALTER ATTRIBUTE {attr.department.department} DROP LABELS {label.department.department.name};\n"
        );
    }

    #[test]
    fn date_drop_includes_time_first() {
        let payday = Column::date("Pay Day", "payment").with_time();
        let maql = payday.drop_maql(&ColumnScope::new("salary", "payday"));
        let time = maql.find("DROP {tm.dt.salary.payday} CASCADE;").unwrap();
        let date = maql.find("DROP {dt.salary.payday} CASCADE;").unwrap();
        assert!(time < date);
        assert!(maql.contains("ALTER ATTRIBUTE {payment.date} DROP KEYS {f_salary.dt_payday_id};"));
    }

    #[test]
    fn alter_title_and_datatype() {
        let city = Column::attribute("City").with_data_type("VARCHAR(20)");
        let changes = Changes {
            title: Some("New City".into()),
            data_type: Some("VARCHAR(30)".into()),
            hyperlink: None,
        };
        assert_eq!(
            city.alter_maql(&scope("city"), &changes),
            "ALTER ATTRIBUTE {attr.department.city} VISUAL(TITLE \"New City\");\n\
             ALTER DATATYPE {d_department_city.nm_city} VARCHAR(30);\n"
        );
    }

    #[test]
    fn alter_date_title_alters_time() {
        let payday = Column::date("Pay Day", "payment").with_time();
        let changes = Changes {
            title: Some("Paid".into()),
            ..Changes::default()
        };
        let maql = payday.alter_maql(&ColumnScope::new("salary", "payday"), &changes);
        assert_eq!(
            maql,
            "ALTER FACT {tm.dt.salary.payday} VISUAL(TITLE \"Paid (Time)\");\n\
             ALTER FACT {dt.salary.payday} VISUAL(TITLE \"Paid (Date)\");\n"
        );
    }

    #[test]
    fn label_to_hyperlink_keeps_title() {
        let name = Column::label("Name", "department");
        let changes = Changes {
            hyperlink: Some(true),
            ..Changes::default()
        };
        assert_eq!(
            name.alter_maql(&scope("name"), &changes),
            "ALTER ATTRIBUTE {attr.department.department} ALTER LABELS \
             {label.department.department.name} HYPERLINK VISUAL(TITLE \"Name\");\n"
        );
    }

    #[test]
    fn date_manifest_parts() {
        let s = ColumnScope::new("salary", "payday");
        let date = Column::date("Pay Day", "payment");
        let parts = date.manifest_parts(&s, UploadMode::Full);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].populates, vec!["payment.date.mdyy"]);
        assert_eq!(parts[0].constraints.as_ref().unwrap().date, DATE_FORMAT);
        assert_eq!(parts[1].column_name, "payday_dt");

        let datetime = date.with_time();
        let parts = datetime.manifest_parts(&s, UploadMode::Incremental);
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0].constraints.as_ref().unwrap().date, DATETIME_FORMAT);
        assert_eq!(parts[2].column_name, "payday_tm");
        assert_eq!(parts[3].column_name, "tm_payday_id");
        assert_eq!(parts[3].populates, vec!["label.time.second.of.day.payment"]);
        assert_eq!(parts[3].reference_key, Some(1));
        assert!(parts.iter().all(|p| p.mode == UploadMode::Incremental));
    }

    #[test]
    fn reference_manifest_part() {
        let worker = Column::reference("Worker", "worker", "Worker");
        let parts = worker.manifest_parts(&ColumnScope::new("salary", "worker"), UploadMode::Full);
        assert_eq!(parts[0].populates, vec!["label.worker.worker"]);
        assert_eq!(parts[0].reference_key, Some(1));
    }

    #[test]
    fn changed_attributes_ignore_reference_title() {
        let local = Column::reference("Worker", "worker", "Worker");
        let remote = Column::reference("", "worker", "Worker");
        assert!(remote.changed_attributes(&local).is_empty());
        assert!(remote.is_equivalent(&local));
        assert!(Column::reference("", "worker", "worker").is_equivalent(&local));
        assert!(Column::attribute("City").is_equivalent(&Column::attribute("City").with_folder("Geo")));

        let old = Column::attribute("City").with_data_type("VARCHAR(20)");
        let new = Column::attribute("New City").with_data_type("VARCHAR(30)");
        assert_eq!(
            old.changed_attributes(&new),
            vec![ColumnAttribute::Title, ColumnAttribute::DataType]
        );
    }

    #[test]
    fn platform_default_types_match_undeclared_ones() {
        let declared = Column::connection_point("Department").with_data_type(DEFAULT_ATTRIBUTE_TYPE);
        assert!(declared.changed_attributes(&Column::connection_point("Department")).is_empty());
        let declared = Column::fact("Payment").with_data_type(DEFAULT_FACT_TYPE);
        assert!(Column::fact("Payment").is_equivalent(&declared));
        assert_eq!(
            Column::fact("Payment").changed_attributes(&Column::fact("Payment").with_data_type("INT")),
            vec![ColumnAttribute::DataType]
        );
    }

    #[test]
    fn reference_names_of_dependent_columns() {
        assert_eq!(Column::reference("Boss", "employee", "Employee").reference_name(), Some("employee"));
        assert_eq!(Column::hyperlink("Site", "department").reference_name(), Some("department"));
        assert_eq!(Column::date("Paid", "payment").reference_name(), None);
    }

    #[test]
    fn reference_data_type_is_not_compared() {
        let remote = Column::reference("", "worker", "worker");
        let local = Column::reference("Worker", "worker", "Worker").with_data_type("VARCHAR(20)");
        assert!(remote.changed_attributes(&local).is_empty());
        assert_eq!(local.default_data_type(), None);
    }

    #[test]
    fn deserializes_tagged_columns() {
        let column: Column = serde_json::from_str(
            r#"{"ldmType": "DATE", "title": "Pay Day", "schemaReference": "payment", "datetime": true}"#,
        )
        .unwrap();
        assert_eq!(column, Column::date("Pay Day", "payment").with_time());

        let column: Column = serde_json::from_str(
            r#"{"ldmType": "HYPERLINK", "title": "Site", "reference": "department", "folder": "Web"}"#,
        )
        .unwrap();
        assert_eq!(column, Column::hyperlink("Site", "department").with_folder("Web"));
    }
}
