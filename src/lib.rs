//! GoodData Client
//!
//! Declare GoodData datasets, create them, load data into them and migrate
//! them when their declaration changes.
//!
//! A [`Dataset`] is an ordered list of named [`Column`]s. It renders the
//! MAQL creating it on GoodData and the SLI manifest its CSV uploads use.
//! Remote datasets are reconstructed from the platform's metadata, diffed
//! against their declaration and brought up to date by a
//! [`MigrationEngine`].
//!
//! # Example
//!
//! ```
//! use gooddata_client::{Column, Dataset, UploadMode};
//!
//! let department = Dataset::new("Department")
//!     .column("department", Column::connection_point("Department"))
//!     .column("name", Column::label("Name", "department"))
//!     .column("city", Column::attribute("City").with_data_type("VARCHAR(20)"));
//!
//! let maql = department.maql();
//! assert!(maql.contains("CREATE DATASET {dataset.department} VISUAL(TITLE \"Department\");"));
//! assert!(maql.contains("DEFAULT LABEL {label.department.department.name}"));
//!
//! let manifest = department.manifest(UploadMode::Full);
//! assert_eq!(manifest.column_names(), vec!["department", "name", "city"]);
//! ```
//!
//! # Column variants
//!
//! | `ldmType` | Storage | Manifest parts |
//! |-----------|---------|----------------|
//! | `ATTRIBUTE` | `d_D_N.nm_N` | 1 (reference key) |
//! | `CONNECTION_POINT` | `f_D.nm_N` | 1 (reference key) |
//! | `FACT` | `f_D.f_N` | 1 |
//! | `DATE` | `f_D.dt_N` | 2, 4 with time |
//! | `REFERENCE` | `f_D.N_id` | 1 (reference key) |
//! | `LABEL` / `HYPERLINK` | `d_D_R.nm_N` | 1 |
//!
//! # Migrations
//!
//! ```no_run
//! use gooddata_client::{
//!     Connection, ConnectionConfig, Dataset, MigrationEngine, MigrationOptions, Project,
//! };
//!
//! # fn main() -> gooddata_client::Result<()> {
//! let connection = Connection::login(ConnectionConfig::new(), "user@example.com", "secret")?;
//! let project = Project::load_by_name(&connection, "Sales")?;
//! let dataset = Dataset::load("department.json".as_ref())?;
//!
//! let options = MigrationOptions::new().dump("migration.maql");
//! let chain = MigrationEngine::new(&project, options).migrate(&dataset)?;
//! println!("{} columns changed", chain.len());
//! # Ok(())
//! # }
//! ```

mod archiver;
mod columns;
mod connection;
mod dataset;
mod date_dimension;
mod diff;
mod error;
mod formatter;
mod manifest;
pub mod maql;
mod migration;
mod project;
mod reconstruct;
mod report;
mod state;
mod text;

pub use archiver::{create_archive, csv_to_rows, rows_to_csv, UploadData, ARCHIVE_NAME};
pub use columns::{
    Changes, Column, ColumnAttribute, ColumnKind, ColumnScope, Common, DateColumn, LabelColumn,
    ReferenceColumn, DATETIME_FORMAT, DATE_FORMAT, DEFAULT_ATTRIBUTE_TYPE, DEFAULT_FACT_TYPE,
};
pub use connection::{
    Connection, ConnectionConfig, DEFAULT_HOST, DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT,
    DEFAULT_WEBDAV_HOST,
};
pub use dataset::{Dataset, Folders, RowFilter, FACTSOF};
pub use date_dimension::{DateDimension, SECONDS_PER_DAY};
pub use diff::{Altered, DatasetDiff};
pub use error::{format_api_message, Error, Result};
pub use formatter::{csv_encode, csv_line, date_id, format_dates, seconds_of_day, Cell, Row};
pub use manifest::{
    Constraints, CsvParams, ManifestPart, SliManifest, SliManifestBody, UploadMode,
    CSV_DATA_FILENAME, MANIFEST_FILENAME,
};
pub use migration::{
    classify, is_simple, same_columns, Alteration, MigrationAction, MigrationChain,
    MigrationEngine, MigrationOptions,
};
pub use project::{delete_projects_by_name, NewProject, Project, UploadOptions};
pub use reconstruct::{
    reconstruct, RemoteAttribute, RemoteReference, RemoteSnapshot, HYPERLINK_TYPE,
};
pub use report::Report;
pub use state::{ColumnUris, RemoteState};
pub use text::{gd_literal, to_identifier, to_title, Literal};
