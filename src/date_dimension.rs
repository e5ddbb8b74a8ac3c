//! Date and time dimensions.
//!
//! Date columns hang off a shared date dimension, created from GoodData's
//! `URN:GOODDATA:DATE` template. Datetime columns also need a time
//! dimension, which is created here and loaded with one row per second of
//! the day.

use crate::archiver::{create_archive, UploadData};
use crate::error::{Error, Result};
use crate::formatter::{Cell, Row};
use crate::manifest::{ManifestPart, SliManifest, UploadMode};
use crate::project::Project;
use crate::text::to_identifier;

/// Number of rows of the time dimension.
pub const SECONDS_PER_DAY: u32 = 86_400;

const DATE_TEMPLATE: &str = "INCLUDE TEMPLATE \"URN:GOODDATA:DATE\"";

/// Date dimensions of a project.
pub struct DateDimension<'p, 'c> {
    project: &'p Project<'c>,
}

impl<'p, 'c> DateDimension<'p, 'c> {
    pub fn new(project: &'p Project<'c>) -> Self {
        Self { project }
    }

    /// MAQL creating a date dimension, optionally with its time dimension.
    ///
    /// Without a name the template is included as is.
    pub fn maql(name: Option<&str>, include_time: bool) -> String {
        let Some(name) = name else {
            return DATE_TEMPLATE.to_string();
        };
        let id = to_identifier(name);
        let mut maql =
            format!("{DATE_TEMPLATE} MODIFY (IDENTIFIER \"{id}\", TITLE \"{name}\");\n\n");
        if include_time {
            maql.push_str(&time_dimension_maql(&id, name));
        }
        maql
    }

    /// Whether the date dimension `name` exists in the project.
    pub fn exists(&self, name: &str) -> Result<bool> {
        self.has_dataset(&format!("{}.dataset.dt", name.to_lowercase()))
    }

    /// Whether the time dimension of `name` exists in the project.
    pub fn time_exists(&self, name: &str) -> Result<bool> {
        self.has_dataset(&format!("dataset.time.{}", to_identifier(name)))
    }

    fn has_dataset(&self, identifier: &str) -> Result<bool> {
        let sets = self
            .project
            .datasets()
            .map_err(|err| Error::MaqlValidation {
                message: format!("could not check if date exists: {}", err.api_message()),
                maql: String::new(),
            })?;
        Ok(sets
            .iter()
            .any(|set| set["meta"]["identifier"].as_str() == Some(identifier)))
    }

    /// Create a date dimension.
    ///
    /// # Errors
    ///
    /// Returns `Error::MaqlValidation` if the dimension already exists.
    pub fn create(&self, name: &str, include_time: bool) -> Result<()> {
        if self.exists(name)? {
            return Err(Error::MaqlValidation {
                message: format!("date dimension already exists: {name}"),
                maql: String::new(),
            });
        }
        log::info!("creating date dimension {name} (time: {include_time})");
        self.project
            .execute_maql(&Self::maql(Some(name), include_time))?;
        if include_time {
            self.upload_time(name)?;
        }
        Ok(())
    }

    /// Add the time dimension to an existing date dimension.
    pub fn create_time(&self, name: &str) -> Result<()> {
        log::info!("creating time dimension of {name}");
        self.project
            .execute_maql(&time_dimension_maql(&to_identifier(name), name))?;
        self.upload_time(name)
    }

    /// Create whatever part of the dimension is missing. Returns whether
    /// anything was created.
    pub fn ensure(&self, name: &str, include_time: bool) -> Result<bool> {
        if !self.exists(name)? {
            self.create(name, include_time)?;
            return Ok(true);
        }
        if include_time && !self.time_exists(name)? {
            self.create_time(name)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Load the seconds of the day into the time dimension.
    pub fn upload_time(&self, name: &str) -> Result<()> {
        let id = to_identifier(name);
        let manifest = time_manifest(&id);
        let data = UploadData::Rows(time_rows());
        let archive = create_archive(&data, &manifest, &[], &[], None)?;
        self.project.upload_archive(archive)?;
        Ok(())
    }
}

fn time_dimension_maql(id: &str, name: &str) -> String {
    format!(
        "# CREATE THE TIME DIMENSION\n\
         CREATE DATASET {{dataset.time.{id}}} VISUAL(TITLE \"Time ({name})\");\n\
         CREATE FOLDER {{dim.time.{id}}} VISUAL(TITLE \"Time ({name})\") TYPE ATTRIBUTE;\n\
         CREATE ATTRIBUTE {{attr.time.second.of.day.{id}}} VISUAL(TITLE \"Time ({name})\", \
         FOLDER {{dim.time.{id}}}) AS KEYS {{d_time_second_of_day_{id}.id}} FULLSET;\n\
         ALTER DATASET {{dataset.time.{id}}} ADD {{attr.time.second.of.day.{id}}};\n\
         ALTER ATTRIBUTE {{attr.time.second.of.day.{id}}} ADD LABELS \
         {{label.time.second.of.day.{id}}} VISUAL(TITLE \"Second of Day ({name})\") \
         AS {{d_time_second_of_day_{id}.nm}};\n\
         ALTER ATTRIBUTE {{attr.time.second.of.day.{id}}} ADD LABELS \
         {{label.time.second.of.day.{id}.time}} VISUAL(TITLE \"Time hh:mm:ss ({name})\") \
         AS {{d_time_second_of_day_{id}.nm_time}};\n\
         ALTER ATTRIBUTE  {{attr.time.second.of.day.{id}}} DEFAULT LABEL \
         {{label.time.second.of.day.{id}.time}};\n\
         SYNCHRONIZE {{dataset.time.{id}}};\n"
    )
}

fn time_manifest(id: &str) -> SliManifest {
    SliManifest::new(
        &format!("time.{id}"),
        vec![
            ManifestPart::new(
                "second_of_day",
                UploadMode::Full,
                format!("label.time.second.of.day.{id}"),
            )
            .reference_key(),
            ManifestPart::new(
                "time",
                UploadMode::Full,
                format!("label.time.second.of.day.{id}.time"),
            ),
        ],
    )
}

fn time_rows() -> Vec<Row> {
    (0..SECONDS_PER_DAY)
        .map(|second| {
            let mut row = Row::new();
            row.insert("second_of_day".into(), Cell::Int(i64::from(second)));
            row.insert(
                "time".into(),
                Cell::Text(format!(
                    "{:02}:{:02}:{:02}",
                    second / 3600,
                    second / 60 % 60,
                    second % 60
                )),
            );
            row
        })
        .collect()
}
