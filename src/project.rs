//! GoodData projects: statement execution, data integration and metadata.

use std::path::PathBuf;
use std::thread::sleep;

use serde_json::{json, Value};

use crate::archiver::{UploadData, ARCHIVE_NAME};
use crate::connection::Connection;
use crate::dataset::Dataset;
use crate::date_dimension::DateDimension;
use crate::error::{Error, Result};
use crate::manifest::{SliManifest, UploadMode};
use crate::text::to_identifier;

const PROJECTS_URI: &str = "/gdc/projects";
const MD_URI: &str = "/gdc/md/";

/// Settings of a new project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    pub title: String,
    pub auth_token: String,
    pub summary: Option<String>,
    pub template: Option<String>,
}

impl NewProject {
    pub fn new(title: &str, auth_token: &str) -> Self {
        Self {
            title: title.to_string(),
            auth_token: auth_token.to_string(),
            summary: None,
            template: None,
        }
    }

    pub fn summary(mut self, summary: &str) -> Self {
        self.summary = Some(summary.to_string());
        self
    }

    /// Create the project from a project template URI.
    pub fn template(mut self, template: &str) -> Self {
        self.template = Some(template.to_string());
        self
    }
}

/// How a dataset upload runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadOptions {
    pub mode: UploadMode,
    /// Keep a copy of the generated CSV at this path.
    pub keep_csv: Option<PathBuf>,
    /// Only build the archive; touch nothing remotely.
    pub no_upload: bool,
}

impl UploadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn full(mut self) -> Self {
        self.mode = UploadMode::Full;
        self
    }

    pub fn keep_csv(mut self, path: impl Into<PathBuf>) -> Self {
        self.keep_csv = Some(path.into());
        self
    }

    pub fn no_upload(mut self) -> Self {
        self.no_upload = true;
        self
    }
}

/// A project, bound to an open connection.
#[derive(Debug, Clone)]
pub struct Project<'c> {
    connection: &'c Connection,
    id: String,
}

impl<'c> Project<'c> {
    pub fn load_by_id(connection: &'c Connection, id: &str) -> Self {
        Self {
            connection,
            id: id.to_string(),
        }
    }

    /// Find a project by title among the ones visible to the user.
    pub fn load_by_name(connection: &'c Connection, name: &str) -> Result<Self> {
        let metadata = connection.get_json(MD_URI)?;
        let links = metadata["about"]["links"]
            .as_array()
            .cloned()
            .unwrap_or_default();
        let id = links
            .iter()
            .find(|link| link["title"].as_str() == Some(name))
            .and_then(|link| link["identifier"].as_str())
            .ok_or_else(|| Error::ProjectNotFound {
                name: name.to_string(),
            })?;
        log::debug!("retrieved project identifier for {name}: {id}");
        Ok(Self::load_by_id(connection, id))
    }

    pub fn create(connection: &'c Connection, settings: &NewProject) -> Result<Self> {
        let mut meta = json!({
            "title": settings.title,
            "summary": settings.summary,
        });
        if let Some(template) = &settings.template {
            meta["projectTemplate"] = json!(template);
        }
        let body = json!({
            "project": {
                "meta": meta,
                "content": {
                    "guidedNavigation": "1",
                    "authorizationToken": settings.auth_token,
                },
            }
        });

        let response = connection.post_json(PROJECTS_URI, &body)?;
        let id = response["uri"]
            .as_str()
            .and_then(|uri| uri.rsplit('/').find(|segment| !segment.is_empty()))
            .ok_or_else(|| Error::ProjectNotOpened {
                project_id: settings.title.clone(),
                message: format!("no project uri in response: {response}"),
            })?;
        log::info!("created project {} with id {id}", settings.title);
        Ok(Self::load_by_id(connection, id))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn connection(&self) -> &'c Connection {
        self.connection
    }

    pub fn delete(&self) -> Result<()> {
        let uri = format!("{PROJECTS_URI}/{}", self.id);
        self.connection
            .delete(&uri)
            .map_err(|err| Error::ProjectNotOpened {
                project_id: self.id.clone(),
                message: err.api_message(),
            })
    }

    /// Execute a MAQL DDL script and return the URIs it produced.
    ///
    /// # Errors
    ///
    /// `Error::MaqlValidation` for an empty script or a 400 answer,
    /// `Error::MaqlExecution` for any other rejection.
    pub fn execute_maql(&self, maql: &str) -> Result<Vec<String>> {
        if maql.trim().is_empty() {
            return Err(Error::MaqlValidation {
                message: "MAQL missing, nothing to execute".into(),
                maql: maql.to_string(),
            });
        }
        log::info!("executing {} bytes of MAQL on project {}", maql.len(), self.id);

        let uri = format!("/gdc/md/{}/ldm/manage", self.id);
        let body = json!({"manage": {"maql": maql}});
        let response = self.connection.post_json(&uri, &body).map_err(|err| match err {
            Error::Api {
                status: 400,
                message,
                ..
            } => Error::MaqlValidation {
                message,
                maql: maql.to_string(),
            },
            Error::Api {
                status, message, ..
            } => Error::MaqlExecution {
                message,
                maql: maql.to_string(),
                status: Some(status),
            },
            other => other,
        })?;

        let uris: Vec<String> = response["uris"]
            .as_array()
            .map(|uris| {
                uris.iter()
                    .filter_map(|u| u.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();
        if uris.is_empty() {
            return Err(Error::MaqlExecution {
                message: "length of `uris` array should not be 0".into(),
                maql: maql.to_string(),
                status: None,
            });
        }
        Ok(uris)
    }

    /// Execute a MAQL DML statement and wait for its task to finish.
    pub fn execute_dml(&self, dml: &str) -> Result<()> {
        let fail = |message: String| Error::DmlExecution {
            message,
            dml: dml.to_string(),
        };
        if dml.trim().is_empty() {
            return Err(fail("DML missing, nothing to execute".into()));
        }

        let uri = format!("/gdc/md/{}/dml/manage", self.id);
        let response = self
            .connection
            .post_json(&uri, &json!({"manage": {"maql": dml}}))
            .map_err(|err| fail(err.api_message()))?;
        let task_uri = response["uri"]
            .as_str()
            .ok_or_else(|| fail(format!("no task uri in response: {response}")))?;

        loop {
            let task = self.connection.get_json(task_uri)?;
            let state = &task["taskState"];
            let status = state["status"].as_str().unwrap_or_default();
            log::debug!("DML task {task_uri}: {status}");
            match status {
                "OK" => return Ok(()),
                "ERROR" => {
                    let message = state["msg"].as_str().unwrap_or("DML task failed");
                    return Err(fail(message.to_string()));
                }
                _ => sleep(self.connection.config().poll_interval),
            }
        }
    }

    /// Ask GoodData to load an uploaded directory and wait for the result.
    ///
    /// An expired session (401) is renewed once before giving up.
    pub fn integrate_uploaded_data(&self, dir_name: &str) -> Result<()> {
        let uri = format!("/gdc/md/{}/etl/pull", self.id);
        let body = json!({"pullIntegration": dir_name});
        let fail = |message: String| Error::UploadFailed {
            message,
            dir_name: dir_name.to_string(),
        };

        let response = match self.connection.post_json(&uri, &body) {
            Err(err) if err.status() == Some(401) => {
                self.connection.relogin()?;
                self.connection.post_json(&uri, &body)
            }
            other => other,
        }
        .map_err(|err| match err {
            Error::Api { message, .. } => fail(message),
            other => other,
        })?;

        let task_uri = response["pullTask"]["uri"]
            .as_str()
            .ok_or_else(|| fail(format!("no pull task in response: {response}")))?;

        loop {
            let task = self.connection.get_json(task_uri)?;
            let status = task["taskStatus"].as_str().unwrap_or_default();
            log::debug!("pull task {task_uri}: {status}");
            match status {
                "OK" => return Ok(()),
                "ERROR" | "WARNING" => return Err(fail(format!("failed with status: {status}"))),
                _ => sleep(self.connection.config().poll_interval),
            }
        }
    }

    /// The SLI manifest GoodData uses to load a dataset.
    pub fn sli_manifest(&self, dataset: &str) -> Result<SliManifest> {
        let dataset = to_identifier(dataset);
        let uri = format!(
            "/gdc/md/{}/ldm/singleloadinterface/dataset.{dataset}/manifest",
            self.id
        );
        let value = self
            .connection
            .get_json(&uri)
            .map_err(|err| Error::SliManifest {
                dataset: dataset.clone(),
                message: err.api_message(),
            })?;
        serde_json::from_value(value).map_err(|err| Error::SliManifest {
            dataset,
            message: err.to_string(),
        })
    }

    /// Metadata of every dataset of the project.
    pub fn datasets(&self) -> Result<Vec<Value>> {
        let uri = format!("/gdc/md/{}/data/sets", self.id);
        let response = self.connection.get_json(&uri)?;
        Ok(response["dataSetsInfo"]["sets"]
            .as_array()
            .cloned()
            .unwrap_or_default())
    }

    /// Metadata of a dataset, looked up by identifier or title.
    pub fn dataset_metadata(&self, name: &str) -> Result<Value> {
        let identifier = format!("dataset.{}", to_identifier(name));
        self.datasets()?
            .into_iter()
            .find(|set| {
                set["meta"]["identifier"].as_str() == Some(identifier.as_str())
                    || set["meta"]["title"].as_str() == Some(name)
            })
            .ok_or_else(|| Error::DatasetNotFound {
                dataset: name.to_string(),
            })
    }

    /// Objects depending on the metadata object at `object_uri`.
    pub fn used_by(&self, object_uri: &str) -> Result<Vec<Value>> {
        let object_id = object_uri.rsplit('/').next().unwrap_or(object_uri);
        let uri = format!("/gdc/md/{}/usedby2/{object_id}", self.id);
        let response = self.connection.get_json(&uri)?;
        Ok(response["entries"].as_array().cloned().unwrap_or_default())
    }

    /// Create a dataset, along with the date dimensions it needs.
    pub fn create_dataset(&self, dataset: &Dataset) -> Result<()> {
        dataset.validate()?;
        let dimensions = DateDimension::new(self);
        for (_, date) in dataset.date_columns() {
            dimensions.ensure(&date.schema_reference, date.datetime)?;
        }
        self.execute_maql(&dataset.maql())?;
        Ok(())
    }

    /// Upload data into a dataset, creating the dataset first if needed.
    ///
    /// Returns the WebDAV directory used, or `None` with `no_upload`.
    pub fn upload_dataset(
        &self,
        dataset: &Dataset,
        data: &UploadData,
        options: &UploadOptions,
    ) -> Result<Option<String>> {
        if !options.no_upload {
            match self.dataset_metadata(dataset.name()) {
                Ok(_) => {}
                Err(Error::DatasetNotFound { .. }) => self.create_dataset(dataset)?,
                Err(err) => return Err(err),
            }
        }

        let archive = dataset.archive(data, options.mode, options.keep_csv.as_deref())?;
        if options.no_upload {
            return Ok(None);
        }
        self.upload_archive(archive).map(Some)
    }

    /// Push an archive to WebDAV, integrate it and clean up.
    pub(crate) fn upload_archive(&self, archive: Vec<u8>) -> Result<String> {
        let dir_name = self.connection.upload_archive(archive, ARCHIVE_NAME)?;
        self.integrate_uploaded_data(&dir_name)?;
        self.connection.delete_upload_dir(&dir_name)?;
        Ok(dir_name)
    }

    pub fn delete_dataset(&self, name: &str) -> Result<()> {
        let metadata = self.dataset_metadata(name)?;
        let uri = metadata["meta"]["uri"]
            .as_str()
            .ok_or_else(|| Error::DatasetNotFound {
                dataset: name.to_string(),
            })?;
        self.connection.delete(uri)
    }
}

/// Delete every project with this title. Returns how many were deleted.
pub fn delete_projects_by_name(connection: &Connection, name: &str) -> Result<usize> {
    log::debug!("dropping projects named {name}");
    let mut deleted = 0;
    loop {
        match Project::load_by_name(connection, name) {
            Ok(project) => {
                project.delete()?;
                deleted += 1;
            }
            Err(Error::ProjectNotFound { .. }) => return Ok(deleted),
            Err(err) => return Err(err),
        }
    }
}
