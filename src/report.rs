//! Report execution and CSV export.

use std::fs;
use std::path::Path;
use std::thread;

use serde_json::{json, Value};

use crate::error::{Error, Result};
use crate::project::Project;

const EXECUTOR_URI: &str = "/gdc/xtab2/executor3";
const EXPORTER_URI: &str = "/gdc/exporter/executor";

/// Export still being generated.
const HTTP_ACCEPTED: u16 = 202;

/// A saved report of a project.
///
/// Each step runs the previous ones when needed, so `save` alone executes,
/// exports and downloads the report.
pub struct Report<'p, 'c> {
    project: &'p Project<'c>,
    id: String,
    exec_result: Option<Value>,
    download_uri: Option<String>,
    content: Option<String>,
}

impl<'p, 'c> Report<'p, 'c> {
    pub fn new(project: &'p Project<'c>, id: &str) -> Self {
        Self {
            project,
            id: id.to_string(),
            exec_result: None,
            download_uri: None,
            content: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    fn definition_uri(&self) -> String {
        format!("/gdc/md/{}/obj/{}", self.project.id(), self.id)
    }

    /// Remote failures carry the report id, transport failures stay as is.
    fn failed(&self, step: &str, err: Error) -> Error {
        match err {
            Error::Api { .. } => Error::Report {
                report_id: self.id.clone(),
                message: format!("{step}: {}", err.api_message()),
            },
            other => other,
        }
    }

    /// Execute the report definition.
    pub fn execute(&mut self) -> Result<&Value> {
        let result = match self.exec_result.take() {
            Some(result) => result,
            None => {
                let body = json!({"report_req": {"report": self.definition_uri()}});
                self.project
                    .connection()
                    .post_json(EXECUTOR_URI, &body)
                    .map_err(|err| self.failed("execution", err))?
            }
        };
        Ok(self.exec_result.insert(result))
    }

    /// Ask for a CSV export. Returns the URI the export is served from.
    pub fn export(&mut self) -> Result<&str> {
        let uri = match self.download_uri.take() {
            Some(uri) => uri,
            None => {
                let result = self.execute()?.clone();
                let body = json!({"result_req": {"format": "csv", "result": result}});
                let response = self
                    .project
                    .connection()
                    .post_json(EXPORTER_URI, &body)
                    .map_err(|err| self.failed("export", err))?;
                response["uri"]
                    .as_str()
                    .map(String::from)
                    .ok_or_else(|| Error::Report {
                        report_id: self.id.clone(),
                        message: "export returned no download uri".into(),
                    })?
            }
        };
        Ok(self.download_uri.insert(uri).as_str())
    }

    /// Fetch the exported CSV, waiting while GoodData still generates it.
    pub fn download(&mut self) -> Result<&str> {
        let content = match self.content.take() {
            Some(content) => content,
            None => {
                let uri = self.export()?.to_string();
                let connection = self.project.connection();
                let body = loop {
                    let (status, body) = connection
                        .get_raw(&uri)
                        .map_err(|err| self.failed("download", err))?;
                    if status != HTTP_ACCEPTED {
                        break body;
                    }
                    log::debug!("report {} export not ready", self.id);
                    thread::sleep(connection.config().poll_interval);
                };
                String::from_utf8_lossy(&body).into_owned()
            }
        };
        Ok(self.content.insert(content).as_str())
    }

    /// Write the exported CSV to `path`.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        let content = self.download()?.to_string();
        fs::write(path, content).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
