//! Error types for GoodData API access, MAQL generation and migrations.

use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every failure the client can surface.
///
/// Low-level transport and HTTP failures are caught at the connection
/// boundary and re-raised as one of these kinds, carrying the URI or
/// statement that triggered them.
#[derive(Debug, Error)]
pub enum Error {
    // Session errors
    #[error("authentication failed: {message}")]
    Authentication { message: String, status: Option<u16> },

    // Transport errors (exit code 3)
    #[error("GoodData is unreachable ({uri}): {source}")]
    Unreachable {
        uri: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {uri} failed: {source}")]
    Http {
        uri: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} {uri} returned {status}: {message}")]
    Api {
        method: String,
        uri: String,
        status: u16,
        message: String,
    },

    // Remote resources
    #[error("project not found: {name}")]
    ProjectNotFound { name: String },

    #[error("project does not seem to be opened: {project_id} ({message})")]
    ProjectNotOpened { project_id: String, message: String },

    #[error("dataset {dataset} not found")]
    DatasetNotFound { dataset: String },

    // Statement errors
    #[error("MAQL validation failed: {message}")]
    MaqlValidation { message: String, maql: String },

    #[error("MAQL execution failed: {message}")]
    MaqlExecution {
        message: String,
        maql: String,
        status: Option<u16>,
    },

    #[error("DML execution failed: {message}")]
    DmlExecution { message: String, dml: String },

    #[error("upload of {dir_name} failed: {message}")]
    UploadFailed { message: String, dir_name: String },

    #[error("getting SLI manifest of {dataset} failed: {message}")]
    SliManifest { dataset: String, message: String },

    // Local model errors (exit code 2)
    #[error("column {column} cannot be altered: {reason}")]
    InvalidAlteration { column: String, reason: String },

    #[error("invalid dataset {dataset}: {message}")]
    InvalidDataset { dataset: String, message: String },

    #[error("cannot delete rows of {dataset}: {message}")]
    RowDeletion { dataset: String, message: String },

    #[error("migration \"{name}\" failed: {source}")]
    Migration {
        name: String,
        #[source]
        source: Box<Error>,
    },

    #[error("report {report_id} failed: {message}")]
    Report { report_id: String, message: String },

    // IO and encoding
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot build upload archive: {source}")]
    Archive {
        #[from]
        source: zip::result::ZipError,
    },

    #[error("invalid CSV data: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },

    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[from]
        source: serde_json::Error,
    },
}

impl Error {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Unreachable { .. } | Self::Http { .. } | Self::Io { .. } => 3,
            Self::InvalidAlteration { .. }
            | Self::InvalidDataset { .. }
            | Self::RowDeletion { .. }
            | Self::InvalidJson { .. }
            | Self::Csv { .. }
            | Self::Archive { .. } => 2,
            Self::Migration { source, .. } => source.exit_code(),
            _ => 1,
        }
    }

    /// HTTP status attached to the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Authentication { status, .. } | Self::MaqlExecution { status, .. } => *status,
            Self::Migration { source, .. } => source.status(),
            _ => None,
        }
    }

    /// The message to show a user, without the request context.
    pub(crate) fn api_message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Render a GoodData error body.
///
/// The API answers failures with `{"error": {"message": "...%s...", "parameters": [...]}}`;
/// placeholders are substituted in order. Bodies without that shape are
/// returned as compact JSON.
pub fn format_api_message(body: &Value) -> String {
    let error = body.get("error").unwrap_or(body);
    let Some(message) = error.get("message").and_then(Value::as_str) else {
        return body.to_string();
    };
    let parameters = error
        .get("parameters")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut rendered = String::with_capacity(message.len());
    let mut params = parameters.iter();
    let mut chars = message.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '%' {
            match chars.peek() {
                Some('s') | Some('d') => {
                    chars.next();
                    match params.next() {
                        Some(Value::String(s)) => rendered.push_str(s),
                        Some(other) => rendered.push_str(&other.to_string()),
                        None => rendered.push_str("%s"),
                    }
                    continue;
                }
                Some('%') => {
                    chars.next();
                }
                _ => {}
            }
        }
        rendered.push(c);
    }
    rendered
}
