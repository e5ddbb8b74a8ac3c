//! SLI manifest types (`upload_info.json`).
//!
//! The manifest tells GoodData which CSV column populates which logical
//! model element.

use serde::{Deserialize, Serialize};

/// Name of the CSV file inside the upload archive.
pub const CSV_DATA_FILENAME: &str = "data.csv";

/// Name of the manifest file inside the upload archive.
pub const MANIFEST_FILENAME: &str = "upload_info.json";

/// Upload mode of a manifest part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UploadMode {
    /// Replace the data already loaded.
    Full,
    /// Append to the data already loaded.
    #[default]
    Incremental,
}

impl UploadMode {
    /// Create mode from a full-upload flag (true = Full, false = Incremental).
    pub fn from_full_flag(full: bool) -> Self {
        if full {
            UploadMode::Full
        } else {
            UploadMode::Incremental
        }
    }
}

/// Date format constraint of a part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraints {
    pub date: String,
}

/// One CSV column mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestPart {
    pub column_name: String,
    pub mode: UploadMode,
    pub populates: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_key: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Constraints>,
}

impl ManifestPart {
    pub(crate) fn new(column_name: impl Into<String>, mode: UploadMode, populates: String) -> Self {
        Self {
            column_name: column_name.into(),
            mode,
            populates: vec![populates],
            reference_key: None,
            constraints: None,
        }
    }

    pub(crate) fn reference_key(mut self) -> Self {
        self.reference_key = Some(1);
        self
    }

    pub(crate) fn date_format(mut self, format: &str) -> Self {
        self.constraints = Some(Constraints {
            date: format.to_string(),
        });
        self
    }
}

/// CSV dialect announced in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvParams {
    pub quote_char: String,
    pub escape_char: String,
    pub separator_char: String,
    pub end_of_line: String,
}

impl Default for CsvParams {
    fn default() -> Self {
        Self {
            quote_char: "\"".into(),
            escape_char: "\"".into(),
            separator_char: ",".into(),
            end_of_line: "\n".into(),
        }
    }
}

/// Body of the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SliManifestBody {
    pub parts: Vec<ManifestPart>,
    pub file: String,
    pub data_set: String,
    #[serde(default)]
    pub csv_params: CsvParams,
}

/// A complete manifest, as uploaded and as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliManifest {
    #[serde(rename = "dataSetSLIManifest")]
    pub manifest: SliManifestBody,
}

impl SliManifest {
    pub fn new(dataset_identifier: &str, parts: Vec<ManifestPart>) -> Self {
        Self {
            manifest: SliManifestBody {
                parts,
                file: CSV_DATA_FILENAME.to_string(),
                data_set: format!("dataset.{}", dataset_identifier),
                csv_params: CsvParams::default(),
            },
        }
    }

    pub fn parts(&self) -> &[ManifestPart] {
        &self.manifest.parts
    }

    /// CSV header, in manifest order.
    pub fn column_names(&self) -> Vec<&str> {
        self.manifest
            .parts
            .iter()
            .map(|part| part.column_name.as_str())
            .collect()
    }

    /// Find the part loading a CSV column.
    pub fn part(&self, column_name: &str) -> Option<&ManifestPart> {
        self.manifest
            .parts
            .iter()
            .find(|part| part.column_name == column_name)
    }
}
