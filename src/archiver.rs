//! Upload archive packaging.
//!
//! GoodData ingests a zip holding `data.csv` and the SLI manifest
//! `upload_info.json`. The archive is built in memory.

use std::io::{Cursor, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Error, Result};
use crate::formatter::{csv_encode, csv_line, format_dates, Cell, Row};
use crate::manifest::{SliManifest, CSV_DATA_FILENAME, MANIFEST_FILENAME};

/// Name of the archive on the WebDAV server.
pub const ARCHIVE_NAME: &str = "upload.zip";

/// Data handed to an upload.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadData {
    /// Ready-made CSV, used as is.
    Csv(String),
    /// Rows rendered in manifest column order, date columns expanded.
    Rows(Vec<Row>),
}

/// Render rows as the upload CSV, header included.
pub fn rows_to_csv(
    rows: &[Row],
    manifest: &SliManifest,
    dates: &[String],
    datetimes: &[String],
) -> String {
    let fields = manifest.column_names();
    let header: Vec<String> = fields.iter().map(|f| csv_encode(&Cell::from(*f))).collect();

    let mut csv = header.join(",");
    csv.push('\n');
    for row in rows {
        let mut row = row.clone();
        format_dates(&mut row, dates, datetimes);
        csv.push_str(&csv_line(&row, &fields));
        csv.push('\n');
    }
    csv
}

/// Build the zip archive.
///
/// With `keep_csv`, the rendered CSV is also written to that path.
pub fn create_archive(
    data: &UploadData,
    manifest: &SliManifest,
    dates: &[String],
    datetimes: &[String],
    keep_csv: Option<&Path>,
) -> Result<Vec<u8>> {
    let csv = match data {
        UploadData::Csv(csv) => csv.clone(),
        UploadData::Rows(rows) => rows_to_csv(rows, manifest, dates, datetimes),
    };

    if let Some(path) = keep_csv {
        std::fs::write(path, &csv).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
    }

    let manifest_json = serde_json::to_string(manifest)?;

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer.start_file(CSV_DATA_FILENAME, options)?;
    writer
        .write_all(csv.as_bytes())
        .map_err(zip::result::ZipError::from)?;
    writer.start_file(MANIFEST_FILENAME, options)?;
    writer
        .write_all(manifest_json.as_bytes())
        .map_err(zip::result::ZipError::from)?;
    let cursor = writer.finish()?;

    log::debug!(
        "built upload archive: {} bytes of CSV, {} bytes zipped",
        csv.len(),
        cursor.get_ref().len()
    );
    Ok(cursor.into_inner())
}

/// Parse a CSV document into rows of text cells.
pub fn csv_to_rows(data: &str) -> Result<Vec<Row>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(data.trim().as_bytes());
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(name, value)| (name.to_string(), Cell::from(value)))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}
