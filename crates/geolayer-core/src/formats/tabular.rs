//! Tabular loader for delimited text and spreadsheets
//!
//! Every cell is kept as a string. Malformed rows are skipped and counted
//! instead of failing the whole parse; only a file that cannot be opened as
//! a table at all produces `TableReadError`.

use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;

use crate::error::{GeolayerError, Result};
use crate::formats::{dataset_name, extension_of};
use crate::models::TableRecordSet;

/// Loads CSV and spreadsheet files into string-typed record sets
pub struct TabularLoader;

impl TabularLoader {
    pub fn load(path: &Path) -> Result<TableRecordSet> {
        let table = match extension_of(path).as_deref() {
            Some("csv") => read_csv(path)?,
            Some("xls") | Some("xlsx") | Some("xlsm") | Some("ods") => read_spreadsheet(path)?,
            other => {
                return Err(GeolayerError::UnsupportedFormat {
                    extension: other.unwrap_or("none").to_string(),
                    supported: crate::formats::TABULAR_EXTENSIONS
                        .iter()
                        .map(|s| s.to_string())
                        .collect(),
                })
            }
        };

        tracing::info!(
            source = %table.source_name,
            columns = table.columns.len(),
            rows = table.len(),
            skipped = table.skipped_rows,
            "Loaded table"
        );

        Ok(table)
    }
}

fn table_error(reason: impl std::fmt::Display) -> GeolayerError {
    GeolayerError::TableReadError {
        reason: reason.to_string(),
    }
}

/// Make header names unique and non-empty
fn normalize_headers(raw: Vec<String>) -> Vec<String> {
    let mut headers: Vec<String> = Vec::with_capacity(raw.len());
    for (index, header) in raw.into_iter().enumerate() {
        let base = match header.trim() {
            "" => format!("Unnamed: {}", index),
            trimmed => trimmed.to_string(),
        };

        let mut candidate = base.clone();
        let mut suffix = 1;
        while headers.contains(&candidate) {
            candidate = format!("{}.{}", base, suffix);
            suffix += 1;
        }
        headers.push(candidate);
    }
    headers
}

/// Read a CSV file
///
/// Rows longer than the header and rows that are not valid UTF-8 are
/// skipped; short rows are padded with empty cells.
fn read_csv(path: &Path) -> Result<TableRecordSet> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_path(path)
        .map_err(|e| table_error(format!("Failed to open {}: {}", path.display(), e)))?;

    let header_record = reader
        .byte_headers()
        .map_err(|e| table_error(format!("Failed to read header row: {}", e)))?
        .clone();
    let headers: Vec<String> = header_record
        .iter()
        .map(|field| String::from_utf8_lossy(field).trim_start_matches('\u{feff}').to_string())
        .collect();

    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err(table_error("No header row found"));
    }
    let columns = normalize_headers(headers);

    let mut rows = Vec::new();
    let mut skipped_rows = 0;

    for (line, result) in reader.byte_records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                if let csv::ErrorKind::Io(io) = e.kind() {
                    return Err(table_error(format!("I/O error while reading: {}", io)));
                }
                tracing::debug!(row = line + 1, error = %e, "Skipping malformed row");
                skipped_rows += 1;
                continue;
            }
        };

        if record.len() > columns.len() {
            tracing::debug!(
                row = line + 1,
                fields = record.len(),
                expected = columns.len(),
                "Skipping row with too many fields"
            );
            skipped_rows += 1;
            continue;
        }

        let decoded: std::result::Result<Vec<String>, _> = record
            .iter()
            .map(|field| std::str::from_utf8(field).map(str::to_string))
            .collect();

        match decoded {
            Ok(mut values) => {
                values.resize(columns.len(), String::new());
                rows.push(values);
            }
            Err(_) => {
                tracing::debug!(row = line + 1, "Skipping row with invalid UTF-8");
                skipped_rows += 1;
            }
        }
    }

    Ok(TableRecordSet {
        source_name: dataset_name(path),
        columns,
        rows,
        skipped_rows,
    })
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Read the first worksheet of a spreadsheet; the first row holds the headers
fn read_spreadsheet(path: &Path) -> Result<TableRecordSet> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| table_error(format!("Failed to open workbook {}: {}", path.display(), e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| table_error("Workbook has no worksheets"))?
        .map_err(|e| table_error(format!("Failed to read first worksheet: {}", e)))?;

    let mut row_iter = range.rows();
    let header_row = row_iter
        .next()
        .ok_or_else(|| table_error("Worksheet is empty"))?;
    let columns = normalize_headers(header_row.iter().map(cell_to_string).collect());

    let mut rows = Vec::new();
    for row in row_iter {
        if row.iter().all(|cell| matches!(cell, Data::Empty)) {
            continue;
        }
        let mut values: Vec<String> = row.iter().map(cell_to_string).collect();
        values.resize(columns.len(), String::new());
        rows.push(values);
    }

    Ok(TableRecordSet {
        source_name: dataset_name(path),
        columns,
        rows,
        skipped_rows: 0,
    })
}
