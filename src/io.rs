//! CSV input and output
//!
//! Input rows keep every column; the output repeats them unchanged and
//! appends [`OUTPUT_COLUMNS`].

use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{ResolveError, Result};
use crate::record::{RawRecord, Record};

pub const DEFAULT_NAME_COLUMN: &str = "trustee_name";
pub const DEFAULT_JURISDICTION_COLUMN: &str = "district";

/// Columns appended to every output row
pub const OUTPUT_COLUMNS: [&str; 4] = ["normalized_name", "suffix", "name_token_count", "group_id"];

/// Which input columns carry the name and the jurisdiction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CsvLayout {
    pub name_column: String,
    pub jurisdiction_column: String,
}

impl Default for CsvLayout {
    fn default() -> Self {
        Self {
            name_column: DEFAULT_NAME_COLUMN.to_string(),
            jurisdiction_column: DEFAULT_JURISDICTION_COLUMN.to_string(),
        }
    }
}

/// A parsed input file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<RawRecord>,
}

impl Table {
    pub fn column_index(&self, column: &str) -> Option<usize> {
        column_index(&self.headers, column)
    }
}

fn column_index(headers: &[String], column: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == column)
}

/// Parse CSV with a header row.
pub fn read_table<R: Read>(reader: R, layout: &CsvLayout) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let name_idx = column_index(&headers, &layout.name_column)
        .ok_or_else(|| ResolveError::MissingColumn(layout.name_column.clone()))?;
    let jurisdiction_idx = column_index(&headers, &layout.jurisdiction_column)
        .ok_or_else(|| ResolveError::MissingColumn(layout.jurisdiction_column.clone()))?;

    let mut rows = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result?;
        let field = |idx: usize, column: &str| {
            record
                .get(idx)
                .map(str::to_string)
                .ok_or_else(|| ResolveError::ShortRow {
                    row,
                    column: column.to_string(),
                })
        };
        rows.push(RawRecord {
            name: field(name_idx, &layout.name_column)?,
            jurisdiction: field(jurisdiction_idx, &layout.jurisdiction_column)?,
            columns: record.iter().map(str::to_string).collect(),
        });
    }

    Ok(Table { headers, rows })
}

/// Write resolved records under `headers` plus [`OUTPUT_COLUMNS`].
///
/// Rows shorter than the header are padded with empty fields.
pub fn write_table<W: Write>(writer: W, headers: &[String], records: &[Record]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(writer);

    writer.write_record(headers.iter().map(String::as_str).chain(OUTPUT_COLUMNS))?;

    let mut row: Vec<String> = Vec::with_capacity(headers.len() + OUTPUT_COLUMNS.len());
    for record in records {
        row.clear();
        row.extend(record.columns.iter().take(headers.len()).cloned());
        row.resize(headers.len(), String::new());
        row.push(record.normalized_name.clone());
        row.push(record.suffix.as_str().to_string());
        row.push(record.name_token_count.to_string());
        row.push(record.group_id.to_string());
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_path(path: impl AsRef<Path>, layout: &CsvLayout) -> Result<Table> {
    read_table(File::open(path)?, layout)
}

/// Write to a sibling temporary file, then rename it over `path`.
pub fn write_path(path: impl AsRef<Path>, headers: &[String], records: &[Record]) -> Result<()> {
    let path = path.as_ref();
    let tmp = temp_sibling(path);
    let written = File::create(&tmp)
        .map_err(ResolveError::from)
        .and_then(|file| write_table(file, headers, records));
    if let Err(err) = written {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
