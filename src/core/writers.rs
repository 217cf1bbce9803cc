//! Table writers for CSV and spreadsheet formats.
//!
//! Both writers emit a header row followed by one line per table row, and
//! never write a row index column.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use rust_xlsxwriter::{Workbook, XlsxError};
use thiserror::Error;

use super::loaders::TableFormat;
use super::table::{Cell, Table};

/// Errors that can occur during write operations.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Failed to create parent directories.
    #[error("failed to create parent directories for '{path}'")]
    CreateDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create or open file for writing.
    #[error("failed to create file '{path}'")]
    CreateFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write data to file.
    #[error("failed to write to file '{path}'")]
    WriteFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV writing error.
    #[error("CSV write error for '{path}'")]
    CsvError {
        path: String,
        #[source]
        source: csv::Error,
    },

    /// Spreadsheet writing error.
    #[error("spreadsheet write error for '{path}'")]
    XlsxError {
        path: String,
        #[source]
        source: XlsxError,
    },

    /// Table does not fit in a worksheet.
    #[error("table with {rows} rows and {columns} columns does not fit in a worksheet")]
    SheetBounds { rows: usize, columns: usize },

    /// Output extension is neither CSV nor spreadsheet.
    #[error("unsupported output format: {0}")]
    UnsupportedFormat(String),
}

/// Result type for write operations.
pub type Result<T> = std::result::Result<T, WriteError>;

/// Creates parent directories for a file path if they don't exist.
fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| WriteError::CreateDirectory {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
    }
    Ok(())
}

/// Spreadsheet extensions the writer can produce; `xls`, `xlsb` and `ods` are read-only.
const XLSX_EXTENSIONS: [&str; 2] = ["xlsx", "xlsm"];

fn is_xlsx_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| XLSX_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Write a table to `path`, choosing the format from the extension.
///
/// Only `.csv`/`.txt` and `.xlsx`/`.xlsm` are writable. Any other extension is
/// rejected before a file is created.
pub fn write_table(path: &Path, table: &Table) -> Result<()> {
    match TableFormat::detect(path) {
        Some(TableFormat::Csv) => write_csv_table(path, table),
        Some(TableFormat::Spreadsheet) => write_xlsx_table(path, table),
        None => Err(WriteError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Write a table as comma-separated text with a header row.
///
/// Missing cells are written as empty fields.
///
/// # Errors
///
/// Returns an error if:
/// - Parent directories cannot be created
/// - File cannot be created or written to
///
/// # Example
///
/// ```no_run
/// use wheel_dataprep::core::table::{Column, Table};
/// use wheel_dataprep::core::writers::write_csv_table;
/// use std::path::Path;
///
/// let table = Table::from_columns(vec![Column::from_f64("Type", vec![1.0, 0.0])]).unwrap();
/// write_csv_table(Path::new("labels.csv"), &table).unwrap();
/// ```
pub fn write_csv_table(path: &Path, table: &Table) -> Result<()> {
    ensure_parent_dirs(path)?;

    let file = File::create(path).map_err(|e| WriteError::CreateFile {
        path: path.display().to_string(),
        source: e,
    })?;
    let buf_writer = BufWriter::new(file);
    let mut csv_writer = csv::Writer::from_writer(buf_writer);

    let path_str = path.display().to_string();

    // Write header
    csv_writer
        .write_record(table.column_names())
        .map_err(|e| WriteError::CsvError {
            path: path_str.clone(),
            source: e,
        })?;

    // Write data rows
    for row in 0..table.num_rows() {
        csv_writer
            .write_record(table.row(row).iter().map(|cell| cell.to_string()))
            .map_err(|e| WriteError::CsvError {
                path: path_str.clone(),
                source: e,
            })?;
    }

    csv_writer.flush().map_err(|e| WriteError::WriteFile {
        path: path_str,
        source: e,
    })?;

    Ok(())
}

/// Write a table to a single-sheet `.xlsx` workbook.
///
/// Numbers are written as numeric cells. Missing cells and NaN are left blank;
/// infinities are written as text since Excel has no representation for them.
/// `path` must end in `.xlsx` or `.xlsm`.
pub fn write_xlsx_table(path: &Path, table: &Table) -> Result<()> {
    if !is_xlsx_path(path) {
        return Err(WriteError::UnsupportedFormat(path.display().to_string()));
    }

    let rows = u32::try_from(table.num_rows() + 1).ok();
    let cols = u16::try_from(table.num_columns()).ok();
    if rows.is_none() || cols.is_none() {
        return Err(WriteError::SheetBounds {
            rows: table.num_rows(),
            columns: table.num_columns(),
        });
    }

    ensure_parent_dirs(path)?;

    let path_str = path.display().to_string();
    let xlsx_err = |e: XlsxError| WriteError::XlsxError {
        path: path_str.clone(),
        source: e,
    };

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (col, column) in (0u16..).zip(table.columns()) {
        sheet.write_string(0, col, column.name.as_str()).map_err(xlsx_err)?;

        for (row, cell) in (1u32..).zip(&column.values) {
            match cell {
                Cell::Number(v) if v.is_finite() => {
                    sheet.write_number(row, col, *v).map_err(xlsx_err)?;
                }
                Cell::Number(v) if v.is_infinite() => {
                    sheet.write_string(row, col, v.to_string()).map_err(xlsx_err)?;
                }
                Cell::Text(s) if !cell.is_missing() => {
                    sheet.write_string(row, col, s.as_str()).map_err(xlsx_err)?;
                }
                _ => {}
            }
        }
    }

    workbook.save(path).map_err(xlsx_err)?;

    Ok(())
}

/// Write the text rendering of a table, e.g. a preview, to any sink.
pub fn write_preview<W: Write>(mut out: W, table: &Table) -> std::io::Result<()> {
    write!(out, "{}", table)?;
    out.flush()
}
