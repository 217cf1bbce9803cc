//! Table loaders for delimited text and spreadsheet files.
//!
//! This module provides:
//! - CSV loading with a header row (comma-separated)
//! - Spreadsheet loading (first worksheet of `.xlsx`, `.xlsm`, `.xls` or `.ods`)
//! - Format detection from the file extension

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use thiserror::Error;

use super::table::{Cell, Table};

/// Errors that can occur during file loading.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("IO error")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error")]
    Spreadsheet(#[from] calamine::Error),

    #[error("Empty file: {0}")]
    EmptyFile(PathBuf),

    #[error("Unsupported table format: {0}")]
    UnsupportedFormat(PathBuf),
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// On-disk table format, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    /// Comma-separated text with a header row
    Csv,
    /// Workbook; only the first sheet is used
    Spreadsheet,
}

impl TableFormat {
    /// Detect the format of `path` from its extension (case-insensitive).
    pub fn detect<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" | "txt" => Some(TableFormat::Csv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(TableFormat::Spreadsheet),
            _ => None,
        }
    }
}

/// Load a table from either a CSV or a spreadsheet file.
///
/// # Errors
///
/// Returns `UnsupportedFormat` for unknown extensions, otherwise whatever the
/// format-specific loader reports.
pub fn load_table<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    match TableFormat::detect(path) {
        Some(TableFormat::Csv) => load_csv_table(path),
        Some(TableFormat::Spreadsheet) => load_spreadsheet_table(path),
        None => Err(LoaderError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Load a comma-separated file whose first row holds the column names.
///
/// Fields are parsed as numbers where possible; blank fields become empty cells.
/// A file with a header but no data rows yields an empty table with those columns.
///
/// # Errors
///
/// Returns an error if the file cannot be read, has no header row, or is malformed.
pub fn load_csv_table<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(BufReader::new(file));

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() {
        return Err(LoaderError::EmptyFile(path.to_path_buf()));
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(Cell::parse).collect());
    }

    Ok(Table::from_rows(headers, rows))
}

/// Load the first worksheet of a workbook. The first row holds the column names.
///
/// # Errors
///
/// Returns an error if the workbook cannot be opened or has no sheets or rows.
pub fn load_spreadsheet_table<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    let mut workbook = open_workbook_auto(path)?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LoaderError::EmptyFile(path.to_path_buf()))??;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(header_name).collect(),
        None => return Err(LoaderError::EmptyFile(path.to_path_buf())),
    };

    let body: Vec<Vec<Cell>> = rows
        .map(|row| row.iter().map(spreadsheet_cell).collect())
        .collect();

    Ok(Table::from_rows(headers, body))
}

fn header_name(data: &Data) -> String {
    match data {
        Data::Float(v) => Cell::Number(*v).to_string(),
        other => other.to_string(),
    }
}

fn spreadsheet_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::Int(v) => Cell::Number(*v as f64),
        Data::Float(v) => Cell::Number(*v),
        Data::Bool(b) => Cell::Number(if *b { 1.0 } else { 0.0 }),
        Data::String(s) => Cell::parse(s),
        other => Cell::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn test_detect_format() {
        assert_eq!(TableFormat::detect("data/raw/Data_Set_C.xlsx"), Some(TableFormat::Spreadsheet));
        assert_eq!(TableFormat::detect("train.CSV"), Some(TableFormat::Csv));
        assert_eq!(TableFormat::detect("table.parquet"), None);
        assert_eq!(TableFormat::detect("no_extension"), None);
    }

    #[test]
    fn test_load_csv_table() -> Result<()> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("train.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "V1real,I1 ,Type").unwrap();
        writeln!(file, "1.5,0.2,5").unwrap();
        writeln!(file, "2.0,,3").unwrap();
        file.flush().unwrap();

        let table = load_table(&path)?;
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.column_names(), vec!["V1real", "I1 ", "Type"]);
        assert_eq!(table.column("V1real").unwrap().values[0], Cell::Number(1.5));
        assert_eq!(table.column("I1 ").unwrap().values[1], Cell::Empty);

        Ok(())
    }

    #[test]
    fn test_load_csv_header_only() -> Result<()> {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "a,b").unwrap();
        file.flush().unwrap();

        let table = load_csv_table(file.path())?;
        assert!(table.is_empty());
        assert_eq!(table.num_columns(), 2);

        Ok(())
    }

    #[test]
    fn test_load_unsupported_extension() {
        let result = load_table("measurements.parquet");
        assert!(matches!(result, Err(LoaderError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_load_spreadsheet_table() -> Result<()> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("raw.xlsx");

        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "V1real").unwrap();
        sheet.write_string(0, 1, "Type").unwrap();
        sheet.write_number(1, 0, 0.5).unwrap();
        sheet.write_number(1, 1, 5.0).unwrap();
        sheet.write_number(2, 0, -1.25).unwrap();
        sheet.write_number(2, 1, 2.0).unwrap();
        workbook.save(&path).unwrap();

        let table = load_table(&path)?;
        assert_eq!(table.column_names(), vec!["V1real", "Type"]);
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.column("V1real").unwrap().values[1], Cell::Number(-1.25));
        assert_eq!(table.column("Type").unwrap().values[0].as_f64(), Some(5.0));

        Ok(())
    }
}
