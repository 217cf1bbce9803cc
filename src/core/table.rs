//! Column-oriented in-memory table shared by all jobs.

use std::cmp::Ordering;
use std::fmt;

use thiserror::Error;

/// Text tokens read as missing values, matching pandas' default NA set.
const NA_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None", "#N/A", "<NA>",
];

/// Errors raised by table access and reshaping.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("row is missing field '{0}'")]
    MissingField(String),

    #[error("non-numeric value '{value}' in column '{column}' at row {row}")]
    NonNumeric {
        row: usize,
        column: String,
        value: String,
    },

    #[error("column '{column}' has {actual} values, table has {expected} rows")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },
}

/// Result type for table operations.
pub type Result<T> = std::result::Result<T, TableError>;

/// A single table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Parse a raw text field, preferring a numeric reading.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(v) => Cell::Number(v),
            Err(_) => Cell::Text(raw.to_string()),
        }
    }

    /// True for empty cells, NaN numbers and NA text tokens.
    pub fn is_missing(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Number(v) => v.is_nan(),
            Cell::Text(s) => NA_TOKENS.contains(&s.trim()),
        }
    }

    /// Numeric view of the cell, `None` for text.
    ///
    /// Missing cells read as NaN so arithmetic propagates them.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            _ if self.is_missing() => Some(f64::NAN),
            Cell::Text(s) => s.trim().parse().ok(),
            Cell::Empty => Some(f64::NAN),
        }
    }

    /// Total order used for sorting: numbers, then text, missing last.
    pub fn sort_cmp(&self, other: &Cell) -> Ordering {
        let rank = |c: &Cell| -> u8 {
            if c.is_missing() {
                2
            } else if matches!(c, Cell::Number(_)) {
                0
            } else {
                1
            }
        };
        match (self, other) {
            (Cell::Number(a), Cell::Number(b)) if !a.is_nan() && !b.is_nan() => a.total_cmp(b),
            (Cell::Text(a), Cell::Text(b)) if !self.is_missing() && !other.is_missing() => a.cmp(b),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Number(v) => write!(f, "{}", v),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Number(v)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

/// A named column of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Build a column of numbers.
    pub fn from_f64(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self::new(name, values.into_iter().map(Cell::Number).collect())
    }
}

/// Ordered set of equal-length named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    num_rows: usize,
}

impl Table {
    /// Creates an empty table with no columns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table from columns, checking they share one length.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let mut table = Self::new();
        for column in columns {
            table.push_column(column)?;
        }
        Ok(table)
    }

    /// Creates a table from a header and row-major records.
    ///
    /// Short records are padded with empty cells, extra fields are ignored.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let num_rows = rows.len();
        let mut columns: Vec<Column> = headers
            .into_iter()
            .map(|name| Column::new(name, Vec::with_capacity(num_rows)))
            .collect();

        for row in rows {
            let mut fields = row.into_iter();
            for column in columns.iter_mut() {
                column.values.push(fields.next().unwrap_or(Cell::Empty));
            }
        }

        Self { columns, num_rows }
    }

    /// Returns the number of rows.
    #[inline]
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Returns the number of columns.
    #[inline]
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_rows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.position(name).map(|i| &self.columns[i])
    }

    /// Look up a column the caller cannot do without.
    pub fn require_column(&self, name: &str) -> Result<&Column> {
        self.column(name)
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))
    }

    /// Append a column at the end. The first column fixes the row count.
    pub fn push_column(&mut self, column: Column) -> Result<()> {
        if self.columns.is_empty() {
            self.num_rows = column.values.len();
        } else if column.values.len() != self.num_rows {
            return Err(TableError::LengthMismatch {
                column: column.name,
                expected: self.num_rows,
                actual: column.values.len(),
            });
        }
        self.columns.push(column);
        Ok(())
    }

    /// Replace a column in place, or append it if the name is new.
    pub fn set_column(&mut self, column: Column) -> Result<()> {
        match self.position(&column.name) {
            Some(i) => {
                if column.values.len() != self.num_rows {
                    return Err(TableError::LengthMismatch {
                        column: column.name,
                        expected: self.num_rows,
                        actual: column.values.len(),
                    });
                }
                self.columns[i] = column;
                Ok(())
            }
            None => self.push_column(column),
        }
    }

    /// Numeric values of a column that must exist for a row-wise computation.
    ///
    /// Missing cells come back as NaN; text that is not a number is an error.
    pub fn numeric_field(&self, name: &str) -> Result<Vec<f64>> {
        let column = self
            .column(name)
            .ok_or_else(|| TableError::MissingField(name.to_string()))?;

        column
            .values
            .iter()
            .enumerate()
            .map(|(row, cell)| {
                cell.as_f64().ok_or_else(|| TableError::NonNumeric {
                    row,
                    column: name.to_string(),
                    value: cell.to_string(),
                })
            })
            .collect()
    }

    /// Remove whitespace around every column name.
    pub fn trim_column_names(&mut self) {
        for column in self.columns.iter_mut() {
            let trimmed = column.name.trim();
            if trimmed.len() != column.name.len() {
                column.name = trimmed.to_string();
            }
        }
    }

    /// Drop every row that has a missing value in any column.
    ///
    /// Returns the number of rows removed.
    pub fn drop_missing_rows(&mut self) -> usize {
        let keep: Vec<usize> = (0..self.num_rows)
            .filter(|&row| !self.columns.iter().any(|c| c.values[row].is_missing()))
            .collect();

        let removed = self.num_rows - keep.len();
        if removed > 0 {
            *self = self.take_rows(&keep);
        }
        removed
    }

    /// New table with the given rows, in the given order.
    pub fn take_rows(&self, indices: &[usize]) -> Table {
        let columns = self
            .columns
            .iter()
            .map(|c| Column::new(c.name.clone(), indices.iter().map(|&i| c.values[i].clone()).collect()))
            .collect();

        Table {
            columns,
            num_rows: indices.len(),
        }
    }

    /// New table with the named columns in the given order. Unknown names are skipped.
    pub fn select(&self, names: &[&str]) -> Table {
        let columns = names
            .iter()
            .filter_map(|name| self.column(name).cloned())
            .collect();

        Table {
            columns,
            num_rows: self.num_rows,
        }
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> Table {
        let indices: Vec<usize> = (0..n.min(self.num_rows)).collect();
        self.take_rows(&indices)
    }

    /// Cells of one row in column order.
    pub fn row(&self, row: usize) -> Vec<&Cell> {
        self.columns.iter().map(|c| &c.values[row]).collect()
    }
}

impl fmt::Display for Table {
    /// Aligned text rendering with a leading row index, for console previews.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let index_width = self.num_rows.saturating_sub(1).to_string().len();

        let rendered: Vec<Vec<String>> = self
            .columns
            .iter()
            .map(|c| c.values.iter().map(|v| v.to_string()).collect())
            .collect();

        let widths: Vec<usize> = self
            .columns
            .iter()
            .zip(rendered.iter())
            .map(|(c, vals)| vals.iter().map(|v| v.len()).chain([c.name.len()]).max().unwrap_or(0))
            .collect();

        write!(f, "{:width$}", "", width = index_width)?;
        for (column, width) in self.columns.iter().zip(&widths) {
            write!(f, "  {:>width$}", column.name, width = width)?;
        }
        writeln!(f)?;

        for row in 0..self.num_rows {
            write!(f, "{:<width$}", row, width = index_width)?;
            for (vals, width) in rendered.iter().zip(&widths) {
                write!(f, "  {:>width$}", vals[row], width = width)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
