//! Row sorting of processed CSV files by a single column.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use log::info;
use thiserror::Error;

use crate::core::loaders::{self, LoaderError};
use crate::core::table::{Table, TableError};
use crate::core::writers::{self, WriteError};

/// Errors that can occur during sorting operations.
#[derive(Debug, Error)]
pub enum SortError {
    #[error("Failed to read CSV file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: LoaderError,
    },

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn from_descending(descending: bool) -> Self {
        if descending {
            SortOrder::Descending
        } else {
            SortOrder::Ascending
        }
    }
}

/// Row permutation that orders `table` by `column`.
///
/// The sort is stable: rows with equal keys keep their original relative order.
/// Missing values go last in either direction.
pub fn sorted_indices(table: &Table, column: &str, order: SortOrder) -> Result<Vec<usize>, TableError> {
    let keys = &table.require_column(column)?.values;

    let mut indices: Vec<usize> = (0..table.num_rows()).collect();
    indices.sort_by(|&a, &b| {
        let (ka, kb) = (&keys[a], &keys[b]);
        match (ka.is_missing(), kb.is_missing()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => match order {
                SortOrder::Ascending => ka.sort_cmp(kb),
                SortOrder::Descending => kb.sort_cmp(ka),
            },
        }
    });

    Ok(indices)
}

/// New table with rows ordered by `column`; its row index is 0..N-1 again.
pub fn sort_table_by_column(table: &Table, column: &str, order: SortOrder) -> Result<Table, TableError> {
    let indices = sorted_indices(table, column, order)?;
    Ok(table.take_rows(&indices))
}

/// Load a CSV, sort it by `column`, and write the sorted CSV to `output`.
///
/// # Returns
///
/// The sorted table, so callers can preview its first rows.
pub fn sort_csv_file(
    input: &Path,
    output: &Path,
    column: &str,
    order: SortOrder,
) -> Result<Table, SortError> {
    let table = loaders::load_csv_table(input).map_err(|source| SortError::Read {
        path: input.to_path_buf(),
        source,
    })?;

    let sorted = sort_table_by_column(&table, column, order)?;
    writers::write_csv_table(output, &sorted)?;
    info!(
        "Sorted {} rows by '{}' ({:?}) into {}",
        sorted.num_rows(),
        column,
        order,
        output.display()
    );

    Ok(sorted)
}
