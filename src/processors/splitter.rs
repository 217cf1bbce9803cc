//! Train/test dataset preparation: feature selection and binary labelling.

use std::path::{Path, PathBuf};

use log::{info, warn};
use thiserror::Error;

use crate::config::{ConfigError, PipelineConfig};
use crate::core::loaders::{self, LoaderError};
use crate::core::table::{Cell, Column, Table, TableError};
use crate::core::writers::{self, WriteError};

/// Raw sensor features.
pub const V1_FEATURES: [&str; 15] = [
    "I1", "I2", "I3", "gx", "gy", "gz", "ax", "ay", "az", "V1real", "V2real", "V3real", "N1",
    "N2", "N3",
];

/// Kinematic ratio features.
pub const V2_FEATURES: [&str; 4] = ["Tx", "Ty", "Tphi", "Tz"];

/// Column holding the class code, and the label column in the output.
pub const LABEL_COLUMN: &str = "Type";

/// Class code mapped to the positive label.
pub const POSITIVE_CLASS: f64 = 5.0;

/// Errors that can occur while preparing the train/test split.
#[derive(Debug, Error)]
pub enum SplitError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to load '{path}'")]
    Load {
        path: PathBuf,
        #[source]
        source: LoaderError,
    },

    #[error("failed to prepare '{path}'")]
    Table {
        path: PathBuf,
        #[source]
        source: TableError,
    },

    #[error(transparent)]
    Write(#[from] WriteError),
}

/// Candidate feature columns in output order.
pub fn candidate_features() -> impl Iterator<Item = &'static str> {
    V1_FEATURES.iter().chain(V2_FEATURES.iter()).copied()
}

/// Result of selecting the candidate features present in a table.
#[derive(Debug, Clone)]
pub struct FeatureSelection {
    pub table: Table,
    /// Candidates absent from the source, in candidate order
    pub skipped: Vec<String>,
}

/// Keep the candidate features present in `table`, in candidate order.
///
/// Each absent candidate is logged as a warning and reported in `skipped`.
pub fn select_features(table: &Table) -> FeatureSelection {
    let (present, skipped): (Vec<&str>, Vec<&str>) =
        candidate_features().partition(|name| table.has_column(name));

    for name in &skipped {
        warn!("Feature column '{}' is missing from the dataset and will be skipped", name);
    }

    FeatureSelection {
        table: table.select(&present),
        skipped: skipped.into_iter().map(str::to_string).collect(),
    }
}

/// Map the class code column to 1 where it equals 5, else 0.
pub fn binary_target(table: &Table) -> Result<Column, TableError> {
    let source = table.require_column(LABEL_COLUMN)?;
    let labels = source
        .values
        .iter()
        .map(|cell| {
            let positive = cell.as_f64() == Some(POSITIVE_CLASS);
            Cell::Number(if positive { 1.0 } else { 0.0 })
        })
        .collect();
    Ok(Column::new(LABEL_COLUMN, labels))
}

/// Counts describing how one table was prepared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableReport {
    pub rows_loaded: usize,
    pub rows_dropped: usize,
    pub features_kept: usize,
    pub skipped: Vec<String>,
    pub positives: usize,
}

/// Both tables' reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitReport {
    pub train: TableReport,
    pub test: TableReport,
}

/// Drop incomplete rows, trim names, select features and append the binary label.
///
/// `table` is consumed; rows with any missing value are removed before selection.
pub fn prepare_table(mut table: Table) -> Result<(Table, TableReport), TableError> {
    let rows_loaded = table.num_rows();
    let rows_dropped = table.drop_missing_rows();
    table.trim_column_names();

    let FeatureSelection {
        table: mut output,
        skipped,
    } = select_features(&table);
    let features_kept = output.num_columns();

    let target = binary_target(&table)?;
    let positives = target
        .values
        .iter()
        .filter(|cell| **cell == Cell::Number(1.0))
        .count();
    output.set_column(target)?;

    Ok((
        output,
        TableReport {
            rows_loaded,
            rows_dropped,
            features_kept,
            skipped,
            positives,
        },
    ))
}

fn load_and_prepare(path: &Path) -> Result<(Table, TableReport), SplitError> {
    let table = loaders::load_table(path).map_err(|source| SplitError::Load {
        path: path.to_path_buf(),
        source,
    })?;

    let (prepared, report) = prepare_table(table).map_err(|source| SplitError::Table {
        path: path.to_path_buf(),
        source,
    })?;

    info!(
        "{}: {} rows loaded, {} dropped for missing values, {} features kept, {} positive",
        path.display(),
        report.rows_loaded,
        report.rows_dropped,
        report.features_kept,
        report.positives
    );
    Ok((prepared, report))
}

/// Prepare the train and test tables named in `config` and write both CSVs.
///
/// Both tables are prepared before either file is written, so a failure on the
/// test table leaves no train output behind.
pub fn split_dataset(config: &PipelineConfig) -> Result<SplitReport, SplitError> {
    let paths = config.split_paths()?;

    info!("Loading training data...");
    let (train, train_report) = load_and_prepare(&paths.train_dataset)?;

    info!("Loading testing data...");
    let (test, test_report) = load_and_prepare(&paths.test_dataset)?;

    writers::write_csv_table(&paths.trainset_path, &train)?;
    info!("Saved processed data to: {}", paths.trainset_path.display());

    writers::write_csv_table(&paths.testset_path, &test)?;
    info!("Saved processed data to: {}", paths.testset_path.display());

    Ok(SplitReport {
        train: train_report,
        test: test_report,
    })
}
