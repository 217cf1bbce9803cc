//! Batch jobs built on the core table types.

pub mod kinematics;
pub mod sorting;
pub mod splitter;

// Re-export key types for convenience
pub use kinematics::{extract_kinematic_features, run_extraction, ExtractionReport, KinematicsError};
pub use sorting::{sort_csv_file, sort_table_by_column, sorted_indices, SortError, SortOrder};
pub use splitter::{
    binary_target, prepare_table, select_features, split_dataset, FeatureSelection, SplitError,
    SplitReport, TableReport,
};
