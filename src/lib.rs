//! Data preparation jobs for a three-wheel omnidirectional robot dataset.
//!
//! This crate provides tools for:
//! - Deriving body-frame velocity, projected current and ratio features from raw
//!   wheel readings (spreadsheet or CSV)
//! - Selecting the training feature set and building a binary `Type` label for
//!   train/test CSVs
//! - Sorting a processed CSV by a column
//!
//! # Example
//!
//! ```no_run
//! use wheel_dataprep::core::{load_table, KinematicModel};
//! use wheel_dataprep::processors::extract_kinematic_features;
//!
//! let mut table = load_table("data/raw/Data_Set_C.xlsx").unwrap();
//! extract_kinematic_features(&mut table, &KinematicModel::default()).unwrap();
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod processors;

pub use config::{ConfigError, KinematicsConfig, PipelineConfig};
pub use crate::core::table::{Cell, Column, Table};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
