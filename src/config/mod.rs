//! Configuration types for the data preparation jobs.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading or validating a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config '{path}'")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to serialize config")]
    Serialize(#[from] serde_yaml::Error),

    #[error("failed to write config '{path}'")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("missing required config key: {0}")]
    MissingKey(&'static str),
}

/// Geometry of the three-wheel omnidirectional platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KinematicsConfig {
    /// Wheel radius in meters
    #[serde(default = "default_wheel_radius")]
    pub wheel_radius_m: f64,

    /// Distance from each wheel to the robot center in meters
    #[serde(default = "default_wheel_base")]
    pub wheel_base_m: f64,

    /// Wheel mounting angle in degrees
    #[serde(default = "default_wheel_angle")]
    pub wheel_angle_deg: f64,

    /// Robot orientation offset in degrees
    #[serde(default)]
    pub orientation_deg: f64,

    /// Added to every ratio denominator
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
}

fn default_wheel_radius() -> f64 {
    0.04
}

fn default_wheel_base() -> f64 {
    0.125
}

fn default_wheel_angle() -> f64 {
    30.0
}

fn default_epsilon() -> f64 {
    1e-6
}

impl Default for KinematicsConfig {
    fn default() -> Self {
        Self {
            wheel_radius_m: default_wheel_radius(),
            wheel_base_m: default_wheel_base(),
            wheel_angle_deg: default_wheel_angle(),
            orientation_deg: 0.0,
            epsilon: default_epsilon(),
        }
    }
}

/// Input and output of the kinematic feature extraction job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    #[serde(default = "default_extract_input")]
    pub input: PathBuf,

    #[serde(default = "default_extract_output")]
    pub output: PathBuf,
}

fn default_extract_input() -> PathBuf {
    PathBuf::from("data/raw/Data_Set_C.xlsx")
}

fn default_extract_output() -> PathBuf {
    PathBuf::from("data/raw/processed_C_data.xlsx")
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            input: default_extract_input(),
            output: default_extract_output(),
        }
    }
}

/// Settings for the column sorter job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortConfig {
    #[serde(default = "default_sort_input")]
    pub input: PathBuf,

    #[serde(default = "default_sort_output")]
    pub output: PathBuf,

    /// Column to order rows by
    #[serde(default = "default_sort_column")]
    pub column: String,

    /// Sort largest values first
    #[serde(default = "default_descending")]
    pub descending: bool,

    /// Number of sorted rows to print
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
}

fn default_sort_input() -> PathBuf {
    PathBuf::from("data/processed/train.csv")
}

fn default_sort_output() -> PathBuf {
    PathBuf::from("data/processed/train_sorted.csv")
}

fn default_sort_column() -> String {
    "Type".to_string()
}

fn default_descending() -> bool {
    true
}

fn default_preview_rows() -> usize {
    5
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            input: default_sort_input(),
            output: default_sort_output(),
            column: default_sort_column(),
            descending: default_descending(),
            preview_rows: default_preview_rows(),
        }
    }
}

/// Raw train/test spreadsheet locations (`data_load` section).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataLoadConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub train_dataset: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_dataset: Option<PathBuf>,
}

/// Processed train/test CSV locations (`data_split` section).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataSplitConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trainset_path: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub testset_path: Option<PathBuf>,
}

/// The four paths the dataset splitter needs, all guaranteed present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitPaths {
    pub train_dataset: PathBuf,
    pub test_dataset: PathBuf,
    pub trainset_path: PathBuf,
    pub testset_path: PathBuf,
}

/// Main pipeline configuration combining all sub-configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub kinematics: KinematicsConfig,

    #[serde(default)]
    pub extract: ExtractConfig,

    #[serde(default)]
    pub sort: SortConfig,

    #[serde(default)]
    pub data_load: DataLoadConfig,

    #[serde(default)]
    pub data_split: DataSplitConfig,
}

impl PipelineConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml_str(content: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document deserializes to unit, not to a mapping.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve the splitter paths, naming the first absent key.
    pub fn split_paths(&self) -> Result<SplitPaths, ConfigError> {
        let train_dataset = self
            .data_load
            .train_dataset
            .clone()
            .ok_or(ConfigError::MissingKey("data_load.train_dataset"))?;
        let test_dataset = self
            .data_load
            .test_dataset
            .clone()
            .ok_or(ConfigError::MissingKey("data_load.test_dataset"))?;
        let trainset_path = self
            .data_split
            .trainset_path
            .clone()
            .ok_or(ConfigError::MissingKey("data_split.trainset_path"))?;
        let testset_path = self
            .data_split
            .testset_path
            .clone()
            .ok_or(ConfigError::MissingKey("data_split.testset_path"))?;

        Ok(SplitPaths {
            train_dataset,
            test_dataset,
            trainset_path,
            testset_path,
        })
    }
}
