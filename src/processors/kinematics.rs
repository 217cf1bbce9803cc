//! Kinematic feature extraction from raw wheel-sensor tables.

use std::path::Path;

use log::{debug, info};
use thiserror::Error;

use crate::config::KinematicsConfig;
use crate::core::loaders::{self, LoaderError};
use crate::core::table::{Column, Table, TableError};
use crate::core::transforms::KinematicModel;
use crate::core::writers::{self, WriteError};

/// Columns every input row must provide.
pub const REQUIRED_COLUMNS: [&str; 7] = ["V1real", "V2real", "V3real", "I1", "I2", "I3", "gz"];

/// Derived columns, in the order they are appended.
pub const DERIVED_COLUMNS: [&str; 10] = [
    "Vx", "Vy", "Omega", "Ix", "Iy", "Iphi", "Tx", "Ty", "Tphi", "Tz",
];

/// Errors that can occur during kinematic feature extraction.
#[derive(Debug, Error)]
pub enum KinematicsError {
    #[error("failed to load '{path}'")]
    Load {
        path: String,
        #[source]
        source: LoaderError,
    },

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

/// Summary of a completed extraction run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionReport {
    pub rows: usize,
    pub input_columns: usize,
    pub output_columns: usize,
}

/// Append `Vx, Vy, Omega, Ix, Iy, Iphi, Tx, Ty, Tphi, Tz` to `table`.
///
/// Every required column is resolved before any derived column is added, so on
/// error the table is left unchanged.
pub fn extract_kinematic_features(
    table: &mut Table,
    model: &KinematicModel,
) -> Result<(), TableError> {
    let [w1, w2, w3, i1, i2, i3, gz] = REQUIRED_COLUMNS.map(|name| table.numeric_field(name));
    let (w1, w2, w3) = (w1?, w2?, w3?);
    let (i1, i2, i3) = (i1?, i2?, i3?);
    let gz = gz?;

    let n = table.num_rows();
    let mut derived: [Vec<f64>; 10] = std::array::from_fn(|_| Vec::with_capacity(n));

    for row in 0..n {
        let v = model.body_velocity([w1[row], w2[row], w3[row]]);
        let c = model.projected_current([i1[row], i2[row], i3[row]]);
        let t = model.torque_ratios(&v, &c, gz[row]);

        let values = [v.vx, v.vy, v.omega, c.ix, c.iy, c.iphi, t.tx, t.ty, t.tphi, t.tz];
        for (out, value) in derived.iter_mut().zip(values) {
            out.push(value);
        }
    }

    for (name, values) in DERIVED_COLUMNS.iter().zip(derived) {
        table.set_column(Column::from_f64(*name, values))?;
    }

    debug!("Derived {} kinematic columns for {} rows", DERIVED_COLUMNS.len(), n);
    Ok(())
}

/// Load `input`, derive the kinematic columns, and write the result to `output`.
///
/// Nothing is written unless every row was processed.
pub fn run_extraction(
    input: &Path,
    output: &Path,
    config: &KinematicsConfig,
) -> Result<ExtractionReport, KinematicsError> {
    let mut table = loaders::load_table(input).map_err(|source| KinematicsError::Load {
        path: input.display().to_string(),
        source,
    })?;
    info!(
        "Loaded {} rows x {} columns from {}",
        table.num_rows(),
        table.num_columns(),
        input.display()
    );

    let input_columns = table.num_columns();
    let model = KinematicModel::new(config);
    extract_kinematic_features(&mut table, &model)?;

    writers::write_table(output, &table)?;
    info!("Saved: {}", output.display());

    Ok(ExtractionReport {
        rows: table.num_rows(),
        input_columns,
        output_columns: table.num_columns(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::table::Cell;
    use approx::assert_relative_eq;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    const HEADER: &str = "V1real,V2real,V3real,I1,I2,I3,gx,gy,gz,Type";

    fn create_raw_csv(dir: &Path, name: &str, rows: &[&str]) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        writeln!(file, "{}", HEADER).unwrap();
        for row in rows {
            writeln!(file, "{}", row).unwrap();
        }
        path
    }

    fn value(table: &Table, column: &str, row: usize) -> f64 {
        table.column(column).unwrap().values[row].as_f64().unwrap()
    }

    #[test]
    fn test_derived_columns_follow_inputs() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_raw_csv(temp_dir.path(), "raw.csv", &["1,0,0,0.2,0.1,0.3,0,0,0.5,5"]);

        let mut table = loaders::load_table(&path).unwrap();
        extract_kinematic_features(&mut table, &KinematicModel::default()).unwrap();

        let names = table.column_names();
        assert_eq!(names.len(), 10 + DERIVED_COLUMNS.len());
        assert_eq!(&names[..10], HEADER.split(',').collect::<Vec<_>>().as_slice());
        assert_eq!(&names[10..], DERIVED_COLUMNS.as_slice());

        assert_relative_eq!(value(&table, "Vx", 0), -0.023_094_010_767_585, epsilon = 1e-12);
        assert_relative_eq!(value(&table, "Vy", 0), 0.013_333_333_333_333, epsilon = 1e-12);
        assert_relative_eq!(value(&table, "Omega", 0), 0.106_666_666_666_667, epsilon = 1e-12);
        // Type is carried through untouched
        assert_eq!(table.column("Type").unwrap().values[0], Cell::Number(5.0));
    }

    #[test]
    fn test_tphi_over_tz_equals_omega_over_gz() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_raw_csv(
            temp_dir.path(),
            "raw.csv",
            &[
                "1.5,-2.0,0.7,0.4,0.2,-0.1,0,0,0.9,1",
                "-3.0,1.0,2.0,1.2,-0.8,0.5,0,0,-0.3,5",
                "0.1,0.2,0.3,0.01,0.02,0.03,0,0,2.5,3",
            ],
        );

        let mut table = loaders::load_table(&path).unwrap();
        extract_kinematic_features(&mut table, &KinematicModel::default()).unwrap();

        for row in 0..table.num_rows() {
            let ratio = value(&table, "Tphi", row) / value(&table, "Tz", row);
            let expected = value(&table, "Omega", row) / value(&table, "gz", row);
            assert_relative_eq!(ratio, expected, epsilon = 1e-9, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_missing_required_column_leaves_table_unchanged() {
        let mut table = Table::from_rows(
            vec!["V1real".into(), "V2real".into(), "V3real".into(), "I1".into(), "I2".into(), "I3".into()],
            vec![vec![Cell::Number(1.0); 6]],
        );
        let before = table.clone();

        let result = extract_kinematic_features(&mut table, &KinematicModel::default());

        assert!(matches!(result, Err(TableError::MissingField(name)) if name == "gz"));
        assert_eq!(table, before);
    }

    #[test]
    fn test_empty_cell_propagates_nan() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_raw_csv(temp_dir.path(), "raw.csv", &["1,0,0,,0.1,0.3,0,0,0.5,5"]);

        let mut table = loaders::load_table(&path).unwrap();
        extract_kinematic_features(&mut table, &KinematicModel::default()).unwrap();

        assert!(value(&table, "Ix", 0).is_nan());
        assert!(value(&table, "Tx", 0).is_nan());
        // Velocity does not depend on currents
        assert!(value(&table, "Vx", 0).is_finite());
    }

    #[test]
    fn test_run_extraction_writes_output() {
        let temp_dir = TempDir::new().unwrap();
        let input = create_raw_csv(
            temp_dir.path(),
            "Data_Set_C.csv",
            &["1,2,3,0.1,0.2,0.3,0,0,0.5,5", "0,0,0,0,0,0,0,0,0,1"],
        );
        let output = temp_dir.path().join("out").join("processed_C_data.xlsx");

        let report = run_extraction(&input, &output, &KinematicsConfig::default()).unwrap();

        assert_eq!(report.rows, 2);
        assert_eq!(report.input_columns, 10);
        assert_eq!(report.output_columns, 20);

        let written = loaders::load_table(&output).unwrap();
        assert_eq!(written.num_rows(), 2);
        assert_eq!(written.column_names()[19], "Tz");
        // All-zero row: every ratio is 0 / eps
        assert_eq!(value(&written, "Tx", 1), 0.0);
    }

    #[test]
    fn test_run_extraction_missing_column_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("raw.csv");
        fs::write(&input, "V1real,V2real,V3real,I1,I2,I3\n1,2,3,4,5,6\n").unwrap();
        let output = temp_dir.path().join("processed.xlsx");

        let result = run_extraction(&input, &output, &KinematicsConfig::default());

        assert!(matches!(
            result,
            Err(KinematicsError::Table(TableError::MissingField(ref name))) if name == "gz"
        ));
        assert!(!output.exists());
    }
}
