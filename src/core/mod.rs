//! Core data types, I/O and transforms.

pub mod loaders;
pub mod table;
pub mod transforms;
pub mod writers;

pub use loaders::{load_table, LoaderError, TableFormat};
pub use table::{Cell, Column, Table, TableError};
pub use transforms::KinematicModel;
pub use writers::{write_csv_table, write_table, write_xlsx_table, WriteError};
