pub mod csv_service;

pub use csv_service::{load_series_file, read_series, write_rows};
