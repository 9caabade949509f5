//! File adapters for the forcing pipeline
//!
//! - [`csv`]: per-site tide and salinity tables
//! - [`netcdf`]: reading templates and writing every output, behind the `netcdf` feature

pub mod csv;
pub mod netcdf;

pub use crate::csv::{load_site_series, read_site_series};
pub use crate::netcdf::{read_dataset, write_dataset};
