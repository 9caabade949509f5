//! Gridded tidal forcing for multi-cell ELM marsh simulations
//!
//! Builds the hourly tide forcing for the Railroad, Middle Road and Typha sites of the
//! Plum Island Ecosystems LTER, two experiment variants with the 2022 and 2023 tides
//! exchanged, and the matching three-cell domain and surface data files.
//!
//! The stages live in [`tidecell_components`], the data model in [`tidecell_core`] and
//! the file adapters in [`tidecell_io`]. [`pipeline::run`] strings them together.

pub mod config;
pub mod logging;
pub mod pipeline;

pub use config::PipelineConfig;
pub use tidecell_core::errors::{TideCellError, TideCellResult};
