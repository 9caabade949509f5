//! Grid cell layouts for multi-cell simulations
//!
//! Each monitoring site becomes one ELM grid cell. The order of the cells is part of
//! the contract with the downstream model: the forcing columns, the domain cells and the
//! surface data cells must all line up.
//!
//! # Examples
//!
//! ```rust
//! use tidecell_core::spatial::{SiteGrid, SpatialGrid};
//!
//! let grid = SiteGrid::plum_island();
//! assert_eq!(grid.size(), 3);
//! assert_eq!(grid.region_names()[0], "Railroad");
//! assert_eq!(grid.gridcell_ids(), vec![0, 1, 2]);
//! ```

use crate::errors::{TideCellError, TideCellResult};
use serde::{Deserialize, Serialize};

/// Trait for grid cell layouts
pub trait SpatialGrid: Clone + std::fmt::Debug {
    /// Unique name for this grid type
    ///
    /// Used for error messages and debugging
    fn grid_name(&self) -> &str;

    /// Number of grid cells
    fn size(&self) -> usize;

    /// Names of the cells, in column order
    fn region_names(&self) -> &[String];

    /// Integer labels written as the `gridcell` coordinate
    fn gridcell_ids(&self) -> Vec<i32> {
        (0..self.size() as i32).collect()
    }
}

/// One grid cell per monitoring site
///
/// Sites are ordered from most to least saline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteGrid {
    name: String,
    sites: Vec<String>,
}

impl SiteGrid {
    pub fn new(name: impl Into<String>, sites: Vec<String>) -> TideCellResult<Self> {
        if sites.is_empty() {
            return Err(TideCellError::Config(
                "a site grid needs at least one site".to_string(),
            ));
        }
        Ok(Self {
            name: name.into(),
            sites,
        })
    }

    /// Railroad, Middle Road and Typha sites of the Plum Island Ecosystems LTER
    pub fn plum_island() -> Self {
        Self {
            name: "PlumIsland".to_string(),
            sites: vec![
                "Railroad".to_string(),
                "Middle Road".to_string(),
                "Typha".to_string(),
            ],
        }
    }
}

impl SpatialGrid for SiteGrid {
    fn grid_name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> usize {
        self.sites.len()
    }

    fn region_names(&self) -> &[String] {
        &self.sites
    }
}
