//! Multi-cell assembly of per-site observations
//!
//! Stacks the site series column-by-column into `(time, gridcell)` arrays. The grid
//! cell order is the site order, which for the Plum Island setup runs from the most
//! to the least saline site.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tidecell_core::dataset::{ForcingDataset, GridVariable};
use tidecell_core::errors::{TideCellError, TideCellResult};
use tidecell_core::spatial::SpatialGrid;
use tidecell_core::standard_variables::{VAR_TIDE_HEIGHT, VAR_TIDE_SALINITY};
use tidecell_core::timeseries::{FloatValue, SiteSeries, TimeAxis};

/// Lower bound applied to salinity so downstream code never divides by zero
pub const SALINITY_FLOOR: FloatValue = 1e-5;

/// Parameters for the site assembler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblerParameters {
    /// Minimum salinity
    /// unit: ppt
    pub salinity_floor: FloatValue,
    /// Index of the site whose timestamps become the shared time axis
    pub time_site: usize,
}

impl Default for AssemblerParameters {
    fn default() -> Self {
        Self {
            salinity_floor: SALINITY_FLOOR,
            // Middle Road
            time_site: 1,
        }
    }
}

/// Builds a [`ForcingDataset`] from one [`SiteSeries`] per grid cell
#[derive(Debug, Clone)]
pub struct SiteAssembler<G: SpatialGrid> {
    grid: G,
    parameters: AssemblerParameters,
}

impl<G: SpatialGrid> SiteAssembler<G> {
    pub fn new(grid: G, parameters: AssemblerParameters) -> Self {
        Self { grid, parameters }
    }

    pub fn grid(&self) -> &G {
        &self.grid
    }

    /// Clip a salinity value to the floor, leaving missing values missing
    pub fn clip_salinity(&self, value: FloatValue) -> FloatValue {
        if value.is_nan() {
            value
        } else {
            value.max(self.parameters.salinity_floor)
        }
    }

    /// Stack the site series into `tide_height` and `tide_salinity`
    ///
    /// Rows are matched by position. Fails with [`TideCellError::Alignment`] if the
    /// number of series does not match the grid or the series differ in length.
    pub fn assemble(&self, sites: &[SiteSeries]) -> TideCellResult<ForcingDataset> {
        if sites.len() != self.grid.size() {
            return Err(TideCellError::Alignment(format!(
                "grid {} has {} cells but {} site series were given",
                self.grid.grid_name(),
                self.grid.size(),
                sites.len()
            )));
        }
        let reference = sites.get(self.parameters.time_site).ok_or_else(|| {
            TideCellError::Alignment(format!(
                "time axis site index {} out of range for {} sites",
                self.parameters.time_site,
                sites.len()
            ))
        })?;

        let n_times = reference.len();
        for site in sites {
            if site.len() != n_times {
                return Err(TideCellError::Alignment(format!(
                    "site {} has {} records, site {} has {}",
                    site.site,
                    site.len(),
                    reference.site,
                    n_times
                )));
            }
        }
        for (site, expected) in sites.iter().zip(self.grid.region_names()) {
            if &site.site != expected {
                log::warn!(
                    "Site {} placed in the grid cell named {}",
                    site.site,
                    expected
                );
            }
        }

        let n_cells = sites.len();
        let height = Array2::from_shape_fn((n_times, n_cells), |(t, c)| {
            sites[c].records[t].tide_height
        });
        let salinity = Array2::from_shape_fn((n_times, n_cells), |(t, c)| {
            self.clip_salinity(sites[c].records[t].salinity)
        });

        let mut dataset = ForcingDataset::new(
            TimeAxis::from_values(reference.timestamps()),
            self.grid.gridcell_ids(),
        );
        dataset.insert(
            VAR_TIDE_HEIGHT.name,
            GridVariable::new(VAR_TIDE_HEIGHT.unit, height),
        )?;
        dataset.insert(
            VAR_TIDE_SALINITY.name,
            GridVariable::new(VAR_TIDE_SALINITY.unit, salinity),
        )?;

        log::info!(
            "Assembled {} time steps for {} grid cells ({})",
            n_times,
            n_cells,
            self.grid.region_names().join(", ")
        );
        Ok(dataset)
    }
}
