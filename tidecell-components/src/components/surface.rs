//! Surface data replication
//!
//! Expands a one-cell ELM surface data file to match the replicated domain, then
//! attaches the marsh geometry used by the tidal hydrology and marks the least saline
//! site as freshwater marsh vegetation.

use ndarray::{Array2, Axis, Ix2};
use serde::{Deserialize, Serialize};
use tidecell_core::dataset::{Dataset, Variable};
use tidecell_core::errors::{TideCellError, TideCellResult};
use tidecell_core::standard_variables::{
    VAR_DIST_FROM_STREAM, VAR_HT_ABOVE_STREAM, VAR_LONGXY, VAR_PCT_NAT_PFT, VAR_XC,
};
use tidecell_core::timeseries::FloatValue;

/// Give one cell a single plant functional type
///
/// `dominant` is set to 100 % and `cleared` to 0 % in `cell`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PftOverride {
    pub cell: usize,
    pub dominant: usize,
    pub cleared: usize,
}

impl Default for PftOverride {
    /// Typha: freshwater marsh PFT replaces the saltmarsh PFT
    fn default() -> Self {
        Self {
            cell: 2,
            dominant: 13,
            cleared: 14,
        }
    }
}

/// Parameters for the surface replicator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceParameters {
    pub cells: usize,
    pub cell_dim: String,
    pub lat_dim: String,
    pub pft_dim: String,
    /// Marsh surface elevation above the tide datum
    /// unit: m
    pub ht_above_stream: FloatValue,
    /// Distance from the marsh edge
    /// unit: m
    pub dist_from_stream: FloatValue,
    pub pft_override: Option<PftOverride>,
}

impl Default for SurfaceParameters {
    fn default() -> Self {
        Self {
            cells: 3,
            cell_dim: "lsmlon".to_string(),
            lat_dim: "lsmlat".to_string(),
            pft_dim: "natpft".to_string(),
            ht_above_stream: 0.252,
            dist_from_stream: 4.0,
            pft_override: Some(PftOverride::default()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SurfaceReplicator {
    parameters: SurfaceParameters,
}

impl SurfaceReplicator {
    pub fn from_parameters(parameters: SurfaceParameters) -> TideCellResult<Self> {
        if parameters.cells == 0 {
            return Err(TideCellError::Config(
                "surface data must have at least one cell".to_string(),
            ));
        }
        Ok(Self { parameters })
    }

    /// Build N-cell surface data from a one-cell template and the replicated domain
    pub fn replicate(&self, template: &Dataset, domain: &Dataset) -> TideCellResult<Dataset> {
        let p = &self.parameters;
        template.variable(VAR_LONGXY.name)?;
        template.f64_array(VAR_PCT_NAT_PFT.name)?;

        let mut out = template.repeat_along(&p.cell_dim, p.cells)?;
        let n_lat = out.dimension_len(&p.lat_dim)?;
        let n_lon = out.dimension_len(&p.cell_dim)?;

        self.copy_longitudes(&mut out, domain, n_lon)?;

        for (def, value) in [
            (&VAR_HT_ABOVE_STREAM, p.ht_above_stream),
            (&VAR_DIST_FROM_STREAM, p.dist_from_stream),
        ] {
            let data = Array2::from_elem((n_lat, n_lon), value).into_dyn();
            out.insert_variable(
                def.name,
                Variable::from_f64(&[p.lat_dim.as_str(), p.cell_dim.as_str()], data).with_attrs(def.attributes()),
            )?;
        }

        if let Some(pft) = p.pft_override {
            self.apply_pft_override(&mut out, pft)?;
        }

        log::info!(
            "Replicated surface data to {} cells ({} = {} m, {} = {} m)",
            n_lon,
            VAR_HT_ABOVE_STREAM.name,
            p.ht_above_stream,
            VAR_DIST_FROM_STREAM.name,
            p.dist_from_stream
        );
        Ok(out)
    }

    /// Set `LONGXY` to the domain cell centers, broadcast over latitude rows
    fn copy_longitudes(&self, out: &mut Dataset, domain: &Dataset, n_lon: usize) -> TideCellResult<()> {
        let p = &self.parameters;
        let xc = domain
            .f64_array(VAR_XC.name)?
            .view()
            .into_dimensionality::<Ix2>()
            .map_err(|e| TideCellError::schema(format!("domain `xc`: {e}")))?;

        let longxy_var = out.variable(VAR_LONGXY.name)?;
        if longxy_var.axis_of(&p.lat_dim) != Some(0) || longxy_var.axis_of(&p.cell_dim) != Some(1) {
            return Err(TideCellError::schema(format!(
                "`LONGXY` has dimensions {:?}, expected [{}, {}]",
                longxy_var.dims, p.lat_dim, p.cell_dim
            )));
        }

        let mut longxy = out
            .f64_array_mut(VAR_LONGXY.name)?
            .view_mut()
            .into_dimensionality::<Ix2>()
            .map_err(|e| TideCellError::schema(format!("`LONGXY`: {e}")))?;
        if xc.ncols() != n_lon || (xc.nrows() != 1 && xc.nrows() != longxy.nrows()) {
            return Err(TideCellError::schema(format!(
                "domain `xc` has shape {:?}, surface data has {:?}",
                xc.dim(),
                longxy.dim()
            )));
        }
        longxy.assign(&xc);
        Ok(())
    }

    fn apply_pft_override(&self, out: &mut Dataset, pft: PftOverride) -> TideCellResult<()> {
        let p = &self.parameters;
        let variable = out.variable(VAR_PCT_NAT_PFT.name)?;
        let (Some(pft_axis), Some(cell_axis)) =
            (variable.axis_of(&p.pft_dim), variable.axis_of(&p.cell_dim))
        else {
            return Err(TideCellError::schema(format!(
                "`PCT_NAT_PFT` has dimensions {:?}, needs `{}` and `{}`",
                variable.dims, p.pft_dim, p.cell_dim
            )));
        };

        let values = out.f64_array_mut(VAR_PCT_NAT_PFT.name)?;
        let n_pft = values.len_of(Axis(pft_axis));
        let n_cells = values.len_of(Axis(cell_axis));
        if pft.cell >= n_cells || pft.dominant >= n_pft || pft.cleared >= n_pft {
            return Err(TideCellError::schema(format!(
                "PFT override {:?} out of range for {} PFTs and {} cells",
                pft, n_pft, n_cells
            )));
        }

        for (index, v) in values.indexed_iter_mut() {
            if index[cell_axis] != pft.cell {
                continue;
            }
            if index[pft_axis] == pft.dominant {
                *v = 100.0;
            } else if index[pft_axis] == pft.cleared {
                *v = 0.0;
            }
        }
        log::debug!(
            "Cell {}: PFT {} set to 100 %, PFT {} set to 0 %",
            pft.cell,
            pft.dominant,
            pft.cleared
        );
        Ok(())
    }
}
