//! Spatial domain replication
//!
//! Turns a one-cell ELM domain file into an N-cell one by laying copies of the cell
//! side by side in longitude. The original cell width is split evenly, so the total
//! area covered by the domain does not change.

use ndarray::{ArrayViewMut2, ArrayViewMut3, Ix2, Ix3};
use serde::{Deserialize, Serialize};
use tidecell_core::dataset::Dataset;
use tidecell_core::errors::{TideCellError, TideCellResult};
use tidecell_core::standard_variables::{VAR_AREA, VAR_XC, VAR_XV};
use tidecell_core::timeseries::FloatValue;

/// Parameters for the domain replicator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainParameters {
    /// Number of cells in the output domain
    pub cells: usize,
    /// Dimension along which cells are laid out
    pub cell_dim: String,
}

impl Default for DomainParameters {
    fn default() -> Self {
        Self {
            cells: 3,
            cell_dim: "ni".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DomainReplicator {
    parameters: DomainParameters,
}

impl DomainReplicator {
    pub fn from_parameters(parameters: DomainParameters) -> TideCellResult<Self> {
        if parameters.cells == 0 {
            return Err(TideCellError::Config(
                "domain must have at least one cell".to_string(),
            ));
        }
        Ok(Self { parameters })
    }

    pub fn cells(&self) -> usize {
        self.parameters.cells
    }

    /// Longitude width of one output cell
    ///
    /// The full vertex extent of the template divided by the number of cells.
    pub fn cell_width(&self, template: &Dataset) -> TideCellResult<FloatValue> {
        let xv = template.f64_array(VAR_XV.name)?;
        let (lo, hi) = xv
            .iter()
            .filter(|v| !v.is_nan())
            .fold((FloatValue::INFINITY, FloatValue::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        if !lo.is_finite() || !hi.is_finite() {
            return Err(TideCellError::schema("`xv` has no valid vertex longitudes"));
        }
        Ok((hi - lo) / self.parameters.cells as FloatValue)
    }

    /// Build the N-cell domain from a one-cell template
    ///
    /// Variables along the cell dimension are repeated, then cell centers, vertices and
    /// areas are recomputed. Every `nj` row is shifted from its own first center.
    pub fn replicate(&self, template: &Dataset) -> TideCellResult<Dataset> {
        let cell_dim = self.parameters.cell_dim.as_str();
        let n = self.parameters.cells;

        let template_cells = template.dimension_len(cell_dim)?;
        if template_cells != 1 {
            return Err(TideCellError::schema(format!(
                "domain template has {template_cells} cells along `{cell_dim}`, expected 1"
            )));
        }
        self.check_layout(template, VAR_XC.name, 2)?;
        self.check_layout(template, VAR_XV.name, 3)?;
        template.f64_array(VAR_AREA.name)?;

        let width = self.cell_width(template)?;
        let origins: Vec<FloatValue> = to_2d(template.f64_array(VAR_XC.name)?.view(), VAR_XC.name)?
            .column(0)
            .to_vec();

        let mut out = template.repeat_along(cell_dim, n)?;

        let centers = {
            let mut xc = to_2d_mut(out.f64_array_mut(VAR_XC.name)?.view_mut(), VAR_XC.name)?;
            for ((j, i), v) in xc.indexed_iter_mut() {
                *v = origins[j] + i as FloatValue * width;
            }
            xc.to_owned()
        };

        let mut xv = to_3d_mut(out.f64_array_mut(VAR_XV.name)?.view_mut(), VAR_XV.name)?;
        for ((j, i, k), v) in xv.indexed_iter_mut() {
            let center = centers[[j, i]];
            *v = if k % 2 == 0 {
                center + width / 2.0
            } else {
                center - width / 2.0
            };
        }

        out.f64_array_mut(VAR_AREA.name)?
            .mapv_inplace(|a| a / n as FloatValue);

        log::info!(
            "Replicated domain to {} cells along {} with width {:.6}",
            n,
            cell_dim,
            width
        );
        Ok(out)
    }

    /// `name` must have `ndim` axes with the cell dimension second
    fn check_layout(&self, template: &Dataset, name: &str, ndim: usize) -> TideCellResult<()> {
        let variable = template.variable(name)?;
        let cell_dim = self.parameters.cell_dim.as_str();
        if variable.dims.len() != ndim || variable.axis_of(cell_dim) != Some(1) {
            return Err(TideCellError::schema(format!(
                "`{name}` has dimensions {:?}, expected {ndim} with `{cell_dim}` second",
                variable.dims
            )));
        }
        Ok(())
    }
}

fn to_2d<'a>(
    view: ndarray::ArrayViewD<'a, FloatValue>,
    name: &str,
) -> TideCellResult<ndarray::ArrayView2<'a, FloatValue>> {
    view.into_dimensionality::<Ix2>()
        .map_err(|e| TideCellError::schema(format!("`{name}`: {e}")))
}

fn to_2d_mut<'a>(
    view: ndarray::ArrayViewMutD<'a, FloatValue>,
    name: &str,
) -> TideCellResult<ArrayViewMut2<'a, FloatValue>> {
    view.into_dimensionality::<Ix2>()
        .map_err(|e| TideCellError::schema(format!("`{name}`: {e}")))
}

fn to_3d_mut<'a>(
    view: ndarray::ArrayViewMutD<'a, FloatValue>,
    name: &str,
) -> TideCellResult<ArrayViewMut3<'a, FloatValue>> {
    view.into_dimensionality::<Ix3>()
        .map_err(|e| TideCellError::schema(format!("`{name}`: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, s};
    use tidecell_core::dataset::{Variable, VariableData};

    fn template() -> Dataset {
        let mut ds = Dataset::new();
        ds.add_dimension("nj", 1).unwrap();
        ds.add_dimension("ni", 1).unwrap();
        ds.add_dimension("nv", 4).unwrap();
        ds.insert_variable("xc", Variable::from_f64(&["nj", "ni"], array![[289.2]].into_dyn()))
            .unwrap();
        ds.insert_variable("yc", Variable::from_f64(&["nj", "ni"], array![[42.74]].into_dyn()))
            .unwrap();
        ds.insert_variable(
            "xv",
            Variable::from_f64(
                &["nj", "ni", "nv"],
                array![[[289.25, 289.15, 289.15, 289.25]]].into_dyn(),
            ),
        )
        .unwrap();
        ds.insert_variable(
            "yv",
            Variable::from_f64(
                &["nj", "ni", "nv"],
                array![[[42.69, 42.69, 42.79, 42.79]]].into_dyn(),
            ),
        )
        .unwrap();
        ds.insert_variable("area", Variable::from_f64(&["nj", "ni"], array![[3.0e-6]].into_dyn()))
            .unwrap();
        ds.insert_variable(
            "mask",
            Variable::new(&["nj", "ni"], VariableData::I32(array![[1]].into_dyn())),
        )
        .unwrap();
        ds
    }

    fn replicator() -> DomainReplicator {
        DomainReplicator::from_parameters(DomainParameters::default()).unwrap()
    }

    #[test]
    fn test_width_is_split_extent() {
        assert_relative_eq!(replicator().cell_width(&template()).unwrap(), 0.1 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_area_is_conserved() {
        let out = replicator().replicate(&template()).unwrap();
        let area = out.f64_array("area").unwrap();
        assert_eq!(area.shape(), &[1, 3]);
        assert_relative_eq!(area.sum(), 3.0e-6, max_relative = 1e-12);
        assert!(area.iter().all(|&a| (a - 1.0e-6).abs() < 1e-18));
    }

    #[test]
    fn test_centers_increase_by_width() {
        let r = replicator();
        let width = r.cell_width(&template()).unwrap();
        let out = r.replicate(&template()).unwrap();
        let xc = out.f64_array("xc").unwrap();

        assert_eq!(xc[[0, 0]], 289.2);
        for i in 1..3 {
            assert!(xc[[0, i]] > xc[[0, i - 1]]);
            assert_relative_eq!(xc[[0, i]] - xc[[0, i - 1]], width, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_vertices_bracket_centers_and_tile() {
        let r = replicator();
        let width = r.cell_width(&template()).unwrap();
        let out = r.replicate(&template()).unwrap();
        let xc = out.f64_array("xc").unwrap();
        let xv = out.f64_array("xv").unwrap();

        for i in 0..3 {
            let c = xc[[0, i]];
            let cell = xv.slice(s![0, i, ..]).to_vec();
            assert_relative_eq!(cell[0], c + width / 2.0, epsilon = 1e-12);
            assert_relative_eq!(cell[2], c + width / 2.0, epsilon = 1e-12);
            assert_relative_eq!(cell[1], c - width / 2.0, epsilon = 1e-12);
            assert_relative_eq!(cell[3], c - width / 2.0, epsilon = 1e-12);
        }
        for i in 0..2 {
            assert_relative_eq!(xv[[0, i, 0]], xv[[0, i + 1, 1]], epsilon = 1e-9);
        }
    }

    #[test]
    fn test_other_variables_are_repeated() {
        let out = replicator().replicate(&template()).unwrap();
        assert_eq!(out.dimension_len("ni").unwrap(), 3);
        let yv = out.f64_array("yv").unwrap();
        for i in 0..3 {
            assert_eq!(yv.slice(s![0, i, ..]).to_vec(), vec![42.69, 42.69, 42.79, 42.79]);
        }
        assert_eq!(out.variable("mask").unwrap().data.shape(), &[1, 3]);
        assert!(out.f64_array("yc").unwrap().iter().all(|&y| y == 42.74));
    }

    #[test]
    fn test_missing_variable_is_schema_error() {
        let mut ds = template();
        ds.variables.shift_remove("area");
        assert!(matches!(
            replicator().replicate(&ds),
            Err(TideCellError::Schema(_))
        ));
    }

    #[test]
    fn test_missing_dimension_is_schema_error() {
        let params = DomainParameters {
            cells: 3,
            cell_dim: "lsmlon".to_string(),
        };
        let r = DomainReplicator::from_parameters(params).unwrap();
        assert!(matches!(r.replicate(&template()), Err(TideCellError::Schema(_))));
    }

    #[test]
    fn test_multi_cell_template_rejected() {
        let once = replicator().replicate(&template()).unwrap();
        assert!(replicator().replicate(&once).is_err());
    }

    #[test]
    fn test_zero_cells_rejected() {
        let params = DomainParameters {
            cells: 0,
            ..Default::default()
        };
        assert!(matches!(
            DomainReplicator::from_parameters(params),
            Err(TideCellError::Config(_))
        ));
    }
}
