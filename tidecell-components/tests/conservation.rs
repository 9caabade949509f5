//! Conservation checks for the template replicators.
//!
//! Splitting one grid cell into several must not change:
//! - the total area covered by the domain
//! - the longitude extent spanned by the cell vertices
//! - the total vegetation cover of any cell

use approx::assert_relative_eq;
use ndarray::{array, s, Array3};
use tidecell_components::components::{
    DomainParameters, DomainReplicator, SurfaceParameters, SurfaceReplicator,
};
use tidecell_core::dataset::{Dataset, Variable};

fn domain_template(nj: usize) -> Dataset {
    let mut ds = Dataset::new();
    ds.add_dimension("nj", nj).unwrap();
    ds.add_dimension("ni", 1).unwrap();
    ds.add_dimension("nv", 4).unwrap();
    let xc = ndarray::Array2::from_shape_fn((nj, 1), |(j, _)| 289.2 + j as f64 * 0.01);
    let xv = ndarray::Array3::from_shape_fn((nj, 1, 4), |(j, _, k)| {
        289.2 + j as f64 * 0.01 + if k % 2 == 0 { 0.05 } else { -0.05 }
    });
    let area = ndarray::Array2::from_elem((nj, 1), 2.4e-6);
    ds.insert_variable("xc", Variable::from_f64(&["nj", "ni"], xc.into_dyn()))
        .unwrap();
    ds.insert_variable("xv", Variable::from_f64(&["nj", "ni", "nv"], xv.into_dyn()))
        .unwrap();
    ds.insert_variable("area", Variable::from_f64(&["nj", "ni"], area.into_dyn()))
        .unwrap();
    ds
}

fn surface_template() -> Dataset {
    let mut ds = Dataset::new();
    ds.add_dimension("lsmlat", 1).unwrap();
    ds.add_dimension("lsmlon", 1).unwrap();
    ds.add_dimension("natpft", 17).unwrap();
    ds.insert_variable(
        "LONGXY",
        Variable::from_f64(&["lsmlat", "lsmlon"], array![[289.2]].into_dyn()),
    )
    .unwrap();
    let mut pct = Array3::<f64>::zeros((17, 1, 1));
    pct[[0, 0, 0]] = 10.0;
    pct[[14, 0, 0]] = 90.0;
    ds.insert_variable(
        "PCT_NAT_PFT",
        Variable::from_f64(&["natpft", "lsmlat", "lsmlon"], pct.into_dyn()),
    )
    .unwrap();
    ds
}

mod domain_conservation {
    use super::*;

    #[test]
    fn test_area_sum_for_any_cell_count() {
        for cells in 1..=5 {
            let replicator = DomainReplicator::from_parameters(DomainParameters {
                cells,
                ..Default::default()
            })
            .unwrap();
            let out = replicator.replicate(&domain_template(1)).unwrap();
            assert_relative_eq!(out.f64_array("area").unwrap().sum(), 2.4e-6, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_vertex_extent_is_preserved() {
        let template = domain_template(1);
        let out = DomainReplicator::from_parameters(DomainParameters::default())
            .unwrap()
            .replicate(&template)
            .unwrap();
        let xv = out.f64_array("xv").unwrap();
        let min = xv.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = xv.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let centre = out.f64_array("xc").unwrap()[[0, 0]];

        // first cell keeps the template center, cells extend eastward from it
        assert_relative_eq!(min, centre - 0.05 / 3.0, epsilon = 1e-9);
        assert_relative_eq!(max - min, 0.1, epsilon = 1e-9);
    }

    #[test]
    fn test_each_row_shifts_from_its_own_center() {
        let out = DomainReplicator::from_parameters(DomainParameters::default())
            .unwrap()
            .replicate(&domain_template(2))
            .unwrap();
        let xc = out.f64_array("xc").unwrap();
        assert_relative_eq!(xc[[0, 0]], 289.2, epsilon = 1e-12);
        assert_relative_eq!(xc[[1, 0]], 289.21, epsilon = 1e-12);
        for j in 0..2 {
            let row = xc.slice(s![j, ..]);
            assert!(row.windows(2).into_iter().all(|w| w[1] > w[0]));
        }
    }
}

mod surface_conservation {
    use super::*;

    #[test]
    fn test_vegetation_cover_sums_to_100() {
        let domain = DomainReplicator::from_parameters(DomainParameters::default())
            .unwrap()
            .replicate(&domain_template(1))
            .unwrap();
        let out = SurfaceReplicator::from_parameters(SurfaceParameters::default())
            .unwrap()
            .replicate(&surface_template(), &domain)
            .unwrap();
        let pct = out.f64_array("PCT_NAT_PFT").unwrap();

        // the override keeps the other PFTs, so only cells 0 and 1 are checked exactly
        for cell in 0..2 {
            assert_relative_eq!(pct.slice(s![.., 0, cell]).sum(), 100.0);
        }
        assert_eq!(pct[[13, 0, 2]], 100.0);
        assert_eq!(pct[[14, 0, 2]], 0.0);
        assert_eq!(pct[[0, 0, 2]], 10.0);
    }
}
