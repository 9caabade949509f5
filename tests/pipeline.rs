//! End-to-end runs of the forcing pipeline on synthetic site tables

use chrono::{Duration, NaiveDate, NaiveDateTime};
use is_close::is_close;
use tidecell::config::PipelineConfig;
use tidecell::pipeline::{build_forcing, build_variants};
use tidecell::TideCellError;
use tidecell_core::timeseries::SiteSeries;
use tidecell_io::read_site_series;

const SITES: [(&str, f64); 3] = [("Railroad", 0.0), ("Middle Road", 1.0), ("Typha", 2.0)];

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2022, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Hourly table whose tide height encodes the site offset and the hour index
fn table(offset: f64, hours: usize) -> String {
    table_from(start(), offset, hours)
}

fn table_from(first: NaiveDateTime, offset: f64, hours: usize) -> String {
    let mut text = String::from("timestamp,tide_NAVD88,Salinity_ppt\n");
    for h in 0..hours {
        let t = first + Duration::hours(h as i64);
        text.push_str(&format!(
            "{},{},{}\n",
            t.format("%Y-%m-%d %H:%M:%S"),
            offset + h as f64 * 1e-3,
            20.0 - offset * 10.0
        ));
    }
    text
}

fn sites(hours: usize) -> Vec<SiteSeries> {
    SITES
        .iter()
        .map(|(name, offset)| {
            read_site_series(table(*offset, hours).as_bytes(), format!("{name}.csv"), name)
                .unwrap()
        })
        .collect()
}

#[test]
fn one_day_of_hourly_data() {
    let config = PipelineConfig::default();
    let forcing = build_forcing(&config, &sites(24)).unwrap();

    assert_eq!(forcing.shape(), (24, 3));
    assert_eq!(forcing.time().first(), Some(start()));
    assert!(forcing.time().is_regular(Duration::hours(1)));

    // resampling hourly data is a no-op
    let height = forcing.values("tide_height").unwrap();
    for (c, (_, offset)) in SITES.iter().enumerate() {
        for t in 0..24 {
            assert!(is_close!(height[[t, c]], offset + t as f64 * 1e-3));
        }
    }

    let nitrate = forcing.values("tide_nitrate").unwrap();
    assert_eq!(nitrate.len(), 72);
    assert!(nitrate.iter().all(|&v| v == 0.3e-3));

    // Typha is 0 ppt in the table and is floored
    let salinity = forcing.values("tide_salinity").unwrap();
    assert!(salinity.column(2).iter().all(|&v| v == 1e-5));
    assert!(salinity.iter().all(|&v| v >= 1e-5));

    assert_eq!(
        forcing.names().collect::<Vec<_>>(),
        vec!["tide_height", "tide_salinity", "tide_nitrate"]
    );
    assert!(forcing.attrs.contains_key("Description"));
}

#[test]
fn variants_over_two_years() {
    let config = PipelineConfig::default();
    let hours = 2 * 365 * 24;
    let base = build_forcing(&config, &sites(hours)).unwrap();
    assert_eq!(base.n_times(), hours);

    let variants = build_variants(&config, &base).unwrap();
    assert_eq!(variants.len(), 2);
    let (swap_file, swapped) = &variants[0];
    let (repeat_file, repeated) = &variants[1];
    assert_eq!(swap_file.to_str(), Some("PIE_tide_forcing_swapyears.nc"));
    assert_eq!(repeat_file.to_str(), Some("PIE_tide_forcing_2323.nc"));

    for field in ["tide_height", "tide_salinity"] {
        let y2022 = base.year_rows(field, 2022).unwrap();
        let y2023 = base.year_rows(field, 2023).unwrap();
        assert_eq!(swapped.year_rows(field, 2023).unwrap(), y2022);
        assert_eq!(swapped.year_rows(field, 2022).unwrap(), y2023);
        assert_eq!(repeated.year_rows(field, 2022).unwrap(), y2023);
        assert_eq!(repeated.year_rows(field, 2023).unwrap(), y2023);
    }
    assert_eq!(
        swapped.values("tide_nitrate").unwrap(),
        base.values("tide_nitrate").unwrap()
    );
}

#[test]
fn sub_hourly_gaps_are_filled() {
    let mut text = String::from("timestamp,tide_NAVD88,Salinity_ppt\n");
    // 15 minute samples with hour 2 missing entirely
    for q in 0..16 {
        if q / 4 == 2 {
            continue;
        }
        let t = start() + Duration::minutes(15 * q);
        text.push_str(&format!("{},{},30\n", t.format("%Y-%m-%d %H:%M:%S"), q / 4));
    }
    let sites: Vec<SiteSeries> = SITES
        .iter()
        .map(|(name, _)| read_site_series(text.as_bytes(), "q.csv", name).unwrap())
        .collect();

    let forcing = build_forcing(&PipelineConfig::default(), &sites).unwrap();
    assert_eq!(forcing.n_times(), 4);
    assert_eq!(
        forcing.column("tide_height", 0).unwrap().to_vec(),
        vec![0.0, 1.0, 2.0, 3.0]
    );
}

#[test]
fn misaligned_sites_are_rejected() {
    let mut series = sites(24);
    series[2].records.pop();
    let err = build_forcing(&PipelineConfig::default(), &series).unwrap_err();
    assert!(matches!(
        err,
        TideCellError::Stage { ref source, .. } if matches!(**source, TideCellError::Alignment(_))
    ));
}

#[cfg(feature = "netcdf")]
mod files {
    use super::*;
    use ndarray::{array, Array3};
    use std::fs;
    use std::path::Path;
    use tidecell::pipeline::run;
    use tidecell_core::dataset::{AttributeValue, Dataset, Variable};
    use tidecell_io::{read_dataset, write_dataset};

    /// Two days straddling new year, so both variant years have 24 rows
    fn write_inputs(dir: &Path, config: &PipelineConfig) {
        let first = NaiveDate::from_ymd_opt(2022, 12, 31)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        for (site, (_, offset)) in config.sites.iter().zip(SITES) {
            fs::write(dir.join(&site.file), table_from(first, offset, 48)).unwrap();
        }

        let mut domain = Dataset::new();
        domain.add_dimension("nj", 1).unwrap();
        domain.add_dimension("ni", 1).unwrap();
        domain.add_dimension("nv", 4).unwrap();
        domain
            .insert_variable("xc", Variable::from_f64(&["nj", "ni"], array![[289.2]].into_dyn()))
            .unwrap();
        domain
            .insert_variable(
                "xv",
                Variable::from_f64(
                    &["nj", "ni", "nv"],
                    array![[[289.25, 289.15, 289.15, 289.25]]].into_dyn(),
                ),
            )
            .unwrap();
        domain
            .insert_variable("area", Variable::from_f64(&["nj", "ni"], array![[3.0e-6]].into_dyn()))
            .unwrap();
        write_dataset(dir.join(&config.domain_template), &domain).unwrap();

        let mut surface = Dataset::new();
        surface.add_dimension("lsmlat", 1).unwrap();
        surface.add_dimension("lsmlon", 1).unwrap();
        surface.add_dimension("natpft", 17).unwrap();
        surface
            .insert_variable(
                "LONGXY",
                Variable::from_f64(&["lsmlat", "lsmlon"], array![[0.0]].into_dyn()),
            )
            .unwrap();
        let mut pct = Array3::<f64>::zeros((17, 1, 1));
        pct[[14, 0, 0]] = 100.0;
        surface
            .insert_variable(
                "PCT_NAT_PFT",
                Variable::from_f64(&["natpft", "lsmlat", "lsmlon"], pct.into_dyn()),
            )
            .unwrap();
        write_dataset(dir.join(&config.surface_template), &surface).unwrap();
    }

    #[test]
    fn full_run_writes_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            input_dir: dir.path().to_path_buf(),
            output_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        write_inputs(dir.path(), &config);

        let written = run(&config).unwrap();
        let names: Vec<String> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "PIE_tide_forcing.nc",
                "PIE_tide_forcing_swapyears.nc",
                "PIE_tide_forcing_2323.nc",
                "PIE_domain_threecell.nc",
                "PIE_surfdata_threecell.nc",
            ]
        );

        let forcing = read_dataset(&written[0]).unwrap();
        assert_eq!(forcing.dimension_len("time").unwrap(), 48);
        assert_eq!(forcing.dimension_len("gridcell").unwrap(), 3);
        assert_eq!(
            forcing.variable("tide_salinity").unwrap().attrs["units"],
            AttributeValue::Str("ppt".to_string())
        );
        assert_eq!(
            forcing.attrs["Description"],
            AttributeValue::Str(tidecell::config::DESCRIPTION.to_string())
        );

        let domain = read_dataset(&written[3]).unwrap();
        assert_eq!(domain.f64_array("xc").unwrap().shape(), &[1, 3]);

        let surface = read_dataset(&written[4]).unwrap();
        assert_eq!(
            surface.f64_array("LONGXY").unwrap(),
            domain.f64_array("xc").unwrap()
        );
        let pct = surface.f64_array("PCT_NAT_PFT").unwrap();
        assert_eq!(pct[[13, 0, 2]], 100.0);
        assert_eq!(pct[[14, 0, 2]], 0.0);
        assert_eq!(pct[[14, 0, 0]], 100.0);
    }

    #[test]
    fn earlier_outputs_survive_a_later_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            input_dir: dir.path().to_path_buf(),
            output_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        write_inputs(dir.path(), &config);
        fs::remove_file(dir.path().join(&config.surface_template)).unwrap();

        let err = run(&config).unwrap_err();
        assert!(err.to_string().contains("surfdata_PIE_onecol.nc"));
        assert!(dir.path().join("PIE_domain_threecell.nc").exists());
        assert!(dir.path().join("PIE_tide_forcing_2323.nc").exists());
    }
}
