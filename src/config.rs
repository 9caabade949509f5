//! Pipeline configuration
//!
//! The defaults reproduce the Plum Island three-cell setup exactly: file names, the
//! site order, physical constants and the experiment variants. The binary always runs
//! with the defaults; library callers and tests can override any of them, either in
//! code or from TOML.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tidecell_components::components::{
    AssemblerParameters, DomainParameters, ResampleParameters, SurfaceParameters, YearVariant,
    DEFAULT_NITRATE,
};
use tidecell_core::errors::{TideCellError, TideCellResult};
use tidecell_core::spatial::SiteGrid;
use tidecell_core::timeseries::FloatValue;

pub const DESCRIPTION: &str = "Tide data for Railroad, Middle Road, and Typha sites of Plum Island LTER. Data provided by Inke Forbrich";

/// One site table, in grid cell order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteInput {
    pub name: String,
    pub file: PathBuf,
}

impl SiteInput {
    fn new(name: &str, file: &str) -> Self {
        Self {
            name: name.to_string(),
            file: PathBuf::from(file),
        }
    }
}

/// An experiment variant and the file it is written to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantOutput {
    pub file: PathBuf,
    pub variant: YearVariant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory holding the site tables and the one-cell templates
    pub input_dir: PathBuf,
    /// Directory all outputs are written to
    pub output_dir: PathBuf,
    pub grid_name: String,
    pub sites: Vec<SiteInput>,
    pub assembler: AssemblerParameters,
    pub resample: ResampleParameters,
    /// unit: mol/L
    pub nitrate: FloatValue,
    pub description: String,
    pub forcing_file: PathBuf,
    pub variants: Vec<VariantOutput>,
    pub domain_template: PathBuf,
    pub domain_file: PathBuf,
    pub domain: DomainParameters,
    pub surface_template: PathBuf,
    pub surface_file: PathBuf,
    pub surface: SurfaceParameters,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            grid_name: "PlumIsland".to_string(),
            sites: vec![
                SiteInput::new("Railroad", "RR_tide_salinity_1423_gf_1002.csv"),
                SiteInput::new("Middle Road", "MR_tide_salinity_1423_gf_1002.csv"),
                SiteInput::new("Typha", "Typha_tide_salinity_1423_gf_1002.csv"),
            ],
            assembler: AssemblerParameters::default(),
            resample: ResampleParameters::default(),
            nitrate: DEFAULT_NITRATE,
            description: DESCRIPTION.to_string(),
            forcing_file: PathBuf::from("PIE_tide_forcing.nc"),
            variants: vec![
                VariantOutput {
                    file: PathBuf::from("PIE_tide_forcing_swapyears.nc"),
                    variant: YearVariant::swap_years(),
                },
                VariantOutput {
                    file: PathBuf::from("PIE_tide_forcing_2323.nc"),
                    variant: YearVariant::repeat_2023(),
                },
            ],
            domain_template: PathBuf::from("domain_PIE_onecol.nc"),
            domain_file: PathBuf::from("PIE_domain_threecell.nc"),
            domain: DomainParameters::default(),
            surface_template: PathBuf::from("surfdata_PIE_onecol.nc"),
            surface_file: PathBuf::from("PIE_surfdata_threecell.nc"),
            surface: SurfaceParameters::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(s: &str) -> TideCellResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| TideCellError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Cell counts and indices must agree across the forcing, domain and surface data
    pub fn validate(&self) -> TideCellResult<()> {
        let n = self.sites.len();
        if n == 0 {
            return Err(TideCellError::Config("no sites configured".to_string()));
        }
        if self.assembler.time_site >= n {
            return Err(TideCellError::Config(format!(
                "time_site {} out of range for {} sites",
                self.assembler.time_site, n
            )));
        }
        if self.domain.cells != n || self.surface.cells != n {
            return Err(TideCellError::Config(format!(
                "{} sites but domain has {} cells and surface data {}",
                n, self.domain.cells, self.surface.cells
            )));
        }
        if !self.nitrate.is_finite() || self.nitrate < 0.0 {
            return Err(TideCellError::Config(format!(
                "nitrate must be a non-negative number, got {}",
                self.nitrate
            )));
        }
        Ok(())
    }

    pub fn grid(&self) -> TideCellResult<SiteGrid> {
        SiteGrid::new(
            self.grid_name.clone(),
            self.sites.iter().map(|s| s.name.clone()).collect(),
        )
    }

    pub fn input_path(&self, file: &Path) -> PathBuf {
        self.input_dir.join(file)
    }

    pub fn output_path(&self, file: &Path) -> PathBuf {
        self.output_dir.join(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidecell_components::components::VariantPolicy;

    #[test]
    fn defaults_match_plum_island_setup() {
        let config = PipelineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.sites.len(), 3);
        assert_eq!(config.sites[1].name, "Middle Road");
        assert_eq!(config.assembler.time_site, 1);
        assert_eq!(config.nitrate, 0.3e-3);
        assert_eq!(config.resample.step_minutes, 60);
        assert_eq!(config.variants.len(), 2);
        assert_eq!(
            config.variants[1].variant.policy,
            VariantPolicy::Overwrite {
                target: 2022,
                source: 2023
            }
        );
        assert_eq!(config.surface.ht_above_stream, 0.252);
        assert_eq!(config.surface.dist_from_stream, 4.0);
        assert_eq!(
            config.output_path(&config.forcing_file),
            PathBuf::from("./PIE_tide_forcing.nc")
        );
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = PipelineConfig::from_toml_str(
            r#"
input_dir = "data"
nitrate = 0.5e-3

[resample]
step_minutes = 30
"#,
        )
        .unwrap();
        assert_eq!(config.input_dir, PathBuf::from("data"));
        assert_eq!(config.nitrate, 0.5e-3);
        assert_eq!(config.resample.step_minutes, 30);
        assert_eq!(config.forcing_file, PathBuf::from("PIE_tide_forcing.nc"));
        assert_eq!(config.description, DESCRIPTION);
    }

    #[test]
    fn toml_round_trip() {
        let text = toml::to_string(&PipelineConfig::default()).unwrap();
        let config = PipelineConfig::from_toml_str(&text).unwrap();
        assert_eq!(config.sites, PipelineConfig::default().sites);
        assert_eq!(config.variants[0].variant.name, "swapyears");
    }

    #[test]
    fn invalid_toml_is_config_error() {
        assert!(matches!(
            PipelineConfig::from_toml_str("nitrate = \"lots\""),
            Err(TideCellError::Config(_))
        ));
    }

    #[test]
    fn cell_count_must_agree() {
        let mut config = PipelineConfig::default();
        config.sites.pop();
        config.assembler.time_site = 0;
        assert!(matches!(config.validate(), Err(TideCellError::Config(_))));
    }
}
