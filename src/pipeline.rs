//! The end-to-end forcing pipeline
//!
//! ```text
//! site CSVs -> assemble -> resample -> + nitrate -> PIE_tide_forcing.nc
//!                                          |-> swap 2022/2023 -> PIE_tide_forcing_swapyears.nc
//!                                          |-> 2023 over 2022  -> PIE_tide_forcing_2323.nc
//! domain template  -> replicate -> PIE_domain_threecell.nc
//! surface template -> replicate (+ domain xc) -> PIE_surfdata_threecell.nc
//! ```
//!
//! The `build_*` functions are pure and work on in-memory data. [`run`] adds the file
//! reads and writes. Any failure aborts the run; files already written stay on disk.

use crate::config::PipelineConfig;
use std::error::Error;
use std::path::{Path, PathBuf};
use tidecell_components::components::{
    ConstantField, DomainReplicator, Resampler, SiteAssembler, SurfaceReplicator,
};
use tidecell_core::component::{apply_all, ForcingTransform};
use tidecell_core::dataset::{Dataset, ForcingDataset};
use tidecell_core::errors::{TideCellError, TideCellResult};
use tidecell_core::timeseries::SiteSeries;
use tidecell_io::{load_site_series, read_dataset, write_dataset};

/// Load every configured site table, in grid cell order
pub fn load_sites(config: &PipelineConfig) -> TideCellResult<Vec<SiteSeries>> {
    config
        .sites
        .iter()
        .map(|site| {
            let path = config.input_path(&site.file);
            load_site_series(&path, &site.name)
                .map_err(|e| e.in_stage(format!("loading {}", site.name)))
        })
        .collect()
}

/// Assemble, resample and complete the base forcing
pub fn build_forcing(
    config: &PipelineConfig,
    sites: &[SiteSeries],
) -> TideCellResult<ForcingDataset> {
    let assembler = SiteAssembler::new(config.grid()?, config.assembler.clone());
    let assembled = assembler
        .assemble(sites)
        .map_err(|e| e.in_stage("assembling sites"))?;

    let resampler = Resampler::from_parameters(&config.resample)?;
    let nitrate = ConstantField::nitrate(config.nitrate);
    let transforms: [&dyn ForcingTransform; 2] = [&resampler, &nitrate];
    let mut forcing = apply_all(&assembled, &transforms)?;
    forcing.set_attr("Description", config.description.as_str());

    log::info!(
        "Base forcing has {} hourly steps for {} cells",
        forcing.n_times(),
        forcing.n_cells()
    );
    Ok(forcing)
}

/// Every configured variant, each derived from `base` independently
pub fn build_variants(
    config: &PipelineConfig,
    base: &ForcingDataset,
) -> TideCellResult<Vec<(PathBuf, ForcingDataset)>> {
    config
        .variants
        .iter()
        .map(|output| {
            let variant = output
                .variant
                .apply(base)
                .map_err(|e| e.in_stage(format!("building variant {}", output.variant.name)))?;
            Ok((output.file.clone(), variant))
        })
        .collect()
}

pub fn build_domain(config: &PipelineConfig, template: &Dataset) -> TideCellResult<Dataset> {
    DomainReplicator::from_parameters(config.domain.clone())?
        .replicate(template)
        .map_err(|e| e.in_stage("replicating domain"))
}

pub fn build_surface(
    config: &PipelineConfig,
    template: &Dataset,
    domain: &Dataset,
) -> TideCellResult<Dataset> {
    SurfaceReplicator::from_parameters(config.surface.clone())?
        .replicate(template, domain)
        .map_err(|e| e.in_stage("replicating surface data"))
}

fn read_template(path: &Path) -> TideCellResult<Dataset> {
    read_dataset(path).map_err(|e| e.in_stage(format!("reading {}", path.display())))
}

fn write_output(path: &Path, dataset: &Dataset) -> TideCellResult<()> {
    write_dataset(path, dataset).map_err(|e| e.in_stage(format!("writing {}", path.display())))
}

fn write_forcing(path: &Path, forcing: &ForcingDataset) -> TideCellResult<()> {
    let dataset = forcing
        .to_dataset()
        .map_err(|e| e.in_stage(format!("encoding {}", path.display())))?;
    write_output(path, &dataset)
}

/// Run every stage and return the paths written, in order
pub fn run(config: &PipelineConfig) -> TideCellResult<Vec<PathBuf>> {
    config.validate()?;
    let mut written = Vec::new();

    let sites = load_sites(config)?;
    let base = build_forcing(config, &sites)?;
    let base_path = config.output_path(&config.forcing_file);
    write_forcing(&base_path, &base)?;
    written.push(base_path);

    for (file, variant) in build_variants(config, &base)? {
        let path = config.output_path(&file);
        write_forcing(&path, &variant)?;
        written.push(path);
    }

    let domain_template = read_template(&config.input_path(&config.domain_template))?;
    let domain = build_domain(config, &domain_template)?;
    let domain_path = config.output_path(&config.domain_file);
    write_output(&domain_path, &domain)?;
    written.push(domain_path);

    let surface_template = read_template(&config.input_path(&config.surface_template))?;
    let surface = build_surface(config, &surface_template, &domain)?;
    let surface_path = config.output_path(&config.surface_file);
    write_output(&surface_path, &surface)?;
    written.push(surface_path);

    log::info!("Wrote {} files", written.len());
    Ok(written)
}

/// Messages of an error and all of its sources, outermost first
pub fn error_chain(error: &TideCellError) -> Vec<String> {
    let mut messages = vec![error.to_string()];
    let mut source = error.source();
    while let Some(inner) = source {
        messages.push(inner.to_string());
        source = inner.source();
    }
    messages
}
