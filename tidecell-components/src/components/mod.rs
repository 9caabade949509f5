mod assembler;
mod constant_field;
mod domain;
mod resample;
mod surface;
mod year_substitution;

pub use assembler::{AssemblerParameters, SiteAssembler, SALINITY_FLOOR};
pub use constant_field::{ConstantField, DEFAULT_NITRATE};
pub use domain::{DomainParameters, DomainReplicator};
pub use resample::{interpolate_gaps, ResampleParameters, Resampler};
pub use surface::{PftOverride, SurfaceParameters, SurfaceReplicator};
pub use year_substitution::{substitute_years, VariantPolicy, YearSubstitution, YearVariant};
