//! Standard variable definitions for the gridded tide setup.
//!
//! ## Forcing
//! - `VAR_TIDE_HEIGHT` - tide level relative to NAVD88, in m
//! - `VAR_TIDE_SALINITY` - salinity of the tidal water, in ppt
//! - `VAR_TIDE_NITRATE` - nitrate concentration of the tidal water, in mol/L
//!
//! ## Domain
//! - `VAR_XC`, `VAR_XV`, `VAR_AREA`
//!
//! ## Surface data
//! - `VAR_LONGXY`, `VAR_HT_ABOVE_STREAM`, `VAR_DIST_FROM_STREAM`, `VAR_PCT_NAT_PFT`

use crate::define_static_variable;
use crate::variable::StaticVariableDefinition;

// ============================================================================
// Forcing Variables
// ============================================================================

define_static_variable!(
    VAR_TIDE_HEIGHT,
    name = "tide_height",
    unit = "m",
    dims = ["time", "gridcell"],
    description = "tide level relative to NAVD88",
);

define_static_variable!(
    VAR_TIDE_SALINITY,
    name = "tide_salinity",
    unit = "ppt",
    dims = ["time", "gridcell"],
    description = "salinity of tidal water",
);

define_static_variable!(
    VAR_TIDE_NITRATE,
    name = "tide_nitrate",
    unit = "mol/L",
    dims = ["time", "gridcell"],
    description = "nitrate concentration of tidal water",
);

// ============================================================================
// Domain Variables
// ============================================================================

define_static_variable!(
    VAR_XC,
    name = "xc",
    unit = "degrees_east",
    dims = ["nj", "ni"],
    description = "longitude of grid cell center",
);

define_static_variable!(
    VAR_XV,
    name = "xv",
    unit = "degrees_east",
    dims = ["nj", "ni", "nv"],
    description = "longitude of grid cell verticies",
);

define_static_variable!(
    VAR_AREA,
    name = "area",
    unit = "radian^2",
    dims = ["nj", "ni"],
    description = "area of grid cell in radians squared",
);

// ============================================================================
// Surface Data Variables
// ============================================================================

define_static_variable!(
    VAR_LONGXY,
    name = "LONGXY",
    unit = "degrees east",
    dims = ["lsmlat", "lsmlon"],
    description = "longitude",
);

define_static_variable!(
    VAR_HT_ABOVE_STREAM,
    name = "ht_above_stream",
    unit = "m",
    dims = ["lsmlat", "lsmlon"],
    description = "marsh surface elevation above the tide datum (NAVD88)",
);

define_static_variable!(
    VAR_DIST_FROM_STREAM,
    name = "dist_from_stream",
    unit = "m",
    dims = ["lsmlat", "lsmlon"],
    description = "lateral distance from the marsh edge to the site",
);

define_static_variable!(
    VAR_PCT_NAT_PFT,
    name = "PCT_NAT_PFT",
    unit = "unitless",
    dims = ["natpft", "lsmlat", "lsmlon"],
    description = "percent plant functional type on the natural veg landunit",
);

/// All definitions known to the pipeline
pub static STANDARD_VARIABLES: [&StaticVariableDefinition; 10] = [
    &VAR_TIDE_HEIGHT,
    &VAR_TIDE_SALINITY,
    &VAR_TIDE_NITRATE,
    &VAR_XC,
    &VAR_XV,
    &VAR_AREA,
    &VAR_LONGXY,
    &VAR_HT_ABOVE_STREAM,
    &VAR_DIST_FROM_STREAM,
    &VAR_PCT_NAT_PFT,
];

/// Look up a standard definition by variable name
pub fn lookup(name: &str) -> Option<&'static StaticVariableDefinition> {
    STANDARD_VARIABLES.iter().copied().find(|v| v.name == name)
}
