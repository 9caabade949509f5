//! Variable definitions for the forcing, domain and surface files.
//!
//! Every variable written by the pipeline carries metadata:
//! - Name (the NetCDF variable name read by ELM)
//! - Unit (stored as the `units` attribute)
//! - Dimensions (the layout ELM expects)
//! - Description (stored as the `long_name` attribute)
//!
//! Definitions are declared at compile time with [`define_static_variable!`] and
//! collected in [`crate::standard_variables`].
//!
//! # Usage
//!
//! ```rust
//! use tidecell_core::standard_variables::VAR_TIDE_HEIGHT;
//!
//! assert_eq!(VAR_TIDE_HEIGHT.name, "tide_height");
//! assert_eq!(VAR_TIDE_HEIGHT.unit, "m");
//! assert_eq!(VAR_TIDE_HEIGHT.dims, &["time", "gridcell"]);
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::dataset::AttributeValue;

/// Definition of a variable with its metadata.
///
/// Owned counterpart of [`StaticVariableDefinition`], used where definitions are
/// serialised or built at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDefinition {
    /// NetCDF variable name (e.g., "tide_height")
    pub name: String,
    /// Canonical unit (e.g., "m", "mol/L")
    pub unit: String,
    /// Dimension names, slowest varying first
    pub dims: Vec<String>,
    /// Human-readable description
    pub description: String,
}

impl VariableDefinition {
    pub fn new(
        name: impl Into<String>,
        unit: impl Into<String>,
        dims: &[&str],
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
            dims: dims.iter().map(|d| d.to_string()).collect(),
            description: description.into(),
        }
    }

    /// Attributes written alongside the variable
    pub fn attributes(&self) -> IndexMap<String, AttributeValue> {
        let mut attrs = IndexMap::new();
        attrs.insert("units".to_string(), AttributeValue::Str(self.unit.clone()));
        if !self.description.is_empty() {
            attrs.insert(
                "long_name".to_string(),
                AttributeValue::Str(self.description.clone()),
            );
        }
        attrs
    }
}

/// Static variable definition usable in const contexts.
///
/// Holds `&'static str` references and converts to [`VariableDefinition`] on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticVariableDefinition {
    /// Variable name
    pub name: &'static str,
    /// Canonical unit
    pub unit: &'static str,
    /// Dimension names
    pub dims: &'static [&'static str],
    /// Description
    pub description: &'static str,
}

impl StaticVariableDefinition {
    pub const fn new(
        name: &'static str,
        unit: &'static str,
        dims: &'static [&'static str],
        description: &'static str,
    ) -> Self {
        Self {
            name,
            unit,
            dims,
            description,
        }
    }

    /// Convert to a [`VariableDefinition`].
    pub fn to_variable_definition(&self) -> VariableDefinition {
        VariableDefinition::new(self.name, self.unit, self.dims, self.description)
    }

    pub fn attributes(&self) -> IndexMap<String, AttributeValue> {
        self.to_variable_definition().attributes()
    }
}

/// Macro for defining variables at compile time using static strings.
///
/// # Usage
///
/// ```rust
/// use tidecell_core::define_static_variable;
///
/// define_static_variable!(
///     MY_VARIABLE,
///     name = "my_variable",
///     unit = "kg",
///     dims = ["time", "gridcell"],
///     description = "A test variable",
/// );
///
/// assert_eq!(MY_VARIABLE.dims.len(), 2);
/// ```
#[macro_export]
macro_rules! define_static_variable {
    (
        $var_name:ident,
        name = $name:expr,
        unit = $unit:expr,
        dims = [$($dim:expr),* $(,)?],
        description = $desc:expr $(,)?
    ) => {
        #[doc = concat!("Static variable definition for `", $name, "`")]
        pub static $var_name: $crate::variable::StaticVariableDefinition =
            $crate::variable::StaticVariableDefinition::new($name, $unit, &[$($dim),*], $desc);
    };
}

pub use crate::define_static_variable;
