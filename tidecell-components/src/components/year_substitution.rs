//! Experiment variants built by exchanging calendar years of forcing
//!
//! 2022 and 2023 had the most different tidal regimes at Plum Island, so the
//! experiments re-run the model with those years exchanged (or with 2023 repeated) to
//! separate the effect of the inundation pattern from the rest of the meteorology.
//!
//! Rows are matched by position within the year, not by timestamp. The target and
//! source years must therefore contain the same number of samples; a leap year paired
//! with a common year is rejected with [`TideCellError::ShapeMismatch`].

use serde::{Deserialize, Serialize};
use tidecell_core::component::ForcingTransform;
use tidecell_core::dataset::{AttributeValue, ForcingDataset};
use tidecell_core::errors::{TideCellError, TideCellResult};
use tidecell_core::standard_variables::{VAR_TIDE_HEIGHT, VAR_TIDE_SALINITY};

/// Replace the rows of `target` with the rows of `source`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearSubstitution {
    pub target: i32,
    pub source: i32,
}

impl YearSubstitution {
    pub fn new(target: i32, source: i32) -> Self {
        Self { target, source }
    }
}

/// Build a new dataset from `base` with the given substitutions applied to `fields`
///
/// Source rows are always read from `base`, never from the partially substituted
/// copy, so substitutions do not compound. `base` itself is left untouched.
pub fn substitute_years(
    base: &ForcingDataset,
    substitutions: &[YearSubstitution],
    fields: &[&str],
) -> TideCellResult<ForcingDataset> {
    let mut output = base.clone();
    let time = base.time();

    for sub in substitutions {
        let targets = time.year_positions(sub.target);
        let sources = time.year_positions(sub.source);
        if targets.is_empty() && sources.is_empty() {
            log::warn!(
                "Neither {} nor {} is present in the forcing, nothing to substitute",
                sub.target,
                sub.source
            );
            continue;
        }

        for &field in fields {
            if targets.len() != sources.len() {
                return Err(TideCellError::ShapeMismatch {
                    field: field.to_string(),
                    target: sub.target,
                    source_year: sub.source,
                    target_len: targets.len(),
                    source_len: sources.len(),
                });
            }
            let source_values = base.values(field)?;
            let target_values = &mut output.get_mut(field)?.values;
            for (&t, &s) in targets.iter().zip(&sources) {
                target_values.row_mut(t).assign(&source_values.row(s));
            }
        }
        log::debug!(
            "Replaced {} rows of {} with {} for {}",
            targets.len(),
            sub.target,
            sub.source,
            fields.join(", ")
        );
    }
    Ok(output)
}

/// How the years of a variant are exchanged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum VariantPolicy {
    /// Each year receives the other's data
    Swap { first: i32, second: i32 },
    /// `target` receives `source`'s data, `source` is unchanged
    Overwrite { target: i32, source: i32 },
}

impl VariantPolicy {
    pub fn substitutions(&self) -> Vec<YearSubstitution> {
        match *self {
            VariantPolicy::Swap { first, second } => vec![
                YearSubstitution::new(second, first),
                YearSubstitution::new(first, second),
            ],
            VariantPolicy::Overwrite { target, source } => {
                vec![YearSubstitution::new(target, source)]
            }
        }
    }

    /// Text recorded in the `history` attribute of a variant
    pub fn describe(&self) -> String {
        match *self {
            VariantPolicy::Swap { first, second } => {
                format!("years {first} and {second} swapped")
            }
            VariantPolicy::Overwrite { target, source } => {
                format!("year {target} overwritten with year {source}")
            }
        }
    }
}

/// A named forcing variant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearVariant {
    pub name: String,
    pub policy: VariantPolicy,
    pub fields: Vec<String>,
}

impl YearVariant {
    pub fn new(name: impl Into<String>, policy: VariantPolicy) -> Self {
        Self {
            name: name.into(),
            policy,
            fields: vec![
                VAR_TIDE_HEIGHT.name.to_string(),
                VAR_TIDE_SALINITY.name.to_string(),
            ],
        }
    }

    /// 2022 and 2023 exchanged
    pub fn swap_years() -> Self {
        Self::new(
            "swapyears",
            VariantPolicy::Swap {
                first: 2022,
                second: 2023,
            },
        )
    }

    /// 2023 forcing repeated in place of 2022
    pub fn repeat_2023() -> Self {
        Self::new(
            "2323",
            VariantPolicy::Overwrite {
                target: 2022,
                source: 2023,
            },
        )
    }
}

impl ForcingTransform for YearVariant {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, input: &ForcingDataset) -> TideCellResult<ForcingDataset> {
        let fields: Vec<&str> = self.fields.iter().map(|f| f.as_str()).collect();
        let mut output = substitute_years(input, &self.policy.substitutions(), &fields)?;
        output.attrs.insert(
            "history".to_string(),
            AttributeValue::Str(format!("{} ({})", self.policy.describe(), fields.join(", "))),
        );
        log::info!("Built forcing variant {}: {}", self.name, self.policy.describe());
        Ok(output)
    }
}
