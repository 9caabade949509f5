use crate::dataset::ForcingDataset;
use crate::errors::TideCellResult;
use std::fmt::Debug;

/// A step that derives a new forcing dataset from an existing one
///
/// Implementations take the input by reference and return an owned result, so the
/// input is never modified. This is what keeps the base forcing and its experiment
/// variants independent of each other.
pub trait ForcingTransform: Debug {
    /// Short name used in log messages and error context
    fn name(&self) -> &str;

    fn apply(&self, input: &ForcingDataset) -> TideCellResult<ForcingDataset>;
}

/// Apply transforms in order, feeding each output into the next
pub fn apply_all(
    input: &ForcingDataset,
    transforms: &[&dyn ForcingTransform],
) -> TideCellResult<ForcingDataset> {
    let mut current = input.clone();
    for transform in transforms {
        log::debug!("Applying {}", transform.name());
        current = transform
            .apply(&current)
            .map_err(|e| e.in_stage(transform.name()))?;
    }
    Ok(current)
}
