//! Constant forcing fields
//!
//! ELM-PFLOTRAN requires a nitrate concentration in the tidal forcing. There are no
//! observations for it, so the field is filled with a single representative value.

use serde::{Deserialize, Serialize};
use tidecell_core::component::ForcingTransform;
use tidecell_core::dataset::{ForcingDataset, GridVariable};
use tidecell_core::errors::{TideCellError, TideCellResult};
use tidecell_core::standard_variables::VAR_TIDE_NITRATE;
use tidecell_core::timeseries::FloatValue;

/// Nitrate concentration used when no observations exist
/// unit: mol/L
pub const DEFAULT_NITRATE: FloatValue = 0.3e-3;

/// Appends a `(time, gridcell)` variable holding one value everywhere
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstantField {
    pub name: String,
    pub unit: String,
    pub value: FloatValue,
}

impl ConstantField {
    pub fn new(name: impl Into<String>, unit: impl Into<String>, value: FloatValue) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
            value,
        }
    }

    /// `tide_nitrate` at the given concentration in mol/L
    pub fn nitrate(value: FloatValue) -> Self {
        Self::new(VAR_TIDE_NITRATE.name, VAR_TIDE_NITRATE.unit, value)
    }
}

impl Default for ConstantField {
    fn default() -> Self {
        Self::nitrate(DEFAULT_NITRATE)
    }
}

impl ForcingTransform for ConstantField {
    fn name(&self) -> &str {
        "add constant field"
    }

    fn apply(&self, input: &ForcingDataset) -> TideCellResult<ForcingDataset> {
        if input.has(&self.name) {
            return Err(TideCellError::schema(format!(
                "forcing already contains `{}`",
                self.name
            )));
        }
        let mut output = input.clone();
        output.insert(
            &self.name,
            GridVariable::filled(self.unit.clone(), input.shape(), self.value),
        )?;
        log::info!("Added {} = {} {}", self.name, self.value, self.unit);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use tidecell_core::timeseries::TimeAxis;

    fn base() -> ForcingDataset {
        let start = NaiveDate::from_ymd_opt(2022, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let mut ds = ForcingDataset::new(TimeAxis::regular(start, Duration::hours(1), 24), vec![0, 1, 2]);
        ds.insert("tide_height", GridVariable::filled("m", (24, 3), 0.4))
            .unwrap();
        ds
    }

    #[test]
    fn test_nitrate_fills_every_entry() {
        let output = ConstantField::default().apply(&base()).unwrap();
        let nitrate = output.get("tide_nitrate").unwrap();
        assert_eq!(nitrate.unit, "mol/L");
        assert_eq!(nitrate.values.len(), 72);
        assert!(nitrate.values.iter().all(|&v| v == 0.3e-3));
    }

    #[test]
    fn test_existing_variables_untouched() {
        let input = base();
        let output = ConstantField::default().apply(&input).unwrap();
        assert_eq!(output.get("tide_height").unwrap(), input.get("tide_height").unwrap());
        assert!(!input.has("tide_nitrate"));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let once = ConstantField::default().apply(&base()).unwrap();
        assert!(matches!(
            ConstantField::default().apply(&once),
            Err(TideCellError::Schema(_))
        ));
    }
}
