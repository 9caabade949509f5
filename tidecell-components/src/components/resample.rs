//! Regularisation of the forcing time axis
//!
//! Two steps, as ELM needs one forcing value per model time step:
//!
//! 1. Bin-average onto windows of a fixed length. Bins are anchored at midnight of the
//!    first sample's day, so hourly bins start on the hour. Empty bins become gaps.
//! 2. Fill interior gaps by linear interpolation along time, independently for every
//!    grid cell. Gaps before the first or after the last valid value are left as NaN.

use chrono::{Duration, NaiveDateTime};
use ndarray::{Array2, ArrayViewMut1, Axis};
use serde::{Deserialize, Serialize};
use tidecell_core::component::ForcingTransform;
use tidecell_core::dataset::{ForcingDataset, GridVariable};
use tidecell_core::errors::{TideCellError, TideCellResult};
use tidecell_core::timeseries::{FloatValue, TimeAxis};

/// Parameters for the resampler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResampleParameters {
    /// Bin width
    /// unit: minutes
    pub step_minutes: i64,
}

impl Default for ResampleParameters {
    fn default() -> Self {
        Self { step_minutes: 60 }
    }
}

/// Bin-mean resampling followed by gap interpolation
#[derive(Debug, Clone)]
pub struct Resampler {
    step: Duration,
}

impl Resampler {
    pub fn from_parameters(parameters: &ResampleParameters) -> TideCellResult<Self> {
        if parameters.step_minutes <= 0 {
            return Err(TideCellError::Config(format!(
                "resample step must be positive, got {} minutes",
                parameters.step_minutes
            )));
        }
        Ok(Self {
            step: Duration::minutes(parameters.step_minutes),
        })
    }

    /// One hour bins, matching the ELM time step
    pub fn hourly() -> Self {
        Self {
            step: Duration::hours(1),
        }
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    fn bin_index(&self, origin: NaiveDateTime, t: NaiveDateTime) -> i64 {
        (t - origin)
            .num_seconds()
            .div_euclid(self.step.num_seconds())
    }

    /// Average every variable into regular bins
    ///
    /// NaN inputs are skipped. Bins without any valid value are NaN.
    pub fn bin_mean(&self, input: &ForcingDataset) -> TideCellResult<ForcingDataset> {
        let times = input.time().values();
        let Some(first) = input.time().first() else {
            return Ok(input.clone());
        };
        let origin = first.date().and_hms_opt(0, 0, 0).unwrap_or(first);

        let bins: Vec<i64> = times.iter().map(|t| self.bin_index(origin, *t)).collect();
        let lo = bins.iter().copied().min().unwrap_or(0);
        let hi = bins.iter().copied().max().unwrap_or(0);
        let n_bins = (hi - lo + 1) as usize;

        let start = origin + self.step * lo as i32;
        let mut output = ForcingDataset::new(
            TimeAxis::regular(start, self.step, n_bins),
            input.gridcells().to_vec(),
        );
        output.attrs = input.attrs.clone();

        let n_cells = input.n_cells();
        for (name, variable) in input.variables() {
            let mut sums = Array2::<FloatValue>::zeros((n_bins, n_cells));
            let mut counts = Array2::<u32>::zeros((n_bins, n_cells));
            for (row, &bin) in variable.values.axis_iter(Axis(0)).zip(&bins) {
                let b = (bin - lo) as usize;
                for (c, &v) in row.iter().enumerate() {
                    if !v.is_nan() {
                        sums[[b, c]] += v;
                        counts[[b, c]] += 1;
                    }
                }
            }
            let means = Array2::from_shape_fn((n_bins, n_cells), |(b, c)| {
                if counts[[b, c]] == 0 {
                    FloatValue::NAN
                } else {
                    sums[[b, c]] / counts[[b, c]] as FloatValue
                }
            });
            output.insert(name, GridVariable::new(variable.unit.clone(), means))?;
        }

        log::debug!(
            "Binned {} samples into {} bins of {} minutes",
            times.len(),
            n_bins,
            self.step.num_minutes()
        );
        Ok(output)
    }
}

/// Fill NaN runs between two valid values by linear interpolation
///
/// Assumes evenly spaced samples. Returns the number of values filled and the number
/// of values left missing at the ends.
pub fn interpolate_gaps(mut values: ArrayViewMut1<FloatValue>) -> (usize, usize) {
    let valid: Vec<usize> = values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .map(|(i, _)| i)
        .collect();

    let (Some(&first), Some(&last)) = (valid.first(), valid.last()) else {
        return (0, values.len());
    };

    let mut filled = 0;
    for pair in valid.windows(2) {
        let (p, q) = (pair[0], pair[1]);
        if q - p < 2 {
            continue;
        }
        let (vp, vq) = (values[p], values[q]);
        for i in p + 1..q {
            let frac = (i - p) as FloatValue / (q - p) as FloatValue;
            values[i] = vp + (vq - vp) * frac;
            filled += 1;
        }
    }
    let unfilled = first + (values.len() - 1 - last);
    (filled, unfilled)
}

impl ForcingTransform for Resampler {
    fn name(&self) -> &str {
        "resample"
    }

    fn apply(&self, input: &ForcingDataset) -> TideCellResult<ForcingDataset> {
        let mut output = self.bin_mean(input)?;
        let names: Vec<String> = output.names().map(|n| n.to_string()).collect();
        for name in names {
            let values = &mut output.get_mut(&name)?.values;
            let (mut filled, mut unfilled) = (0, 0);
            for column in values.axis_iter_mut(Axis(1)) {
                let (f, u) = interpolate_gaps(column);
                filled += f;
                unfilled += u;
            }
            if filled > 0 {
                log::info!("Interpolated {} missing values of {}", filled, name);
            }
            if unfilled > 0 {
                log::warn!(
                    "{} values of {} lie outside the observed range and stay missing",
                    unfilled,
                    name
                );
            }
        }
        Ok(output)
    }
}
