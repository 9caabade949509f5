//! Site observations and the shared time axis
//!
//! A [`SiteSeries`] is the raw record stream for one monitoring site as read from disk.
//! A [`TimeAxis`] is the time coordinate shared by every variable of a
//! [`ForcingDataset`](crate::dataset::ForcingDataset).

use chrono::{Datelike, Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub type FloatValue = f64;
pub type Time = NaiveDateTime;

/// One observation at a monitoring site
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SiteRecord {
    pub timestamp: Time,
    /// Tide height relative to NAVD88
    /// unit: m
    pub tide_height: FloatValue,
    /// unit: ppt
    pub salinity: FloatValue,
}

/// Time-ordered observations for a single site.
///
/// Ordering is assumed, not verified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteSeries {
    pub site: String,
    pub records: Vec<SiteRecord>,
}

impl SiteSeries {
    pub fn new(site: impl Into<String>, records: Vec<SiteRecord>) -> Self {
        Self {
            site: site.into(),
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn timestamps(&self) -> Vec<Time> {
        self.records.iter().map(|r| r.timestamp).collect()
    }

    pub fn tide_heights(&self) -> impl Iterator<Item = FloatValue> + '_ {
        self.records.iter().map(|r| r.tide_height)
    }

    pub fn salinities(&self) -> impl Iterator<Item = FloatValue> + '_ {
        self.records.iter().map(|r| r.salinity)
    }
}

/// Time coordinate of a forcing dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeAxis {
    values: Vec<Time>,
}

impl TimeAxis {
    pub fn from_values(values: Vec<Time>) -> Self {
        Self { values }
    }

    /// Regular axis of `len` points starting at `start`
    pub fn regular(start: Time, step: Duration, len: usize) -> Self {
        let values = (0..len)
            .map(|i| start + step * i as i32)
            .collect::<Vec<_>>();
        Self { values }
    }

    pub fn values(&self) -> &[Time] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn first(&self) -> Option<Time> {
        self.values.first().copied()
    }

    pub fn last(&self) -> Option<Time> {
        self.values.last().copied()
    }

    /// Row indices whose timestamp falls in the calendar year `year`
    ///
    /// Works on unordered axes too, so the result is not assumed to be contiguous.
    pub fn year_positions(&self, year: i32) -> Vec<usize> {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, t)| t.year() == year)
            .map(|(i, _)| i)
            .collect()
    }

    /// Whether consecutive values are exactly `step` apart
    pub fn is_regular(&self, step: Duration) -> bool {
        self.values.windows(2).all(|w| w[1] - w[0] == step)
    }

    /// Hours elapsed since the first value, for CF-style encoding
    pub fn hours_since_start(&self) -> Vec<FloatValue> {
        match self.first() {
            Some(start) => self
                .values
                .iter()
                .map(|t| (*t - start).num_seconds() as FloatValue / 3600.0)
                .collect(),
            None => Vec::new(),
        }
    }
}
