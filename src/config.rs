//! Sizing configuration for `ChainedHashMap`.

use crate::error::{Error, Result};

/// Bin count a map starts with when none is requested.
pub const DEFAULT_BINS: usize = 1;

/// Maximum `len / bins` ratio before the bucket array doubles.
pub const DEFAULT_LOAD_THRESHOLD: f64 = 1.0;

/// Initial bin count and growth threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapConfig {
    /// Bucket count at construction; grows only by doubling.
    pub initial_bins: usize,
    /// Entries-per-bin ratio that, once exceeded, triggers a resize.
    pub load_threshold: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            initial_bins: DEFAULT_BINS,
            load_threshold: DEFAULT_LOAD_THRESHOLD,
        }
    }
}

impl MapConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial_bins(mut self, bins: usize) -> Self {
        self.initial_bins = bins;
        self
    }

    pub fn with_load_threshold(mut self, threshold: f64) -> Self {
        self.load_threshold = threshold;
        self
    }

    /// Reject zero bins and thresholds that are not positive and finite.
    pub fn validate(&self) -> Result<()> {
        if self.initial_bins == 0 {
            return Err(Error::InvalidConfig {
                key: "initial_bins",
                value: self.initial_bins.to_string(),
            });
        }
        validate_load_threshold(self.load_threshold)
    }
}

pub(crate) fn validate_load_threshold(threshold: f64) -> Result<()> {
    if threshold.is_finite() && threshold > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidConfig {
            key: "load_threshold",
            value: threshold.to_string(),
        })
    }
}
