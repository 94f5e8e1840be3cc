//! Last-call memoization for interactive callers
//!
//! A chart that re-renders on every selection change calls the engine with
//! the same arguments over and over. `ResampleCache` keeps the previous
//! arguments and result and only recomputes when something differs.

use crate::resample::engine::Resampler;
use crate::resample::hints::{CategoryGroupHints, NumericBinHints};
use crate::resample::types::{MetricRecord, ResampleConfig, ResampleResult};

struct CacheEntry {
    records: Vec<MetricRecord>,
    config: ResampleConfig,
    numeric_hints: Option<NumericBinHints>,
    category_hints: Option<CategoryGroupHints>,
    result: ResampleResult,
}

impl CacheEntry {
    fn matches(
        &self,
        records: &[MetricRecord],
        config: &ResampleConfig,
        numeric_hints: Option<&NumericBinHints>,
        category_hints: Option<&CategoryGroupHints>,
    ) -> bool {
        self.config == *config
            && self.numeric_hints.as_ref() == numeric_hints
            && self.category_hints.as_ref() == category_hints
            && self.records.as_slice() == records
    }
}

/// Memoizing wrapper around a [`Resampler`]
pub struct ResampleCache {
    resampler: Resampler,
    last: Option<CacheEntry>,
    hits: u64,
    misses: u64,
}

impl Default for ResampleCache {
    fn default() -> Self {
        Self::new(Resampler::default())
    }
}

impl ResampleCache {
    pub fn new(resampler: Resampler) -> Self {
        Self {
            resampler,
            last: None,
            hits: 0,
            misses: 0,
        }
    }

    /// Return the cached result for identical arguments, computing otherwise
    pub fn get_or_compute(
        &mut self,
        records: &[MetricRecord],
        config: &ResampleConfig,
        numeric_hints: Option<&NumericBinHints>,
        category_hints: Option<&CategoryGroupHints>,
    ) -> &ResampleResult {
        let entry = match self.last.take() {
            Some(entry) if entry.matches(records, config, numeric_hints, category_hints) => {
                self.hits += 1;
                entry
            }
            _ => {
                self.misses += 1;
                tracing::trace!(records = records.len(), "resample cache miss");
                CacheEntry {
                    records: records.to_vec(),
                    config: config.clone(),
                    numeric_hints: numeric_hints.cloned(),
                    category_hints: category_hints.cloned(),
                    result: self
                        .resampler
                        .compute(records, config, numeric_hints, category_hints),
                }
            }
        };

        &self.last.insert(entry).result
    }

    /// Drop the cached result
    pub fn invalidate(&mut self) {
        self.last = None;
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
