//! Resample Engine
//!
//! Re-aggregates batch records into chart buckets along one dimension:
//! 1. Resolve the dimension and metric (falling back instead of failing)
//! 2. Derive a bucket key per record
//! 3. Aggregate members per key
//! 4. Order the buckets
//! 5. Apply the brush range and collect the allowed ids
//!
//! # Pipeline
//!
//! ```text
//! Records + Config → Resolve → Key → Aggregate → Order → Brush → Result
//! ```
//!
//! Every call is pure: identical inputs give bucket-for-bucket identical
//! output.

use crate::resample::bucketing::{BinLayout, BucketKey, Dimension};
use crate::resample::granularity::TimeBucket;
use crate::resample::hints::{valid_edges, CategoryGroupHints, NumericBinHints};
use crate::resample::types::*;
use std::collections::{BTreeSet, HashMap};

/// Tunable bucketing policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResampleSettings {
    /// Bucket count the automatic time granularity aims for
    pub target_time_buckets: usize,
    /// Bin count for numeric dimensions without hints or an explicit count
    pub numeric_bin_count: usize,
}

impl ResampleSettings {
    pub const DEFAULT_TARGET_TIME_BUCKETS: usize = 24;
    pub const DEFAULT_NUMERIC_BIN_COUNT: usize = 10;
}

impl Default for ResampleSettings {
    fn default() -> Self {
        Self {
            target_time_buckets: Self::DEFAULT_TARGET_TIME_BUCKETS,
            numeric_bin_count: Self::DEFAULT_NUMERIC_BIN_COUNT,
        }
    }
}

/// Resample engine
#[derive(Debug, Clone, Default)]
pub struct Resampler {
    settings: ResampleSettings,
}

impl Resampler {
    /// Create an engine with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with explicit settings
    pub fn with_settings(settings: ResampleSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ResampleSettings {
        &self.settings
    }

    /// Resample `records` according to `config`
    ///
    /// Never fails: unresolvable fields, unknown bucket tokens, malformed
    /// hints and out-of-range brushes all degrade to a safe default, and
    /// every such fallback is listed in `ResampleResult::degradations`.
    pub fn compute(
        &self,
        records: &[MetricRecord],
        config: &ResampleConfig,
        numeric_hints: Option<&NumericBinHints>,
        category_hints: Option<&CategoryGroupHints>,
    ) -> ResampleResult {
        let mut degradations = Vec::new();

        let dimension =
            self.resolve_dimension(records, config, numeric_hints, category_hints, &mut degradations);
        let (aggregation, metric) = resolve_metric(records, config, &mut degradations);

        let mut groups = Groups::default();
        let mut skipped_records = 0;

        for (index, record) in records.iter().enumerate() {
            let Some(key) = dimension.key_for(index, record) else {
                skipped_records += 1;
                continue;
            };
            let amount = metric.and_then(|m| record.number(m)).unwrap_or(0.0);
            groups.add(key, &record.id, amount);
        }

        let series = groups.into_series(&dimension, aggregation);
        let brush = Brush::apply(&series, config.range);

        for degradation in &degradations {
            tracing::debug!(%degradation, "resample fell back");
        }
        tracing::trace!(
            records = records.len(),
            buckets = series.len(),
            skipped = skipped_records,
            filter_active = brush.filter_active,
            "resample complete"
        );

        ResampleResult {
            series,
            resolved_bucket: dimension.resolved_bucket(),
            aggregation,
            config_range: brush.config_range,
            allowed_ids: brush.allowed_ids,
            filter_active: brush.filter_active,
            display_range: brush.display_range,
            skipped_records,
            degradations,
        }
    }

    /// Resolve the configured dimension against the records
    fn resolve_dimension<'a>(
        &self,
        records: &[MetricRecord],
        config: &'a ResampleConfig,
        numeric_hints: Option<&'a NumericBinHints>,
        category_hints: Option<&'a CategoryGroupHints>,
        degradations: &mut Vec<Degradation>,
    ) -> Dimension<'a> {
        let field = config.dimension.trim();
        if field == BATCH_INDEX {
            return Dimension::Ordinal;
        }

        let resolved = match config.dimension_kind {
            DimensionKind::Temporal => {
                let stamps: Vec<i64> = records.iter().filter_map(|r| r.timestamp(field)).collect();
                if stamps.is_empty() && !records.is_empty() {
                    None
                } else {
                    let granularity = self.resolve_granularity(&config.bucket, &stamps, degradations);
                    Some(Dimension::Temporal { field, granularity })
                }
            }
            DimensionKind::Numeric => {
                self.resolve_numeric(records, field, &config.bucket, numeric_hints, degradations)
            }
            DimensionKind::Categorical => {
                if records.is_empty() || records.iter().any(|r| r.text(field).is_some()) {
                    Some(Dimension::Categorical {
                        field,
                        hints: category_hints,
                    })
                } else {
                    None
                }
            }
        };

        resolved.unwrap_or_else(|| {
            degradations.push(Degradation::DimensionFallback {
                requested: config.dimension.clone(),
                dimension_kind: config.dimension_kind,
            });
            Dimension::Ordinal
        })
    }

    /// Pick the time granularity for a temporal dimension
    fn resolve_granularity(
        &self,
        token: &str,
        stamps: &[i64],
        degradations: &mut Vec<Degradation>,
    ) -> TimeBucket {
        if !is_auto(token) {
            if let Some(granularity) = TimeBucket::from_str(token) {
                return granularity;
            }
            degradations.push(Degradation::UnknownBucketToken {
                token: token.to_string(),
            });
        }

        let span = match (stamps.iter().min(), stamps.iter().max()) {
            (Some(min), Some(max)) => max.saturating_sub(*min),
            _ => 0,
        };
        TimeBucket::auto_for_span(span, self.settings.target_time_buckets)
    }

    /// Resolve a numeric dimension and its bin layout
    fn resolve_numeric<'a>(
        &self,
        records: &[MetricRecord],
        field: &'a str,
        token: &str,
        numeric_hints: Option<&NumericBinHints>,
        degradations: &mut Vec<Degradation>,
    ) -> Option<Dimension<'a>> {
        if let Some(edges) = numeric_hints.and_then(|h| h.edges(field)) {
            if valid_edges(edges) {
                return Some(Dimension::Numeric {
                    field,
                    layout: BinLayout::Edges(edges.to_vec()),
                    hinted: true,
                });
            }
            degradations.push(Degradation::InvalidBinHints {
                field: field.to_string(),
            });
        }

        let values: Vec<f64> = records.iter().filter_map(|r| r.number(field)).collect();
        if values.is_empty() && !records.is_empty() {
            return None;
        }

        let count = if is_auto(token) {
            self.settings.numeric_bin_count
        } else {
            match token.trim().parse::<usize>() {
                Ok(count) if count > 0 => count,
                _ => {
                    degradations.push(Degradation::UnknownBucketToken {
                        token: token.to_string(),
                    });
                    self.settings.numeric_bin_count
                }
            }
        };

        let layout = if values.is_empty() {
            // Nothing to measure yet; report the requested bin count
            BinLayout::Uniform {
                min: 0.0,
                max: 0.0,
                width: 0.0,
                count,
            }
        } else {
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            BinLayout::uniform(min, max, count)
        };

        Some(Dimension::Numeric {
            field,
            layout,
            hinted: false,
        })
    }
}

/// Resample with default settings
///
/// See [`Resampler::compute`].
pub fn compute_resample(
    records: &[MetricRecord],
    config: &ResampleConfig,
    numeric_hints: Option<&NumericBinHints>,
    category_hints: Option<&CategoryGroupHints>,
) -> ResampleResult {
    Resampler::new().compute(records, config, numeric_hints, category_hints)
}

fn is_auto(token: &str) -> bool {
    let token = token.trim();
    token.is_empty() || token.eq_ignore_ascii_case(AUTO_BUCKET)
}

/// Resolve the effective aggregation and metric field
///
/// `count` needs no metric. `sum` and `avg` need the metric to be numeric on
/// at least one record; otherwise they fall back to `count`.
fn resolve_metric<'a>(
    records: &[MetricRecord],
    config: &'a ResampleConfig,
    degradations: &mut Vec<Degradation>,
) -> (Aggregation, Option<&'a str>) {
    if config.aggregation == Aggregation::Count {
        return (Aggregation::Count, None);
    }

    let metric = config.metric.trim();
    if records.is_empty() || records.iter().any(|r| r.number(metric).is_some()) {
        return (config.aggregation, Some(metric));
    }

    degradations.push(Degradation::MetricFallback {
        requested: config.metric.clone(),
        aggregation: config.aggregation,
    });
    (Aggregation::Count, None)
}

/// Running totals for one bucket
struct Accumulator {
    key: BucketKey,
    total: f64,
    members: usize,
    ids: BTreeSet<String>,
}

/// Buckets in first-seen order with key lookup
#[derive(Default)]
struct Groups {
    index: HashMap<BucketKey, usize>,
    slots: Vec<Accumulator>,
}

impl Groups {
    fn add(&mut self, key: BucketKey, id: &str, amount: f64) {
        let slot = match self.index.get(&key) {
            Some(&slot) => slot,
            None => {
                let slot = self.slots.len();
                self.index.insert(key.clone(), slot);
                self.slots.push(Accumulator {
                    key,
                    total: 0.0,
                    members: 0,
                    ids: BTreeSet::new(),
                });
                slot
            }
        };

        let acc = &mut self.slots[slot];
        acc.total += amount;
        acc.members += 1;
        acc.ids.insert(id.to_string());
    }

    fn into_series(self, dimension: &Dimension<'_>, aggregation: Aggregation) -> Vec<Bucket> {
        let mut slots = self.slots;

        if dimension.keeps_first_seen_order() {
            // Stable: unranked labels keep first-seen order after ranked ones
            slots.sort_by_key(|acc| dimension.rank(&acc.key).unwrap_or(usize::MAX));
        } else {
            slots.sort_by(|a, b| a.key.cmp(&b.key));
        }

        slots
            .into_iter()
            .map(|acc| Bucket {
                label: dimension.label(&acc.key),
                value: aggregation.finish(acc.total, acc.members),
                ids: acc.ids,
            })
            .collect()
    }
}

/// Outcome of applying a brush range to a series
#[derive(Debug, Default, PartialEq)]
struct Brush {
    config_range: Option<(usize, usize)>,
    display_range: Option<(usize, usize)>,
    allowed_ids: Option<BTreeSet<String>>,
    filter_active: bool,
}

impl Brush {
    /// Clamp `range` to the series and collect the ids it covers
    ///
    /// Reversed ranges are swapped. A range covering the whole series is not
    /// a filter.
    fn apply(series: &[Bucket], range: Option<(i64, i64)>) -> Self {
        let Some(last) = series.len().checked_sub(1) else {
            return Self::default();
        };
        let full = (0, last);

        let Some((a, b)) = range else {
            return Self {
                display_range: Some(full),
                ..Self::default()
            };
        };

        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let clamp = |v: i64| v.clamp(0, last as i64) as usize;
        let clamped = (clamp(lo), clamp(hi));

        if clamped == full {
            return Self {
                config_range: Some(clamped),
                display_range: Some(clamped),
                allowed_ids: None,
                filter_active: false,
            };
        }

        let allowed: BTreeSet<String> = series[clamped.0..=clamped.1]
            .iter()
            .flat_map(|bucket| bucket.ids.iter().cloned())
            .collect();

        Self {
            config_range: Some(clamped),
            display_range: Some(clamped),
            allowed_ids: Some(allowed),
            filter_active: true,
        }
    }
}
