//! Bucket-key derivation
//!
//! A resolved [`Dimension`] maps each record to a [`BucketKey`] (or to
//! nothing, when the record lacks the field) and each key to a label.
//! Keys order naturally: chronological, by bin index, by input position.
//! Categorical keys are never sorted by value; they keep first-seen order.

use crate::resample::granularity::TimeBucket;
use crate::resample::hints::CategoryGroupHints;
use crate::resample::types::{format_number, MetricRecord, ResolvedBucket};

/// Grouping key of one bucket
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BucketKey {
    /// Bucket start in Unix milliseconds
    Time(i64),
    /// Numeric bin index
    Bin(usize),
    /// Canonical category label
    Category(String),
    /// Position in the input collection
    Ordinal(usize),
}

/// Numeric bin layout
#[derive(Debug, Clone, PartialEq)]
pub enum BinLayout {
    /// `count` bins of equal `width` starting at `min`; the last bin ends at `max`
    Uniform {
        min: f64,
        max: f64,
        width: f64,
        count: usize,
    },
    /// Explicit edges from hints
    Edges(Vec<f64>),
}

impl BinLayout {
    /// Equal-width layout over `[min, max]`
    ///
    /// A zero-width range collapses to a single bin. The width is taken
    /// per bin so that ranges wider than `f64::MAX` stay finite.
    pub fn uniform(min: f64, max: f64, count: usize) -> Self {
        let count = if max > min { count.max(1) } else { 1 };
        let width = max / count as f64 - min / count as f64;
        BinLayout::Uniform {
            min,
            max,
            width,
            count,
        }
    }

    /// Number of bins
    pub fn count(&self) -> usize {
        match self {
            BinLayout::Uniform { count, .. } => *count,
            BinLayout::Edges(edges) => edges.len().saturating_sub(1).max(1),
        }
    }

    /// Bin index of a value
    ///
    /// The maximum lands in the last bin rather than an overflow bin.
    /// Values outside hinted edges clamp into the first or last bin.
    pub fn bin_of(&self, value: f64) -> usize {
        let last = self.count() - 1;
        match self {
            BinLayout::Uniform { min, width, .. } => {
                if *width <= 0.0 || value <= *min {
                    return 0;
                }
                let index = (value / width - min / width).floor() as usize;
                index.min(last)
            }
            BinLayout::Edges(edges) => {
                let at_or_below = edges.partition_point(|edge| *edge <= value);
                at_or_below.saturating_sub(1).min(last)
            }
        }
    }

    /// Range label of a bin, `[lo, hi)` or `[lo, hi]` for the last one
    pub fn label(&self, index: usize) -> String {
        let (lo, hi) = match self {
            BinLayout::Uniform {
                min,
                max,
                width,
                count,
            } => {
                let lo = min + width * index as f64;
                let hi = if index + 1 >= *count {
                    *max
                } else {
                    lo + width
                };
                (lo, hi)
            }
            BinLayout::Edges(edges) => {
                let lo = edges.get(index).copied().unwrap_or(f64::NAN);
                let hi = edges.get(index + 1).copied().unwrap_or(lo);
                (lo, hi)
            }
        };

        let close = if index + 1 >= self.count() { ']' } else { ')' };
        format!("[{}, {}{}", format_number(lo), format_number(hi), close)
    }
}

/// A dimension resolved against the record set
#[derive(Debug, Clone)]
pub enum Dimension<'a> {
    Temporal {
        field: &'a str,
        granularity: TimeBucket,
    },
    Numeric {
        field: &'a str,
        layout: BinLayout,
        hinted: bool,
    },
    Categorical {
        field: &'a str,
        hints: Option<&'a CategoryGroupHints>,
    },
    Ordinal,
}

impl Dimension<'_> {
    /// Key of a record, `None` when it lacks the dimension's field
    pub fn key_for(&self, index: usize, record: &MetricRecord) -> Option<BucketKey> {
        match self {
            Dimension::Temporal { field, granularity } => record
                .timestamp(field)
                .map(|ts| BucketKey::Time(granularity.truncate(ts))),
            Dimension::Numeric { field, layout, .. } => record
                .number(field)
                .map(|value| BucketKey::Bin(layout.bin_of(value))),
            Dimension::Categorical { field, hints } => record.text(field).map(|raw| {
                let label = match hints {
                    Some(hints) => hints.canonical(&raw),
                    None => raw,
                };
                BucketKey::Category(label)
            }),
            Dimension::Ordinal => Some(BucketKey::Ordinal(index)),
        }
    }

    /// Display label of a key
    pub fn label(&self, key: &BucketKey) -> String {
        match (self, key) {
            (Dimension::Temporal { granularity, .. }, BucketKey::Time(start)) => {
                granularity.label(*start)
            }
            (Dimension::Numeric { layout, .. }, BucketKey::Bin(index)) => layout.label(*index),
            (_, BucketKey::Category(label)) => label.clone(),
            (_, BucketKey::Ordinal(index)) => index.to_string(),
            (_, BucketKey::Time(start)) => start.to_string(),
            (_, BucketKey::Bin(index)) => index.to_string(),
        }
    }

    /// Explicit display rank of a key, if the dimension dictates one
    pub fn rank(&self, key: &BucketKey) -> Option<usize> {
        match (self, key) {
            (Dimension::Categorical { hints: Some(hints), .. }, BucketKey::Category(label)) => {
                hints.rank(label)
            }
            _ => None,
        }
    }

    /// Whether buckets keep first-seen order instead of key order
    pub fn keeps_first_seen_order(&self) -> bool {
        matches!(self, Dimension::Categorical { .. })
    }

    /// Bucket size reported back to the caller
    pub fn resolved_bucket(&self) -> ResolvedBucket {
        match self {
            Dimension::Temporal { granularity, .. } => ResolvedBucket::Time(*granularity),
            Dimension::Numeric { layout, hinted, .. } => ResolvedBucket::Bins {
                count: layout.count(),
                hinted: *hinted,
            },
            Dimension::Categorical { .. } => ResolvedBucket::Category,
            Dimension::Ordinal => ResolvedBucket::Ordinal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_max_lands_in_last_bin() {
        let layout = BinLayout::uniform(1.0, 100.0, 10);

        assert_eq!(layout.count(), 10);
        assert_eq!(layout.bin_of(1.0), 0);
        assert_eq!(layout.bin_of(5.0), 0);
        assert_eq!(layout.bin_of(11.0), 1);
        assert_eq!(layout.bin_of(100.0), 9);
    }

    #[test]
    fn test_uniform_extreme_range_stays_finite() {
        let layout = BinLayout::uniform(-1e308, 1e308, 10);

        assert_eq!(layout.bin_of(-1e308), 0);
        assert!((1..9).contains(&layout.bin_of(0.0)));
        assert_eq!(layout.bin_of(1e308), 9);
        assert!(!layout.label(9).contains("NaN"));
    }

    #[test]
    fn test_uniform_zero_range_single_bin() {
        let layout = BinLayout::uniform(7.0, 7.0, 10);

        assert_eq!(layout.count(), 1);
        assert_eq!(layout.bin_of(7.0), 0);
        assert_eq!(layout.label(0), "[7, 7]");
    }

    #[test]
    fn test_uniform_labels() {
        let layout = BinLayout::uniform(0.0, 100.0, 4);

        assert_eq!(layout.label(0), "[0, 25)");
        assert_eq!(layout.label(3), "[75, 100]");
    }

    #[test]
    fn test_edge_bins_clamp() {
        let layout = BinLayout::Edges(vec![0.0, 10.0, 50.0, 100.0]);

        assert_eq!(layout.count(), 3);
        assert_eq!(layout.bin_of(-5.0), 0);
        assert_eq!(layout.bin_of(0.0), 0);
        assert_eq!(layout.bin_of(10.0), 1);
        assert_eq!(layout.bin_of(49.9), 1);
        assert_eq!(layout.bin_of(100.0), 2);
        assert_eq!(layout.bin_of(250.0), 2);
        assert_eq!(layout.label(1), "[10, 50)");
        assert_eq!(layout.label(2), "[50, 100]");
    }

    #[test]
    fn test_categorical_key_uses_hints() {
        let hints = CategoryGroupHints::new().group("usa", "United States");
        let dimension = Dimension::Categorical {
            field: "category",
            hints: Some(&hints),
        };

        let record = MetricRecord::new("a").category("USA");
        assert_eq!(
            dimension.key_for(0, &record),
            Some(BucketKey::Category("United States".to_string()))
        );

        let missing = MetricRecord::new("b");
        assert_eq!(dimension.key_for(1, &missing), None);
    }

    #[test]
    fn test_temporal_key_truncates() {
        let dimension = Dimension::Temporal {
            field: "time",
            granularity: TimeBucket::Day,
        };
        let record = MetricRecord::new("a").time("2024-01-15T14:35:42Z");

        let key = dimension.key_for(0, &record).unwrap();
        assert_eq!(key, BucketKey::Time(1705276800000));
        assert_eq!(dimension.label(&key), "2024-01-15");

        let malformed = MetricRecord::new("b").time("not a date");
        assert_eq!(dimension.key_for(1, &malformed), None);
    }

    #[test]
    fn test_ordinal_key_is_position() {
        let record = MetricRecord::new("a");
        assert_eq!(
            Dimension::Ordinal.key_for(3, &record),
            Some(BucketKey::Ordinal(3))
        );
        assert_eq!(Dimension::Ordinal.label(&BucketKey::Ordinal(3)), "3");
    }
}
