//! Batchscope Resample Engine
//!
//! Groups discovered batch records into chart buckets:
//!
//! - **Types**: records, selector config, buckets and results
//! - **Granularity**: time bucket ladder and timestamp handling
//! - **Hints**: backend-supplied bin edges and category groupings
//! - **Bucketing**: per-dimension key derivation
//! - **Engine**: resolution, aggregation, ordering and brush application
//! - **Memo**: last-call cache for interactive callers
//!
//! # Example
//!
//! ```rust
//! use batchscope::resample::*;
//!
//! let records = vec![
//!     MetricRecord::new("a").category("x").field("rows", 10.0),
//!     MetricRecord::new("b").category("x").field("rows", 20.0),
//!     MetricRecord::new("c").category("y").field("rows", 5.0),
//! ];
//!
//! let config = ResampleConfig::new("category", DimensionKind::Categorical, "rows");
//! let result = compute_resample(&records, &config, None, None);
//!
//! assert_eq!(result.series[0].label, "x");
//! assert_eq!(result.series[0].value, 30.0);
//! ```

mod bucketing;
mod engine;
mod granularity;
mod hints;
mod memo;
mod types;

pub use bucketing::{BinLayout, BucketKey};
pub use engine::{compute_resample, ResampleSettings, Resampler};
pub use granularity::{parse_timestamp, TimeBucket};
pub use hints::{valid_edges, CategoryGroupHints, NumericBinHints};
pub use memo::ResampleCache;
pub use types::{
    format_number, Aggregation, Bucket, Degradation, DimensionKind, FieldRef, FieldValue,
    MetricRecord, ResampleConfig, ResampleResult, ResolvedBucket, AUTO_BUCKET, BATCH_INDEX,
};
