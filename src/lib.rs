//! # Batchscope
//!
//! Batch resampling for report previews - group discovered data batches into
//! chart buckets and cross-filter them with a brush selection.
//!
//! ## Features
//!
//! - **Three dimension kinds**: time buckets, numeric bins, categories
//! - **Automatic bucket sizing**: time granularity chosen from the data span
//! - **Brush cross-filtering**: bucket ranges resolve to record id sets
//! - **Never blocks the caller**: bad input degrades, and says how
//!
//! ## Modules
//!
//! - [`resample`]: The resample engine
//! - [`schema`]: Discovered dimensions and metrics
//! - [`dataset`]: Loading records and hints from JSON and CSV
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust
//! use batchscope::resample::*;
//!
//! let records: Vec<MetricRecord> = (1..=10)
//!     .map(|day| {
//!         MetricRecord::new(format!("batch-{}", day))
//!             .time(format!("2024-03-{:02}T09:00:00Z", day))
//!             .field("rows", day as f64 * 100.0)
//!     })
//!     .collect();
//!
//! // Sum rows per automatically sized time bucket, brushing buckets 2..=4
//! let config = ResampleConfig::new("time", DimensionKind::Temporal, "rows").range(2, 4);
//! let result = compute_resample(&records, &config, None, None);
//!
//! assert_eq!(result.resolved_bucket.to_string(), "day");
//! assert!(result.filter_active);
//! assert_eq!(result.selected(&records).len(), 3);
//! ```

pub mod config;
pub mod dataset;
pub mod resample;
pub mod schema;

// Re-export top-level types for convenience
pub use resample::{
    compute_resample, Aggregation, Bucket, CategoryGroupHints, Degradation, DimensionKind,
    MetricRecord, NumericBinHints, ResampleCache, ResampleConfig, ResampleResult,
    ResampleSettings, Resampler, ResolvedBucket, TimeBucket,
};

pub use schema::{DimensionSpec, DiscoverySchema};

pub use dataset::{load_records, CsvRecordReader, DatasetError, DatasetResult};

pub use config::{Config, ConfigError, LoadedConfig, LoggingConfig};
