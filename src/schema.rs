//! Discovery Schema
//!
//! Describes which dimensions and metrics a record set offers, so a caller
//! can populate its selectors and build a sensible initial config. The
//! discovery backend may ship one; otherwise it is inferred from records.

use crate::resample::{
    Aggregation, DimensionKind, MetricRecord, ResampleConfig, AUTO_BUCKET, BATCH_INDEX,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A dimension a record set can be grouped by
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionSpec {
    pub name: String,
    pub kind: DimensionKind,
}

impl DimensionSpec {
    pub fn new(name: impl Into<String>, kind: DimensionKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Available dimensions and metrics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoverySchema {
    #[serde(default)]
    pub dimensions: Vec<DimensionSpec>,
    #[serde(default)]
    pub metrics: Vec<String>,
}

impl DiscoverySchema {
    /// Infer a schema from records
    ///
    /// `time` becomes temporal when any record carries a parseable timestamp,
    /// `category` categorical when any record has one. Other fields are
    /// numeric (dimension and metric) when any record holds a number there,
    /// categorical otherwise. `batch_index` is always offered last.
    pub fn infer(records: &[MetricRecord]) -> Self {
        let mut dimensions = Vec::new();
        let mut metrics = Vec::new();

        if records.iter().any(|r| r.timestamp("time").is_some()) {
            dimensions.push(DimensionSpec::new("time", DimensionKind::Temporal));
        }
        if records.iter().any(|r| r.text("category").is_some()) {
            dimensions.push(DimensionSpec::new("category", DimensionKind::Categorical));
        }

        let names: BTreeSet<&str> = records
            .iter()
            .flat_map(|r| r.fields.keys().map(String::as_str))
            .collect();

        for name in names {
            if records.iter().any(|r| r.number(name).is_some()) {
                dimensions.push(DimensionSpec::new(name, DimensionKind::Numeric));
                metrics.push(name.to_string());
            } else if records.iter().any(|r| r.text(name).is_some()) {
                dimensions.push(DimensionSpec::new(name, DimensionKind::Categorical));
            }
        }

        dimensions.push(DimensionSpec::new(BATCH_INDEX, DimensionKind::Numeric));

        Self {
            dimensions,
            metrics,
        }
    }

    /// Kind of a named dimension
    pub fn kind_of(&self, name: &str) -> Option<DimensionKind> {
        self.dimensions
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.kind)
    }

    pub fn has_metric(&self, name: &str) -> bool {
        self.metrics.iter().any(|m| m == name)
    }

    /// Initial selector state
    ///
    /// The first temporal dimension (else `batch_index`), the first metric
    /// summed, automatic bucketing, no brush. Without metrics, records are
    /// counted.
    pub fn default_config(&self) -> ResampleConfig {
        let dimension = self
            .dimensions
            .iter()
            .find(|d| d.kind == DimensionKind::Temporal)
            .cloned()
            .unwrap_or_else(|| DimensionSpec::new(BATCH_INDEX, DimensionKind::Numeric));

        let (metric, aggregation) = match self.metrics.first() {
            Some(metric) => (metric.clone(), Aggregation::Sum),
            None => (String::new(), Aggregation::Count),
        };

        ResampleConfig::new(dimension.name, dimension.kind, metric)
            .aggregation(aggregation)
            .bucket(AUTO_BUCKET)
    }
}
