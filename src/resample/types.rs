//! Core data types for the resample engine
//!
//! This module defines the values that cross the engine boundary:
//! - `MetricRecord`: one discovered batch with its named fields
//! - `ResampleConfig`: dimension / metric / aggregation / bucket / brush selection
//! - `Bucket` and `ResampleResult`: the chart series and cross-filter output
//! - `Degradation`: a fallback the engine took instead of failing

use crate::resample::granularity::{parse_timestamp, TimeBucket};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Name of the synthetic ordinal dimension (position in the input collection)
pub const BATCH_INDEX: &str = "batch_index";

/// A raw field value as delivered by the discovery backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Explicit null
    Null,
    /// Boolean flag
    Bool(bool),
    /// Any numeric value (integers are widened)
    Number(f64),
    /// Free text
    Text(String),
    /// Arrays and objects; carried along but never bucketed
    Nested(serde_json::Value),
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

/// Borrowed view of a resolved, non-null field
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldRef<'a> {
    Text(&'a str),
    Number(f64),
    Bool(bool),
}

impl FieldValue {
    fn as_field_ref(&self) -> Option<FieldRef<'_>> {
        match self {
            FieldValue::Null | FieldValue::Nested(_) => None,
            FieldValue::Bool(b) => Some(FieldRef::Bool(*b)),
            FieldValue::Number(n) => Some(FieldRef::Number(*n)),
            FieldValue::Text(s) => Some(FieldRef::Text(s)),
        }
    }
}

/// One discovered data batch
///
/// `time` and `category` are first-class because every discovery backend
/// reports them; everything else (`rows`, `parent`, `rows_per_parent`, ...)
/// lives in `fields` and is looked up by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    /// Unique within one record set
    pub id: String,
    /// ISO-ish timestamp string
    #[serde(default)]
    pub time: Option<String>,
    /// Category label
    #[serde(default)]
    pub category: Option<String>,
    /// Remaining named fields
    #[serde(flatten)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl MetricRecord {
    /// Create a record with only an id
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            time: None,
            category: None,
            fields: BTreeMap::new(),
        }
    }

    /// Builder method: set the timestamp string
    pub fn time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    /// Builder method: set the category
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Builder method: set a named field
    ///
    /// `time` and `category` are routed to their dedicated attributes when
    /// given as text.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        let name = name.into();
        let value = value.into();
        match (name.as_str(), value) {
            ("time", FieldValue::Text(s)) => self.time = Some(s),
            ("category", FieldValue::Text(s)) => self.category = Some(s),
            (_, value) => {
                self.fields.insert(name, value);
            }
        }
        self
    }

    /// Look up a field by name; `None` when absent or null
    pub fn get(&self, name: &str) -> Option<FieldRef<'_>> {
        match name {
            "id" => Some(FieldRef::Text(&self.id)),
            "time" => self.time.as_deref().map(FieldRef::Text),
            "category" => self.category.as_deref().map(FieldRef::Text),
            _ => self.fields.get(name).and_then(FieldValue::as_field_ref),
        }
    }

    /// Numeric value of a field
    ///
    /// Numeric text (e.g. `"42"`) counts; non-finite values do not.
    pub fn number(&self, name: &str) -> Option<f64> {
        let value = match self.get(name)? {
            FieldRef::Number(n) => n,
            FieldRef::Text(s) => s.trim().parse::<f64>().ok()?,
            FieldRef::Bool(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    /// Text rendering of a field for categorical grouping
    ///
    /// Blank text is treated as missing.
    pub fn text(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            FieldRef::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            FieldRef::Number(n) => Some(format_number(n)),
            FieldRef::Bool(b) => Some(b.to_string()),
        }
    }

    /// Timestamp of a field in Unix milliseconds
    ///
    /// Text is parsed leniently; numbers are taken as epoch milliseconds.
    pub fn timestamp(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            FieldRef::Text(s) => parse_timestamp(s),
            FieldRef::Number(n) if n.is_finite() => Some(n as i64),
            _ => None,
        }
    }
}

/// How the grouping dimension is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionKind {
    /// Timestamps truncated to a time bucket
    Temporal,
    /// Numbers assigned to bins
    Numeric,
    /// Raw labels
    Categorical,
}

impl DimensionKind {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "temporal" | "time" => Some(Self::Temporal),
            "numeric" | "number" => Some(Self::Numeric),
            "categorical" | "category" => Some(Self::Categorical),
            _ => None,
        }
    }
}

impl fmt::Display for DimensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Temporal => write!(f, "temporal"),
            Self::Numeric => write!(f, "numeric"),
            Self::Categorical => write!(f, "categorical"),
        }
    }
}

/// Aggregation applied to the metric within each bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// Total of the metric across members
    #[default]
    Sum,
    /// Total divided by member count
    Avg,
    /// Member count; the metric is ignored
    Count,
}

impl Aggregation {
    /// Final bucket value from a running total and member count
    pub fn finish(&self, total: f64, members: usize) -> f64 {
        match self {
            Self::Sum => total,
            Self::Avg if members == 0 => 0.0,
            Self::Avg => total / members as f64,
            Self::Count => members as f64,
        }
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "sum" | "total" => Some(Self::Sum),
            "avg" | "average" | "mean" => Some(Self::Avg),
            "count" => Some(Self::Count),
            _ => None,
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sum => write!(f, "sum"),
            Self::Avg => write!(f, "avg"),
            Self::Count => write!(f, "count"),
        }
    }
}

fn default_bucket() -> String {
    AUTO_BUCKET.to_string()
}

/// Bucket token meaning "let the engine decide"
pub const AUTO_BUCKET: &str = "auto";

/// Selector state for one resample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResampleConfig {
    /// Field to group by (or `batch_index`)
    pub dimension: String,
    /// Interpretation of the dimension field
    pub dimension_kind: DimensionKind,
    /// Numeric field to aggregate
    #[serde(default)]
    pub metric: String,
    /// Aggregation function
    #[serde(default)]
    pub aggregation: Aggregation,
    /// Time bucket token, numeric bin count, or `auto`
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Brush selection as inclusive bucket indices
    #[serde(default)]
    pub range: Option<(i64, i64)>,
}

impl ResampleConfig {
    /// Create a config with `sum` aggregation, automatic bucketing and no brush
    pub fn new(
        dimension: impl Into<String>,
        dimension_kind: DimensionKind,
        metric: impl Into<String>,
    ) -> Self {
        Self {
            dimension: dimension.into(),
            dimension_kind,
            metric: metric.into(),
            aggregation: Aggregation::default(),
            bucket: default_bucket(),
            range: None,
        }
    }

    /// Builder method: set the aggregation
    pub fn aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// Builder method: set the bucket token
    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    /// Builder method: set the brush range
    pub fn range(mut self, start: i64, end: i64) -> Self {
        self.range = Some((start, end));
        self
    }

    /// Persist a result's clamped range back into the selector state
    pub fn store_range(&mut self, result: &ResampleResult) {
        self.range = result
            .config_range
            .map(|(start, end)| (start as i64, end as i64));
    }
}

/// One aggregation group in the output series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    /// Display label
    pub label: String,
    /// Aggregated metric value
    pub value: f64,
    /// Ids of the member records
    pub ids: BTreeSet<String>,
}

/// Bucket size the engine actually used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedBucket {
    /// Time granularity
    Time(TimeBucket),
    /// Numeric bins; `hinted` when the edges came from the backend
    Bins { count: usize, hinted: bool },
    /// One bucket per distinct label
    Category,
    /// One bucket per record in input order
    Ordinal,
}

impl fmt::Display for ResolvedBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Time(granularity) => write!(f, "{}", granularity),
            Self::Bins { count, hinted: false } => write!(f, "{} bins", count),
            Self::Bins { count, hinted: true } => write!(f, "{} hinted bins", count),
            Self::Category => write!(f, "category"),
            Self::Ordinal => write!(f, "ordinal"),
        }
    }
}

impl Serialize for ResolvedBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A fallback taken instead of failing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
    /// Dimension field could not be resolved; ordinal bucketing was used
    DimensionFallback {
        requested: String,
        dimension_kind: DimensionKind,
    },
    /// Metric field could not be resolved; records were counted
    MetricFallback {
        requested: String,
        aggregation: Aggregation,
    },
    /// Bucket token was not understood for this dimension kind
    UnknownBucketToken { token: String },
    /// Bin edge hints were malformed and ignored
    InvalidBinHints { field: String },
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DimensionFallback {
                requested,
                dimension_kind,
            } => write!(
                f,
                "{} dimension '{}' not found, grouping by {}",
                dimension_kind, requested, BATCH_INDEX
            ),
            Self::MetricFallback {
                requested,
                aggregation,
            } => write!(
                f,
                "metric '{}' not found, using count instead of {}",
                requested, aggregation
            ),
            Self::UnknownBucketToken { token } => {
                write!(f, "bucket '{}' not recognised, using auto", token)
            }
            Self::InvalidBinHints { field } => {
                write!(f, "bin hints for '{}' are invalid, using uniform bins", field)
            }
        }
    }
}

/// Output of one resample
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResampleResult {
    /// Non-empty buckets in natural order
    pub series: Vec<Bucket>,
    /// Bucket size actually used
    pub resolved_bucket: ResolvedBucket,
    /// Aggregation actually used
    pub aggregation: Aggregation,
    /// Clamped brush range to store back into the config
    pub config_range: Option<(usize, usize)>,
    /// Ids inside the brush, `None` when nothing is filtered
    pub allowed_ids: Option<BTreeSet<String>>,
    /// Whether the brush narrows the record set
    pub filter_active: bool,
    /// Range the brush control should display
    pub display_range: Option<(usize, usize)>,
    /// Records without a value for the resolved dimension
    pub skipped_records: usize,
    /// Fallbacks taken during this resample
    pub degradations: Vec<Degradation>,
}

impl ResampleResult {
    /// Whether any fallback was taken
    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }

    /// Whether the series has no buckets
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Number of record ids placed into buckets
    pub fn bucketed_records(&self) -> usize {
        self.series.iter().map(|b| b.ids.len()).sum()
    }

    /// Whether a record survives the brush
    pub fn allows(&self, id: &str) -> bool {
        match &self.allowed_ids {
            Some(ids) if self.filter_active => ids.contains(id),
            _ => true,
        }
    }

    /// Records allowed by the brush, in input order
    pub fn selected<'a>(&self, records: &'a [MetricRecord]) -> Vec<&'a MetricRecord> {
        records.iter().filter(|r| self.allows(&r.id)).collect()
    }
}

/// Render a number compactly: integers without a fraction, others to two places
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.0}", value)
    } else {
        let s = format!("{:.2}", value);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}
