//! Backend-supplied bucketing hints
//!
//! Discovery can ship precomputed numeric bin edges per field and a
//! mapping that collapses near-duplicate category spellings. Both are
//! optional; the engine ignores anything malformed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Precomputed bin edges keyed by field name
///
/// `n + 1` ascending edges describe `n` bins; bin `i` covers
/// `[edges[i], edges[i + 1])` and the last bin also includes its upper edge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NumericBinHints {
    edges: BTreeMap<String, Vec<f64>>,
}

impl NumericBinHints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set edges for a field
    pub fn with_edges(mut self, field: impl Into<String>, edges: Vec<f64>) -> Self {
        self.edges.insert(field.into(), edges);
        self
    }

    /// Raw edges for a field, valid or not
    pub fn edges(&self, field: &str) -> Option<&[f64]> {
        self.edges.get(field).map(Vec::as_slice)
    }

    /// Whether the hints mention a field at all
    pub fn contains(&self, field: &str) -> bool {
        self.edges.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// At least two finite, strictly ascending edges
pub fn valid_edges(edges: &[f64]) -> bool {
    edges.len() >= 2
        && edges.iter().all(|e| e.is_finite())
        && edges.windows(2).all(|w| w[0] < w[1])
}

/// Category alias collapsing and optional explicit ordering
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryGroupHints {
    /// Raw spelling -> canonical label
    #[serde(default)]
    pub groups: BTreeMap<String, String>,
    /// Canonical labels in display order
    #[serde(default)]
    pub order: Vec<String>,
}

impl CategoryGroupHints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: map a raw spelling onto a canonical label
    pub fn group(mut self, raw: impl Into<String>, canonical: impl Into<String>) -> Self {
        self.groups.insert(raw.into(), canonical.into());
        self
    }

    /// Builder method: set the explicit display order
    pub fn order<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.order = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Canonical label for a raw value
    ///
    /// Exact matches win; otherwise aliases match case-insensitively after
    /// trimming. Unmapped values are returned unchanged.
    pub fn canonical(&self, raw: &str) -> String {
        if let Some(label) = self.groups.get(raw) {
            return label.clone();
        }

        let needle = raw.trim();
        self.groups
            .iter()
            .find(|(alias, _)| alias.trim().eq_ignore_ascii_case(needle))
            .map(|(_, label)| label.clone())
            .unwrap_or_else(|| raw.to_string())
    }

    /// Position of a label in the explicit order
    pub fn rank(&self, label: &str) -> Option<usize> {
        self.order.iter().position(|l| l == label)
    }

    /// Whether the hints dictate an order
    pub fn has_order(&self) -> bool {
        !self.order.is_empty()
    }
}
