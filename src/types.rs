//! Core types for the agreement pipeline
//!
//! This module defines the data structures that flow through each stage:
//! the dimension schema, normalized label tables, and agreement reports.

use crate::error::{AgreementError, Result};
use crate::normalizer::NormalizationPolicy;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Emotion dimensions used by the default rating schema, in column order
pub const EMOTION_DIMENSIONS: [&str; 9] = [
    "anger",
    "fear",
    "joy",
    "sadness",
    "disgust",
    "positiveSurprise",
    "negativeSurprise",
    "anticipation",
    "trust",
];

/// Ordered, immutable set of dimension names shared by every table in a comparison.
///
/// Cloning is cheap; clones share the same backing list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct DimensionSet {
    names: Arc<[String]>,
}

impl DimensionSet {
    /// Build a dimension set from an ordered list of names.
    ///
    /// Names must be non-empty and unique, and the list itself must not be empty.
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();

        if names.is_empty() {
            return Err(AgreementError::InvalidConfig(
                "dimension set must not be empty".to_string(),
            ));
        }

        for (i, name) in names.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(AgreementError::InvalidConfig(format!(
                    "dimension {} has an empty name",
                    i
                )));
            }
            if names[..i].contains(name) {
                return Err(AgreementError::InvalidConfig(format!(
                    "duplicate dimension '{}'",
                    name
                )));
            }
        }

        Ok(Self {
            names: names.into(),
        })
    }

    /// The nine-emotion schema
    pub fn emotions() -> Self {
        Self {
            names: EMOTION_DIMENSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn contains(&self, dimension: &str) -> bool {
        self.iter().any(|d| d == dimension)
    }

    /// Column index of a dimension
    pub fn index_of(&self, dimension: &str) -> Result<usize> {
        self.iter()
            .position(|d| d == dimension)
            .ok_or_else(|| AgreementError::UnknownDimension(dimension.to_string()))
    }
}

impl Default for DimensionSet {
    fn default() -> Self {
        Self::emotions()
    }
}

impl TryFrom<Vec<String>> for DimensionSet {
    type Error = AgreementError;

    fn try_from(names: Vec<String>) -> Result<Self> {
        Self::new(names)
    }
}

impl From<DimensionSet> for Vec<String> {
    fn from(set: DimensionSet) -> Self {
        set.names.to_vec()
    }
}

/// Binary labels derived from one annotator's raw table.
///
/// Every cell is exactly 0 or 1; the shape matches the source table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedTable {
    dimensions: DimensionSet,
    policy: NormalizationPolicy,
    columns: Vec<Vec<u8>>,
    rows: usize,
}

impl NormalizedTable {
    pub(crate) fn new(
        dimensions: DimensionSet,
        policy: NormalizationPolicy,
        columns: Vec<Vec<u8>>,
        rows: usize,
    ) -> Self {
        debug_assert_eq!(columns.len(), dimensions.len());
        debug_assert!(columns.iter().all(|c| c.len() == rows));
        debug_assert!(columns.iter().flatten().all(|&v| v <= 1));
        Self {
            dimensions,
            policy,
            columns,
            rows,
        }
    }

    pub fn dimensions(&self) -> &DimensionSet {
        &self.dimensions
    }

    pub fn policy(&self) -> NormalizationPolicy {
        self.policy
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Labels for one dimension
    pub fn column(&self, dimension: &str) -> Result<&[u8]> {
        let idx = self.dimensions.index_of(dimension)?;
        Ok(&self.columns[idx])
    }

    /// Labels for one item, in dimension order
    pub fn row(&self, index: usize) -> Option<Vec<u8>> {
        if index >= self.rows {
            return None;
        }
        Some(self.columns.iter().map(|c| c[index]).collect())
    }
}

/// Retained agreement coefficient for one dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub dimension: String,
    /// Cohen's kappa, rounded to two decimals, within [0, 1]
    pub kappa: f64,
}

/// Why a dimension is missing from a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ExclusionReason {
    /// Both raters gave one identical label to every item; kappa is undefined
    Degenerate,
    /// Rounded kappa fell outside [0, 1]
    OutOfRange { kappa: f64 },
}

/// Dimension dropped by the validity filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exclusion {
    pub dimension: String,
    #[serde(flatten)]
    pub reason: ExclusionReason,
}

/// Result of comparing two annotators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgreementReport {
    /// First annotator
    pub left: String,
    /// Second annotator
    pub right: String,
    /// Retained coefficients, in dimension order
    pub scores: Vec<DimensionScore>,
    /// Dimensions dropped by the validity filter, in dimension order
    pub excluded: Vec<Exclusion>,
}

impl AgreementReport {
    /// Retained coefficient for a dimension, if any
    pub fn score(&self, dimension: &str) -> Option<f64> {
        self.scores
            .iter()
            .find(|s| s.dimension == dimension)
            .map(|s| s.kappa)
    }

    /// Arithmetic mean of the retained coefficients
    pub fn mean(&self) -> Result<f64> {
        if self.scores.is_empty() {
            return Err(AgreementError::NoValidDimensions(
                self.left.clone(),
                self.right.clone(),
            ));
        }
        let sum: f64 = self.scores.iter().map(|s| s.kappa).sum();
        Ok(sum / self.scores.len() as f64)
    }
}
