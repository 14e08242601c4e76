//! Rating normalization
//!
//! Reduces raw intensity ratings to binary presence labels.
//! - `binary`: any non-zero intensity counts as present
//! - `intensity`: only ratings above 1 count as present

use crate::error::AgreementError;
use crate::source::AnnotationSource;
use crate::types::NormalizedTable;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Thresholding policy applied to every cell of a raw table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizationPolicy {
    /// Label 1 iff raw > 0
    #[default]
    Binary,
    /// Label 1 iff raw > 1
    Intensity,
}

impl NormalizationPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            NormalizationPolicy::Binary => "binary",
            NormalizationPolicy::Intensity => "intensity",
        }
    }

    /// Raw values strictly above this threshold are labelled 1
    pub fn threshold(&self) -> f64 {
        match self {
            NormalizationPolicy::Binary => 0.0,
            NormalizationPolicy::Intensity => 1.0,
        }
    }

    /// Label a single raw value
    pub fn label(&self, raw: f64) -> u8 {
        u8::from(raw > self.threshold())
    }
}

impl FromStr for NormalizationPolicy {
    type Err = AgreementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "binary" => Ok(NormalizationPolicy::Binary),
            "intensity" => Ok(NormalizationPolicy::Intensity),
            other => Err(AgreementError::InvalidPolicy(other.to_string())),
        }
    }
}

impl fmt::Display for NormalizationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalizer for converting raw rating tables to binary label tables
pub struct Normalizer;

impl Normalizer {
    /// Normalize every column of a source independently.
    ///
    /// Pure: the source is not modified. Use [`AnnotationSource::normalize`]
    /// to cache the result on the source.
    pub fn normalize(source: &AnnotationSource, policy: NormalizationPolicy) -> NormalizedTable {
        let columns: Vec<Vec<u8>> = source
            .columns()
            .iter()
            .map(|column| column.iter().map(|&raw| policy.label(raw)).collect())
            .collect();

        tracing::debug!(
            annotator = source.name(),
            policy = policy.as_str(),
            rows = source.rows(),
            "normalized ratings"
        );

        NormalizedTable::new(
            source.dimensions().clone(),
            policy,
            columns,
            source.rows(),
        )
    }

    /// Normalize using a policy given by name
    pub fn normalize_named(
        source: &AnnotationSource,
        policy: &str,
    ) -> Result<NormalizedTable, AgreementError> {
        let policy = policy.parse()?;
        Ok(Self::normalize(source, policy))
    }
}
