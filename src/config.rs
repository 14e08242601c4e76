//! Run configuration
//!
//! Loaded from a JSON file; every field is optional and falls back to the
//! defaults below. Command-line flags override file values.

use crate::error::{AgreementError, Result};
use crate::normalizer::NormalizationPolicy;
use crate::types::DimensionSet;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for an agreement run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgreementConfig {
    /// Directory holding one `{annotator}.csv` per annotator
    pub data_dir: PathBuf,
    /// Column schema shared by every rating table
    pub dimensions: DimensionSet,
    pub policy: NormalizationPolicy,
    /// Compare normalized labels (`true`) or raw values (`false`)
    pub use_normalized: bool,
    /// Annotators to compare pairwise, in order
    pub annotators: Vec<String>,
}

impl Default for AgreementConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            dimensions: DimensionSet::emotions(),
            policy: NormalizationPolicy::Binary,
            use_normalized: true,
            annotators: Vec::new(),
        }
    }
}

impl AgreementConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;

        // Unknown policy names are a policy error, not a JSON error
        if let Some(policy) = value.get("policy").and_then(|p| p.as_str()) {
            policy.parse::<NormalizationPolicy>()?;
        }

        let config: Self = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Reject annotator lists that cannot be compared
    pub fn validate(&self) -> Result<()> {
        for (i, name) in self.annotators.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(AgreementError::InvalidConfig(format!(
                    "annotator {} has an empty name",
                    i
                )));
            }
            if self.annotators[..i].contains(name) {
                return Err(AgreementError::InvalidConfig(format!(
                    "annotator '{}' listed twice",
                    name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_from_empty_object() {
        let config = AgreementConfig::from_json("{}").unwrap();
        assert_eq!(config, AgreementConfig::default());
        assert_eq!(config.dimensions.len(), 9);
        assert!(config.use_normalized);
    }

    #[test]
    fn test_full_config() {
        let config = AgreementConfig::from_json(
            r#"{
                "data_dir": "ratings",
                "dimensions": ["joy", "fear"],
                "policy": "intensity",
                "use_normalized": false,
                "annotators": ["alex", "sarina", "xanat"]
            }"#,
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("ratings"));
        assert_eq!(config.dimensions.names(), &["joy", "fear"]);
        assert_eq!(config.policy, NormalizationPolicy::Intensity);
        assert!(!config.use_normalized);
        assert_eq!(config.annotators.len(), 3);
    }

    #[test]
    fn test_round_trip() {
        let mut config = AgreementConfig::default();
        config.annotators = vec!["alex".to_string(), "sarina".to_string()];
        let json = config.to_json().unwrap();
        assert_eq!(AgreementConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            AgreementConfig::from_json(r#"{"policy": "ordinal"}"#),
            Err(AgreementError::InvalidPolicy(p)) if p == "ordinal"
        ));
        assert!(matches!(
            AgreementConfig::from_json(r#"{"policy": 3}"#),
            Err(AgreementError::Json(_))
        ));
        assert!(AgreementConfig::from_json(r#"{"dimensions": []}"#).is_err());
        assert!(matches!(
            AgreementConfig::from_json(r#"{"annotators": ["alex", "alex"]}"#),
            Err(AgreementError::InvalidConfig(_))
        ));
    }
}
