//! Report rendering and encoding
//!
//! Renders agreement reports as the one-line text summary and encodes batches
//! of reports into a JSON document carrying producer metadata.

use crate::error::Result;
use crate::normalizer::NormalizationPolicy;
use crate::types::{AgreementReport, DimensionScore, Exclusion};
use crate::{AGREEMENT_VERSION, PRODUCER_NAME};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Render a report as a single line of text.
///
/// ```text
/// Cohen's kappa score for agreement between alex and sarina: {'anger': 0.4, 'joy': 1.0}. Mean value: 0.70
/// ```
///
/// Fails with `NoValidDimensions` when the report retained nothing.
pub fn render(report: &AgreementReport) -> Result<String> {
    let mean = report.mean()?;
    let scores = report
        .scores
        .iter()
        .map(|s| format!("'{}': {}", s.dimension, format_score(s.kappa)))
        .collect::<Vec<_>>()
        .join(", ");

    Ok(format!(
        "Cohen's kappa score for agreement between {} and {}: {{{}}}. Mean value: {:.2}",
        report.left, report.right, scores, mean
    ))
}

/// Whole-valued scores keep one decimal place (`1.0`, `0.0`)
fn format_score(kappa: f64) -> String {
    if kappa.fract() == 0.0 {
        format!("{:.1}", kappa)
    } else {
        format!("{}", kappa)
    }
}

/// Producer metadata embedded in every encoded document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Producer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// One encoded comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedReport {
    pub left: String,
    pub right: String,
    pub scores: Vec<DimensionScore>,
    pub excluded: Vec<Exclusion>,
    /// Absent when no dimension was retained
    pub mean: Option<f64>,
}

/// JSON document for a batch of comparisons
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgreementDocument {
    pub producer: Producer,
    pub computed_at_utc: String,
    /// Normalization policy, or `None` when raw values were compared
    pub policy: Option<NormalizationPolicy>,
    pub reports: Vec<EncodedReport>,
}

/// Encoder for producing agreement documents
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn encode(
        &self,
        reports: &[AgreementReport],
        policy: Option<NormalizationPolicy>,
    ) -> AgreementDocument {
        AgreementDocument {
            producer: Producer {
                name: PRODUCER_NAME.to_string(),
                version: AGREEMENT_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            computed_at_utc: Utc::now().to_rfc3339(),
            policy,
            reports: reports
                .iter()
                .map(|r| EncodedReport {
                    left: r.left.clone(),
                    right: r.right.clone(),
                    scores: r.scores.clone(),
                    excluded: r.excluded.clone(),
                    mean: r.mean().ok(),
                })
                .collect(),
        }
    }

    /// Encode to a compact JSON string
    pub fn encode_to_json(
        &self,
        reports: &[AgreementReport],
        policy: Option<NormalizationPolicy>,
    ) -> Result<String> {
        Ok(serde_json::to_string(&self.encode(reports, policy))?)
    }

    /// Encode to an indented JSON string
    pub fn encode_to_json_pretty(
        &self,
        reports: &[AgreementReport],
        policy: Option<NormalizationPolicy>,
    ) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.encode(reports, policy))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AgreementError;
    use crate::types::ExclusionReason;
    use pretty_assertions::assert_eq;

    fn make_test_report() -> AgreementReport {
        AgreementReport {
            left: "alex".to_string(),
            right: "sarina".to_string(),
            scores: vec![
                DimensionScore {
                    dimension: "anger".to_string(),
                    kappa: 0.4,
                },
                DimensionScore {
                    dimension: "joy".to_string(),
                    kappa: 1.0,
                },
            ],
            excluded: vec![Exclusion {
                dimension: "fear".to_string(),
                reason: ExclusionReason::Degenerate,
            }],
        }
    }

    #[test]
    fn test_render_text() {
        let text = render(&make_test_report()).unwrap();
        assert_eq!(
            text,
            "Cohen's kappa score for agreement between alex and sarina: \
             {'anger': 0.4, 'joy': 1.0}. Mean value: 0.70"
        );
    }

    #[test]
    fn test_render_without_scores_fails() {
        let mut report = make_test_report();
        report.scores.clear();
        assert!(matches!(
            render(&report),
            Err(AgreementError::NoValidDimensions(_, _))
        ));
    }

    #[test]
    fn test_encode_document() {
        let encoder = ReportEncoder::with_instance_id("test-instance".to_string());
        let mut empty = make_test_report();
        empty.scores.clear();

        let doc = encoder.encode(
            &[make_test_report(), empty],
            Some(NormalizationPolicy::Binary),
        );

        assert_eq!(doc.producer.name, PRODUCER_NAME);
        assert_eq!(doc.producer.version, AGREEMENT_VERSION);
        assert_eq!(doc.producer.instance_id, "test-instance");
        assert_eq!(doc.reports.len(), 2);
        assert!((doc.reports[0].mean.unwrap() - 0.7).abs() < 1e-12);
        assert_eq!(doc.reports[1].mean, None);
    }

    #[test]
    fn test_encode_json_shape() {
        let encoder = ReportEncoder::with_instance_id("test-instance".to_string());
        let json = encoder
            .encode_to_json(&[make_test_report()], Some(NormalizationPolicy::Intensity))
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["policy"], "intensity");
        assert_eq!(value["producer"]["name"], PRODUCER_NAME);
        assert_eq!(value["reports"][0]["scores"][1]["dimension"], "joy");
        assert_eq!(value["reports"][0]["excluded"][0]["dimension"], "fear");
        assert_eq!(value["reports"][0]["excluded"][0]["reason"], "degenerate");
        assert!(value["computed_at_utc"].as_str().is_some());
    }
}
