//! Pipeline orchestration
//!
//! Wires the stages together for a list of annotators:
//! load → normalize → pairwise compare. Agreement stays strictly pairwise;
//! a run over several annotators is just every unordered pair in input order.

use crate::agreement::AgreementCalculator;
use crate::config::AgreementConfig;
use crate::error::{AgreementError, Result};
use crate::loaders::{CsvDirectory, RatingLoader};
use crate::normalizer::NormalizationPolicy;
use crate::source::AnnotationSource;
use crate::types::{AgreementReport, DimensionSet};

/// Loads, normalizes and compares a group of annotators
pub struct AgreementPipeline<L: RatingLoader> {
    loader: L,
    dimensions: DimensionSet,
    policy: NormalizationPolicy,
    use_normalized: bool,
}

impl AgreementPipeline<CsvDirectory> {
    /// Pipeline reading CSV files from the configured data directory
    pub fn from_config(config: &AgreementConfig) -> Self {
        Self::new(CsvDirectory::new(&config.data_dir), config.dimensions.clone())
            .with_policy(config.policy)
            .with_normalized(config.use_normalized)
    }
}

impl<L: RatingLoader> AgreementPipeline<L> {
    /// Create a pipeline using the `binary` policy on normalized labels
    pub fn new(loader: L, dimensions: DimensionSet) -> Self {
        Self {
            loader,
            dimensions,
            policy: NormalizationPolicy::Binary,
            use_normalized: true,
        }
    }

    pub fn with_policy(mut self, policy: NormalizationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Compare raw values instead of normalized labels when `false`
    pub fn with_normalized(mut self, use_normalized: bool) -> Self {
        self.use_normalized = use_normalized;
        self
    }

    pub fn policy(&self) -> NormalizationPolicy {
        self.policy
    }

    pub fn uses_normalized(&self) -> bool {
        self.use_normalized
    }

    pub fn dimensions(&self) -> &DimensionSet {
        &self.dimensions
    }

    /// Load one annotator and normalize it with the pipeline's policy
    pub fn load(&self, annotator: &str) -> Result<AnnotationSource> {
        let mut source = self.loader.load(annotator, &self.dimensions)?;
        source.normalize(self.policy);
        Ok(source)
    }

    /// Load every annotator, failing on the first that cannot be loaded
    pub fn load_all<S: AsRef<str>>(&self, annotators: &[S]) -> Result<Vec<AnnotationSource>> {
        annotators.iter().map(|a| self.load(a.as_ref())).collect()
    }

    /// Compare every unordered pair of already loaded sources
    pub fn compare_pairs(&self, sources: &[AnnotationSource]) -> Result<Vec<AgreementReport>> {
        let mut reports = Vec::new();
        for (i, left) in sources.iter().enumerate() {
            for right in &sources[i + 1..] {
                reports.push(AgreementCalculator::compare(
                    left,
                    right,
                    self.use_normalized,
                )?);
            }
        }
        Ok(reports)
    }

    /// Load the annotators and compare every pair
    pub fn run<S: AsRef<str>>(&self, annotators: &[S]) -> Result<Vec<AgreementReport>> {
        if annotators.len() < 2 {
            return Err(AgreementError::InvalidConfig(
                "at least two annotators are required".to_string(),
            ));
        }

        let sources = self.load_all(annotators)?;
        let reports = self.compare_pairs(&sources)?;

        tracing::debug!(
            annotators = annotators.len(),
            pairs = reports.len(),
            policy = self.policy.as_str(),
            "pipeline finished"
        );

        Ok(reports)
    }
}
