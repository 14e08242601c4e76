//! In-memory loader
//!
//! Holds CSV text keyed by annotator name. Useful when ratings are embedded
//! or already fetched by the caller.

use crate::error::AgreementError;
use crate::source::AnnotationSource;
use crate::types::DimensionSet;
use std::collections::HashMap;

use super::RatingLoader;

/// Loader backed by a map of annotator name to CSV text
#[derive(Debug, Clone, Default)]
pub struct InMemoryLoader {
    tables: HashMap<String, String>,
}

impl InMemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) an annotator's CSV text
    pub fn insert(&mut self, annotator: impl Into<String>, csv: impl Into<String>) {
        self.tables.insert(annotator.into(), csv.into());
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with(mut self, annotator: impl Into<String>, csv: impl Into<String>) -> Self {
        self.insert(annotator, csv);
        self
    }
}

impl RatingLoader for InMemoryLoader {
    fn load(
        &self,
        annotator: &str,
        dimensions: &DimensionSet,
    ) -> Result<AnnotationSource, AgreementError> {
        let text = self
            .tables
            .get(annotator)
            .ok_or_else(|| AgreementError::load(annotator, "no ratings registered"))?;
        AnnotationSource::from_csv_str(annotator, dimensions.clone(), text)
    }
}
