//! Rating loaders
//!
//! This module provides loaders that resolve an annotator name to a raw rating
//! table and build an [`AnnotationSource`] from it.

mod csv_dir;
mod memory;

pub use csv_dir::CsvDirectory;
pub use memory::InMemoryLoader;

use crate::error::AgreementError;
use crate::source::AnnotationSource;
use crate::types::DimensionSet;

/// Trait for rating loaders
pub trait RatingLoader {
    /// Load one annotator's ratings, conforming to the given dimension set
    fn load(
        &self,
        annotator: &str,
        dimensions: &DimensionSet,
    ) -> Result<AnnotationSource, AgreementError>;
}
