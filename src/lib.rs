//! Annotator Agreement - chance-corrected agreement for multi-dimensional emotion ratings
//!
//! Several annotators rate the same items along a fixed set of emotion
//! dimensions. This crate measures how consistently pairs of annotators agree,
//! per dimension, through a deterministic pipeline: rating loading →
//! normalization to binary labels → pairwise Cohen's kappa → report.
//!
//! ## Modules
//!
//! - **Sources & loaders**: one annotator's raw rating table, loaded by name
//! - **Normalizer**: `binary` / `intensity` thresholding policies
//! - **Agreement**: per-dimension kappa with the [0, 1] validity filter
//! - **Report**: text rendering and JSON encoding of results

pub mod agreement;
pub mod config;
pub mod error;
pub mod loaders;
pub mod normalizer;
pub mod pipeline;
pub mod report;
pub mod source;
pub mod types;

pub use agreement::{cohen_kappa, AgreementCalculator};
pub use config::AgreementConfig;
pub use error::{AgreementError, Result};
pub use loaders::{CsvDirectory, InMemoryLoader, RatingLoader};
pub use normalizer::{NormalizationPolicy, Normalizer};
pub use pipeline::AgreementPipeline;
pub use report::{render, ReportEncoder};
pub use source::AnnotationSource;
pub use types::{AgreementReport, DimensionSet, NormalizedTable};

/// Crate version embedded in encoded reports
pub const AGREEMENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for encoded reports
pub const PRODUCER_NAME: &str = "annotator-agreement";
