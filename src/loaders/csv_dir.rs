//! CSV directory loader
//!
//! Resolves an annotator name to `{dir}/{name}.csv`, a headerless table with
//! columns in dimension order.

use crate::error::AgreementError;
use crate::source::AnnotationSource;
use crate::types::DimensionSet;
use std::fs;
use std::path::{Path, PathBuf};

use super::RatingLoader;

/// File extension of rating tables
pub const RATING_EXTENSION: &str = "csv";

/// Loader reading one CSV file per annotator from a directory
#[derive(Debug, Clone)]
pub struct CsvDirectory {
    root: PathBuf,
}

impl CsvDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of an annotator's rating file
    pub fn path_for(&self, annotator: &str) -> PathBuf {
        self.root.join(format!("{}.{}", annotator, RATING_EXTENSION))
    }

    /// Annotator names with a rating file in the directory, sorted
    pub fn annotators(&self) -> Result<Vec<String>, AgreementError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RATING_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

impl RatingLoader for CsvDirectory {
    fn load(
        &self,
        annotator: &str,
        dimensions: &DimensionSet,
    ) -> Result<AnnotationSource, AgreementError> {
        let path = self.path_for(annotator);
        let text = fs::read_to_string(&path).map_err(|e| {
            AgreementError::load(annotator, format!("{}: {}", path.display(), e))
        })?;
        AnnotationSource::from_csv_str(annotator, dimensions.clone(), &text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn make_temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("agreement-test-{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_load_from_directory() {
        let dir = make_temp_dir();
        fs::write(dir.join("alex.csv"), "0,1\n2,0\n").unwrap();
        fs::write(dir.join("sarina.csv"), "1,1\n0,0\n").unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let loader = CsvDirectory::new(&dir);
        let dims = DimensionSet::new(["joy", "fear"]).unwrap();

        let alex = loader.load("alex", &dims).unwrap();
        assert_eq!(alex.name(), "alex");
        assert_eq!(alex.column("joy").unwrap(), &[0.0, 2.0]);

        assert_eq!(loader.annotators().unwrap(), vec!["alex", "sarina"]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let dir = make_temp_dir();
        let loader = CsvDirectory::new(&dir);

        let result = loader.load("xanat", &DimensionSet::emotions());
        assert!(matches!(result, Err(AgreementError::Load { annotator, .. }) if annotator == "xanat"));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_wrong_arity_is_load_error() {
        let dir = make_temp_dir();
        fs::write(dir.join("alex.csv"), "0,1,2\n").unwrap();
        let loader = CsvDirectory::new(&dir);

        let result = loader.load("alex", &DimensionSet::emotions());
        assert!(matches!(result, Err(AgreementError::Load { .. })));

        fs::remove_dir_all(&dir).unwrap();
    }
}
