//! Annotation sources
//!
//! An [`AnnotationSource`] holds one annotator's raw ratings: one column per
//! dimension, one row per rated item. The raw table is immutable once built;
//! the only mutable state is the cached [`NormalizedTable`].

use crate::error::{AgreementError, Result};
use crate::normalizer::{NormalizationPolicy, Normalizer};
use crate::types::{DimensionSet, NormalizedTable};

/// One annotator's ratings
#[derive(Debug, Clone)]
pub struct AnnotationSource {
    name: String,
    dimensions: DimensionSet,
    /// Column-major raw values, one vector per dimension
    columns: Vec<Vec<f64>>,
    rows: usize,
    normalized: Option<NormalizedTable>,
}

impl AnnotationSource {
    /// Build a source from row-major ratings.
    ///
    /// Every row must have exactly one value per dimension, and every value
    /// must be finite and non-negative.
    pub fn from_rows(
        name: impl Into<String>,
        dimensions: DimensionSet,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self> {
        let name = name.into();
        let mut columns = vec![Vec::with_capacity(rows.len()); dimensions.len()];

        for (i, row) in rows.iter().enumerate() {
            if row.len() != dimensions.len() {
                return Err(AgreementError::load(
                    &name,
                    format!(
                        "row {} has {} columns, expected {}",
                        i + 1,
                        row.len(),
                        dimensions.len()
                    ),
                ));
            }
            for (col, &value) in columns.iter_mut().zip(row) {
                check_value(&name, i + 1, value)?;
                col.push(value);
            }
        }

        Ok(Self {
            name,
            dimensions,
            columns,
            rows: rows.len(),
            normalized: None,
        })
    }

    /// Parse a headerless, comma-separated table.
    ///
    /// Blank lines are skipped and cells may be wrapped in double quotes.
    /// An input with no rows is rejected.
    pub fn from_csv_str(
        name: impl Into<String>,
        dimensions: DimensionSet,
        text: &str,
    ) -> Result<Self> {
        let name = name.into();
        let mut rows = Vec::new();

        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let row = line
                .split(',')
                .map(|cell| {
                    let cell = unquote(cell.trim());
                    cell.parse::<f64>().map_err(|_| {
                        AgreementError::load(
                            &name,
                            format!("line {}: '{}' is not a number", line_no + 1, cell),
                        )
                    })
                })
                .collect::<Result<Vec<f64>>>()?;

            if row.len() != dimensions.len() {
                return Err(AgreementError::load(
                    &name,
                    format!(
                        "line {} has {} columns, expected {}",
                        line_no + 1,
                        row.len(),
                        dimensions.len()
                    ),
                ));
            }
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(AgreementError::load(&name, "no rating rows found"));
        }

        let source = Self::from_rows(name, dimensions, rows)?;
        tracing::debug!(
            annotator = %source.name,
            rows = source.rows,
            dimensions = source.dimensions.len(),
            "loaded ratings"
        );
        Ok(source)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimensions(&self) -> &DimensionSet {
        &self.dimensions
    }

    /// Number of rated items
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Raw values for one dimension
    pub fn column(&self, dimension: &str) -> Result<&[f64]> {
        let idx = self.dimensions.index_of(dimension)?;
        Ok(&self.columns[idx])
    }

    pub(crate) fn columns(&self) -> &[Vec<f64>] {
        &self.columns
    }

    /// Normalize the raw table and cache the result, replacing any earlier one
    pub fn normalize(&mut self, policy: NormalizationPolicy) -> &NormalizedTable {
        let table = Normalizer::normalize(self, policy);
        self.normalized.insert(table)
    }

    /// Normalize using a policy given by name
    pub fn normalize_named(&mut self, policy: &str) -> Result<&NormalizedTable> {
        let policy = policy.parse()?;
        Ok(self.normalize(policy))
    }

    /// Cached normalized table, if [`normalize`](Self::normalize) has been called
    pub fn normalized(&self) -> Option<&NormalizedTable> {
        self.normalized.as_ref()
    }
}

fn unquote(cell: &str) -> &str {
    cell.strip_prefix('"')
        .and_then(|c| c.strip_suffix('"'))
        .map_or(cell, str::trim)
}

fn check_value(name: &str, row: usize, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(AgreementError::load(
            name,
            format!("row {}: rating {} is not finite", row, value),
        ));
    }
    if value < 0.0 {
        return Err(AgreementError::load(
            name,
            format!("row {}: rating {} is negative", row, value),
        ));
    }
    Ok(())
}
