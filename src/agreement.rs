//! Pairwise agreement
//!
//! Computes Cohen's kappa per dimension between two annotators and applies the
//! report's validity filter: coefficients are rounded to two decimals and kept
//! only when they fall within [0, 1]. Dropped dimensions are recorded in the
//! report's exclusion list and never contribute to the mean.

use crate::error::{AgreementError, Result};
use crate::source::AnnotationSource;
use crate::types::{
    AgreementReport, DimensionScore, DimensionSet, Exclusion, ExclusionReason, NormalizedTable,
};

/// Cohen's kappa between two label sequences.
///
/// `kappa = (p_o - p_e) / (1 - p_e)`, with `p_o` the observed agreement and
/// `p_e` the agreement expected from each rater's marginal label counts.
///
/// Returns `None` when the statistic is undefined: sequences of different
/// length, empty sequences, or both raters giving one identical label to
/// every item (`p_e == 1`).
pub fn cohen_kappa<T: PartialEq>(left: &[T], right: &[T]) -> Option<f64> {
    if left.len() != right.len() || left.is_empty() {
        return None;
    }

    let mut categories: Vec<&T> = Vec::new();
    let mut left_counts: Vec<u64> = Vec::new();
    let mut right_counts: Vec<u64> = Vec::new();
    let mut agreements: u64 = 0;

    for (l, r) in left.iter().zip(right) {
        let li = category_index(&mut categories, &mut left_counts, &mut right_counts, l);
        left_counts[li] += 1;
        let ri = category_index(&mut categories, &mut left_counts, &mut right_counts, r);
        right_counts[ri] += 1;
        if li == ri {
            agreements += 1;
        }
    }

    // Both proportions scaled by n^2 so the degenerate check stays exact
    let n = left.len() as u64;
    let total = n * n;
    let observed = agreements * n;
    let expected: u64 = left_counts
        .iter()
        .zip(&right_counts)
        .map(|(l, r)| l * r)
        .sum();

    if expected == total {
        return None;
    }

    Some((observed as f64 - expected as f64) / (total - expected) as f64)
}

fn category_index<'a, T: PartialEq>(
    categories: &mut Vec<&'a T>,
    left_counts: &mut Vec<u64>,
    right_counts: &mut Vec<u64>,
    value: &'a T,
) -> usize {
    match categories.iter().position(|c| *c == value) {
        Some(idx) => idx,
        None => {
            categories.push(value);
            left_counts.push(0);
            right_counts.push(0);
            categories.len() - 1
        }
    }
}

/// Round a coefficient to two decimals, folding negative zero into zero.
///
/// Exact ties round to even (`0.125` → `0.12`).
pub fn round_kappa(kappa: f64) -> f64 {
    format!("{:.2}", kappa)
        .parse::<f64>()
        .map_or(kappa, |rounded| rounded + 0.0)
}

/// Calculator for pairwise agreement reports
pub struct AgreementCalculator;

impl AgreementCalculator {
    /// Compare two annotators over every dimension.
    ///
    /// With `use_normalized` both sources must already carry a normalized
    /// table; normalization is never performed here. Otherwise the raw values
    /// are compared as categorical labels.
    pub fn compare(
        left: &AnnotationSource,
        right: &AnnotationSource,
        use_normalized: bool,
    ) -> Result<AgreementReport> {
        check_shape(
            left.name(),
            left.dimensions(),
            left.rows(),
            right.name(),
            right.dimensions(),
            right.rows(),
        )?;

        if !use_normalized {
            return build_report(left.name(), right.name(), left.dimensions(), |dim| {
                Ok(cohen_kappa(left.column(dim)?, right.column(dim)?))
            });
        }

        let left_table = left
            .normalized()
            .ok_or_else(|| AgreementError::NotNormalized(left.name().to_string()))?;
        let right_table = right
            .normalized()
            .ok_or_else(|| AgreementError::NotNormalized(right.name().to_string()))?;

        Self::compare_tables(left.name(), left_table, right.name(), right_table)
    }

    /// Compare two normalized tables directly
    pub fn compare_tables(
        left_name: &str,
        left: &NormalizedTable,
        right_name: &str,
        right: &NormalizedTable,
    ) -> Result<AgreementReport> {
        check_shape(
            left_name,
            left.dimensions(),
            left.rows(),
            right_name,
            right.dimensions(),
            right.rows(),
        )?;

        build_report(left_name, right_name, left.dimensions(), |dim| {
            Ok(cohen_kappa(left.column(dim)?, right.column(dim)?))
        })
    }
}

fn check_shape(
    left_name: &str,
    left_dims: &DimensionSet,
    left_rows: usize,
    right_name: &str,
    right_dims: &DimensionSet,
    right_rows: usize,
) -> Result<()> {
    if left_dims != right_dims {
        return Err(AgreementError::DimensionMismatch(
            left_name.to_string(),
            right_name.to_string(),
        ));
    }
    if left_rows != right_rows {
        return Err(AgreementError::RowCountMismatch {
            left: left_name.to_string(),
            left_rows,
            right: right_name.to_string(),
            right_rows,
        });
    }
    Ok(())
}

fn build_report<F>(
    left: &str,
    right: &str,
    dimensions: &DimensionSet,
    mut kappa_for: F,
) -> Result<AgreementReport>
where
    F: FnMut(&str) -> Result<Option<f64>>,
{
    let mut scores = Vec::new();
    let mut excluded = Vec::new();

    for dim in dimensions.iter() {
        let reason = match kappa_for(dim)? {
            None => ExclusionReason::Degenerate,
            Some(kappa) => {
                let kappa = round_kappa(kappa);
                if (0.0..=1.0).contains(&kappa) {
                    scores.push(DimensionScore {
                        dimension: dim.to_string(),
                        kappa,
                    });
                    continue;
                }
                ExclusionReason::OutOfRange { kappa }
            }
        };

        tracing::debug!(
            left,
            right,
            dimension = dim,
            ?reason,
            "dimension excluded from agreement report"
        );
        excluded.push(Exclusion {
            dimension: dim.to_string(),
            reason,
        });
    }

    tracing::debug!(
        left,
        right,
        retained = scores.len(),
        excluded = excluded.len(),
        "computed agreement"
    );

    Ok(AgreementReport {
        left: left.to_string(),
        right: right.to_string(),
        scores,
        excluded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::NormalizationPolicy;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};
    use tracing::{span, Level};

    fn single_dim() -> DimensionSet {
        DimensionSet::new(["joy"]).unwrap()
    }

    fn make_source(name: &str, dims: &DimensionSet, rows: Vec<Vec<f64>>) -> AnnotationSource {
        AnnotationSource::from_rows(name, dims.clone(), rows).unwrap()
    }

    /// Deterministic 9-dimension ratings; `shift` perturbs some cells
    fn make_emotion_source(name: &str, shift: usize) -> AnnotationSource {
        let dims = DimensionSet::emotions();
        let rows = (0..12)
            .map(|item| {
                (0..dims.len())
                    .map(|d| {
                        // joy (column 2) is identical for every annotator
                        let base = ((item * 7 + d * 3) % 4) as f64;
                        if d != 2 && (item + d + shift) % 5 == 0 {
                            (base + 1.0) % 4.0
                        } else {
                            base
                        }
                    })
                    .collect()
            })
            .collect();
        AnnotationSource::from_rows(name, dims, rows).unwrap()
    }

    #[test]
    fn test_kappa_known_value() {
        let a = [1u8, 1, 0, 0, 1, 0];
        let b = [1u8, 0, 0, 0, 1, 1];
        // p_o = 4/6, p_e = 1/2
        let kappa = cohen_kappa(&a, &b).unwrap();
        assert!((kappa - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_kappa_categorical_raw_values() {
        let a = [0.0, 2.0, 1.0, 2.0];
        let b = [0.0, 2.0, 1.0, 1.0];
        // p_o = 3/4, p_e = 5/16
        let kappa = cohen_kappa(&a, &b).unwrap();
        assert!((kappa - 7.0 / 11.0).abs() < 1e-12);
    }

    #[test]
    fn test_kappa_degenerate_cases() {
        assert_eq!(cohen_kappa(&[0u8, 0, 0], &[0u8, 0, 0]), None);
        assert_eq!(cohen_kappa::<u8>(&[], &[]), None);
        assert_eq!(cohen_kappa(&[0u8, 1], &[0u8]), None);

        // One constant rater is still defined
        assert_eq!(cohen_kappa(&[0u8, 0, 0, 0], &[0u8, 1, 0, 1]), Some(0.0));
        // Both constant on different labels
        assert_eq!(cohen_kappa(&[0u8, 0], &[1u8, 1]), Some(0.0));
    }

    #[test]
    fn test_round_kappa() {
        assert_eq!(round_kappa(0.33333), 0.33);
        assert_eq!(round_kappa(0.636), 0.64);
        let zero = round_kappa(-0.004);
        assert_eq!(zero, 0.0);
        assert!(zero.is_sign_positive());
    }

    #[test]
    fn test_round_kappa_ties_to_even() {
        assert_eq!(round_kappa(0.125), 0.12);
        assert_eq!(round_kappa(0.375), 0.38);
        assert_eq!(round_kappa(0.625), 0.62);
    }

    #[test]
    fn test_exact_tie_reported_rounded_to_even() {
        let dims = single_dim();
        let mut a = make_source(
            "a",
            &dims,
            vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]
                .into_iter()
                .map(|v| vec![v])
                .collect(),
        );
        let mut b = make_source(
            "b",
            &dims,
            vec![0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0]
                .into_iter()
                .map(|v| vec![v])
                .collect(),
        );
        a.normalize(NormalizationPolicy::Binary);
        b.normalize(NormalizationPolicy::Binary);

        // p_o = 3/7, p_e = 17/49, kappa = 4/32
        let kappa = cohen_kappa(
            a.normalized().unwrap().column("joy").unwrap(),
            b.normalized().unwrap().column("joy").unwrap(),
        )
        .unwrap();
        assert_eq!(kappa, 0.125);

        let report = AgreementCalculator::compare(&a, &b, true).unwrap();
        assert_eq!(report.score("joy"), Some(0.12));
        assert_eq!(
            crate::report::render(&report).unwrap(),
            "Cohen's kappa score for agreement between a and b: {'joy': 0.12}. Mean value: 0.12"
        );
    }

    /// Records the level of every event emitted while installed
    struct LevelRecorder(Arc<Mutex<Vec<Level>>>);

    impl tracing::Subscriber for LevelRecorder {
        fn enabled(&self, _: &tracing::Metadata<'_>) -> bool {
            true
        }
        fn new_span(&self, _: &span::Attributes<'_>) -> span::Id {
            span::Id::from_u64(1)
        }
        fn record(&self, _: &span::Id, _: &span::Record<'_>) {}
        fn record_follows_from(&self, _: &span::Id, _: &span::Id) {}
        fn event(&self, event: &tracing::Event<'_>) {
            self.0.lock().unwrap().push(*event.metadata().level());
        }
        fn enter(&self, _: &span::Id) {}
        fn exit(&self, _: &span::Id) {}
    }

    #[test]
    fn test_excluded_dimensions_do_not_warn() {
        let dims = single_dim();
        let mut a = make_source("a", &dims, vec![vec![0.0], vec![0.0], vec![0.0]]);
        let mut b = make_source("b", &dims, vec![vec![0.0], vec![0.0], vec![0.0]]);
        a.normalize(NormalizationPolicy::Binary);
        b.normalize(NormalizationPolicy::Binary);

        let levels = Arc::new(Mutex::new(Vec::new()));
        let report = tracing::subscriber::with_default(LevelRecorder(levels.clone()), || {
            AgreementCalculator::compare(&a, &b, true).unwrap()
        });

        assert_eq!(report.excluded[0].reason, ExclusionReason::Degenerate);
        let levels = levels.lock().unwrap();
        assert!(levels.iter().all(|l| *l > Level::WARN), "{:?}", levels);
    }

    #[test]
    fn test_zero_agreement_scenario() {
        let dims = single_dim();
        let mut a = make_source("a", &dims, vec![vec![0.0], vec![2.0], vec![0.0]]);
        let mut b = make_source("b", &dims, vec![vec![1.0], vec![0.0], vec![3.0]]);
        a.normalize(NormalizationPolicy::Binary);
        b.normalize(NormalizationPolicy::Binary);

        assert_eq!(a.normalized().unwrap().column("joy").unwrap(), &[0, 1, 0]);
        assert_eq!(b.normalized().unwrap().column("joy").unwrap(), &[1, 0, 1]);

        // p_o = 0, p_e = (2*1 + 1*2) / 9, kappa = (0 - 4/9) / (5/9)
        let kappa = cohen_kappa(
            a.normalized().unwrap().column("joy").unwrap(),
            b.normalized().unwrap().column("joy").unwrap(),
        )
        .unwrap();
        assert!((kappa - (-0.8)).abs() < 1e-12);

        let report = AgreementCalculator::compare(&a, &b, true).unwrap();
        assert!(report.scores.is_empty());
        assert_eq!(
            report.excluded,
            vec![Exclusion {
                dimension: "joy".to_string(),
                reason: ExclusionReason::OutOfRange { kappa: -0.8 },
            }]
        );
        assert!(matches!(
            report.mean(),
            Err(AgreementError::NoValidDimensions(_, _))
        ));
    }

    #[test]
    fn test_self_comparison_is_perfect() {
        let mut a = make_emotion_source("alex", 0);
        a.normalize(NormalizationPolicy::Binary);

        let report = AgreementCalculator::compare(&a, &a, true).unwrap();
        for score in &report.scores {
            assert_eq!(score.kappa, 1.0, "{}", score.dimension);
        }
        for exclusion in &report.excluded {
            assert_eq!(exclusion.reason, ExclusionReason::Degenerate);
        }
        assert_eq!(report.mean().unwrap(), 1.0);
    }

    #[test]
    fn test_comparison_is_symmetric() {
        let mut a = make_emotion_source("alex", 0);
        let mut b = make_emotion_source("sarina", 2);
        a.normalize(NormalizationPolicy::Intensity);
        b.normalize(NormalizationPolicy::Intensity);

        for use_normalized in [true, false] {
            let ab = AgreementCalculator::compare(&a, &b, use_normalized).unwrap();
            let ba = AgreementCalculator::compare(&b, &a, use_normalized).unwrap();
            assert_eq!(ab.scores, ba.scores);
            assert_eq!(ab.excluded, ba.excluded);
            assert_eq!(ab.mean().unwrap(), ba.mean().unwrap());
            assert_eq!(ab.left, "alex");
            assert_eq!(ba.left, "sarina");
        }
    }

    #[test]
    fn test_three_annotator_scenario() {
        let mut sources = vec![
            make_emotion_source("alex", 0),
            make_emotion_source("sarina", 1),
            make_emotion_source("xanat", 3),
        ];
        for source in &mut sources {
            source.normalize(NormalizationPolicy::Binary);
        }

        for i in 0..sources.len() {
            for j in (i + 1)..sources.len() {
                let report = AgreementCalculator::compare(&sources[i], &sources[j], true).unwrap();
                assert!(report.scores.len() <= 9);
                assert_eq!(report.scores.len() + report.excluded.len(), 9);
                assert_eq!(report.score("joy"), Some(1.0));

                let mean = report.mean().unwrap();
                assert!((0.0..=1.0).contains(&mean));

                let expected: f64 = report.scores.iter().map(|s| s.kappa).sum::<f64>()
                    / report.scores.len() as f64;
                assert_eq!(mean, expected);

                for score in &report.scores {
                    assert!((0.0..=1.0).contains(&score.kappa));
                }
            }
        }
    }

    #[test]
    fn test_requires_normalization() {
        let mut a = make_emotion_source("alex", 0);
        let b = make_emotion_source("sarina", 1);
        a.normalize(NormalizationPolicy::Binary);

        let err = AgreementCalculator::compare(&a, &b, true).unwrap_err();
        assert!(matches!(err, AgreementError::NotNormalized(name) if name == "sarina"));
        // Compare never normalizes as a side effect
        assert!(b.normalized().is_none());
    }

    #[test]
    fn test_row_count_mismatch() {
        let dims = single_dim();
        let a = make_source("a", &dims, vec![vec![0.0], vec![1.0], vec![1.0]]);
        let b = make_source("b", &dims, vec![vec![0.0], vec![1.0]]);

        let err = AgreementCalculator::compare(&a, &b, false).unwrap_err();
        assert!(matches!(
            err,
            AgreementError::RowCountMismatch {
                left_rows: 3,
                right_rows: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_dimension_mismatch() {
        let a = make_source("a", &single_dim(), vec![vec![0.0]]);
        let other = DimensionSet::new(["fear"]).unwrap();
        let b = make_source("b", &other, vec![vec![0.0]]);

        let err = AgreementCalculator::compare(&a, &b, false).unwrap_err();
        assert!(matches!(err, AgreementError::DimensionMismatch(_, _)));
    }

    #[test]
    fn test_raw_comparison_uses_raw_values() {
        let dims = single_dim();
        let a = make_source(
            "a",
            &dims,
            vec![vec![0.0], vec![2.0], vec![1.0], vec![2.0]],
        );
        let b = make_source(
            "b",
            &dims,
            vec![vec![0.0], vec![2.0], vec![1.0], vec![1.0]],
        );

        let report = AgreementCalculator::compare(&a, &b, false).unwrap();
        assert_eq!(report.score("joy"), Some(0.64));
    }
}
