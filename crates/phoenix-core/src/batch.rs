use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::engine::calculate_phoenix;
use crate::error::PhoenixError;
use crate::path::PricePath;
use crate::result::{CalculationResult, TerminationKind};
use crate::terms::ProductTerms;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::PhoenixResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Outcome statistics of one product across many paths. Undiscounted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub path_count: usize,
    pub autocall_probability: Rate,
    pub knock_in_probability: Rate,
    pub maturity_no_knock_in_probability: Rate,
    pub expected_coupons: Money,
    pub expected_final_payoff: Money,
    pub expected_total_redemption: Money,
    pub expected_termination_index: Decimal,
    /// Number of paths autocalled at each observation index.
    pub autocall_distribution: Vec<usize>,
    pub worst_final_payoff: Money,
    pub best_total_redemption: Money,
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Evaluate every path independently against the same terms, preserving
/// input order. Runs on the rayon pool when built with `parallel`.
pub fn calculate_batch(
    terms: &ProductTerms,
    paths: &[PricePath],
) -> Vec<PhoenixResult<CalculationResult>> {
    evaluate_all(terms, paths)
}

#[cfg(feature = "parallel")]
fn evaluate_all(
    terms: &ProductTerms,
    paths: &[PricePath],
) -> Vec<PhoenixResult<CalculationResult>> {
    paths
        .par_iter()
        .map(|path| calculate_phoenix(terms, path))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn evaluate_all(
    terms: &ProductTerms,
    paths: &[PricePath],
) -> Vec<PhoenixResult<CalculationResult>> {
    paths
        .iter()
        .map(|path| calculate_phoenix(terms, path))
        .collect()
}

/// Prefix the error's reason with the index of the path that produced it.
fn tag_path(err: PhoenixError, path_index: usize) -> PhoenixError {
    match err {
        PhoenixError::Schema { field, reason } => PhoenixError::Schema {
            field,
            reason: format!("path {path_index}: {reason}"),
        },
        PhoenixError::MalformedPath {
            date_index,
            underlying,
            reason,
        } => PhoenixError::MalformedPath {
            date_index,
            underlying,
            reason: format!("path {path_index}: {reason}"),
        },
        PhoenixError::Configuration { field, reason } => PhoenixError::Configuration {
            field,
            reason: format!("path {path_index}: {reason}"),
        },
        PhoenixError::SerializationError(msg) => {
            PhoenixError::SerializationError(format!("path {path_index}: {msg}"))
        }
    }
}

fn summarize(
    terms: &ProductTerms,
    results: &[CalculationResult],
) -> PhoenixResult<BatchSummary> {
    let n = Decimal::from(results.len());
    let mut autocalls = 0usize;
    let mut knock_ins = 0usize;
    let mut protected = 0usize;
    let mut sum_coupons = Decimal::ZERO;
    let mut sum_payoff = Decimal::ZERO;
    let mut sum_index = Decimal::ZERO;
    let mut autocall_distribution = vec![0usize; terms.observation_count()];
    let mut worst_final_payoff = terms.nominal;
    let mut best_total_redemption = Decimal::ZERO;

    for r in results {
        match r.terminated_by {
            TerminationKind::Autocall => {
                autocalls += 1;
                if let Some(slot) = autocall_distribution.get_mut(r.termination_date_index) {
                    *slot += 1;
                }
            }
            TerminationKind::MaturityKnockIn => knock_ins += 1,
            TerminationKind::MaturityNoKnockIn => protected += 1,
        }
        sum_coupons = accumulate(sum_coupons, r.total_coupons, "expected_coupons")?;
        sum_payoff = accumulate(sum_payoff, r.final_payoff, "expected_final_payoff")?;
        sum_index += Decimal::from(r.termination_date_index);
        worst_final_payoff = worst_final_payoff.min(r.final_payoff);
        best_total_redemption = best_total_redemption.max(r.total_redemption);
    }

    let sum_redemption = accumulate(sum_coupons, sum_payoff, "expected_total_redemption")?;

    Ok(BatchSummary {
        path_count: results.len(),
        autocall_probability: Decimal::from(autocalls) / n,
        knock_in_probability: Decimal::from(knock_ins) / n,
        maturity_no_knock_in_probability: Decimal::from(protected) / n,
        expected_coupons: sum_coupons / n,
        expected_final_payoff: sum_payoff / n,
        expected_total_redemption: sum_redemption / n,
        expected_termination_index: sum_index / n,
        autocall_distribution,
        worst_final_payoff,
        best_total_redemption,
    })
}

fn accumulate(total: Money, amount: Money, field: &str) -> PhoenixResult<Money> {
    total.checked_add(amount).ok_or_else(|| {
        PhoenixError::configuration(field, "sum across paths exceeds the decimal range")
    })
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Evaluate all paths and report outcome statistics. The first failing path
/// fails the whole batch.
pub fn summarize_batch(
    terms: &ProductTerms,
    paths: &[PricePath],
) -> PhoenixResult<ComputationOutput<BatchSummary>> {
    let start = Instant::now();

    if paths.is_empty() {
        return Err(PhoenixError::configuration(
            "paths",
            "at least one price path required",
        ));
    }

    let results = calculate_batch(terms, paths)
        .into_iter()
        .enumerate()
        .map(|(i, r)| r.map_err(|e| tag_path(e, i)))
        .collect::<PhoenixResult<Vec<_>>>()?;

    let summary = summarize(terms, &results)?;

    let mut warnings = Vec::new();
    if summary.path_count < 100 {
        warnings.push(format!(
            "Only {} paths evaluated; statistics are indicative",
            summary.path_count
        ));
    }
    if summary.knock_in_probability > dec!(0.5) {
        warnings.push("Knock-in occurs on more than half of the paths".into());
    }
    if summary.autocall_probability.is_zero() {
        warnings.push("No path autocalled".into());
    }

    let assumptions = serde_json::json!({
        "path_count": summary.path_count,
        "observation_count": terms.observation_count(),
        "discounting": "none",
        "parallel": cfg!(feature = "parallel"),
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Path-by-path Phoenix evaluation with outcome averaging",
        &assumptions,
        warnings,
        elapsed,
        summary,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terms::{StructureKind, Underlying};
    use chrono::NaiveDate;

    fn terms() -> ProductTerms {
        ProductTerms {
            structure_kind: StructureKind::Single,
            underlyings: vec![Underlying {
                name: "FTSE".into(),
                initial_level: dec!(100),
            }],
            observation_dates: (1..=3)
                .map(|m| NaiveDate::from_ymd_opt(2025, m, 10).unwrap())
                .collect(),
            coupon_rate: dec!(0.1),
            coupon_barrier_level: dec!(0.8),
            autocall_barrier_level: dec!(1.0),
            knock_in_barrier_level: dec!(0.6),
            memory_coupon_enabled: false,
            nominal: dec!(100),
            currency: "GBP".into(),
            first_autocall_date_index: 0,
        }
    }

    fn paths() -> Vec<PricePath> {
        vec![
            // autocall at 0
            PricePath::single(vec![dec!(105), dec!(90), dec!(90)]),
            // autocall at 2
            PricePath::single(vec![dec!(90), dec!(95), dec!(100)]),
            // knock-in
            PricePath::single(vec![dec!(90), dec!(70), dec!(50)]),
            // protected at maturity
            PricePath::single(vec![dec!(85), dec!(75), dec!(70)]),
        ]
    }

    #[test]
    fn test_batch_preserves_order() {
        let results = calculate_batch(&terms(), &paths());
        let kinds: Vec<TerminationKind> = results
            .into_iter()
            .map(|r| r.unwrap().terminated_by)
            .collect();
        assert_eq!(
            kinds,
            vec![
                TerminationKind::Autocall,
                TerminationKind::Autocall,
                TerminationKind::MaturityKnockIn,
                TerminationKind::MaturityNoKnockIn,
            ]
        );
    }

    #[test]
    fn test_summary_statistics() {
        let out = summarize_batch(&terms(), &paths()).unwrap();
        let s = out.result;
        assert_eq!(s.path_count, 4);
        assert_eq!(s.autocall_probability, dec!(0.5));
        assert_eq!(s.knock_in_probability, dec!(0.25));
        assert_eq!(s.maturity_no_knock_in_probability, dec!(0.25));
        assert_eq!(s.autocall_distribution, vec![1, 0, 1]);
        // coupons: 10, 30, 10, 10
        assert_eq!(s.expected_coupons, dec!(15));
        // payoffs: 100, 100, 50, 100
        assert_eq!(s.expected_final_payoff, dec!(87.5));
        assert_eq!(s.expected_total_redemption, dec!(102.5));
        assert_eq!(s.expected_termination_index, dec!(1.5));
        assert_eq!(s.worst_final_payoff, dec!(50));
        assert_eq!(s.best_total_redemption, dec!(130));
        assert!(out.warnings.iter().any(|w| w.contains("Only 4 paths")));
    }

    #[test]
    fn test_failing_path_fails_batch_with_index() {
        let mut ps = paths();
        ps.push(PricePath::single(vec![dec!(90), dec!(90)]));
        let err = summarize_batch(&terms(), &ps).unwrap_err();
        assert!(err.is_malformed_path());
        assert!(err.to_string().contains("path 4"));
    }

    #[test]
    fn test_sum_beyond_decimal_range_fails_batch() {
        let mut t = terms();
        t.nominal = dec!(50_000_000_000_000_000_000_000_000_000);
        t.coupon_rate = Decimal::ZERO;
        let ps = vec![
            PricePath::single(vec![dec!(105), dec!(90), dec!(90)]),
            PricePath::single(vec![dec!(110), dec!(90), dec!(90)]),
        ];
        assert!(calculate_batch(&t, &ps).iter().all(Result::is_ok));
        let err = summarize_batch(&t, &ps).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("expected_final_payoff"));
    }

    #[test]
    fn test_empty_batch_rejected() {
        assert!(summarize_batch(&terms(), &[]).unwrap_err().is_configuration());
    }
}
