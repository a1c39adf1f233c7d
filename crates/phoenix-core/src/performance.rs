use rust_decimal::Decimal;

use crate::error::PhoenixError;
use crate::path::{AlignedPath, PricePath};
use crate::terms::{ProductTerms, StructureKind, Underlying};
use crate::types::{Money, Ratio};
use crate::PhoenixResult;

/// Performance of a product on one observation date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Performance<'a> {
    pub ratio: Ratio,
    /// Underlying whose ratio drives the product on this date.
    pub driving_underlying: &'a str,
}

/// Strategy turning per-underlying price ratios into the single ratio every
/// barrier is compared against. This is the only point where single and
/// worst-of products differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceEvaluator {
    Single,
    WorstOf,
}

impl PerformanceEvaluator {
    pub fn for_structure(kind: StructureKind) -> Self {
        match kind {
            StructureKind::Single => PerformanceEvaluator::Single,
            StructureKind::WorstOf => PerformanceEvaluator::WorstOf,
        }
    }

    pub fn evaluate<'a>(
        &self,
        path: &AlignedPath<'a>,
        date_index: usize,
    ) -> PhoenixResult<Performance<'a>> {
        let mut series = path.iter();
        let (first, prices) = series.next().ok_or_else(|| {
            PhoenixError::malformed_path(Some(date_index), "price_path", "no price series")
        })?;
        let mut worst = Performance {
            ratio: underlying_ratio(first, prices, date_index)?,
            driving_underlying: first.name.as_str(),
        };

        match self {
            PerformanceEvaluator::Single => {
                if path.underlying_count() != 1 {
                    return Err(PhoenixError::malformed_path(
                        Some(date_index),
                        "price_path",
                        format!(
                            "single-underlying evaluation given {} series",
                            path.underlying_count()
                        ),
                    ));
                }
            }
            PerformanceEvaluator::WorstOf => {
                // Every series is checked even once a lower ratio is known.
                for (u, prices) in series {
                    let ratio = underlying_ratio(u, prices, date_index)?;
                    if ratio < worst.ratio {
                        worst = Performance {
                            ratio,
                            driving_underlying: u.name.as_str(),
                        };
                    }
                }
            }
        }

        Ok(worst)
    }
}

fn underlying_ratio(u: &Underlying, prices: &[Money], date_index: usize) -> PhoenixResult<Ratio> {
    let price = prices.get(date_index).copied().ok_or_else(|| {
        PhoenixError::malformed_path(
            Some(date_index),
            u.name.as_str(),
            format!("series has only {} prices", prices.len()),
        )
    })?;
    if price <= Decimal::ZERO {
        return Err(PhoenixError::malformed_path(
            Some(date_index),
            u.name.as_str(),
            format!("non-positive price {price}"),
        ));
    }
    if u.initial_level <= Decimal::ZERO {
        return Err(PhoenixError::configuration(
            format!("underlyings[{}].initial_level", u.name),
            "must be positive",
        ));
    }
    price.checked_div(u.initial_level).ok_or_else(|| {
        PhoenixError::malformed_path(
            Some(date_index),
            u.name.as_str(),
            format!(
                "price {price} over initial level {} exceeds the decimal range",
                u.initial_level
            ),
        )
    })
}

/// Driving performance ratio of `terms` on `date_index` of `price_path`.
pub fn performance_ratio(
    terms: &ProductTerms,
    price_path: &PricePath,
    date_index: usize,
) -> PhoenixResult<Ratio> {
    let aligned = price_path.align(terms)?;
    let evaluator = PerformanceEvaluator::for_structure(terms.structure_kind);
    Ok(evaluator.evaluate(&aligned, date_index)?.ratio)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
