use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::PhoenixError;
use crate::types::{Money, Rate, Ratio};
use crate::PhoenixResult;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// How the driving performance of a product is derived from its underlyings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureKind {
    Single,
    WorstOf,
}

impl std::fmt::Display for StructureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StructureKind::Single => write!(f, "Single Underlying"),
            StructureKind::WorstOf => write!(f, "Worst-Of Basket"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Underlying {
    pub name: String,
    /// Strike fixing all performance ratios are measured against.
    pub initial_level: Money,
}

/// Contractual terms of a Phoenix autocallable note.
///
/// Constructed once per product and only ever borrowed by the engine, so a
/// single instance can be shared across any number of concurrent path
/// evaluations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductTerms {
    #[serde(rename = "structure_type")]
    pub structure_kind: StructureKind,
    pub underlyings: Vec<Underlying>,
    /// Strictly increasing; the last entry is the maturity observation.
    pub observation_dates: Vec<NaiveDate>,
    /// Coupon per observation as a fraction of nominal.
    pub coupon_rate: Rate,
    pub coupon_barrier_level: Ratio,
    pub autocall_barrier_level: Ratio,
    /// Checked at maturity only, against the final performance ratio.
    pub knock_in_barrier_level: Ratio,
    pub memory_coupon_enabled: bool,
    pub nominal: Money,
    /// Pass-through only; no conversion is ever applied.
    pub currency: String,
    /// First observation index at which the autocall condition is checked.
    #[serde(default)]
    pub first_autocall_date_index: usize,
}

impl ProductTerms {
    pub fn observation_count(&self) -> usize {
        self.observation_dates.len()
    }

    pub fn maturity_index(&self) -> usize {
        self.observation_dates.len().saturating_sub(1)
    }

    pub fn is_maturity(&self, date_index: usize) -> bool {
        date_index == self.maturity_index()
    }

    pub fn is_autocall_eligible(&self, date_index: usize) -> bool {
        date_index >= self.first_autocall_date_index
    }

    /// Cash amount of one regular coupon.
    pub fn coupon_amount(&self) -> PhoenixResult<Money> {
        self.coupon_rate.checked_mul(self.nominal).ok_or_else(|| {
            PhoenixError::configuration(
                "coupon_rate",
                format!(
                    "coupon of {} on nominal {} exceeds the decimal range",
                    self.coupon_rate, self.nominal
                ),
            )
        })
    }

    /// Guards the engine applies regardless of whether the readiness gate ran.
    ///
    /// These are the minimum conditions for the state machine to execute
    /// safely; business plausibility is not judged here.
    pub fn validate_configuration(&self) -> PhoenixResult<()> {
        if self.underlyings.is_empty() {
            return Err(PhoenixError::configuration(
                "underlyings",
                format!("{} product requires at least one underlying", self.structure_kind),
            ));
        }
        if self.structure_kind == StructureKind::Single && self.underlyings.len() != 1 {
            return Err(PhoenixError::configuration(
                "underlyings",
                format!(
                    "single-underlying product has {} underlyings",
                    self.underlyings.len()
                ),
            ));
        }
        for u in &self.underlyings {
            if u.initial_level <= Decimal::ZERO {
                return Err(PhoenixError::configuration(
                    format!("underlyings[{}].initial_level", u.name),
                    "must be positive",
                ));
            }
        }
        if self.observation_dates.is_empty() {
            return Err(PhoenixError::configuration(
                "observation_dates",
                "at least one observation date required",
            ));
        }
        if self.coupon_rate < Decimal::ZERO {
            return Err(PhoenixError::configuration(
                "coupon_rate",
                "must be non-negative",
            ));
        }
        if self.nominal <= Decimal::ZERO {
            return Err(PhoenixError::configuration("nominal", "must be positive"));
        }
        let barriers = [
            ("coupon_barrier_level", self.coupon_barrier_level),
            ("autocall_barrier_level", self.autocall_barrier_level),
            ("knock_in_barrier_level", self.knock_in_barrier_level),
        ];
        for (field, level) in barriers {
            if level <= Decimal::ZERO {
                return Err(PhoenixError::configuration(
                    field,
                    "barrier ratio must be positive",
                ));
            }
        }
        if self.first_autocall_date_index >= self.observation_dates.len() {
            return Err(PhoenixError::configuration(
                "first_autocall_date_index",
                format!(
                    "index {} is beyond the last observation ({})",
                    self.first_autocall_date_index,
                    self.maturity_index()
                ),
            ));
        }
        self.coupon_amount()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
