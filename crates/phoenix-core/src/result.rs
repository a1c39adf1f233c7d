use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::PhoenixError;
use crate::terms::{ProductTerms, StructureKind};
use crate::types::{Money, Ratio};
use crate::PhoenixResult;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerminationKind {
    #[serde(rename = "AUTOCALL")]
    Autocall,
    #[serde(rename = "MATURITY_NO_KNOCKIN")]
    MaturityNoKnockIn,
    #[serde(rename = "MATURITY_KNOCKIN")]
    MaturityKnockIn,
}

impl std::fmt::Display for TerminationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminationKind::Autocall => write!(f, "Autocalled"),
            TerminationKind::MaturityNoKnockIn => write!(f, "Matured (capital protected)"),
            TerminationKind::MaturityKnockIn => write!(f, "Matured (knocked in)"),
        }
    }
}

/// Audit record for one evaluated observation date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationEvent {
    pub date_index: usize,
    pub observation_date: NaiveDate,
    pub performance_ratio: Ratio,
    pub driving_underlying: String,
    pub autocall_eligible: bool,
    pub coupon_barrier_met: bool,
    /// Total coupon cash paid on this date, memory release included.
    pub coupon_paid: Money,
    /// Portion of `coupon_paid` released from earlier missed dates.
    pub memory_released: Money,
    /// Missed coupons still outstanding after this date.
    pub memory_carried_amount: Money,
    /// Coupons permanently lost on this date.
    pub coupon_forfeited: Money,
    pub autocalled: bool,
    /// Only ever true on the maturity date.
    pub knocked_in: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub structure_kind: StructureKind,
    pub nominal: Money,
    pub currency: String,
    pub total_coupons: Money,
    /// Capital redemption in nominal units.
    pub final_payoff: Money,
    pub total_redemption: Money,
    pub terminated_by: TerminationKind,
    pub termination_date_index: usize,
    pub final_performance_ratio: Ratio,
    pub coupons_paid_count: usize,
    pub forfeited_coupons: Money,
    pub events: Vec<ObservationEvent>,
}

/// Terminal outcome decided by the state machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Redemption {
    pub terminated_by: TerminationKind,
    pub final_payoff: Money,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Collects the event stream of one run into a `CalculationResult`.
///
/// Sums what the events say and nothing more; every barrier decision has
/// already been taken by the state machine.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    events: Vec<ObservationEvent>,
}

impl ResultAggregator {
    pub fn with_capacity(observations: usize) -> Self {
        ResultAggregator {
            events: Vec::with_capacity(observations),
        }
    }

    pub fn record(&mut self, event: ObservationEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[ObservationEvent] {
        &self.events
    }

    pub fn finish(
        self,
        terms: &ProductTerms,
        redemption: Redemption,
    ) -> PhoenixResult<CalculationResult> {
        let last = self.events.last().ok_or_else(|| {
            PhoenixError::configuration("observation_dates", "no observation date was evaluated")
        })?;
        let termination_date_index = last.date_index;
        let final_performance_ratio = last.performance_ratio;

        let total_coupons =
            checked_total(self.events.iter().map(|e| e.coupon_paid), "total_coupons")?;
        let forfeited_coupons = checked_total(
            self.events.iter().map(|e| e.coupon_forfeited),
            "forfeited_coupons",
        )?;
        let total_redemption = total_coupons
            .checked_add(redemption.final_payoff)
            .ok_or_else(|| overflow("total_redemption"))?;
        let coupons_paid_count = self
            .events
            .iter()
            .filter(|e| e.coupon_paid > Decimal::ZERO)
            .count();

        Ok(CalculationResult {
            structure_kind: terms.structure_kind,
            nominal: terms.nominal,
            currency: terms.currency.clone(),
            total_coupons,
            final_payoff: redemption.final_payoff,
            total_redemption,
            terminated_by: redemption.terminated_by,
            termination_date_index,
            final_performance_ratio,
            coupons_paid_count,
            forfeited_coupons,
            events: self.events,
        })
    }
}

fn overflow(field: &str) -> PhoenixError {
    PhoenixError::configuration(field, "sum exceeds the decimal range")
}

fn checked_total(mut amounts: impl Iterator<Item = Money>, field: &str) -> PhoenixResult<Money> {
    amounts.try_fold(Decimal::ZERO, |acc, x| {
        acc.checked_add(x).ok_or_else(|| overflow(field))
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
