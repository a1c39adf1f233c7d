use rust_decimal::Decimal;

use crate::error::PhoenixError;
use crate::path::PricePath;
use crate::performance::{Performance, PerformanceEvaluator};
use crate::result::{
    CalculationResult, ObservationEvent, Redemption, ResultAggregator, TerminationKind,
};
use crate::terms::ProductTerms;
use crate::types::Money;
use crate::PhoenixResult;

// ---------------------------------------------------------------------------
// States
// ---------------------------------------------------------------------------

/// Lifecycle of a note along one path. `Active` is the only non-terminal
/// state and is never re-entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhoenixState {
    Active,
    Autocalled,
    MaturedNoKnockIn,
    MaturedKnockIn,
}

impl PhoenixState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PhoenixState::Active)
    }

    pub fn termination_kind(&self) -> Option<TerminationKind> {
        match self {
            PhoenixState::Active => None,
            PhoenixState::Autocalled => Some(TerminationKind::Autocall),
            PhoenixState::MaturedNoKnockIn => Some(TerminationKind::MaturityNoKnockIn),
            PhoenixState::MaturedKnockIn => Some(TerminationKind::MaturityKnockIn),
        }
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Walks observation dates in order, applying autocall, coupon, memory and
/// knock-in rules. All barrier comparisons are `>=`.
#[derive(Debug)]
pub struct PhoenixStateMachine<'a> {
    terms: &'a ProductTerms,
    state: PhoenixState,
    carry: Money,
    final_payoff: Money,
    aggregator: ResultAggregator,
}

impl<'a> PhoenixStateMachine<'a> {
    pub fn new(terms: &'a ProductTerms) -> Self {
        PhoenixStateMachine {
            terms,
            state: PhoenixState::Active,
            carry: Decimal::ZERO,
            final_payoff: Decimal::ZERO,
            aggregator: ResultAggregator::with_capacity(terms.observation_count()),
        }
    }

    pub fn state(&self) -> PhoenixState {
        self.state
    }

    /// Memory coupons currently outstanding.
    pub fn carry(&self) -> Money {
        self.carry
    }

    pub fn events(&self) -> &[ObservationEvent] {
        self.aggregator.events()
    }

    /// Apply one observation date. Dates must be fed in order starting at 0.
    pub fn observe(&mut self, date_index: usize, perf: Performance<'_>) -> PhoenixResult<PhoenixState> {
        if self.state.is_terminal() {
            return Err(PhoenixError::malformed_path(
                Some(date_index),
                perf.driving_underlying,
                format!("observation after terminal state {:?}", self.state),
            ));
        }
        let expected = self.aggregator.events().len();
        if date_index != expected {
            return Err(PhoenixError::malformed_path(
                Some(date_index),
                perf.driving_underlying,
                format!("observations out of order, expected date index {expected}"),
            ));
        }
        let observation_date = *self.terms.observation_dates.get(date_index).ok_or_else(|| {
            PhoenixError::malformed_path(
                Some(date_index),
                perf.driving_underlying,
                "beyond the observation schedule",
            )
        })?;

        let terms = self.terms;
        let coupon = terms.coupon_amount()?;
        let ratio = perf.ratio;
        let autocall_eligible = terms.is_autocall_eligible(date_index);
        let coupon_barrier_met = ratio >= terms.coupon_barrier_level;

        let mut coupon_paid = Decimal::ZERO;
        let mut memory_released = Decimal::ZERO;
        let mut coupon_forfeited = Decimal::ZERO;
        let mut autocalled = false;
        let mut knocked_in = false;

        if autocall_eligible && ratio >= terms.autocall_barrier_level {
            // The call date's coupon is always paid, with any carry released.
            memory_released = self.carry;
            coupon_paid = self.with_carry(coupon)?;
            self.carry = Decimal::ZERO;
            autocalled = true;
            self.final_payoff = terms.nominal;
            self.state = PhoenixState::Autocalled;
        } else {
            if coupon_barrier_met {
                memory_released = self.carry;
                coupon_paid = self.with_carry(coupon)?;
                self.carry = Decimal::ZERO;
            } else if terms.memory_coupon_enabled {
                self.carry = self.with_carry(coupon)?;
            } else {
                coupon_forfeited = coupon;
            }

            if terms.is_maturity(date_index) {
                // Nothing can be carried past the final observation.
                coupon_forfeited = self.with_carry(coupon_forfeited)?;
                self.carry = Decimal::ZERO;

                if ratio >= terms.knock_in_barrier_level {
                    self.final_payoff = terms.nominal;
                    self.state = PhoenixState::MaturedNoKnockIn;
                } else {
                    self.final_payoff = terms.nominal.checked_mul(ratio).ok_or_else(|| {
                        PhoenixError::configuration(
                            "nominal",
                            format!(
                                "knock-in redemption {} x {ratio} exceeds the decimal range",
                                terms.nominal
                            ),
                        )
                    })?;
                    knocked_in = true;
                    self.state = PhoenixState::MaturedKnockIn;
                }
            }
        }

        self.aggregator.record(ObservationEvent {
            date_index,
            observation_date,
            performance_ratio: ratio,
            driving_underlying: perf.driving_underlying.to_string(),
            autocall_eligible,
            coupon_barrier_met,
            coupon_paid,
            memory_released,
            memory_carried_amount: self.carry,
            coupon_forfeited,
            autocalled,
            knocked_in,
        });

        Ok(self.state)
    }

    /// `amount` plus the outstanding memory carry.
    fn with_carry(&self, amount: Money) -> PhoenixResult<Money> {
        amount.checked_add(self.carry).ok_or_else(|| {
            PhoenixError::configuration(
                "nominal",
                format!(
                    "memory carry {} plus {amount} exceeds the decimal range",
                    self.carry
                ),
            )
        })
    }

    /// Hand the recorded events to the aggregator. Fails if no terminal state
    /// was reached.
    pub fn finish(self) -> PhoenixResult<CalculationResult> {
        let terminated_by = self.state.termination_kind().ok_or_else(|| {
            PhoenixError::malformed_path(
                None,
                "price_path",
                "path ended before the maturity observation",
            )
        })?;
        self.aggregator.finish(
            self.terms,
            Redemption {
                terminated_by,
                final_payoff: self.final_payoff,
            },
        )
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Coupon cash flows and capital redemption of `terms` along `price_path`.
///
/// Pure: no I/O and no state survives the call. Any malformed input fails
/// the whole calculation; partial results are never returned.
pub fn calculate_phoenix(
    terms: &ProductTerms,
    price_path: &PricePath,
) -> PhoenixResult<CalculationResult> {
    terms.validate_configuration()?;
    let aligned = price_path.align(terms)?;
    let evaluator = PerformanceEvaluator::for_structure(terms.structure_kind);

    let mut machine = PhoenixStateMachine::new(terms);
    for date_index in 0..terms.observation_count() {
        let perf = evaluator.evaluate(&aligned, date_index)?;
        if machine.observe(date_index, perf)?.is_terminal() {
            break;
        }
    }
    machine.finish()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
