use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::engine::calculate_phoenix;
use crate::path::PricePath;
use crate::readiness::{ReadinessGate, StructuralGate};
use crate::result::CalculationResult;
use crate::terms::{ProductTerms, StructureKind};
use crate::types::{with_metadata, ComputationOutput};
use crate::PhoenixResult;

/// A product and one price path, as exchanged with the orchestration layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhoenixInput {
    pub terms: ProductTerms,
    pub price_path: PricePath,
}

/// Run `gate` and then the engine. The gate's verdict is final: if it
/// rejects the terms no calculation is attempted.
pub fn calculate_with_gate(
    terms: &ProductTerms,
    price_path: &PricePath,
    gate: &impl ReadinessGate,
) -> PhoenixResult<CalculationResult> {
    gate.check(terms)?;
    calculate_phoenix(terms, price_path)
}

/// Term combinations that are legal but unusual enough to flag.
pub fn plausibility_warnings(terms: &ProductTerms) -> Vec<String> {
    let mut warnings = Vec::new();

    if terms.autocall_barrier_level < terms.coupon_barrier_level {
        warnings.push(format!(
            "Autocall barrier {} is below coupon barrier {}; a call pays the coupon regardless",
            terms.autocall_barrier_level, terms.coupon_barrier_level
        ));
    }
    if terms.knock_in_barrier_level > terms.coupon_barrier_level {
        warnings.push(format!(
            "Knock-in barrier {} is above coupon barrier {}",
            terms.knock_in_barrier_level, terms.coupon_barrier_level
        ));
    }
    let limit = dec!(1.5);
    for (name, level) in [
        ("coupon", terms.coupon_barrier_level),
        ("autocall", terms.autocall_barrier_level),
        ("knock-in", terms.knock_in_barrier_level),
    ] {
        if level > limit {
            warnings.push(format!(
                "{name} barrier {level} exceeds 150% of initial level"
            ));
        }
    }
    if terms.coupon_rate.is_zero() {
        warnings.push("Coupon rate is zero; no coupon can ever be paid".into());
    }
    if terms.memory_coupon_enabled && terms.observation_count() == 1 {
        warnings.push("Memory coupon has no effect with a single observation date".into());
    }

    warnings
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn price_phoenix(
    input: &PhoenixInput,
) -> PhoenixResult<ComputationOutput<CalculationResult>> {
    let start = Instant::now();

    let result = calculate_with_gate(&input.terms, &input.price_path, &StructuralGate)?;
    let warnings = plausibility_warnings(&input.terms);

    let methodology = "Deterministic Phoenix autocallable path evaluation";
    let performance = match input.terms.structure_kind {
        StructureKind::Single => "price / initial level",
        StructureKind::WorstOf => "minimum of price / initial level across basket",
    };
    let assumptions = serde_json::json!({
        "structure_type": input.terms.structure_kind,
        "performance": performance,
        "barrier_comparison": ">= (meeting a barrier counts as success)",
        "autocall_from_date_index": input.terms.first_autocall_date_index,
        "memory_coupon": input.terms.memory_coupon_enabled,
        "knock_in_observation": "maturity only",
        "discounting": "none",
        "precision": "rust_decimal_128bit",
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        methodology,
        &assumptions,
        warnings,
        elapsed,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
