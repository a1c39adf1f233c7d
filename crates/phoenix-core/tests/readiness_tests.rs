use phoenix_core::pricing::{calculate_with_gate, price_phoenix, PhoenixInput};
use phoenix_core::readiness::{admit_terms, ReadinessGate, StructuralGate, REQUIRED_FIELDS};
use phoenix_core::{PhoenixError, PhoenixResult, PricePath, ProductTerms, TerminationKind};
use rust_decimal_macros::dec;
use serde_json::{json, Value};

// ===========================================================================
// JSON term sheets as produced by the extraction pipeline
// ===========================================================================

fn single_sheet() -> Value {
    json!({
        "structure_type": "single",
        "underlyings": [{ "name": "SPX", "initial_level": 2000 }],
        "observation_dates": ["2024-06-28", "2024-12-27", "2025-06-27"],
        "coupon_rate": 0.04,
        "coupon_barrier_level": 1.0,
        "autocall_barrier_level": 1.0,
        "knock_in_barrier_level": 0.6,
        "memory_coupon_enabled": false,
        "nominal": 100000,
        "currency": "USD"
    })
}

#[test]
fn test_every_required_field_is_enforced() {
    for field in REQUIRED_FIELDS {
        let mut sheet = single_sheet();
        sheet.as_object_mut().unwrap().remove(field);
        match admit_terms(&sheet, &StructuralGate) {
            Err(PhoenixError::Schema { field: f, .. }) => assert_eq!(f, field),
            other => panic!("removing {field}: expected schema error, got {other:?}"),
        }
    }
}

#[test]
fn test_optional_first_call_date_parsed() {
    let mut sheet = single_sheet();
    sheet["first_autocall_date_index"] = json!(1);
    let terms = admit_terms(&sheet, &StructuralGate).unwrap();
    assert_eq!(terms.first_autocall_date_index, 1);
}

#[test]
fn test_combined_input_document_end_to_end() {
    let doc = json!({
        "terms": single_sheet(),
        "price_path": [2000, 2100, 2200]
    });
    let input: PhoenixInput = serde_json::from_value(doc).unwrap();
    let out = price_phoenix(&input).unwrap();
    assert_eq!(out.result.terminated_by, TerminationKind::Autocall);
    assert_eq!(out.result.total_coupons, dec!(4000));
    assert_eq!(out.result.final_payoff, dec!(100000));

    let rendered = serde_json::to_value(&out.result).unwrap();
    for key in [
        "total_coupons",
        "final_payoff",
        "terminated_by",
        "termination_date_index",
        "events",
    ] {
        assert!(rendered.get(key).is_some(), "missing output field {key}");
    }
    assert_eq!(rendered["terminated_by"], "AUTOCALL");
    assert_eq!(rendered["events"][0]["autocalled"], true);
}

#[test]
fn test_worst_of_path_mapping_by_name() {
    let sheet = json!({
        "structure_type": "worst_of",
        "underlyings": [
            { "name": "AAA", "initial_level": 100 },
            { "name": "BBB", "initial_level": 100 }
        ],
        "observation_dates": ["2025-01-31", "2025-07-31"],
        "coupon_rate": 0.05,
        "coupon_barrier_level": 0.7,
        "autocall_barrier_level": 1.0,
        "knock_in_barrier_level": 0.6,
        "memory_coupon_enabled": true,
        "nominal": 1000,
        "currency": "USD"
    });
    let terms = admit_terms(&sheet, &StructuralGate).unwrap();
    let path: PricePath =
        serde_json::from_value(json!({ "BBB": [80, 80], "AAA": [90, 50] })).unwrap();
    let result = calculate_with_gate(&terms, &path, &StructuralGate).unwrap();
    assert_eq!(result.terminated_by, TerminationKind::MaturityKnockIn);
    assert_eq!(result.final_payoff, dec!(500));
}

// ===========================================================================
// Custom gates
// ===========================================================================

/// Rejects anything not denominated in an allowed currency.
struct CurrencyGate(&'static [&'static str]);

impl ReadinessGate for CurrencyGate {
    fn check(&self, terms: &ProductTerms) -> PhoenixResult<()> {
        StructuralGate.check(terms)?;
        if self.0.contains(&terms.currency.as_str()) {
            Ok(())
        } else {
            Err(PhoenixError::schema("currency", "not on the allowed list"))
        }
    }
}

#[test]
fn test_custom_gate_blocks_calculation() {
    let terms = admit_terms(&single_sheet(), &StructuralGate).unwrap();
    let path = PricePath::single(vec![dec!(2000), dec!(2000), dec!(2000)]);
    let err = calculate_with_gate(&terms, &path, &CurrencyGate(&["EUR", "CHF"])).unwrap_err();
    assert!(err.is_schema());
    assert!(calculate_with_gate(&terms, &path, &CurrencyGate(&["USD"])).is_ok());
}

#[test]
fn test_gate_bypassed_engine_still_guards() {
    let mut terms = admit_terms(&single_sheet(), &StructuralGate).unwrap();
    terms.underlyings[0].initial_level = dec!(0);
    let path = PricePath::single(vec![dec!(2000), dec!(2000), dec!(2000)]);
    let err = phoenix_core::calculate_phoenix(&terms, &path).unwrap_err();
    assert!(err.is_configuration());
}
