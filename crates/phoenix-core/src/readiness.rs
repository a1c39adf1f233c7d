use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::HashSet;

use crate::error::PhoenixError;
use crate::terms::{ProductTerms, StructureKind};
use crate::PhoenixResult;

/// Keys a term sheet must carry before it can be materialized.
pub const REQUIRED_FIELDS: [&str; 10] = [
    "structure_type",
    "underlyings",
    "observation_dates",
    "coupon_rate",
    "coupon_barrier_level",
    "autocall_barrier_level",
    "knock_in_barrier_level",
    "memory_coupon_enabled",
    "nominal",
    "currency",
];

/// Pre-calculation check that terms are structurally complete.
///
/// The engine only consumes the outcome of a gate; callers may plug in a
/// stricter implementation (e.g. one backed by a document-extraction
/// confidence report) as long as it fails with `PhoenixError::Schema`.
pub trait ReadinessGate {
    fn check(&self, terms: &ProductTerms) -> PhoenixResult<()>;
}

/// Default gate: arity, schedule ordering and sign checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralGate;

impl ReadinessGate for StructuralGate {
    fn check(&self, terms: &ProductTerms) -> PhoenixResult<()> {
        check_underlyings(terms)?;
        check_schedule(terms)?;
        check_levels(terms)?;
        if terms.currency.trim().is_empty() {
            return Err(PhoenixError::schema("currency", "must not be empty"));
        }
        Ok(())
    }
}

fn check_underlyings(terms: &ProductTerms) -> PhoenixResult<()> {
    let count = terms.underlyings.len();
    match terms.structure_kind {
        StructureKind::Single if count != 1 => {
            return Err(PhoenixError::schema(
                "underlyings",
                format!("structure_type single requires exactly one underlying, got {count}"),
            ));
        }
        StructureKind::WorstOf if count < 2 => {
            return Err(PhoenixError::schema(
                "underlyings",
                format!("structure_type worst_of requires at least two underlyings, got {count}"),
            ));
        }
        _ => {}
    }

    let mut seen = HashSet::with_capacity(count);
    for (i, u) in terms.underlyings.iter().enumerate() {
        if u.name.trim().is_empty() {
            return Err(PhoenixError::schema(
                format!("underlyings[{i}].name"),
                "must not be empty",
            ));
        }
        if !seen.insert(u.name.as_str()) {
            return Err(PhoenixError::schema(
                format!("underlyings[{i}].name"),
                format!("duplicate underlying '{}'", u.name),
            ));
        }
    }
    Ok(())
}

fn check_schedule(terms: &ProductTerms) -> PhoenixResult<()> {
    if terms.observation_dates.is_empty() {
        return Err(PhoenixError::schema(
            "observation_dates",
            "at least one observation date required",
        ));
    }
    if let Some(i) = terms
        .observation_dates
        .windows(2)
        .position(|w| w[1] <= w[0])
    {
        return Err(PhoenixError::schema(
            "observation_dates",
            format!(
                "must be strictly increasing ({} follows {})",
                terms.observation_dates[i + 1],
                terms.observation_dates[i]
            ),
        ));
    }
    Ok(())
}

fn check_levels(terms: &ProductTerms) -> PhoenixResult<()> {
    let levels = [
        ("coupon_rate", terms.coupon_rate),
        ("coupon_barrier_level", terms.coupon_barrier_level),
        ("autocall_barrier_level", terms.autocall_barrier_level),
        ("knock_in_barrier_level", terms.knock_in_barrier_level),
        ("nominal", terms.nominal),
    ];
    for (field, value) in levels {
        if value < Decimal::ZERO {
            return Err(PhoenixError::schema(field, "must be non-negative"));
        }
    }
    Ok(())
}

/// Materialize terms from a JSON term sheet, reporting the first missing or
/// mistyped field as a schema error.
pub fn terms_from_json(value: &Value) -> PhoenixResult<ProductTerms> {
    let obj = value
        .as_object()
        .ok_or_else(|| PhoenixError::schema("terms", "expected a JSON object"))?;

    for field in REQUIRED_FIELDS {
        match obj.get(field) {
            None | Some(Value::Null) => {
                return Err(PhoenixError::schema(field, "required field missing"));
            }
            Some(_) => {}
        }
    }

    serde_json::from_value(value.clone()).map_err(|e| PhoenixError::schema("terms", e.to_string()))
}

/// Materialize a term sheet and pass it through `gate`.
pub fn admit_terms(value: &Value, gate: &impl ReadinessGate) -> PhoenixResult<ProductTerms> {
    let terms = terms_from_json(value)?;
    gate.check(&terms)?;
    Ok(terms)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sheet() -> Value {
        json!({
            "structure_type": "worst_of",
            "underlyings": [
                { "name": "AAPL", "initial_level": 180 },
                { "name": "MSFT", "initial_level": "410.5" }
            ],
            "observation_dates": ["2025-01-15", "2025-04-15", "2025-07-15"],
            "coupon_rate": 0.025,
            "coupon_barrier_level": 0.7,
            "autocall_barrier_level": 1.0,
            "knock_in_barrier_level": 0.6,
            "memory_coupon_enabled": true,
            "nominal": 10000,
            "currency": "USD"
        })
    }

    #[test]
    fn test_complete_sheet_admitted() {
        let terms = admit_terms(&sheet(), &StructuralGate).unwrap();
        assert_eq!(terms.structure_kind, StructureKind::WorstOf);
        assert_eq!(terms.underlyings.len(), 2);
        assert_eq!(terms.first_autocall_date_index, 0);
    }

    #[test]
    fn test_missing_field_named_in_error() {
        let mut v = sheet();
        v.as_object_mut().unwrap().remove("knock_in_barrier_level");
        match terms_from_json(&v).unwrap_err() {
            PhoenixError::Schema { field, .. } => assert_eq!(field, "knock_in_barrier_level"),
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_null_field_treated_as_missing() {
        let mut v = sheet();
        v["coupon_rate"] = Value::Null;
        assert!(terms_from_json(&v).unwrap_err().is_schema());
    }

    #[test]
    fn test_mistyped_field_is_schema_error() {
        let mut v = sheet();
        v["memory_coupon_enabled"] = json!("sometimes");
        assert!(terms_from_json(&v).unwrap_err().is_schema());
    }

    #[test]
    fn test_worst_of_with_one_underlying_rejected() {
        let mut v = sheet();
        v["underlyings"] = json!([{ "name": "AAPL", "initial_level": 180 }]);
        let err = admit_terms(&v, &StructuralGate).unwrap_err();
        assert!(err.is_schema());
        assert!(err.to_string().contains("at least two"));
    }

    #[test]
    fn test_single_with_two_underlyings_rejected() {
        let mut v = sheet();
        v["structure_type"] = json!("single");
        assert!(admit_terms(&v, &StructuralGate).unwrap_err().is_schema());
    }

    #[test]
    fn test_non_increasing_dates_rejected() {
        let mut v = sheet();
        v["observation_dates"] = json!(["2025-01-15", "2025-01-15", "2025-07-15"]);
        let err = admit_terms(&v, &StructuralGate).unwrap_err();
        assert!(err.to_string().contains("strictly increasing"));
    }

    #[test]
    fn test_duplicate_underlying_names_rejected() {
        let mut v = sheet();
        v["underlyings"][1]["name"] = json!("AAPL");
        assert!(admit_terms(&v, &StructuralGate).unwrap_err().is_schema());
    }

    #[test]
    fn test_negative_barrier_rejected_by_gate() {
        let mut v = sheet();
        v["coupon_barrier_level"] = json!(-0.5);
        match admit_terms(&v, &StructuralGate).unwrap_err() {
            PhoenixError::Schema { field, .. } => assert_eq!(field, "coupon_barrier_level"),
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(terms_from_json(&json!([1, 2, 3])).unwrap_err().is_schema());
    }
}
