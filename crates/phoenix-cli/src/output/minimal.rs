use serde_json::Value;

use super::{result_of, scalar_text};

/// Fields answering "what does the investor get back", most specific first.
const PRIORITY_KEYS: [&str; 5] = [
    "total_redemption",
    "expected_total_redemption",
    "final_payoff",
    "terminated_by",
    "valid",
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_text(value));
}

fn minimal_text(value: &Value) -> String {
    let result = result_of(value);

    if let Value::Object(map) = result {
        for key in PRIORITY_KEYS {
            if let Some(val) = map.get(key).filter(|v| !v.is_null()) {
                return scalar_text(val);
            }
        }
        if let Some((key, val)) = map.iter().next() {
            return format!("{}: {}", key, scalar_text(val));
        }
    }

    scalar_text(result)
}
