use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use phoenix_core::pricing::{price_phoenix, PhoenixInput};
use phoenix_core::readiness::{admit_terms, StructuralGate};
use phoenix_core::PricePath;

use crate::input;

/// Arguments for a single-path calculation
#[derive(Args)]
pub struct CalculateArgs {
    /// Path to the term sheet (JSON or YAML)
    #[arg(long)]
    pub terms: Option<String>,

    /// Path to the JSON price path (array, or name -> array for baskets)
    #[arg(long)]
    pub path: Option<String>,

    /// Path to a combined document {"terms": ..., "price_path": ...}
    #[arg(long, conflicts_with_all = ["terms", "path"])]
    pub input: Option<String>,

    /// Override the nominal stated in the term sheet
    #[arg(long)]
    pub nominal: Option<Decimal>,
}

/// Split a combined document into its term sheet and price path.
pub fn split_combined(doc: Value) -> Result<(Value, PricePath), Box<dyn std::error::Error>> {
    let mut obj = match doc {
        Value::Object(obj) => obj,
        _ => return Err("combined input must be a JSON object".into()),
    };
    let terms = obj
        .remove("terms")
        .ok_or("combined input is missing \"terms\"")?;
    let path = obj
        .remove("price_path")
        .ok_or("combined input is missing \"price_path\"")?;
    Ok((terms, PricePath::from_json(&path)?))
}

pub fn run_calculate(args: CalculateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let (sheet, price_path) = if let Some(ref path) = args.input {
        split_combined(input::file::read_document_value(path)?)?
    } else if let (Some(terms), Some(path)) = (&args.terms, &args.path) {
        let sheet = input::file::read_document_value(terms)?;
        let price_path = PricePath::from_json(&input::file::read_json(path)?)?;
        (sheet, price_path)
    } else if let Some(data) = input::stdin::read_stdin_document()? {
        split_combined(data)?
    } else {
        return Err(
            "--terms <file> with --path <file>, --input <file.json>, or stdin required".into(),
        );
    };

    let mut terms = admit_terms(&sheet, &StructuralGate)?;
    if let Some(nominal) = args.nominal {
        terms.nominal = nominal;
    }

    let result = price_phoenix(&PhoenixInput { terms, price_path })?;
    Ok(serde_json::to_value(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_combined_document() {
        let doc = json!({ "terms": { "currency": "USD" }, "price_path": [1, 2, 3] });
        let (terms, path) = split_combined(doc).unwrap();
        assert_eq!(terms["currency"], "USD");
        assert!(matches!(path, PricePath::Single(ref p) if p.len() == 3));
    }

    #[test]
    fn test_split_combined_requires_both_parts() {
        assert!(split_combined(json!({ "terms": {} })).is_err());
        assert!(split_combined(json!({ "price_path": [1] })).is_err());
        assert!(split_combined(json!([1, 2])).is_err());
    }

    #[test]
    fn test_split_combined_reports_bad_path_shape() {
        let doc = json!({ "terms": {}, "price_path": "100,101" });
        let err = split_combined(doc).unwrap_err();
        assert!(err.to_string().contains("price_path"));
    }
}
