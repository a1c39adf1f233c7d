use clap::Args;
use serde_json::Value;

use phoenix_core::pricing::plausibility_warnings;

use crate::input;

/// Arguments for term sheet validation
#[derive(Args)]
pub struct ValidateArgs {
    /// Path to the term sheet (JSON or YAML)
    #[arg(long)]
    pub terms: String,
}

pub fn run_validate(args: ValidateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let terms = input::load_terms(&args.terms)?;
    terms.validate_configuration()?;

    let coupon_amount = terms.coupon_amount()?;
    let maturity = terms.observation_dates[terms.maturity_index()];
    Ok(serde_json::json!({
        "result": {
            "valid": true,
            "structure_type": terms.structure_kind,
            "underlyings": terms.underlyings.iter().map(|u| u.name.as_str()).collect::<Vec<_>>(),
            "observation_count": terms.observation_count(),
            "maturity_date": maturity,
            "first_autocall_date": terms.observation_dates[terms.first_autocall_date_index],
            "coupon_amount": coupon_amount,
            "currency": terms.currency,
        },
        "warnings": plausibility_warnings(&terms),
    }))
}
