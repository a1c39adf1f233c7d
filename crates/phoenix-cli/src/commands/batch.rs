use clap::Args;
use serde_json::Value;

use phoenix_core::batch::{calculate_batch, summarize_batch};
use phoenix_core::PricePath;

use crate::input;

/// Arguments for multi-path evaluation
#[derive(Args)]
pub struct BatchArgs {
    /// Path to the term sheet (JSON or YAML)
    #[arg(long)]
    pub terms: String,

    /// Path to a JSON array of price paths
    #[arg(long)]
    pub paths: String,

    /// Print every path's result instead of the summary
    #[arg(long)]
    pub detail: bool,
}

pub fn run_batch(args: BatchArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let terms = input::load_terms(&args.terms)?;
    let raw: Vec<Value> = input::file::read_json(&args.paths)?;
    let paths = raw
        .iter()
        .enumerate()
        .map(|(i, v)| PricePath::from_json(v).map_err(|e| format!("path {i}: {e}")))
        .collect::<Result<Vec<_>, _>>()?;

    if args.detail {
        let mut rows = Vec::with_capacity(paths.len());
        for (i, result) in calculate_batch(&terms, &paths).into_iter().enumerate() {
            let result = result.map_err(|e| format!("path {i}: {e}"))?;
            rows.push(serde_json::json!({
                "path": i,
                "terminated_by": result.terminated_by,
                "termination_date_index": result.termination_date_index,
                "total_coupons": result.total_coupons,
                "final_payoff": result.final_payoff,
                "total_redemption": result.total_redemption,
                "final_performance_ratio": result.final_performance_ratio,
            }));
        }
        return Ok(serde_json::json!({ "results": rows }));
    }

    let summary = summarize_batch(&terms, &paths)?;
    Ok(serde_json::to_value(summary)?)
}
