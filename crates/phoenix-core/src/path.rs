use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::PhoenixError;
use crate::terms::{ProductTerms, Underlying};
use crate::types::Money;
use crate::PhoenixResult;

/// Observed prices aligned 1:1 with a product's observation dates.
///
/// A single-underlying path is a bare array; a basket path maps each
/// underlying name to its own series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    untagged,
    expecting = "price_path must be an array of prices or a map of underlying name to prices"
)]
pub enum PricePath {
    Single(Vec<Money>),
    Basket(BTreeMap<String, Vec<Money>>),
}

impl PricePath {
    pub fn single(prices: impl Into<Vec<Money>>) -> Self {
        PricePath::Single(prices.into())
    }

    pub fn basket<N, S>(series: impl IntoIterator<Item = (N, S)>) -> Self
    where
        N: Into<String>,
        S: Into<Vec<Money>>,
    {
        PricePath::Basket(
            series
                .into_iter()
                .map(|(name, prices)| (name.into(), prices.into()))
                .collect(),
        )
    }

    /// Parse a path from a JSON value. Anything that is neither a price array
    /// nor a name-to-prices map is a malformed path.
    pub fn from_json(value: &serde_json::Value) -> PhoenixResult<Self> {
        serde_json::from_value(value.clone())
            .map_err(|e| {
                PhoenixError::malformed_path(
                    None,
                    "price_path",
                    format!("unrecognised series layout: {e}"),
                )
            })
    }

    /// Resolve the path against `terms`, ordering series by underlying.
    ///
    /// Shape and length are checked up front; individual prices are only
    /// checked when the evaluator reaches their date.
    pub fn align<'a>(&'a self, terms: &'a ProductTerms) -> PhoenixResult<AlignedPath<'a>> {
        let expected = terms.observation_count();
        let mut series = Vec::with_capacity(terms.underlyings.len());

        match self {
            PricePath::Single(prices) => {
                if terms.underlyings.len() != 1 {
                    return Err(PhoenixError::malformed_path(
                        None,
                        "price_path",
                        format!(
                            "a single price series was supplied for a basket of {} underlyings",
                            terms.underlyings.len()
                        ),
                    ));
                }
                series.push((&terms.underlyings[0], prices.as_slice()));
            }
            PricePath::Basket(map) => {
                if let Some(unknown) = map
                    .keys()
                    .find(|name| !terms.underlyings.iter().any(|u| &u.name == *name))
                {
                    return Err(PhoenixError::malformed_path(
                        None,
                        unknown.as_str(),
                        "series supplied for a name that is not an underlying of this product",
                    ));
                }
                for u in &terms.underlyings {
                    let prices = map.get(&u.name).ok_or_else(|| {
                        PhoenixError::malformed_path(None, u.name.as_str(), "no price series supplied")
                    })?;
                    series.push((u, prices.as_slice()));
                }
            }
        }

        for (u, prices) in &series {
            if prices.len() != expected {
                return Err(PhoenixError::malformed_path(
                    None,
                    u.name.as_str(),
                    format!(
                        "expected {expected} prices (one per observation date), got {}",
                        prices.len()
                    ),
                ));
            }
        }

        Ok(AlignedPath { series })
    }
}

/// A price path validated for shape against one product, with series in the
/// same order as the product's underlyings.
#[derive(Debug, Clone)]
pub struct AlignedPath<'a> {
    series: Vec<(&'a Underlying, &'a [Money])>,
}

impl<'a> AlignedPath<'a> {
    pub fn iter(&self) -> impl Iterator<Item = (&'a Underlying, &'a [Money])> + '_ {
        self.series.iter().copied()
    }

    pub fn underlying_count(&self) -> usize {
        self.series.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
