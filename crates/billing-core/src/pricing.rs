//! # Price Selection
//!
//! Resolves a lookup key to exactly one price.

use crate::error::{BillingError, BillingResult};
use crate::model::Price;

/// Pick the price for `lookup_key` out of a provider listing.
///
/// Only active prices whose lookup key matches count. The result must be
/// unique: no match is `PriceNotFound`, several matches are
/// `AmbiguousPrice`. Listing order is never used to break a tie.
pub fn select_price(lookup_key: &str, prices: Vec<Price>) -> BillingResult<Price> {
    let mut matching: Vec<Price> = prices
        .into_iter()
        .filter(|p| p.active && p.lookup_key.as_deref() == Some(lookup_key))
        .collect();

    match matching.len() {
        0 => Err(BillingError::PriceNotFound {
            lookup_key: lookup_key.to_string(),
        }),
        1 => Ok(matching.remove(0)),
        count => Err(BillingError::AmbiguousPrice {
            lookup_key: lookup_key.to_string(),
            count,
        }),
    }
}
