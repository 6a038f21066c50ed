//! Discount resolution engine.
//!
//! Pure function from (pricing inputs, catalog snapshot) to the displayed
//! price. Stateless and safe for unlimited concurrent invocation.

use std::collections::HashSet;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::rules::{DiscountCatalog, DiscountRule};

/// Outcome of resolving one item against the catalog. Computed fresh on every
/// read, never persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingResult {
    pub base_price: Decimal,
    pub final_price: Decimal,
    #[serde(rename = "discount")]
    pub applied: Option<DiscountRule>,
}

/// Resolve the displayed price for an item.
///
/// Candidate rules are the catalog's global rule (if any) followed by the
/// creator's rules in catalog order, each gated by its tag allow-list. The
/// lowest candidate strictly below the base price wins; on a tie the earlier
/// rule in evaluation order is kept, so resolution is deterministic for a
/// given snapshot.
pub fn resolve(
    base_price: Decimal,
    creator_name: &str,
    item_tags: &HashSet<String>,
    catalog: &DiscountCatalog,
) -> PricingResult {
    // Free items are never discounted.
    if base_price <= Decimal::ZERO {
        return PricingResult {
            base_price,
            final_price: base_price,
            applied: None,
        };
    }

    let normalized = creator_name.trim().to_lowercase();

    let mut best: Option<(Decimal, &DiscountRule)> = None;
    let candidates = catalog
        .global
        .iter()
        .chain(catalog.creator_rules(&normalized).iter());

    for rule in candidates {
        if !rule.applies_to(item_tags) {
            continue;
        }
        let candidate = rule.kind.candidate_price(base_price);
        match best {
            Some((current, _)) if candidate >= current => {}
            _ => best = Some((candidate, rule)),
        }
    }

    match best {
        Some((price, rule)) if price < base_price => PricingResult {
            base_price,
            final_price: round_price(price),
            applied: Some(rule.clone()),
        },
        _ => PricingResult {
            base_price,
            final_price: base_price,
            applied: None,
        },
    }
}

fn round_price(price: Decimal) -> Decimal {
    price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
