//! Discount rule and catalog snapshot types.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// A discount computation, tagged on the wire by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DiscountKind {
    Percentage {
        #[serde(rename = "percentOff")]
        percent_off: Decimal,
    },
    Amount {
        #[serde(rename = "amountOff")]
        amount_off: Decimal,
    },
    Fixed {
        #[serde(rename = "fixedPrice")]
        fixed_price: Decimal,
    },
}

impl DiscountKind {
    /// Candidate price for a base price, clamped at zero.
    pub fn candidate_price(&self, base_price: Decimal) -> Decimal {
        let candidate = match self {
            DiscountKind::Percentage { percent_off } => {
                base_price * (Decimal::ONE - percent_off / Decimal::from(100))
            }
            DiscountKind::Amount { amount_off } => base_price - amount_off,
            DiscountKind::Fixed { fixed_price } => *fixed_price,
        };
        candidate.max(Decimal::ZERO)
    }
}

/// A single discount rule, either global or keyed to a creator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(flatten)]
    pub kind: DiscountKind,
    /// Empty means the rule applies regardless of tags.
    #[serde(default, skip_serializing_if = "HashSet::is_empty")]
    pub applies_to_tags: HashSet<String>,
}

impl DiscountRule {
    /// Tag gate: an empty allow-list applies unconditionally; otherwise the
    /// item must share at least one tag (case-sensitive membership).
    pub fn applies_to(&self, item_tags: &HashSet<String>) -> bool {
        self.applies_to_tags.is_empty()
            || self.applies_to_tags.iter().any(|tag| item_tags.contains(tag))
    }
}

/// Point-in-time snapshot of all active discounts.
///
/// `creators` is keyed by normalized (lowercased, trimmed) creator name; the
/// wire format accepts either a single rule or an array per creator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscountCatalog {
    #[serde(default)]
    pub global: Option<DiscountRule>,
    #[serde(default, deserialize_with = "one_or_many_rules")]
    pub creators: HashMap<String, Vec<DiscountRule>>,
}

impl DiscountCatalog {
    /// Rules for one creator, by normalized name.
    pub fn creator_rules(&self, normalized_name: &str) -> &[DiscountRule] {
        self.creators
            .get(normalized_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.global.is_none() && self.creators.is_empty()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(DiscountRule),
    Many(Vec<DiscountRule>),
}

fn one_or_many_rules<'de, D>(
    deserializer: D,
) -> Result<HashMap<String, Vec<DiscountRule>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: HashMap<String, OneOrMany> = HashMap::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(name, rules)| {
            let rules = match rules {
                OneOrMany::One(rule) => vec![rule],
                OneOrMany::Many(rules) => rules,
            };
            (name.trim().to_lowercase(), rules)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(values: &[&str]) -> HashSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_kind_wire_format() {
        let rule: DiscountRule =
            serde_json::from_str(r#"{"label":"Spring","type":"percentage","percentOff":25}"#)
                .unwrap();
        assert_eq!(
            rule.kind,
            DiscountKind::Percentage {
                percent_off: Decimal::from(25)
            }
        );

        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["type"], "percentage");
        assert_eq!(json["percentOff"], serde_json::json!(25.0));
    }

    #[test]
    fn test_catalog_accepts_single_rule_or_array() {
        let catalog: DiscountCatalog = serde_json::from_str(
            r#"{
                "global": null,
                "creators": {
                    "Alice ": {"type":"amount","amountOff":5},
                    "bob": [{"type":"fixed","fixedPrice":3}, {"type":"percentage","percentOff":10}]
                }
            }"#,
        )
        .unwrap();

        assert_eq!(catalog.creator_rules("alice").len(), 1);
        assert_eq!(catalog.creator_rules("bob").len(), 2);
        assert!(catalog.creator_rules("carol").is_empty());
    }

    #[test]
    fn test_applies_to_tags_intersection() {
        let rule: DiscountRule =
            serde_json::from_str(r#"{"type":"percentage","percentOff":10,"appliesToTags":["sale"]}"#)
                .unwrap();

        assert!(!rule.applies_to(&tags(&["vlog"])));
        assert!(rule.applies_to(&tags(&["sale", "vlog"])));
        // Case-sensitive membership.
        assert!(!rule.applies_to(&tags(&["Sale"])));
    }

    #[test]
    fn test_empty_tag_list_applies_unconditionally() {
        let rule: DiscountRule =
            serde_json::from_str(r#"{"type":"amount","amountOff":2}"#).unwrap();
        assert!(rule.applies_to(&HashSet::new()));
        assert!(rule.applies_to(&tags(&["anything"])));
    }

    #[test]
    fn test_candidate_price_clamps_at_zero() {
        let kind = DiscountKind::Amount {
            amount_off: Decimal::from(50),
        };
        assert_eq!(kind.candidate_price(Decimal::from(20)), Decimal::ZERO);
    }
}
