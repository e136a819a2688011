use crate::browser::Locator;
use serde::{Deserialize, Serialize};

/// Whether a parse failure falls back to the raw text or errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    #[default]
    Permissive,
    Strict,
}

/// Per-field transform applied to the scraped text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number(ParseMode),
    DurationDays(ParseMode),
}

/// One configured field: where to find it and how to interpret it.
/// Loaded once at listener construction, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub locator: Locator,
}

impl FieldSpec {
    pub fn text(name: &str, locator: Locator) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Text,
            locator,
        }
    }

    pub fn number(name: &str, locator: Locator) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Number(ParseMode::Permissive),
            locator,
        }
    }

    pub fn duration(name: &str, locator: Locator) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::DurationDays(ParseMode::Strict),
            locator,
        }
    }
}

/// The production field table observed on the target site's detail
/// pages. Selectors are site-version-specific class names.
pub fn default_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::text("product_name", Locator::css("._44qnta")),
        FieldSpec::number("number_of_stars", Locator::css("._046PXf")),
        FieldSpec::number(
            "number_of_comments",
            Locator::css("div.IZIVH\\+:nth-child(2)"),
        ),
        FieldSpec::number("quantity_sold", Locator::css(".jgUbWJ")),
        FieldSpec::number("quantity_remaining", Locator::css("._6lioXX")),
        FieldSpec::text("price_range", Locator::css(".pqTWkA")),
        FieldSpec::number("free_shipment_fee_threshold", Locator::css("._7K5or9")),
        FieldSpec::number("number_of_likes", Locator::css("div.Ne7dEf:nth-child(2)")),
        FieldSpec::number(
            "number_of_market_comments",
            Locator::css("div.Odudp\\+:nth-child(1) > div:nth-child(1) > span:nth-child(2)"),
        ),
        FieldSpec::number("number_of_market_product", Locator::css(".vUG3KX")),
        FieldSpec::text(
            "chat_response_speed",
            Locator::css("div.Odudp\\+:nth-child(2) > div:nth-child(2) > span:nth-child(2)"),
        ),
        FieldSpec::number(
            "chat_response_rate",
            Locator::css("div.Odudp\\+:nth-child(2) > div:nth-child(1) > span:nth-child(2)"),
        ),
        FieldSpec::duration("join_time", Locator::css("div.Odudp\\+:nth-child(3) > div:nth-child(1)")),
        FieldSpec::number(
            "number_of_fans",
            Locator::css("div.Odudp\\+:nth-child(3) > div:nth-child(2)"),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_fields_shape() {
        let fields = default_fields();
        assert_eq!(fields.len(), 14);
        assert_eq!(fields[0].name, "product_name");
        assert_eq!(fields[0].kind, FieldKind::Text);

        let numeric = fields
            .iter()
            .filter(|f| matches!(f.kind, FieldKind::Number(_)))
            .count();
        assert_eq!(numeric, 10);

        let durations: Vec<_> = fields
            .iter()
            .filter(|f| matches!(f.kind, FieldKind::DurationDays(_)))
            .collect();
        assert_eq!(durations.len(), 1);
        assert_eq!(durations[0].name, "join_time");
    }

    #[test]
    fn test_duration_defaults_strict() {
        let spec = FieldSpec::duration("join_time", Locator::css(".x"));
        assert_eq!(spec.kind, FieldKind::DurationDays(ParseMode::Strict));
    }

    #[test]
    fn test_number_defaults_permissive() {
        let spec = FieldSpec::number("likes", Locator::css(".x"));
        assert_eq!(spec.kind, FieldKind::Number(ParseMode::Permissive));
    }

    #[test]
    fn test_field_spec_roundtrips_through_toml() {
        let spec = FieldSpec::number("quantity_sold", Locator::css(".jgUbWJ"));
        let encoded = toml::to_string(&spec).unwrap();
        let decoded: FieldSpec = toml::from_str(&encoded).unwrap();
        assert_eq!(decoded, spec);
    }
}
