use serde::{Deserialize, Serialize};

/// Lookup strategy for element location, mirroring the small subset of
/// selector kinds the crawl actually uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Css,
    ClassName,
    TagName,
}

/// A (strategy, selector) pair resolvable to a CSS selector string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locator {
    pub strategy: Strategy,
    pub value: String,
}

impl Locator {
    pub fn css(value: impl Into<String>) -> Self {
        Self {
            strategy: Strategy::Css,
            value: value.into(),
        }
    }

    pub fn class_name(value: impl Into<String>) -> Self {
        Self {
            strategy: Strategy::ClassName,
            value: value.into(),
        }
    }

    pub fn tag_name(value: impl Into<String>) -> Self {
        Self {
            strategy: Strategy::TagName,
            value: value.into(),
        }
    }

    pub fn to_selector(&self) -> String {
        match self.strategy {
            Strategy::Css | Strategy::TagName => self.value.clone(),
            Strategy::ClassName => format!(".{}", self.value),
        }
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_selector())
    }
}

pub fn escape_selector(selector: &str) -> String {
    selector.replace('\\', "\\\\").replace('\'', "\\'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_passthrough() {
        assert_eq!(Locator::css("div.item > a").to_selector(), "div.item > a");
    }

    #[test]
    fn test_class_name_prefixed() {
        assert_eq!(
            Locator::class_name("search-result__items").to_selector(),
            ".search-result__items"
        );
    }

    #[test]
    fn test_tag_name_passthrough() {
        assert_eq!(Locator::tag_name("a").to_selector(), "a");
    }

    #[test]
    fn test_escape_selector() {
        assert_eq!(escape_selector("div"), "div");
        assert_eq!(escape_selector("div's"), "div\\'s");
        assert_eq!(escape_selector("div.IZIVH\\+"), "div.IZIVH\\\\+");
    }

    #[test]
    fn test_locator_roundtrips_through_toml() {
        let locator = Locator::class_name("page-controller__total");
        let encoded = toml::to_string(&locator).unwrap();
        let decoded: Locator = toml::from_str(&encoded).unwrap();
        assert_eq!(decoded, locator);
    }
}
