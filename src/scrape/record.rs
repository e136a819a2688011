use serde::Serialize;
use std::collections::HashMap;

pub const PRODUCT_NAME_FIELD: &str = "product_name";
pub const PREFERRED_SELLER_FIELD: &str = "is_preferred_seller";
pub const PRODUCT_URL_FIELD: &str = "product_url";

/// A scraped scalar. `Missing` marks a field whose selector matched
/// nothing on the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Days(i64),
    Flag(bool),
    Missing,
}

impl FieldValue {
    pub fn to_csv_field(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Number(n) => format!("{}", n),
            FieldValue::Days(d) => d.to_string(),
            FieldValue::Flag(b) => b.to_string(),
            FieldValue::Missing => String::new(),
        }
    }
}

/// An immutable field-name → value mapping for one product page.
///
/// Identity is the `product_name` field alone: two records with the
/// same name are the same product no matter what else differs.
#[derive(Debug, Clone, Serialize)]
pub struct ProductRecord {
    values: HashMap<String, FieldValue>,
}

impl ProductRecord {
    pub fn new(values: HashMap<String, FieldValue>) -> Self {
        Self { values }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(field)
    }

    pub fn product_name(&self) -> Option<&str> {
        match self.values.get(PRODUCT_NAME_FIELD) {
            Some(FieldValue::Text(name)) => Some(name),
            _ => None,
        }
    }

    pub fn product_url(&self) -> Option<&str> {
        match self.values.get(PRODUCT_URL_FIELD) {
            Some(FieldValue::Text(url)) => Some(url),
            _ => None,
        }
    }
}

impl PartialEq for ProductRecord {
    fn eq(&self, other: &Self) -> bool {
        self.product_name() == other.product_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, FieldValue)]) -> ProductRecord {
        ProductRecord::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn test_equal_when_names_match() {
        let a = record(&[
            (PRODUCT_NAME_FIELD, FieldValue::Text("widget".into())),
            ("number_of_stars", FieldValue::Number(4.9)),
        ]);
        let b = record(&[
            (PRODUCT_NAME_FIELD, FieldValue::Text("widget".into())),
            ("number_of_stars", FieldValue::Number(1.0)),
            ("quantity_sold", FieldValue::Number(300.0)),
        ]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_not_equal_when_names_differ() {
        let a = record(&[
            (PRODUCT_NAME_FIELD, FieldValue::Text("widget".into())),
            ("number_of_stars", FieldValue::Number(4.9)),
        ]);
        let b = record(&[
            (PRODUCT_NAME_FIELD, FieldValue::Text("gadget".into())),
            ("number_of_stars", FieldValue::Number(4.9)),
        ]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_missing_name_is_not_text() {
        let a = record(&[(PRODUCT_NAME_FIELD, FieldValue::Missing)]);
        assert_eq!(a.product_name(), None);
    }

    #[test]
    fn test_csv_field_rendering() {
        assert_eq!(FieldValue::Text("hi".into()).to_csv_field(), "hi");
        assert_eq!(FieldValue::Number(2.5).to_csv_field(), "2.5");
        assert_eq!(FieldValue::Number(25000.0).to_csv_field(), "25000");
        assert_eq!(FieldValue::Days(365).to_csv_field(), "365");
        assert_eq!(FieldValue::Flag(true).to_csv_field(), "true");
        assert_eq!(FieldValue::Missing.to_csv_field(), "");
    }

    #[test]
    fn test_missing_serializes_as_null() {
        let json = serde_json::to_string(&FieldValue::Missing).unwrap();
        assert_eq!(json, "null");
    }
}
