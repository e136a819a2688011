use shopcrawl::browser::Locator;
use shopcrawl::export::{export_columns, write_records};
use shopcrawl::scrape::fields::FieldSpec;
use shopcrawl::scrape::record::{FieldValue, ProductRecord};
use std::collections::HashMap;

fn test_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::text("product_name", Locator::css(".name")),
        FieldSpec::number("number_of_stars", Locator::css(".stars")),
        FieldSpec::duration("join_time", Locator::css(".age")),
    ]
}

fn record(name: &str, stars: Option<f64>, days: i64, url: &str) -> ProductRecord {
    let mut values = HashMap::new();
    values.insert(
        "product_name".to_string(),
        FieldValue::Text(name.to_string()),
    );
    values.insert(
        "number_of_stars".to_string(),
        stars.map(FieldValue::Number).unwrap_or(FieldValue::Missing),
    );
    values.insert("join_time".to_string(), FieldValue::Days(days));
    values.insert("is_preferred_seller".to_string(), FieldValue::Flag(false));
    values.insert("product_url".to_string(), FieldValue::Text(url.to_string()));
    ProductRecord::new(values)
}

#[test]
fn export_writes_header_and_one_row_per_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("export.csv");

    let records = vec![
        record("widget", Some(4.9), 365, "https://example.com/a?sp_atk=1"),
        record("gadget", Some(3.0), 150, "https://example.com/b?sp_atk=2"),
        record("gizmo", None, 30, "https://example.com/c?sp_atk=3"),
    ];

    let written = write_records(&path, &test_fields(), &records).unwrap();
    assert_eq!(written, 3);

    let raw = std::fs::read(&path).unwrap();
    assert!(raw.starts_with(b"\xef\xbb\xbf"), "missing UTF-8 signature");

    let content = String::from_utf8(raw[3..].to_vec()).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 4, "header plus three data rows");
    assert_eq!(
        lines[0],
        "product_name,number_of_stars,join_time,is_preferred_seller,product_url"
    );
    assert_eq!(lines[1], "widget,4.9,365,false,https://example.com/a?sp_atk=1");

    // A missing field renders as an empty cell, not a literal null.
    assert_eq!(lines[3], "gizmo,,30,false,https://example.com/c?sp_atk=3");
}

#[test]
fn export_with_no_records_still_writes_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.csv");

    let written = write_records(&path, &test_fields(), &[]).unwrap();
    assert_eq!(written, 0);

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 1);
}

#[test]
fn export_columns_union_matches_default_table() {
    let config = shopcrawl::Config::default();
    let columns = export_columns(&config.site.fields);

    assert_eq!(columns.len(), 16);
    assert_eq!(columns[0], "product_name");
    assert_eq!(columns[14], "is_preferred_seller");
    assert_eq!(columns[15], "product_url");
}

#[test]
fn export_creates_missing_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/run/export.csv");

    write_records(&path, &test_fields(), &[]).unwrap();
    assert!(path.exists());
}
