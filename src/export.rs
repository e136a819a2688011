//! Tabular export sink: one CSV per crawl run, UTF-8 with a BOM
//! signature so spreadsheet tools pick up the CJK columns correctly.

use crate::Result;
use crate::scrape::fields::FieldSpec;
use crate::scrape::record::{PREFERRED_SELLER_FIELD, PRODUCT_URL_FIELD, ProductRecord};
use std::fs::File;
use std::io::Write;
use std::path::Path;

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// Column order: configured fields in spec order, then the synthetic
/// columns the listener derives.
pub fn export_columns(fields: &[FieldSpec]) -> Vec<String> {
    let mut columns: Vec<String> = fields.iter().map(|f| f.name.clone()).collect();
    columns.push(PREFERRED_SELLER_FIELD.to_string());
    columns.push(PRODUCT_URL_FIELD.to_string());
    columns
}

/// Writes header plus one row per record. Returns the row count.
pub fn write_records(
    path: &Path,
    fields: &[FieldSpec],
    records: &[ProductRecord],
) -> Result<usize> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = File::create(path)?;
    file.write_all(UTF8_BOM)?;

    let mut writer = csv::WriterBuilder::new().from_writer(file);
    let columns = export_columns(fields);
    writer.write_record(&columns)?;

    for record in records {
        let row: Vec<String> = columns
            .iter()
            .map(|column| {
                record
                    .get(column)
                    .map(|value| value.to_csv_field())
                    .unwrap_or_default()
            })
            .collect();
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::Locator;

    #[test]
    fn test_export_columns_appends_synthetics() {
        let fields = vec![
            FieldSpec::text("product_name", Locator::css(".name")),
            FieldSpec::number("number_of_stars", Locator::css(".stars")),
        ];

        assert_eq!(
            export_columns(&fields),
            vec![
                "product_name",
                "number_of_stars",
                "is_preferred_seller",
                "product_url",
            ]
        );
    }
}
