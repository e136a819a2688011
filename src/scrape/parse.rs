//! Text transforms for scraped field values.
//!
//! The target site abbreviates large counts with Chinese magnitude
//! suffixes (2.5萬 = 25 000) and shop ages with Chinese time units
//! (3年 = 1 095 days). Numeric parsing is permissive by default and
//! falls back to the raw text; duration parsing is strict by default.

use crate::scrape::fields::ParseMode;
use crate::scrape::record::FieldValue;
use crate::{CrawlError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static NUMBER_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").unwrap());

fn magnitude_suffix(text: &str) -> Option<f64> {
    text.chars().find_map(|c| match c {
        '百' => Some(100.0),
        '千' => Some(1000.0),
        '萬' => Some(10_000.0),
        _ => None,
    })
}

fn day_unit(text: &str) -> Option<i64> {
    // Last unit wins when several appear, e.g. "1年2個月".
    text.chars()
        .filter_map(|c| match c {
            '月' => Some(30),
            '年' => Some(365),
            _ => None,
        })
        .last()
}

/// Parses the leading numeric run of `text`, scaled by an optional
/// magnitude suffix. Permissive mode returns the original text
/// unchanged when no number can be extracted.
pub fn extract_number(text: &str, mode: ParseMode) -> Result<FieldValue> {
    let parsed = NUMBER_RUN
        .find(text)
        .and_then(|run| run.as_str().parse::<f64>().ok());

    match parsed {
        Some(number) => {
            let multiplier = magnitude_suffix(text).unwrap_or(1.0);
            Ok(FieldValue::Number(number * multiplier))
        }
        None => match mode {
            ParseMode::Permissive => Ok(FieldValue::Text(text.to_string())),
            ParseMode::Strict => Err(CrawlError::NumberParse(text.to_string())),
        },
    }
}

/// Parses a duration like "3年" or "5個月" into a day count. Strict
/// mode errors when the text has no digits or no recognized unit.
pub fn convert_duration(text: &str, mode: ParseMode) -> Result<FieldValue> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();

    let days = digits
        .parse::<i64>()
        .ok()
        .zip(day_unit(text))
        .map(|(number, unit)| number * unit);

    match days {
        Some(days) => Ok(FieldValue::Days(days)),
        None => match mode {
            ParseMode::Permissive => Ok(FieldValue::Text(text.to_string())),
            ParseMode::Strict => Err(CrawlError::DurationParse(text.to_string())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(text: &str) -> FieldValue {
        extract_number(text, ParseMode::Permissive).unwrap()
    }

    #[test]
    fn test_plain_number() {
        assert_eq!(number("42"), FieldValue::Number(42.0));
        assert_eq!(number("4.9"), FieldValue::Number(4.9));
    }

    #[test]
    fn test_magnitude_suffixes() {
        assert_eq!(number("3百"), FieldValue::Number(300.0));
        assert_eq!(number("2千"), FieldValue::Number(2000.0));
        assert_eq!(number("2.5萬"), FieldValue::Number(25_000.0));
    }

    #[test]
    fn test_no_suffix_means_multiplier_one() {
        assert_eq!(number("123"), FieldValue::Number(123.0));
    }

    #[test]
    fn test_number_with_trailing_noise() {
        assert_eq!(number("15 件"), FieldValue::Number(15.0));
    }

    #[test]
    fn test_permissive_fallback_returns_original() {
        assert_eq!(
            number("尚無評價"),
            FieldValue::Text("尚無評價".to_string())
        );
    }

    #[test]
    fn test_strict_number_errors() {
        assert!(matches!(
            extract_number("尚無評價", ParseMode::Strict),
            Err(CrawlError::NumberParse(_))
        ));
    }

    #[test]
    fn test_duration_months() {
        assert_eq!(
            convert_duration("5個月", ParseMode::Strict).unwrap(),
            FieldValue::Days(150)
        );
    }

    #[test]
    fn test_duration_years() {
        assert_eq!(
            convert_duration("3年", ParseMode::Strict).unwrap(),
            FieldValue::Days(1095)
        );
    }

    #[test]
    fn test_duration_without_digits_errors() {
        assert!(matches!(
            convert_duration("去年", ParseMode::Strict),
            Err(CrawlError::DurationParse(_))
        ));
    }

    #[test]
    fn test_duration_without_unit_errors() {
        assert!(matches!(
            convert_duration("42", ParseMode::Strict),
            Err(CrawlError::DurationParse(_))
        ));
    }

    #[test]
    fn test_duration_permissive_falls_back() {
        assert_eq!(
            convert_duration("剛剛加入", ParseMode::Permissive).unwrap(),
            FieldValue::Text("剛剛加入".to_string())
        );
    }

    #[test]
    fn test_duration_last_unit_wins() {
        // "1年2個月" concatenates digits (12) and keeps the last unit.
        assert_eq!(
            convert_duration("1年2個月", ParseMode::Strict).unwrap(),
            FieldValue::Days(12 * 30)
        );
    }
}
