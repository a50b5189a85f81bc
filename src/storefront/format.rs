// storefront/format.rs - Display formatting and user input validation

use std::sync::OnceLock;

use chrono::{DateTime, Datelike, FixedOffset};
use regex::Regex;
use thiserror::Error;

pub const MAX_QUERY_CHARS: usize = 100;
pub const MAX_PRICE: u32 = 100_000_000;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;
const JST_OFFSET_SECONDS: i32 = 9 * 60 * 60;

static SCRIPT_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

/// Rejected user input; messages are shown as-is in the storefront
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("検索キーワードを入力してください")]
    EmptyQuery,
    #[error("検索キーワードは100文字以内で入力してください")]
    QueryTooLong,
    #[error("使用できない文字が含まれています")]
    ForbiddenPattern,
    #[error("価格は数値で入力してください")]
    PriceNotNumeric,
    #[error("価格は0以上で入力してください")]
    NegativePrice,
    #[error("価格は1億円以内で入力してください")]
    PriceTooHigh,
    #[error("最低価格は最高価格以下で設定してください")]
    InvertedRange,
}

/// `12345` -> `"12,345円"`
pub fn format_price(price: u32) -> String {
    let digits = price.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.push('円');
    out
}

pub fn format_price_range(min: Option<u32>, max: Option<u32>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("{} 〜 {}", format_price(min), format_price(max)),
        (Some(min), None) => format!("{}以上", format_price(min)),
        (None, Some(max)) => format!("{}以下", format_price(max)),
        (None, None) => "価格指定なし".to_string(),
    }
}

/// Calendar date in Japan time, e.g. `2024年1月15日`
pub fn format_date(timestamp: i64) -> String {
    let jst = FixedOffset::east_opt(JST_OFFSET_SECONDS);
    match (DateTime::from_timestamp(timestamp, 0), jst) {
        (Some(utc), Some(jst)) => {
            let date = utc.with_timezone(&jst);
            format!("{}年{}月{}日", date.year(), date.month(), date.day())
        }
        _ => "日付不明".to_string(),
    }
}

/// Coarse age of `timestamp` relative to `now` (both Unix seconds)
pub fn format_relative_date(timestamp: i64, now: i64) -> String {
    let days = now.saturating_sub(timestamp).max(0) / SECONDS_PER_DAY;
    match days {
        0 => "今日".to_string(),
        1 => "昨日".to_string(),
        2..=6 => format!("{days}日前"),
        7..=29 => format!("{}週間前", days / 7),
        _ => format!("{}ヶ月前", days / 30),
    }
}

/// Cut `text` to at most `max_chars` characters, `suffix` included
pub fn truncate_text(text: &str, max_chars: usize, suffix: &str) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let suffix_len = suffix.chars().count();
    if suffix_len >= max_chars {
        return text.chars().take(max_chars).collect();
    }
    let keep = max_chars - suffix_len;
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(suffix);
    out
}

pub fn validate_search_query(query: &str) -> Result<&str, ValidationError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyQuery);
    }
    if trimmed.chars().count() > MAX_QUERY_CHARS {
        return Err(ValidationError::QueryTooLong);
    }
    let pattern = SCRIPT_PATTERN.get_or_init(|| Regex::new(r"(?i)<script|javascript:|on\w+=").ok());
    if pattern.as_ref().is_some_and(|re| re.is_match(query)) {
        return Err(ValidationError::ForbiddenPattern);
    }
    Ok(trimmed)
}

/// Parse a price field. Blank input means "not set"; fractions are floored.
pub fn validate_price(input: &str) -> Result<Option<u32>, ValidationError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    let value: f64 = input.parse().map_err(|_| ValidationError::PriceNotNumeric)?;
    if value.is_nan() {
        return Err(ValidationError::PriceNotNumeric);
    }
    if value < 0.0 {
        return Err(ValidationError::NegativePrice);
    }
    if value > f64::from(MAX_PRICE) {
        return Err(ValidationError::PriceTooHigh);
    }
    Ok(Some(value.floor() as u32))
}

pub fn validate_price_range(min: Option<u32>, max: Option<u32>) -> Result<(), ValidationError> {
    match (min, max) {
        (Some(min), Some(max)) if min > max => Err(ValidationError::InvertedRange),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(0), "0円");
        assert_eq!(format_price(500), "500円");
        assert_eq!(format_price(1000), "1,000円");
        assert_eq!(format_price(1234567), "1,234,567円");
    }

    #[test]
    fn test_format_price_range() {
        assert_eq!(format_price_range(Some(1000), Some(5000)), "1,000円 〜 5,000円");
        assert_eq!(format_price_range(Some(10000), None), "10,000円以上");
        assert_eq!(format_price_range(None, Some(3000)), "3,000円以下");
        assert_eq!(format_price_range(None, None), "価格指定なし");
    }

    #[test]
    fn test_format_date_uses_japan_time() {
        // 2024-01-14T16:00:00Z is already the 15th in Tokyo
        assert_eq!(format_date(1_705_248_000), "2024年1月15日");
    }

    #[test]
    fn test_format_relative_date() {
        let now = 1_705_248_000;
        let day = SECONDS_PER_DAY;
        assert_eq!(format_relative_date(now - 60, now), "今日");
        assert_eq!(format_relative_date(now - day, now), "昨日");
        assert_eq!(format_relative_date(now - 3 * day, now), "3日前");
        assert_eq!(format_relative_date(now - 15 * day, now), "2週間前");
        assert_eq!(format_relative_date(now - 65 * day, now), "2ヶ月前");
        assert_eq!(format_relative_date(now + day, now), "今日");
    }

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(truncate_text("今治タオル", 10, "..."), "今治タオル");
        assert_eq!(truncate_text("とても長い商品名ですよね", 10, "..."), "とても長い商品...");
    }

    #[test]
    fn test_truncate_never_exceeds_limit() {
        assert_eq!(truncate_text("今治タオル", 2, "..."), "今治");
        assert_eq!(truncate_text("今治タオル", 3, "..."), "今治タ");
        assert_eq!(truncate_text("今治タオル", 0, "..."), "");
        for max in 0..8 {
            assert!(truncate_text("とても長い商品名ですよね", max, "…続き").chars().count() <= max);
        }
    }

    #[test]
    fn test_validate_search_query() {
        assert_eq!(validate_search_query("  タオル "), Ok("タオル"));
        assert_eq!(validate_search_query("   "), Err(ValidationError::EmptyQuery));
        assert_eq!(
            validate_search_query(&"あ".repeat(101)),
            Err(ValidationError::QueryTooLong)
        );
        assert_eq!(
            validate_search_query("<SCRIPT>alert(1)"),
            Err(ValidationError::ForbiddenPattern)
        );
        assert_eq!(
            validate_search_query("img onerror=x"),
            Err(ValidationError::ForbiddenPattern)
        );
    }

    #[test]
    fn test_validate_price() {
        assert_eq!(validate_price(""), Ok(None));
        assert_eq!(validate_price("3000.9"), Ok(Some(3000)));
        assert_eq!(validate_price("abc"), Err(ValidationError::PriceNotNumeric));
        assert_eq!(validate_price("-1"), Err(ValidationError::NegativePrice));
        assert_eq!(validate_price("100000001"), Err(ValidationError::PriceTooHigh));
        assert_eq!(validate_price("100000000"), Ok(Some(MAX_PRICE)));
    }

    #[test]
    fn test_validate_price_range() {
        assert!(validate_price_range(Some(1000), None).is_ok());
        assert!(validate_price_range(Some(1000), Some(1000)).is_ok());
        assert_eq!(
            validate_price_range(Some(5000), Some(3000)),
            Err(ValidationError::InvertedRange)
        );
    }
}
