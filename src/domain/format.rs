//! Display formatting policy (dates, numbers).
//!
//! Builders only talk to [`DisplayFormat`], so locale conventions can be
//! swapped without touching the tree layout.

use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Timelike, Utc,
};
use serde_json::Value;

use crate::domain::entities::FieldValue;

/// Default display offset: China Standard Time.
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 8 * 60;

/// Formatting conventions used when rendering record values.
pub trait DisplayFormat: Send + Sync {
    /// Interpret a raw field as a point in time.
    fn parse_time(&self, raw: &FieldValue) -> Option<DateTime<FixedOffset>>;

    /// Date and time of day.
    fn date_time(&self, at: &DateTime<FixedOffset>) -> String;

    /// Date only.
    fn date(&self, at: &DateTime<FixedOffset>) -> String;

    /// Number with digit grouping.
    fn number(&self, value: f64) -> String;

    /// Localized date-time for a raw field; unparseable values are shown as-is.
    fn localized(&self, raw: &FieldValue) -> String {
        match self.parse_time(raw) {
            Some(at) => self.date_time(&at),
            None => raw.to_string(),
        }
    }
}

/// `zh-CN` conventions: `2024/1/5 08:03:09`, `2024/1/5`, `1,234,567.891`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZhCnFormat {
    offset: FixedOffset,
}

impl Default for ZhCnFormat {
    fn default() -> Self {
        Self {
            offset: offset_from_minutes(DEFAULT_UTC_OFFSET_MINUTES).unwrap_or_else(|| Utc.fix()),
        }
    }
}

impl ZhCnFormat {
    /// Format in the given UTC offset; `None` if the offset is out of range.
    pub fn with_offset_minutes(minutes: i32) -> Option<Self> {
        offset_from_minutes(minutes).map(|offset| Self { offset })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }
}

fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
}

impl DisplayFormat for ZhCnFormat {
    fn parse_time(&self, raw: &FieldValue) -> Option<DateTime<FixedOffset>> {
        match raw.as_value() {
            Value::Number(n) => {
                let millis = n.as_f64()?;
                if !millis.is_finite() {
                    return None;
                }
                DateTime::from_timestamp_millis(millis as i64)
                    .map(|utc| utc.with_timezone(&self.offset))
            }
            Value::String(s) => parse_time_str(s.trim(), &self.offset),
            _ => None,
        }
    }

    fn date_time(&self, at: &DateTime<FixedOffset>) -> String {
        format!(
            "{} {:02}:{:02}:{:02}",
            self.date(at),
            at.hour(),
            at.minute(),
            at.second()
        )
    }

    fn date(&self, at: &DateTime<FixedOffset>) -> String {
        format!("{}/{}/{}", at.year(), at.month(), at.day())
    }

    fn number(&self, value: f64) -> String {
        group_digits(value)
    }
}

const NAIVE_DATE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Timestamps with an explicit zone are converted into `offset`; naive ones
/// are taken to already be in `offset`. A bare date is midnight in `offset`,
/// not UTC midnight.
fn parse_time_str(s: &str, offset: &FixedOffset) -> Option<DateTime<FixedOffset>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(s) {
        return Some(at.with_timezone(offset));
    }
    if let Ok(at) = DateTime::parse_from_rfc2822(s) {
        return Some(at.with_timezone(offset));
    }
    let naive = NAIVE_DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;
    offset.from_local_datetime(&naive).single()
}

/// Group the integer part with commas, keep at most three decimals.
fn group_digits(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let rendered = format!("{:.3}", value.abs());
    let (int_part, frac_part) = rendered.split_once('.').unwrap_or((rendered.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let negative = value < 0.0 && (int_part != "0" || !frac_part.is_empty());
    let sign = if negative { "-" } else { "" };
    if frac_part.is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{}", sign, grouped, frac_part)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn given_large_number_when_grouping_then_inserts_commas() {
        assert_eq!(group_digits(1234567.0), "1,234,567");
        assert_eq!(group_digits(1234567.8912), "1,234,567.891");
        assert_eq!(group_digits(999.5), "999.5");
        assert_eq!(group_digits(0.0001), "0");
        assert_eq!(group_digits(-1000.25), "-1,000.25");
    }

    #[test]
    fn given_naive_timestamp_when_formatting_then_keeps_wall_clock() {
        let format = ZhCnFormat::default();
        let raw = FieldValue::from("2024-01-05 08:03:09");

        assert_eq!(format.localized(&raw), "2024/1/5 08:03:09");
    }

    #[test]
    fn given_rfc2822_gmt_when_formatting_then_converts_to_offset() {
        let format = ZhCnFormat::default();
        let raw = FieldValue::from("Fri, 05 Jan 2024 08:03:09 GMT");

        assert_eq!(format.localized(&raw), "2024/1/5 16:03:09");
    }

    #[test]
    fn given_epoch_millis_when_formatting_then_converts_to_offset() {
        let format = ZhCnFormat::with_offset_minutes(0).unwrap();
        let raw = FieldValue::new(json!(1704441789000_i64));

        assert_eq!(format.localized(&raw), "2024/1/5 08:03:09");
    }

    #[test]
    fn given_garbage_when_formatting_then_shows_raw() {
        let format = ZhCnFormat::default();
        assert_eq!(format.localized(&FieldValue::from("yesterday")), "yesterday");
    }

    #[test]
    fn given_date_only_when_formatting_then_local_midnight() {
        let format = ZhCnFormat::default();
        let raw = FieldValue::from("2024-01-05");

        assert_eq!(format.localized(&raw), "2024/1/5 00:00:00");
    }

    #[test]
    fn given_out_of_range_offset_when_creating_then_none() {
        assert!(ZhCnFormat::with_offset_minutes(24 * 60).is_none());
        assert!(ZhCnFormat::with_offset_minutes(-300).is_some());
    }
}
