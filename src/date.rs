//! PDF date strings.
//!
//! PDF Spec: ISO 32000-1:2008, Section 7.9.4 - Dates.
//! Format: `D:YYYYMMDDHHmmSSOHH'mm'` where every field after the year is optional.

use crate::error::{Error, Result};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Timelike};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PDF_DATE: Regex = Regex::new(
        r"^(?:D:)?(\d{4})(\d{2})?(\d{2})?(\d{2})?(\d{2})?(\d{2})?(?:([+\-Z])(?:(\d{2})'?(?:(\d{2})'?)?)?)?$"
    )
    .expect("PDF date pattern is valid");
}

/// Parse a PDF date string.
pub fn parse_pdf_date(text: &str) -> Result<DateTime<FixedOffset>> {
    let text = text.trim();
    let caps = PDF_DATE
        .captures(text)
        .ok_or_else(|| Error::corrupt(format!("invalid date string '{}'", text)))?;

    let field = |i: usize, default: u32| -> u32 {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(default)
    };

    let year = field(1, 0) as i32;
    let (month, day) = (field(2, 1), field(3, 1));
    let (hour, minute, second) = (field(4, 0), field(5, 0), field(6, 0));

    let offset_seconds = match caps.get(7).map(|m| m.as_str()) {
        Some("+") => (field(8, 0) * 3600 + field(9, 0) * 60) as i32,
        Some("-") => -((field(8, 0) * 3600 + field(9, 0) * 60) as i32),
        _ => 0,
    };

    let offset = FixedOffset::east_opt(offset_seconds)
        .ok_or_else(|| Error::corrupt(format!("invalid UTC offset in date '{}'", text)))?;
    let naive = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, second))
        .ok_or_else(|| Error::corrupt(format!("date out of range '{}'", text)))?;

    offset
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| Error::corrupt(format!("ambiguous date '{}'", text)))
}

/// Format a date as a PDF date string.
pub fn format_pdf_date(date: &DateTime<FixedOffset>) -> String {
    let offset = date.offset().local_minus_utc();
    let sign = if offset < 0 { '-' } else { '+' };
    let offset = offset.abs();
    format!(
        "D:{:04}{:02}{:02}{:02}{:02}{:02}{}{:02}'{:02}'",
        date.year(),
        date.month(),
        date.day(),
        date.hour(),
        date.minute(),
        date.second(),
        sign,
        offset / 3600,
        (offset % 3600) / 60
    )
}
