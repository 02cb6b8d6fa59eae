//! Common utilities for report generation.
//!
//! Shared helpers for pt-BR number/date formatting and the download filename.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::{Decimal, RoundingStrategy};

/// Substitute for text fields that are absent or blank at render time.
pub const PLACEHOLDER: &str = "N/A";

/// Return the trimmed-empty-aware value or [`PLACEHOLDER`].
pub fn or_placeholder(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => PLACEHOLDER,
    }
}

/// Format a date as `dd/MM/yyyy`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Format a timestamp as `dd/MM/yyyy HH:mm`.
pub fn format_timestamp(timestamp: NaiveDateTime) -> String {
    timestamp.format("%d/%m/%Y %H:%M").to_string()
}

/// Insert `.` every three digits from the right, e.g. `1234567` -> `1.234.567`.
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut grouped = String::with_capacity(len + len / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    grouped
}

/// Integer with pt-BR thousands separators (e.g. `45.000`).
pub fn format_mileage(km: i64) -> String {
    let digits = km.unsigned_abs().to_string();
    if km < 0 {
        format!("-{}", group_thousands(&digits))
    } else {
        group_thousands(&digits)
    }
}

/// Currency with two decimals and pt-BR separators (e.g. `R$ 1.234,56`).
pub fn format_currency(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let plain = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };

    format!("R$ {}{},{}", sign, group_thousands(int_part), frac_part)
}

/// Download filename: `relatorio_<plate>_<ddMMyyyy>.pdf`, with spaces and
/// hyphens in the plate replaced by underscores.
pub fn report_filename(plate: &str, date: NaiveDate) -> String {
    let plate = plate.trim().replace([' ', '-'], "_");
    format!("relatorio_{}_{}.pdf", plate, date.format("%d%m%Y"))
}
