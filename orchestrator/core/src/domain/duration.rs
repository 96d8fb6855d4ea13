// Copyright (c) 2026 Tributary Authors
// SPDX-License-Identifier: AGPL-3.0
//! # Window Duration Grammar
//!
//! Task windows are authored with a hybrid duration notation that mixes a
//! calendar-month token with the standard `h`/`m`/`s` notation:
//!
//! | Input      | Resolved span |
//! |------------|---------------|
//! | `24h`      | 24h           |
//! | `2M`       | 1440h         |
//! | `-1M`      | -720h         |
//! | `1M12h`    | 732h          |
//! | `-1h30m`   | -1h30m        |
//!
//! Months are **not** calendar aware: one month is a fixed 30 day (720h) span.
//!
//! The standard notation is a sign-prefixed sequence of decimal numbers, each
//! with a unit suffix (`ns`, `us`, `µs`, `ms`, `s`, `m`, `h`). A bare `0` is
//! accepted. [`format_duration`] renders spans back into the canonical
//! standard form (`720h0m0s`, `1m30s`, `500ms`, `0s`).
//!
//! # Architecture
//!
//! - **Layer:** Domain
//! - **Purpose:** Pure value parsing, safe to share across sessions

use chrono::TimeDelta;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Hours in one window month (30 days)
pub const HOURS_IN_MONTH: i64 = 30 * 24;

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SECOND: u128 = 1_000_000_000;
const NANOS_PER_MINUTE: u128 = 60 * NANOS_PER_SECOND;
const NANOS_PER_HOUR: u128 = 60 * NANOS_PER_MINUTE;

static MONTH_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([+-])?([0-9]+)M").expect("month token pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationParseError {
    #[error("invalid duration {0:?}")]
    Invalid(String),

    #[error("missing unit in duration {0:?}")]
    MissingUnit(String),

    #[error("unknown unit {unit:?} in duration {input:?}")]
    UnknownUnit { unit: String, input: String },

    #[error("duration {0:?} overflows the representable range")]
    Overflow(String),

    #[error("no month notation in {0:?}")]
    NotAMonthDuration(String),

    #[error("invalid remainder {remainder:?} after month notation in {input:?}: {source}")]
    InvalidRemainder {
        input: String,
        remainder: String,
        #[source]
        source: Box<DurationParseError>,
    },
}

/// Parse a hybrid window duration.
///
/// Month-bearing strings go through [`parse_months`]; anything else is parsed
/// as a standard duration.
pub fn parse(input: &str) -> Result<TimeDelta, DurationParseError> {
    match parse_months(input) {
        Err(DurationParseError::NotAMonthDuration(_)) => parse_standard(input),
        other => other,
    }
}

/// Parse a duration that carries a month token (`[+-]<digits>M`).
///
/// Only the first month token is counted, but every month token is removed
/// from the input, so `1M1M` is one month. Whatever remains is parsed as a standard duration and added to the month span; an empty
/// remainder yields the month span alone. Strings without a month token are
/// rejected with [`DurationParseError::NotAMonthDuration`].
pub fn parse_months(input: &str) -> Result<TimeDelta, DurationParseError> {
    let captures = MONTH_TOKEN
        .captures(input)
        .ok_or_else(|| DurationParseError::NotAMonthDuration(input.to_string()))?;

    let count: i64 = captures[2]
        .parse()
        .map_err(|_| DurationParseError::Overflow(input.to_string()))?;

    let mut hours = count
        .checked_mul(HOURS_IN_MONTH)
        .ok_or_else(|| DurationParseError::Overflow(input.to_string()))?;
    if captures.get(1).map(|m| m.as_str()) == Some("-") {
        hours = -hours;
    }
    let months = TimeDelta::try_hours(hours)
        .ok_or_else(|| DurationParseError::Overflow(input.to_string()))?;

    let remainder = MONTH_TOKEN.replace_all(input, "");
    let remainder = remainder.trim();
    if remainder.is_empty() {
        return Ok(months);
    }

    let rest = parse_standard(remainder).map_err(|e| DurationParseError::InvalidRemainder {
        input: input.to_string(),
        remainder: remainder.to_string(),
        source: Box::new(e),
    })?;

    months
        .checked_add(&rest)
        .ok_or_else(|| DurationParseError::Overflow(input.to_string()))
}

/// Parse the standard `[-+]?(<decimal><unit>)+` notation.
pub fn parse_standard(input: &str) -> Result<TimeDelta, DurationParseError> {
    let invalid = || DurationParseError::Invalid(input.to_string());

    let mut rest = input;
    let negative = match rest.chars().next() {
        Some('-') => {
            rest = &rest[1..];
            true
        }
        Some('+') => {
            rest = &rest[1..];
            false
        }
        _ => false,
    };

    if rest == "0" {
        return Ok(TimeDelta::zero());
    }
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let int_len = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
        let (int_part, after_int) = rest.split_at(int_len);

        let (frac_part, after_number) = match after_int.strip_prefix('.') {
            Some(tail) => {
                let frac_len = tail.bytes().take_while(|b| b.is_ascii_digit()).count();
                tail.split_at(frac_len)
            }
            None => ("", after_int),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }

        let unit_len = after_number
            .char_indices()
            .find(|(_, c)| *c == '.' || c.is_ascii_digit())
            .map(|(i, _)| i)
            .unwrap_or(after_number.len());
        if unit_len == 0 {
            return Err(DurationParseError::MissingUnit(input.to_string()));
        }
        let (unit, tail) = after_number.split_at(unit_len);
        let scale = unit_scale(unit).ok_or_else(|| DurationParseError::UnknownUnit {
            unit: unit.to_string(),
            input: input.to_string(),
        })?;

        let overflow = || DurationParseError::Overflow(input.to_string());
        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| overflow())?
        };
        let mut value = whole.checked_mul(scale).ok_or_else(overflow)?;

        // fractional digits beyond nanosecond precision are truncated
        let mut divisor: u128 = 1;
        let mut fraction: u128 = 0;
        for digit in frac_part.bytes() {
            if divisor > scale {
                break;
            }
            fraction = fraction * 10 + u128::from(digit - b'0');
            divisor *= 10;
        }
        value += fraction * scale / divisor;

        total = total.checked_add(value).ok_or_else(overflow)?;
        if total > i64::MAX as u128 {
            return Err(overflow());
        }
        rest = tail;
    }

    let nanos = total as i64;
    Ok(TimeDelta::nanoseconds(if negative { -nanos } else { nanos }))
}

fn unit_scale(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(NANOS_PER_MICRO),
        "ms" => Some(NANOS_PER_MILLI),
        "s" => Some(NANOS_PER_SECOND),
        "m" => Some(NANOS_PER_MINUTE),
        "h" => Some(NANOS_PER_HOUR),
        _ => None,
    }
}

/// Render a span in the canonical standard notation.
pub fn format_duration(span: TimeDelta) -> String {
    let nanos = i128::from(span.num_seconds()) * NANOS_PER_SECOND as i128
        + i128::from(span.subsec_nanos());
    let negative = nanos < 0;
    let abs = nanos.unsigned_abs();

    if abs == 0 {
        return "0s".to_string();
    }

    let mut out = String::new();
    if negative {
        out.push('-');
    }

    if abs < NANOS_PER_SECOND {
        if abs < NANOS_PER_MICRO {
            out.push_str(&format!("{abs}ns"));
        } else if abs < NANOS_PER_MILLI {
            out.push_str(&format_fraction(abs, 3));
            out.push_str("µs");
        } else {
            out.push_str(&format_fraction(abs, 6));
            out.push_str("ms");
        }
        return out;
    }

    let hours = abs / NANOS_PER_HOUR;
    let minutes = (abs % NANOS_PER_HOUR) / NANOS_PER_MINUTE;
    let seconds = abs % NANOS_PER_MINUTE;

    if hours > 0 {
        out.push_str(&format!("{hours}h"));
    }
    if hours > 0 || minutes > 0 {
        out.push_str(&format!("{minutes}m"));
    }
    out.push_str(&format_fraction(seconds, 9));
    out.push('s');
    out
}

/// `value / 10^precision` with trailing fractional zeros removed
fn format_fraction(value: u128, precision: u32) -> String {
    let scale = 10u128.pow(precision);
    let whole = value / scale;
    let fraction = value % scale;
    if fraction == 0 {
        return whole.to_string();
    }
    let digits = format!("{:0width$}", fraction, width = precision as usize);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}
