//! Price normalization.
//!
//! Every price leaving the pipeline has the shape `<symbol><integer>,<fraction>`
//! with exactly two fraction digits and a comma as decimal separator, e.g.
//! `€12,50` or `$1234,00`. Grouping marks are dropped.

use serde_json::Value;

/// Currency symbols kept by [`normalize_price`]; anything else is discarded.
pub const CURRENCY_SYMBOLS: [char; 5] = ['€', '$', '£', '¥', '₹'];

pub const DEFAULT_CURRENCY_SYMBOL: &str = "$";

/// Floats at or above this value are read as minor units, below it as major
/// units. Ambiguous for genuine prices in the thousands expressed in major
/// units; see DESIGN.md.
pub const MINOR_UNITS_THRESHOLD: f64 = 1000.0;

/// Normalize scraped price text into the canonical form.
///
/// Returns `None` when the text holds no digits. The first price-like run of
/// the text is used, so `"Regular price $10.00 Sale price $8.00"` yields
/// `"$10,00"`.
pub fn normalize_price(raw: &str) -> Option<String> {
    let symbol = raw.chars().find(|c| CURRENCY_SYMBOLS.contains(c));
    let amount = first_amount(raw)?;
    let (integer, fraction) = split_amount(&amount);

    let mut out = String::with_capacity(integer.len() + 4);
    if let Some(symbol) = symbol {
        out.push(symbol);
    }
    out.push_str(&integer);
    out.push(',');
    out.push_str(&fraction);
    Some(out)
}

/// Render an amount in minor units (cents) through the same normalization as
/// scraped text, so both paths agree on the output.
pub fn format_minor_units(cents: i64, symbol: &str) -> Option<String> {
    if cents < 0 {
        return None;
    }
    let text = format!("{symbol}{}.{:02}", cents / 100, cents % 100);
    normalize_price(&text)
}

/// A price field as found in structured product data.
#[derive(Debug, Clone, PartialEq)]
pub enum RawPrice {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl RawPrice {
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => number
                .as_i64()
                .map(RawPrice::Integer)
                .or_else(|| number.as_f64().map(RawPrice::Float)),
            Value::String(text) => Some(RawPrice::Text(text.clone())),
            _ => None,
        }
    }

    /// Interpret the raw value as an amount in minor units.
    ///
    /// - integers are already minor units
    /// - floats go through [`MINOR_UNITS_THRESHOLD`]
    /// - digit-only strings are minor units, other strings are major units
    pub fn to_minor_units(&self) -> Option<i64> {
        match self {
            RawPrice::Integer(value) => (*value >= 0).then_some(*value),
            RawPrice::Float(value) => float_to_minor_units(*value),
            RawPrice::Text(text) => text_to_minor_units(text),
        }
    }
}

fn float_to_minor_units(value: f64) -> Option<i64> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    if value < MINOR_UNITS_THRESHOLD {
        whole_i64((value * 100.0).round())
    } else {
        whole_i64(value.trunc())
    }
}

/// `None` when the value does not fit an `i64` instead of saturating.
fn whole_i64(value: f64) -> Option<i64> {
    (value.is_finite() && value >= 0.0 && value < i64::MAX as f64).then_some(value as i64)
}

fn text_to_minor_units(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.chars().all(|c| c.is_ascii_digit()) {
        return trimmed.parse().ok();
    }
    if let Ok(major) = trimmed.parse::<f64>() {
        return whole_i64((major * 100.0).round());
    }
    // Localised text such as "12,50 €": reuse the canonical form.
    let canonical = normalize_price(trimmed)?;
    let digits: String = canonical
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',')
        .collect();
    let (integer, fraction) = digits.split_once(',')?;
    let integer: i64 = integer.parse().ok()?;
    let fraction: i64 = fraction.parse().ok()?;
    integer.checked_mul(100)?.checked_add(fraction)
}

/// Collect the first run of digits and separators. A separator right before
/// the first digit belongs to the run (".99"). A lone whitespace between a
/// digit and a group of exactly three digits is a grouping mark ("1 234").
fn first_amount(raw: &str) -> Option<String> {
    let chars: Vec<char> = raw.chars().collect();
    let first_digit = chars.iter().position(|c| c.is_ascii_digit())?;
    let start = match first_digit.checked_sub(1).map(|idx| chars[idx]) {
        Some('.' | ',') => first_digit - 1,
        _ => first_digit,
    };

    let mut amount = String::new();
    let mut idx = start;
    while idx < chars.len() {
        let c = chars[idx];
        if c.is_ascii_digit() {
            amount.push(c);
        } else if c == '.' || c == ',' {
            if !chars.get(idx + 1).is_some_and(|n| n.is_ascii_digit()) {
                break;
            }
            amount.push(c);
        } else if c.is_whitespace() && is_space_group(&chars, idx) {
            amount.push(',');
        } else {
            break;
        }
        idx += 1;
    }
    Some(amount)
}

fn is_space_group(chars: &[char], idx: usize) -> bool {
    let prev_is_digit = idx > 0 && chars[idx - 1].is_ascii_digit();
    let group = chars.get(idx + 1..idx + 4);
    let group_is_digits = group.is_some_and(|g| g.iter().all(|c| c.is_ascii_digit()));
    let ends_group = !chars.get(idx + 4).is_some_and(|c| c.is_ascii_digit());
    prev_is_digit && group_is_digits && ends_group
}

/// Split a run like `1.234,5` into `("1234", "50")`. Three digits after the
/// last separator are a thousands group only behind a non-zero integer part.
fn split_amount(amount: &str) -> (String, String) {
    let (integer, fraction) = match amount.rfind(['.', ',']) {
        None => (amount.to_string(), String::new()),
        Some(pos) => {
            let head: String = amount[..pos].chars().filter(char::is_ascii_digit).collect();
            let tail = &amount[pos + 1..];
            let head_is_group = head.chars().any(|c| c != '0');
            if tail.len() == 3 && head_is_group {
                (format!("{head}{tail}"), String::new())
            } else {
                (head, tail.chars().take(2).collect())
            }
        }
    };

    let integer = integer.trim_start_matches('0');
    let integer = if integer.is_empty() { "0" } else { integer };
    (integer.to_string(), format!("{fraction:0<2}"))
}
