//! Best-effort parsing of the free-text numeric cells found in the cars
//! dataset ("$12,000-$15,000", "1.2k", "300 Nm", ...).

use regex::Regex;
use std::sync::LazyLock;

static SUFFIXED_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]*\.?[0-9]+)\s*([kKmM]?)$").expect("valid suffixed number pattern")
});

static NUMERIC_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]*\.?[0-9]+\s*[kKmM]?)").expect("valid numeric token pattern")
});

static CURRENCY_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,$£€]").expect("valid currency pattern"));

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Converts a number with an optional `k`/`M` suffix: `"1.2k"` is 1200,
/// `"3M"` is 3,000,000. Anything else falls back to a plain float parse.
pub fn num_with_suffix(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let Some(caps) = SUFFIXED_NUMBER.captures(s) else {
        return s.parse::<f64>().ok().and_then(finite);
    };

    let num: f64 = caps[1].parse().ok()?;
    let multiplier = match caps[2].to_ascii_lowercase().as_str() {
        "k" => 1_000.0,
        "m" => 1_000_000.0,
        _ => 1.0,
    };
    finite(num * multiplier)
}

fn first_token_value(s: &str) -> Option<f64> {
    NUMERIC_TOKEN
        .find(s)
        .and_then(|m| num_with_suffix(&m.as_str().replace(' ', "")))
}

/// Parses a price cell. Ranges such as `"$12,000-$15,000"` yield the mean of
/// their endpoints.
pub fn parse_price(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let cleaned = CURRENCY_CHARS.replace_all(s, "");

    if cleaned.contains('-') {
        let values: Vec<f64> = cleaned
            .split('-')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .filter_map(first_token_value)
            .collect();
        return mean(&values);
    }

    first_token_value(&cleaned)
}

/// Mean of every numeric token in `s`, e.g. `"70-85 hp"` gives 77.5.
pub fn extract_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let without_commas = s.replace(',', " ");
    let values: Vec<f64> = NUMERIC_TOKEN
        .find_iter(&without_commas)
        .filter_map(|m| num_with_suffix(&m.as_str().replace(' ', "")))
        .collect();
    mean(&values)
}

/// Plain numeric conversion; unparseable cells become missing.
pub fn to_numeric(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().and_then(finite)
}
