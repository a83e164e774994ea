//! Exploratory statistics over the cleaned cars dataset.

use crate::domain::model::{
    BoxStats, CarRecord, CorrelationMatrix, EdaReport, EdaSummary, HistogramBin, NUMERIC_COLUMNS,
};
use std::collections::HashMap;

/// Equal-width histogram in the style of `numpy.histogram`: the last bin is
/// closed on the right, and a degenerate range is widened by 0.5 each side.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let mut lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;

    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            start: lo + width * i as f64,
            end: if i + 1 == bins { hi } else { lo + width * (i + 1) as f64 },
            count,
        })
        .collect()
}

/// Linear-interpolated quantile of already sorted values.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    quantile_sorted(&sorted, 0.5)
}

/// Pearson correlation; `None` below two observations or with zero variance.
pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for &(x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0))
}

/// Pairwise-complete correlation over the numeric columns.
pub fn correlation_matrix(records: &[CarRecord]) -> CorrelationMatrix {
    let columns: Vec<String> = NUMERIC_COLUMNS.iter().map(|c| c.to_string()).collect();
    let values = NUMERIC_COLUMNS
        .iter()
        .map(|a| {
            NUMERIC_COLUMNS
                .iter()
                .map(|b| {
                    let pairs: Vec<(f64, f64)> = records
                        .iter()
                        .filter_map(|r| Some((r.numeric(a)?, r.numeric(b)?)))
                        .collect();
                    pearson(&pairs)
                })
                .collect()
        })
        .collect();

    CorrelationMatrix { columns, values }
}

/// The `n` most frequent companies; ties keep first-appearance order.
pub fn top_companies(records: &[CarRecord], n: usize) -> Vec<String> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for company in records.iter().filter_map(|r| r.company.as_deref()) {
        let count = counts.entry(company).or_insert(0);
        if *count == 0 {
            order.push(company.to_string());
        }
        *count += 1;
    }

    // sort_by is stable, so equal counts stay in first-seen order
    order.sort_by(|a, b| counts[b.as_str()].cmp(&counts[a.as_str()]));
    order.truncate(n);
    order
}

pub fn company_boxplot(records: &[CarRecord], top_n: usize) -> Vec<BoxStats> {
    top_companies(records, top_n)
        .into_iter()
        .filter_map(|company| {
            let mut prices: Vec<f64> = records
                .iter()
                .filter(|r| r.company.as_deref() == Some(company.as_str()))
                .filter_map(|r| r.price)
                .collect();
            prices.sort_by(f64::total_cmp);

            Some(BoxStats {
                count: prices.len(),
                min: *prices.first()?,
                q1: quantile_sorted(&prices, 0.25)?,
                median: quantile_sorted(&prices, 0.5)?,
                q3: quantile_sorted(&prices, 0.75)?,
                max: *prices.last()?,
                company,
            })
        })
        .collect()
}

/// Thousands-separated label: integers when the value is whole or at least
/// 1000 in magnitude, one decimal otherwise.
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value.abs() >= 1000.0 || value.fract() == 0.0 {
        return group_thousands(value.trunc() as i64);
    }
    let rounded = format!("{:.1}", value.abs());
    let (int_part, frac_part) = rounded.split_once('.').unwrap_or((rounded.as_str(), "0"));
    let int_value: i64 = int_part.parse().unwrap_or(0);
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, group_thousands(int_value), frac_part)
}

fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if value < 0 {
        format!("-{}", out)
    } else {
        out
    }
}

pub fn build_report(records: &[CarRecord], bins: usize, top_n: usize) -> EdaReport {
    let prices: Vec<f64> = records.iter().filter_map(|r| r.price).collect();
    let log_prices: Vec<f64> = prices
        .iter()
        .filter(|p| **p > 0.0)
        .map(|p| p.log10())
        .collect();
    let horsepower_vs_price = records
        .iter()
        .filter_map(|r| Some((r.horsepower?, r.price?)))
        .collect();

    let non_missing = NUMERIC_COLUMNS
        .iter()
        .map(|c| {
            (
                c.to_string(),
                records.iter().filter(|r| r.numeric(c).is_some()).count(),
            )
        })
        .collect();

    EdaReport {
        summary: EdaSummary {
            rows: records.len(),
            non_missing,
            generated_at: chrono::Utc::now(),
        },
        price_hist: histogram(&prices, bins),
        log_price_hist: histogram(&log_prices, bins),
        horsepower_vs_price,
        company_boxplot: company_boxplot(records, top_n),
        correlation: correlation_matrix(records),
    }
}
