use crate::core::cleaning::{extract_number, parse_price, to_numeric};
use crate::domain::model::CarRecord;
use crate::utils::error::{ProjectError, Result};
use std::path::{Path, PathBuf};

pub const COMPANY_COLUMN: &str = "Company Names";
pub const NAME_COLUMN: &str = "Cars Names";
pub const FUEL_COLUMN: &str = "Fuel Types";
pub const PRICE_COLUMN: &str = "Cars Prices";
pub const HORSEPOWER_COLUMN: &str = "HorsePower";
pub const CC_COLUMN: &str = "CC/Battery Capacity";
pub const PERFORMANCE_COLUMN: &str = "Performance(0 - 100 )KM/H";
pub const TORQUE_COLUMN: &str = "Torque";
pub const SEATS_COLUMN: &str = "Seats";

/// One CSV row with its header names, in file order.
pub type HeadRow = Vec<(String, String)>;

/// Looks for `<root>/<data_dir>/<file_name>` first, then `<cwd>/<file_name>`.
pub fn find_sample_csv(root: &Path, data_dir: &str, file_name: &str, cwd: &Path) -> Result<PathBuf> {
    let candidate = root.join(data_dir).join(file_name);
    if candidate.is_file() {
        return Ok(candidate);
    }

    let fallback = cwd.join(file_name);
    if fallback.is_file() {
        return Ok(fallback);
    }

    Err(ProjectError::DataNotFound {
        path: file_name.to_string(),
        hint: format!(
            "expected at '{}' or '{}'",
            candidate.display(),
            fallback.display()
        ),
    })
}

/// First `n` data rows of a headed CSV file.
pub fn read_head(path: &Path, n: usize) -> Result<Vec<HeadRow>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.headers()?.clone();

    let mut rows = Vec::with_capacity(n);
    for record in reader.records().take(n) {
        let record = record?;
        rows.push(
            headers
                .iter()
                .zip(record.iter())
                .map(|(h, v)| (h.to_string(), v.to_string()))
                .collect(),
        );
    }
    Ok(rows)
}

/// Each byte maps to the code point of the same value.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Parses the cars dataset. Headers are trimmed; a column absent from the
/// file leaves the matching field missing on every row.
pub fn parse_cars(content: &str) -> Result<Vec<CarRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let index_of = |name: &str| headers.iter().position(|h| h == name);

    let company = index_of(COMPANY_COLUMN);
    let name = index_of(NAME_COLUMN);
    let fuel = index_of(FUEL_COLUMN);
    let price = index_of(PRICE_COLUMN);
    let horsepower = index_of(HORSEPOWER_COLUMN);
    let cc = index_of(CC_COLUMN);
    let perf = index_of(PERFORMANCE_COLUMN);
    let torque = index_of(TORQUE_COLUMN);
    let seats = index_of(SEATS_COLUMN);

    for (column, idx) in [(PRICE_COLUMN, price), (HORSEPOWER_COLUMN, horsepower)] {
        if idx.is_none() {
            tracing::warn!("Column '{}' not found in dataset", column);
        }
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let cell = |idx: Option<usize>| idx.and_then(|i| row.get(i));
        let text = |idx: Option<usize>| {
            cell(idx)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        records.push(CarRecord {
            company: text(company),
            name: text(name),
            fuel_type: text(fuel),
            price: cell(price).and_then(parse_price),
            horsepower: cell(horsepower).and_then(extract_number),
            cc: cell(cc).and_then(extract_number),
            perf_sec: cell(perf).and_then(extract_number),
            torque: cell(torque).and_then(extract_number),
            seats: cell(seats).and_then(to_numeric),
        });
    }

    tracing::debug!("Parsed {} dataset rows", records.len());
    Ok(records)
}
