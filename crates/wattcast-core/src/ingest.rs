//! CSV ingest for monthly consumption/billing uploads
//!
//! Any header layout is accepted as long as one column can be identified for
//! each role (period, consumption, bill). Cells that fail to parse are coerced
//! rather than rejected.

use csv::{ReaderBuilder, StringRecord};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{ColumnRoles, Dataset, UNKNOWN_PERIOD};

/// Header substrings identifying the period label column
const PERIOD_KEYS: &[&str] = &["month"];

/// Header substrings identifying the consumption column
const QUANTITY_KEYS: &[&str] = &["consum", "energy", "usage", "kwh"];

/// Header substrings identifying the billed amount column
const AMOUNT_KEYS: &[&str] = &["bill", "amount", "cost"];

/// Result of parsing an upload
#[derive(Debug, Clone)]
pub struct ParsedUpload {
    pub dataset: Dataset,
    pub columns: ColumnRoles,
    /// All headers after normalization, in file order
    pub headers: Vec<String>,
}

/// Normalize a header for matching: trimmed, lower-cased
fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase()
}

/// First header containing any of `keys`
fn find_column<'a>(headers: &'a [String], keys: &[&str]) -> Option<&'a String> {
    headers
        .iter()
        .find(|h| keys.iter().any(|key| h.contains(key)))
}

/// Assign roles to normalized headers
///
/// Each role takes the first header that matches its vocabulary, so a header
/// like `energy_cost` may satisfy both consumption and bill.
pub fn detect_columns(headers: &[String]) -> Result<ColumnRoles> {
    let period = find_column(headers, PERIOD_KEYS);
    let quantity = find_column(headers, QUANTITY_KEYS);
    let amount = find_column(headers, AMOUNT_KEYS);

    match (period, quantity, amount) {
        (Some(period), Some(quantity), Some(amount)) => Ok(ColumnRoles {
            period: period.clone(),
            quantity: quantity.clone(),
            amount: amount.clone(),
        }),
        _ => Err(Error::MissingColumns {
            found: headers.to_vec(),
        }),
    }
}

/// Parse raw upload bytes into a dataset
///
/// Bytes are decoded lossily, so files with stray non-UTF-8 characters still
/// load.
pub fn parse_csv(bytes: &[u8]) -> Result<ParsedUpload> {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim_start_matches('\u{feff}');

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = rdr.headers()?.iter().map(normalize_header).collect();

    let mut rows: Vec<StringRecord> = Vec::new();
    let mut skipped = 0usize;
    for result in rdr.records() {
        let record = result?;
        if is_blank(&record) {
            skipped += 1;
            continue;
        }
        rows.push(record);
    }

    let columns = detect_columns(&headers)?;
    let position = |name: &str| headers.iter().position(|h| h == name);
    let (period_col, quantity_col, amount_col) = match (
        position(&columns.period),
        position(&columns.quantity),
        position(&columns.amount),
    ) {
        (Some(p), Some(q), Some(a)) => (p, q, a),
        _ => {
            return Err(Error::MissingColumns {
                found: headers.clone(),
            })
        }
    };

    if rows.is_empty() {
        return Err(Error::InvalidData("CSV contains no data rows".into()));
    }

    let dataset = Dataset::from_rows(rows.iter().map(|record| {
        let month = record
            .get(period_col)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNKNOWN_PERIOD)
            .to_string();
        let consumption = coerce_number(record.get(quantity_col).unwrap_or(""));
        let bill = coerce_number(record.get(amount_col).unwrap_or(""));
        (month, consumption, bill)
    }));

    debug!(
        rows = dataset.len(),
        skipped,
        period = %columns.period,
        quantity = %columns.quantity,
        amount = %columns.amount,
        "Parsed consumption CSV"
    );

    Ok(ParsedUpload {
        dataset,
        columns,
        headers,
    })
}

/// True when every cell in the row is empty or whitespace
fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|cell| cell.trim().is_empty())
}

/// Parse a numeric cell, returning 0.0 for anything unparseable
///
/// Strips currency symbols and thousands separators first.
pub fn coerce_number(s: &str) -> f64 {
    let cleaned: String = s
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | '₹' | '€' | '£' | ',' | ' '))
        .collect();

    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// SHA-256 fingerprint of an upload
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
