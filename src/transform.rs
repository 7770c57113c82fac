// src/transform.rs

use std::{collections::HashMap, fs::File, path::Path};
use tracing::{debug, instrument, warn};

use crate::error::{EtlError, Result};
use crate::extract::MARKET_CAP;
use crate::table::{Table, Value};

pub const USD_COLUMN: &str = "MC_USD_Billion";

/// Currencies converted from USD, in column order.
pub const TARGET_CURRENCIES: [&str; 3] = ["GBP", "EUR", "INR"];

/// Multiplier used for a currency absent from the rate file.
pub const DEFAULT_RATE: f64 = 1.0;

/// Currency code → USD multiplier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateMap(HashMap<String, f64>);

impl RateMap {
    /// Read a headerless `currency,rate` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| EtlError::rate_file(path, e))?;
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let mut rates = HashMap::new();
        for (i, record) in rdr.records().enumerate() {
            let record = record.map_err(|e| EtlError::rate_file(path, e))?;
            let line = record.position().map(|p| p.line()).unwrap_or(i as u64 + 1);
            if record.iter().all(str::is_empty) {
                continue;
            }
            if record.len() < 2 {
                return Err(EtlError::rate_file(
                    path,
                    format!("line {}: expected `currency,rate`", line),
                ));
            }
            let rate: f64 = record[1].parse().map_err(|_| {
                EtlError::rate_file(path, format!("line {}: rate {:?} is not a number", line, &record[1]))
            })?;
            if !rate.is_finite() || rate <= 0.0 {
                return Err(EtlError::rate_file(
                    path,
                    format!("line {}: rate {} must be positive", line, rate),
                ));
            }
            if rates.insert(record[0].to_string(), rate).is_some() {
                warn!(currency = &record[0], line, "duplicate currency; keeping the later rate");
            }
        }

        if rates.is_empty() {
            return Err(EtlError::rate_file(path, "no rates found"));
        }
        debug!(count = rates.len(), "loaded exchange rates");
        Ok(Self(rates))
    }

    pub fn get(&self, currency: &str) -> Option<f64> {
        self.0.get(currency).copied()
    }

    /// Rate for `currency`, or [`DEFAULT_RATE`] when unknown.
    pub fn rate(&self, currency: &str) -> f64 {
        self.get(currency).unwrap_or(DEFAULT_RATE)
    }
}

impl FromIterator<(String, f64)> for RateMap {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Round to two decimals, ties to even.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round_ties_even() / 100.0
}

pub fn currency_column(currency: &str) -> String {
    format!("MC_{}_Billion", currency)
}

/// Load rates from `rate_file` and append the converted columns.
pub fn transform(table: Table, rate_file: impl AsRef<Path>) -> Result<Table> {
    let rates = RateMap::load(rate_file)?;
    apply_rates(table, &rates)
}

/// Append `MC_USD_Billion` and one rounded `MC_<CCY>_Billion` column per
/// target currency. Rows and existing columns are untouched.
#[instrument(level = "debug", skip_all, fields(rows = table.num_rows()))]
pub fn apply_rates(mut table: Table, rates: &RateMap) -> Result<Table> {
    let idx = table
        .column_index(MARKET_CAP)
        .ok_or_else(|| EtlError::Schema(format!("column {:?} not found", MARKET_CAP)))?;

    let usd = table
        .rows()
        .iter()
        .enumerate()
        .map(|(i, row)| {
            row[idx].as_f64().map(|cap| cap / 1e9).ok_or_else(|| {
                EtlError::Format(format!("row {}: {} is not numeric", i + 1, MARKET_CAP))
            })
        })
        .collect::<Result<Vec<f64>>>()?;

    table.push_column(USD_COLUMN, usd.iter().copied().map(Value::Float).collect())?;
    for ccy in TARGET_CURRENCIES {
        let rate = rates.rate(ccy);
        if rates.get(ccy).is_none() {
            debug!(currency = ccy, "no rate; using {}", DEFAULT_RATE);
        }
        let values = usd.iter().map(|v| Value::Float(round2(v * rate))).collect();
        table.push_column(currency_column(ccy), values)?;
    }
    Ok(table)
}
