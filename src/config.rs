// src/config.rs

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::PathBuf};

use crate::store::normalize_column_name;

/// Environment variable naming an optional JSON config file.
pub const CONFIG_ENV: &str = "BANKS_ETL_CONFIG";

pub const DEFAULT_SOURCE_URL: &str =
    "https://web.archive.org/web/20230908091635/https://en.wikipedia.org/wiki/List_of_largest_banks";

/// Fixed query batch; `{relation}` is replaced by the configured relation name.
static QUERY_TEMPLATES: &[&str] = &[
    "SELECT * FROM {relation}",
    "SELECT AVG(MC_USD_Billion) FROM {relation}",
    "SELECT Name FROM {relation} LIMIT 5",
];

/// Everything a pipeline run needs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub source_url: String,
    pub rate_file: PathBuf,
    pub raw_csv: PathBuf,
    pub transformed_csv: PathBuf,
    pub db_path: PathBuf,
    pub relation: String,
    pub log_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            rate_file: PathBuf::from("exchange_rates.csv"),
            raw_csv: PathBuf::from("bank_data.csv"),
            transformed_csv: PathBuf::from("transformed_bank_data.csv"),
            db_path: PathBuf::from("Banks.db"),
            relation: "Largest_banks".to_string(),
            log_path: PathBuf::from("code_log.txt"),
        }
    }
}

impl Config {
    /// Defaults, or the file named by `BANKS_ETL_CONFIG` when set.
    pub fn load() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(PathBuf::from(path)),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let text = fs::read_to_string(&path).with_context(|| format!("reading {:?}", path))?;
        serde_json::from_str(&text).with_context(|| format!("parsing {:?}", path))
    }

    /// Relation name as created in the store: spaces become underscores.
    pub fn relation_name(&self) -> String {
        normalize_column_name(&self.relation)
    }

    /// The query batch rendered against [`Config::relation_name`].
    pub fn queries(&self) -> Vec<String> {
        let relation = self.relation_name();
        QUERY_TEMPLATES
            .iter()
            .map(|q| q.replace("{relation}", &relation))
            .collect()
    }
}
