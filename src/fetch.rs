// src/fetch.rs

use reqwest::blocking::Client;
use std::fs;
use tracing::debug;
use url::Url;

use crate::error::{EtlError, Result};

/// Fetch the body of `url` as text.
///
/// `http`/`https` go through `client` and any non-success status is an error;
/// `file` URLs read a saved copy of the page from disk.
pub fn get_text(client: &Client, url: &str) -> Result<String> {
    let parsed = Url::parse(url).map_err(|e| EtlError::fetch(url, e))?;
    match parsed.scheme() {
        "http" | "https" => {
            debug!("Fetching text from {}", parsed);
            client
                .get(parsed.as_str())
                .send()
                .and_then(|resp| resp.error_for_status())
                .and_then(|resp| resp.text())
                .map_err(|e| EtlError::fetch(url, e))
        }
        "file" => {
            let path = parsed
                .to_file_path()
                .map_err(|_| EtlError::fetch(url, "not a local file path"))?;
            debug!("Reading page from {}", path.display());
            fs::read_to_string(&path).map_err(|e| EtlError::fetch(url, e))
        }
        other => Err(EtlError::fetch(url, format!("unsupported scheme {:?}", other))),
    }
}
