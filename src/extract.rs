// src/extract.rs

use reqwest::blocking::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument, trace};

use crate::error::{EtlError, Result};
use crate::fetch;
use crate::table::{Table, Value};

/// Id of the heading that precedes the market-cap table.
pub const ANCHOR_ID: &str = "By_market_capitalization";

pub const RANK: &str = "Rank";
pub const NAME: &str = "Name";
pub const MARKET_CAP: &str = "Market Cap";

/// Source header label → canonical column name.
pub const COLUMN_RENAMES: [(&str, &str); 3] = [
    ("Rank", RANK),
    ("Bank name", NAME),
    ("Market cap(US$ billion)", MARKET_CAP),
];

/// Fetch `url` and parse its market-cap table.
pub fn extract(client: &Client, url: &str) -> Result<Table> {
    let html = fetch::get_text(client, url)?;
    parse_page(&html)
}

/// Locate the table after the anchor heading and normalize it
/// to `Rank, Name, Market Cap`.
#[instrument(level = "debug", skip(html), fields(html_len = html.len()))]
pub fn parse_page(html: &str) -> Result<Table> {
    let document = Html::parse_document(html);
    let raw = find_table(&document, ANCHOR_ID)?;
    let (header, rows) = read_rows(raw)?;
    debug!(rows = rows.len(), header = ?header, "parsed raw table");

    let positions: Vec<Option<usize>> = COLUMN_RENAMES
        .iter()
        .map(|(from, _)| header.iter().position(|h| h == from))
        .collect();
    let missing: Vec<&str> = COLUMN_RENAMES
        .iter()
        .zip(&positions)
        .filter(|(_, pos)| pos.is_none())
        .map(|((from, _), _)| *from)
        .collect();
    if !missing.is_empty() {
        return Err(EtlError::Schema(format!(
            "expected columns not found in extracted data: {}",
            missing.join(", ")
        )));
    }
    let idx: Vec<usize> = positions.into_iter().flatten().collect();
    let (rank, name, cap) = (idx[0], idx[1], idx[2]);

    let mut table = Table::new(COLUMN_RENAMES.iter().map(|(_, to)| to.to_string()).collect());
    for (i, mut cells) in rows.into_iter().enumerate() {
        let market_cap = parse_market_cap(&cells[cap]).ok_or_else(|| {
            EtlError::Format(format!(
                "row {}: market cap {:?} is not a number",
                i + 1,
                cells[cap]
            ))
        })?;
        table.push_row(vec![
            Value::Text(std::mem::take(&mut cells[rank])),
            Value::Text(std::mem::take(&mut cells[name])),
            Value::Float(market_cap),
        ])?;
    }
    Ok(table)
}

/// Strip thousands separators and parse: `"1,234.5"` → `1234.5`.
pub fn parse_market_cap(raw: &str) -> Option<f64> {
    raw.trim().replace(',', "").parse().ok()
}

/// First `<table>` after the element with id `anchor_id`, in document order.
fn find_table<'a>(document: &'a Html, anchor_id: &str) -> Result<ElementRef<'a>> {
    let anchor_sel = Selector::parse(&format!(r#"[id="{}"]"#, anchor_id))
        .map_err(|e| EtlError::Structure(format!("bad anchor selector: {:?}", e)))?;
    let anchor = document.select(&anchor_sel).next().ok_or_else(|| {
        EtlError::Structure(format!(
            "expected section not found: no element with id {:?}",
            anchor_id
        ))
    })?;

    document
        .root_element()
        .descendants()
        .skip_while(|node| node.id() != anchor.id())
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "table")
        .ok_or_else(|| {
            EtlError::Structure(format!("expected section not found: no table after {:?}", anchor_id))
        })
}

/// First row is the header; every cell is whitespace-trimmed and each
/// data row is cut to the header width.
fn read_rows(table: ElementRef<'_>) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let row_sel = Selector::parse("tr").expect("row selector should parse");
    let cell_sel = Selector::parse("th, td").expect("cell selector should parse");

    let mut rows = table.select(&row_sel).filter_map(|tr| {
        let cells: Vec<String> = tr
            .select(&cell_sel)
            .map(|c| c.text().collect::<String>().trim().to_string())
            .collect();
        (!cells.is_empty()).then_some(cells)
    });

    let header = rows
        .next()
        .ok_or_else(|| EtlError::Structure("expected section not found: empty table".into()))?;
    trace!(header = ?header, "table header");

    let body = rows
        .enumerate()
        .map(|(i, mut cells)| {
            if cells.len() < header.len() {
                return Err(EtlError::Format(format!(
                    "row {} has {} cells, header has {}",
                    i + 1,
                    cells.len(),
                    header.len()
                )));
            }
            cells.truncate(header.len());
            Ok(cells)
        })
        .collect::<Result<Vec<_>>>()?;
    Ok((header, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <h2><span id="Other">Other</span></h2>
          <table><tr><th>Ignore</th></tr><tr><td>me</td></tr></table>
          <h2><span class="mw-headline" id="By_market_capitalization">By market capitalization</span></h2>
          <p>Intro text</p>
          <table class="wikitable">
            <tbody>
              <tr><th>Rank</th><th>Bank name</th><th>Market cap<br>(US$ billion)</th></tr>
              <tr><td>1</td><td> <a href="/jpm">JPMorgan Chase</a> </td><td>432.92</td></tr>
              <tr><td>2</td><td>Bank of America</td><td>1,231.52
              </td></tr>
            </tbody>
          </table>
          <table><tr><th>Later</th></tr></table>
        </body></html>
    "#;

    #[test]
    fn test_parse_page_canonical_schema() {
        let t = parse_page(PAGE).unwrap();
        assert_eq!(t.columns(), [RANK, NAME, MARKET_CAP]);
        assert_eq!(t.num_rows(), 2);
        assert_eq!(t.get(0, RANK), Some(&Value::Text("1".into())));
        assert_eq!(t.get(0, NAME), Some(&Value::Text("JPMorgan Chase".into())));
        assert_eq!(t.get(0, MARKET_CAP), Some(&Value::Float(432.92)));
        assert_eq!(t.get(1, MARKET_CAP), Some(&Value::Float(1231.52)));
    }

    #[test]
    fn test_parse_market_cap() {
        assert_eq!(parse_market_cap("1,234.5"), Some(1234.5));
        assert_eq!(parse_market_cap(" 500,000,000,000 "), Some(500000000000.0));
        assert_eq!(parse_market_cap("n/a"), None);
    }

    #[test]
    fn test_missing_anchor_is_structure_error() {
        let html = "<html><body><table><tr><th>Rank</th></tr></table></body></html>";
        assert!(matches!(parse_page(html), Err(EtlError::Structure(_))));
    }

    #[test]
    fn test_anchor_without_table_is_structure_error() {
        let html = r#"<html><body><table></table><span id="By_market_capitalization"></span></body></html>"#;
        assert!(matches!(parse_page(html), Err(EtlError::Structure(_))));
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let html = r#"
            <span id="By_market_capitalization"></span>
            <table>
              <tr><th>Rank</th><th>Bank name</th><th>Total assets</th></tr>
              <tr><td>1</td><td>Bank A</td><td>10</td></tr>
            </table>"#;
        match parse_page(html) {
            Err(EtlError::Schema(msg)) => assert!(msg.contains("Market cap(US$ billion)")),
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_unparsable_market_cap_is_format_error() {
        let html = r#"
            <span id="By_market_capitalization"></span>
            <table>
              <tr><th>Rank</th><th>Bank name</th><th>Market cap(US$ billion)</th></tr>
              <tr><td>1</td><td>Bank A</td><td>unknown</td></tr>
            </table>"#;
        assert!(matches!(parse_page(html), Err(EtlError::Format(_))));
    }

    #[test]
    fn test_short_row_is_format_error() {
        let html = r#"
            <span id="By_market_capitalization"></span>
            <table>
              <tr><th>Rank</th><th>Bank name</th><th>Market cap(US$ billion)</th></tr>
              <tr><td>1</td><td>Bank A</td></tr>
            </table>"#;
        assert!(matches!(parse_page(html), Err(EtlError::Format(_))));
    }

    #[test]
    fn test_extra_columns_are_dropped() {
        let html = r#"
            <span id="By_market_capitalization"></span>
            <table>
              <tr><th>Bank name</th><th>Country</th><th>Rank</th><th>Market cap(US$ billion)</th></tr>
              <tr><td>Bank A</td><td>X</td><td>1</td><td>5</td></tr>
            </table>"#;
        let t = parse_page(html).unwrap();
        assert_eq!(t.columns(), [RANK, NAME, MARKET_CAP]);
        assert_eq!(t.rows()[0][1], Value::Text("Bank A".into()));
    }
}
