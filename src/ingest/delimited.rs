// src/ingest/delimited.rs
use csv::ReaderBuilder;
use std::fmt;
use tracing::{debug, trace};

use super::raw_table::RawTable;
use super::utils::clean_cell;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    /// ISO-8859-1: every byte is the code point of the same value.
    Latin1,
}

impl TextEncoding {
    fn decode(self, bytes: &[u8]) -> Result<String, String> {
        let text = match self {
            TextEncoding::Utf8 => std::str::from_utf8(bytes)
                .map_err(|e| format!("not valid UTF-8: {}", e))?
                .to_string(),
            TextEncoding::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
        };
        Ok(text.trim_start_matches('\u{feff}').to_string())
    }
}

/// One way of reading delimited text. Strategies are tried in order by
/// [`crate::ingest::ingest`]; the first that returns `Ok` wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseStrategy {
    pub delimiter: u8,
    pub encoding: TextEncoding,
}

/// Comma + UTF-8 first, then the semicolon + Latin-1 layout of
/// European-locale spreadsheet exports.
pub const DELIMITED_STRATEGIES: [ParseStrategy; 2] = [
    ParseStrategy {
        delimiter: b',',
        encoding: TextEncoding::Utf8,
    },
    ParseStrategy {
        delimiter: b';',
        encoding: TextEncoding::Latin1,
    },
];

impl fmt::Display for ParseStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let enc = match self.encoding {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Latin1 => "latin-1",
        };
        write!(f, "'{}'/{}", char::from(self.delimiter), enc)
    }
}

impl ParseStrategy {
    pub fn parse(&self, source: &str, bytes: &[u8]) -> Result<RawTable, String> {
        let text = self.encoding.decode(bytes)?;

        let mut rdr = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = rdr
            .headers()
            .map_err(|e| format!("cannot read header: {}", e))?
            .iter()
            .map(str::to_string)
            .collect();

        if headers.iter().all(|h| h.trim().is_empty()) {
            return Err("header row is empty".into());
        }
        // A semicolon export read with the comma reader collapses into one column.
        if self.delimiter != b';' && headers.len() == 1 && headers[0].contains(';') {
            return Err(format!(
                "single column {:?} looks ';'-separated",
                headers[0]
            ));
        }

        let mut table = RawTable::new(source, headers);
        for (idx, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| format!("record {}: {}", idx + 1, e))?;
            // short rows are padded with missing cells; long ones have no column to land in
            if record.len() > table.num_columns() {
                return Err(format!(
                    "record {}: {} fields but the header has {}",
                    idx + 1,
                    record.len(),
                    table.num_columns()
                ));
            }
            trace!(record = idx + 1, fields = record.len(), "parsed record");
            table.push_row(record.iter().map(clean_cell).collect());
        }

        debug!(
            strategy = %self,
            columns = table.num_columns(),
            rows = table.num_rows(),
            "delimited parse ok"
        );
        Ok(table)
    }
}
