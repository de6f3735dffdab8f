// src/ingest/mod.rs
pub mod delimited;
pub mod raw_table;
pub mod spreadsheet;
pub mod utils;

use std::{fs, path::Path};
use tracing::{info, warn};

use crate::error::{PanelError, Result};
pub use delimited::{ParseStrategy, TextEncoding, DELIMITED_STRATEGIES};
pub use raw_table::RawTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Delimited,
    Spreadsheet,
}

impl FileFormat {
    /// `.csv` (any case) is delimited text; everything else is a workbook.
    pub fn from_name(name: &str) -> Self {
        if name.to_lowercase().ends_with(".csv") {
            FileFormat::Delimited
        } else {
            FileFormat::Spreadsheet
        }
    }
}

/// Parse an uploaded file into a [`RawTable`] with its original column names.
///
/// Delimited text goes through [`DELIMITED_STRATEGIES`] in order; the first
/// strategy yielding a non-empty header wins. If every strategy fails the
/// error lists why each one did.
#[tracing::instrument(level = "info", skip(bytes), fields(size = bytes.len()))]
pub fn ingest(name: &str, bytes: &[u8]) -> Result<RawTable> {
    let table = match FileFormat::from_name(name) {
        FileFormat::Delimited => {
            let mut failures = Vec::with_capacity(DELIMITED_STRATEGIES.len());
            let mut parsed = None;
            for strategy in DELIMITED_STRATEGIES {
                match strategy.parse(name, bytes) {
                    Ok(table) => {
                        info!(strategy = %strategy, "parsed delimited text");
                        parsed = Some(table);
                        break;
                    }
                    Err(reason) => {
                        warn!(strategy = %strategy, %reason, "parse strategy failed");
                        failures.push(format!("{}: {}", strategy, reason));
                    }
                }
            }
            parsed.ok_or_else(|| PanelError::Ingest {
                file: name.to_string(),
                reason: failures.join("; "),
            })?
        }
        FileFormat::Spreadsheet => {
            spreadsheet::read_first_sheet(name, bytes).map_err(|reason| PanelError::Ingest {
                file: name.to_string(),
                reason,
            })?
        }
    };

    if table.num_columns() == 0 {
        return Err(PanelError::Ingest {
            file: name.to_string(),
            reason: "no columns".into(),
        });
    }
    info!(
        columns = table.num_columns(),
        rows = table.num_rows(),
        "ingested"
    );
    Ok(table)
}

/// Read `path` from disk and [`ingest`] it under its file name.
pub fn ingest_path<P: AsRef<Path>>(path: P) -> Result<RawTable> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    ingest(&name, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(FileFormat::from_name("dados.csv"), FileFormat::Delimited);
        assert_eq!(FileFormat::from_name("DADOS.CSV"), FileFormat::Delimited);
        assert_eq!(FileFormat::from_name("Base.xlsx"), FileFormat::Spreadsheet);
        assert_eq!(FileFormat::from_name("dados"), FileFormat::Spreadsheet);
    }

    #[test]
    fn test_semicolon_fallback() {
        let data = "Universidade;Ano;Orçamento(GND 3+4);IGC (Contínuo)\nUFPE;2019;1.500.000,50;3,1\n";
        let latin1: Vec<u8> = data.chars().map(|c| c as u32 as u8).collect();
        let table = ingest("dados.csv", &latin1).unwrap();
        assert_eq!(table.num_columns(), 4);
        assert_eq!(table.headers[2], "Orçamento(GND 3+4)");
        assert_eq!(table.cell(0, 2), Some("1.500.000,50"));
    }

    #[test]
    fn test_ingest_error_names_file_and_strategies() {
        // Latin-1 byte breaks UTF-8; the semicolon pass then trips on ragged rows
        let mut bytes = b"a;b\n1;2;3\n".to_vec();
        bytes.push(0xE9);
        let err = ingest("broken.csv", &bytes).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("broken.csv"), "{}", msg);
        assert!(msg.contains("utf-8") && msg.contains("latin-1"), "{}", msg);
    }

    #[test]
    fn test_empty_file_fails() {
        assert!(matches!(
            ingest("empty.csv", b""),
            Err(PanelError::Ingest { .. })
        ));
    }
}
