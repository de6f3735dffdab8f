// src/ingest/spreadsheet.rs
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;
use tracing::debug;

use super::raw_table::RawTable;
use super::utils::clean_cell;

/// Read the first worksheet of an xlsx/xls/ods workbook. Row 1 is the header.
pub fn read_first_sheet(source: &str, bytes: &[u8]) -> Result<RawTable, String> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| format!("not a readable spreadsheet: {}", e))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| "workbook has no sheets".to_string())?
        .map_err(|e| format!("cannot read first sheet: {}", e))?;

    let mut rows = range.rows();
    let header_row = rows.next().ok_or_else(|| "first sheet is empty".to_string())?;
    let headers: Vec<String> = header_row
        .iter()
        .map(|c| cell_text(c).unwrap_or_default())
        .collect();

    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err("header row is empty".into());
    }

    let mut table = RawTable::new(source, headers);
    for row in rows {
        table.push_row(
            row.iter()
                .map(|c| cell_text(c).and_then(|s| clean_cell(&s)))
                .collect(),
        );
    }

    debug!(
        columns = table.num_columns(),
        rows = table.num_rows(),
        "spreadsheet parse ok"
    );
    Ok(table)
}

/// Render a cell the way it would appear in a CSV export. Integral floats
/// (Excel stores every number as a double) lose their `.0`.
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => Some(s.clone()),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => Some(format!("{}", *f as i64)),
        Data::Float(f) => Some(f.to_string()),
        other => Some(other.to_string()),
    }
}
