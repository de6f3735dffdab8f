// src/schema/mod.rs
pub mod alias;

use tracing::{debug, warn};

use crate::error::{PanelError, Result};
use crate::ingest::RawTable;
pub use alias::{AliasTable, BUILTIN_ALIASES, BUILTIN_ALIAS_VERSION};

pub const UNIVERSIDADE: &str = "Universidade";
pub const ANO: &str = "Ano";
pub const ORCAMENTO: &str = "Orcamento";
pub const IGC: &str = "IGC";

// derived
pub const ORCAMENTO_MILHOES: &str = "Orcamento_Milhoes";
pub const LN_ORCAMENTO: &str = "ln_Orcamento";
pub const LN_IGC: &str = "ln_IGC";
pub const POS_TETO: &str = "Pos_Teto";
pub const LN_ORCAMENTO_LAG: &str = "ln_Orcamento_lag";
pub const INTERACAO: &str = "Interacao";

pub const REQUIRED_COLUMNS: [&str; 4] = [UNIVERSIDADE, ANO, ORCAMENTO, IGC];

/// Positions of the required columns inside a normalized [`RawTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnIndices {
    pub universidade: usize,
    pub ano: usize,
    pub orcamento: usize,
    pub igc: usize,
}

/// Trim every header, then rename known variants through `aliases`.
/// Cells are left alone.
pub fn normalize(mut table: RawTable, aliases: &AliasTable) -> RawTable {
    for header in table.headers.iter_mut() {
        let canonical = aliases.resolve(header.trim()).to_string();
        if canonical != *header {
            debug!(from = %header, to = %canonical, "renamed column");
            *header = canonical;
        }
    }
    table
}

/// Locate the required columns, failing with every missing name at once.
pub fn require_columns(table: &RawTable) -> Result<ColumnIndices> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| table.column_index(c).is_none())
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(PanelError::Schema { missing });
    }

    for name in REQUIRED_COLUMNS {
        let count = table.headers.iter().filter(|h| *h == name).count();
        if count > 1 {
            warn!(column = name, count, "column appears more than once, using the first");
        }
    }

    let idx = |name: &str| table.column_index(name).unwrap_or_default();
    Ok(ColumnIndices {
        universidade: idx(UNIVERSIDADE),
        ano: idx(ANO),
        orcamento: idx(ORCAMENTO),
        igc: idx(IGC),
    })
}
