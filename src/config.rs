// src/config.rs
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::error::{PanelError, Result};
use crate::schema::AliasTable;

/// Which budget series feeds the `Interacao` term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionPolicy {
    /// `Interacao = ln_Orcamento * Pos_Teto`
    #[default]
    Contemporaneous,
    /// `Interacao = ln_Orcamento_lag * Pos_Teto`; undefined for an entity's first year.
    Lagged,
}

/// What to do when a logarithm input is missing or not positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainPolicy {
    /// Keep the row, leave the derived value undefined, record a `DomainIssue`.
    /// Model frames drop such rows.
    #[default]
    Flag,
    /// Abort the whole build on the first issue.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub aliases: AliasTable,
    pub interaction: InteractionPolicy,
    pub domain: DomainPolicy,
}

impl PipelineConfig {
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| PanelError::Config(format!("pipeline config: {}", e)))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&text)
    }

    /// Stable text identifying everything that changes the build output.
    pub fn fingerprint(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| PanelError::Config(e.to_string()))
    }
}
