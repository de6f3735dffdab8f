// src/schema/alias.rs
use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{collections::BTreeMap, fs, path::Path};

use crate::error::{PanelError, Result};

/// Version of [`BUILTIN_ALIASES`]. Bump when an entry is added or changed.
pub const BUILTIN_ALIAS_VERSION: u32 = 1;

/// Raw header variants seen in the wild → canonical column names.
pub const BUILTIN_ALIASES: &[(&str, &str)] = &[
    ("Orçamento(GND 3+4)", "Orcamento"),
    ("IGC (Contínuo)", "IGC"),
    ("IGC (Continuo)", "IGC"),
    ("Ano ", "Ano"),
];

static BUILTIN: Lazy<AliasTable> =
    Lazy::new(|| AliasTable::from_pairs(BUILTIN_ALIAS_VERSION, BUILTIN_ALIASES.iter().copied()));

/// Header rename table. Keys are stored trimmed because `normalize` trims
/// headers before looking them up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasTable {
    version: u32,
    aliases: BTreeMap<String, String>,
}

/// On-disk shape of an alias document.
#[derive(Debug, Serialize, Deserialize)]
struct AliasDoc {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    aliases: BTreeMap<String, String>,
}

impl Default for AliasTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl AliasTable {
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    pub fn from_pairs<'a>(version: u32, pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let aliases = pairs
            .into_iter()
            .map(|(raw, canonical)| (raw.trim().to_string(), canonical.trim().to_string()))
            .collect();
        Self { version, aliases }
    }

    /// Parse a YAML alias document and merge it over the built-in table.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let doc: AliasDoc = serde_yaml::from_str(text)
            .map_err(|e| PanelError::Config(format!("alias table: {}", e)))?;
        Ok(Self::builtin().merged(&doc.into()))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&text)
    }

    /// `other` wins on conflicting keys; the higher version is kept.
    pub fn merged(&self, other: &AliasTable) -> Self {
        let mut aliases = self.aliases.clone();
        aliases.extend(other.aliases.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self {
            version: self.version.max(other.version),
            aliases,
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Canonical name for a (trimmed) header, or the header itself.
    pub fn resolve<'a>(&'a self, header: &'a str) -> &'a str {
        self.aliases.get(header).map(String::as_str).unwrap_or(header)
    }
}

impl From<AliasDoc> for AliasTable {
    fn from(doc: AliasDoc) -> Self {
        AliasTable::from_pairs(
            doc.version,
            doc.aliases.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        )
    }
}

impl Serialize for AliasTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        AliasDoc {
            version: self.version,
            aliases: self.aliases.clone(),
        }
        .serialize(serializer)
    }
}

/// Deserialized tables are merged over the built-in one, same as [`AliasTable::from_yaml`].
impl<'de> Deserialize<'de> for AliasTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let doc = AliasDoc::deserialize(deserializer)?;
        Ok(AliasTable::builtin().merged(&doc.into()))
    }
}
