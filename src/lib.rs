//! Panel preparation for the federal-university budget vs. IGC study.
//!
//! `ingest` → `schema::normalize` → `panel::build_panel` turns an uploaded
//! CSV or spreadsheet into a sorted, repaired `(Universidade, Ano)` panel
//! with the derived columns the FE / RE / DiD regressions need.

pub mod cache;
pub mod config;
pub mod error;
pub mod export;
pub mod ingest;
pub mod interpret;
pub mod panel;
pub mod schema;
pub mod stats;

pub use cache::PanelCache;
pub use config::{DomainPolicy, InteractionPolicy, PipelineConfig};
pub use error::{PanelError, Result};
pub use ingest::{ingest, RawTable};
pub use panel::{build_panel, DomainIssue, Panel, PanelBuilder, PanelRecord, TETO_START_YEAR};
pub use schema::{normalize, AliasTable};
