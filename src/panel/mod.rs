// src/panel/mod.rs
pub mod arrow;
pub mod derive;
pub mod projection;
pub mod repair;

use serde::Serialize;
use std::{fmt, ops::Range, path::Path};
use tracing::{debug, info, instrument, warn};

use crate::config::{DomainPolicy, InteractionPolicy, PipelineConfig};
use crate::error::{PanelError, Result};
use crate::ingest::{self, utils, RawTable};
use crate::schema::{self, ColumnIndices, IGC, ORCAMENTO};
pub use derive::{BUDGET_SCALE, TETO_START_YEAR};
pub use projection::{ChartPoint, ChartSeries, Metric, ModelFrame, ModelRow, ModelSpec};
pub use repair::Imputation;

/// One cleaned `(Universidade, Ano)` observation plus its derived fields.
/// `None` marks an undefined value; nothing is ever coerced to zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelRecord {
    pub universidade: String,
    pub ano: i32,
    pub orcamento: Option<f64>,
    pub igc: Option<f64>,
    pub igc_imputed: Option<Imputation>,
    pub orcamento_milhoes: Option<f64>,
    pub ln_orcamento: Option<f64>,
    pub ln_igc: Option<f64>,
    pub pos_teto: u8,
    pub ln_orcamento_lag: Option<f64>,
    pub interacao: Option<f64>,
    /// 1-based data row in the uploaded file.
    pub source_row: usize,
}

/// A logarithm input that was missing or not positive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainIssue {
    pub row: usize,
    pub entity: String,
    pub year: i32,
    pub column: String,
    /// `None` when the cell was empty.
    pub value: Option<f64>,
}

impl fmt::Display for DomainIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {} ({}, {}): `{}` ", self.row, self.entity, self.year, self.column)?;
        match self.value {
            Some(v) => write!(f, "= {} is not positive", v)?,
            None => write!(f, "is missing")?,
        }
        write!(f, ", its logarithm is undefined")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelSummary {
    pub source: String,
    pub rows: usize,
    pub entities: usize,
    pub first_year: Option<i32>,
    pub last_year: Option<i32>,
    pub igc_interpolated: usize,
    pub igc_carried: usize,
    pub igc_missing: usize,
    pub domain_issues: usize,
    pub interaction: InteractionPolicy,
}

/// Immutable, validated long-format panel sorted by `(Universidade, Ano)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    source: String,
    interaction: InteractionPolicy,
    records: Vec<PanelRecord>,
    /// Entity name → contiguous range in `records`.
    spans: Vec<(String, Range<usize>)>,
    issues: Vec<DomainIssue>,
}

impl Panel {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn interaction_policy(&self) -> InteractionPolicy {
        self.interaction
    }

    pub fn records(&self) -> &[PanelRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct entities in ascending order.
    pub fn entities(&self) -> impl Iterator<Item = &str> {
        self.spans.iter().map(|(name, _)| name.as_str())
    }

    /// All records of one entity, in year order.
    pub fn entity(&self, name: &str) -> Option<&[PanelRecord]> {
        self.spans
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, r)| &self.records[r.clone()])
    }

    pub(crate) fn entity_slices(&self) -> impl Iterator<Item = (&str, &[PanelRecord])> {
        self.spans
            .iter()
            .map(|(n, r)| (n.as_str(), &self.records[r.clone()]))
    }

    pub fn issues(&self) -> &[DomainIssue] {
        &self.issues
    }

    pub fn summary(&self) -> PanelSummary {
        let imputed = |kind| {
            self.records
                .iter()
                .filter(|r| r.igc_imputed == Some(kind))
                .count()
        };
        PanelSummary {
            source: self.source.clone(),
            rows: self.records.len(),
            entities: self.spans.len(),
            first_year: self.records.iter().map(|r| r.ano).min(),
            last_year: self.records.iter().map(|r| r.ano).max(),
            igc_interpolated: imputed(Imputation::Interpolated),
            igc_carried: imputed(Imputation::Carried),
            igc_missing: self.records.iter().filter(|r| r.igc.is_none()).count(),
            domain_issues: self.issues.len(),
            interaction: self.interaction,
        }
    }
}

/// ingest → normalize → build, configured once.
#[derive(Debug, Clone, Default)]
pub struct PanelBuilder {
    config: PipelineConfig,
}

impl PanelBuilder {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn ingest(&self, name: &str, bytes: &[u8]) -> Result<RawTable> {
        ingest::ingest(name, bytes)
    }

    pub fn normalize(&self, table: RawTable) -> RawTable {
        schema::normalize(table, &self.config.aliases)
    }

    /// `table` must already be normalized.
    pub fn build_panel(&self, table: &RawTable) -> Result<Panel> {
        build_panel(table, &self.config)
    }

    pub fn build(&self, name: &str, bytes: &[u8]) -> Result<Panel> {
        let table = self.normalize(self.ingest(name, bytes)?);
        self.build_panel(&table)
    }

    pub fn build_path<P: AsRef<Path>>(&self, path: P) -> Result<Panel> {
        let table = self.normalize(ingest::ingest_path(path)?);
        self.build_panel(&table)
    }
}

struct Observation {
    row: usize,
    universidade: String,
    ano: i32,
    orcamento: Option<f64>,
    igc: Option<f64>,
}

/// Turn a normalized table into a [`Panel`].
///
/// 1) parse the required cells, 2) stable sort by `(Universidade, Ano)`,
/// 3) reject duplicate keys, 4) repair IGC per entity, 5) derive the
/// budget, log, treatment and interaction fields.
#[instrument(level = "info", skip_all, fields(source = %table.source, rows = table.num_rows()))]
pub fn build_panel(table: &RawTable, config: &PipelineConfig) -> Result<Panel> {
    let cols = schema::require_columns(table)?;

    // 1) typed observations
    let mut obs = Vec::with_capacity(table.num_rows());
    for (idx, row) in table.rows.iter().enumerate() {
        if let Some(o) = parse_observation(idx + 1, row, &cols)? {
            obs.push(o);
        }
    }

    // 2) entity-major, year-minor; sort_by is stable
    obs.sort_by(|a, b| {
        a.universidade
            .cmp(&b.universidade)
            .then(a.ano.cmp(&b.ano))
    });

    // 3) one observation per key
    for pair in obs.windows(2) {
        if pair[0].universidade == pair[1].universidade && pair[0].ano == pair[1].ano {
            let (first_row, second_row) = if pair[0].row < pair[1].row {
                (pair[0].row, pair[1].row)
            } else {
                (pair[1].row, pair[0].row)
            };
            return Err(PanelError::DuplicateKey {
                entity: pair[0].universidade.clone(),
                year: pair[0].ano,
                first_row,
                second_row,
            });
        }
    }

    let mut records = Vec::with_capacity(obs.len());
    let mut spans = Vec::new();
    let mut issues = Vec::new();

    let mut start = 0;
    while start < obs.len() {
        let end = obs[start..]
            .iter()
            .position(|o| o.universidade != obs[start].universidade)
            .map_or(obs.len(), |n| start + n);
        let group = &obs[start..end];

        // 4) IGC repair
        let years: Vec<i32> = group.iter().map(|o| o.ano).collect();
        let mut igc: Vec<Option<f64>> = group.iter().map(|o| o.igc).collect();
        let imputed = repair::repair_series(&years, &mut igc);

        // 5) derived fields
        let ln_orc: Vec<Option<f64>> = group
            .iter()
            .map(|o| derive::ln_positive(o.orcamento))
            .collect();
        let ln_orc_lag = derive::lag(&ln_orc);

        for (i, o) in group.iter().enumerate() {
            if ln_orc[i].is_none() {
                issues.push(DomainIssue {
                    row: o.row,
                    entity: o.universidade.clone(),
                    year: o.ano,
                    column: ORCAMENTO.to_string(),
                    value: o.orcamento,
                });
            }
            let ln_igc = derive::ln_positive(igc[i]);
            if let (None, Some(v)) = (ln_igc, igc[i]) {
                issues.push(DomainIssue {
                    row: o.row,
                    entity: o.universidade.clone(),
                    year: o.ano,
                    column: IGC.to_string(),
                    value: Some(v),
                });
            }

            let pos_teto = derive::pos_teto(o.ano);
            records.push(PanelRecord {
                universidade: o.universidade.clone(),
                ano: o.ano,
                orcamento: o.orcamento,
                igc: igc[i],
                igc_imputed: imputed[i],
                orcamento_milhoes: derive::millions(o.orcamento),
                ln_orcamento: ln_orc[i],
                ln_igc,
                pos_teto,
                ln_orcamento_lag: ln_orc_lag[i],
                interacao: derive::interaction(config.interaction, ln_orc[i], ln_orc_lag[i], pos_teto),
                source_row: o.row,
            });
        }

        if igc.iter().all(Option::is_none) {
            warn!(entity = %group[0].universidade, "no IGC observed for entity, series left missing");
        }
        spans.push((group[0].universidade.clone(), start..end));
        start = end;
    }

    if let Some(issue) = issues.first() {
        match config.domain {
            DomainPolicy::Reject => return Err(PanelError::Domain(issue.clone())),
            DomainPolicy::Flag => {
                for issue in &issues {
                    warn!(%issue, "domain issue flagged");
                }
            }
        }
    }

    let panel = Panel {
        source: table.source.clone(),
        interaction: config.interaction,
        records,
        spans,
        issues,
    };
    let summary = panel.summary();
    info!(
        rows = summary.rows,
        entities = summary.entities,
        interpolated = summary.igc_interpolated,
        carried = summary.igc_carried,
        domain_issues = summary.domain_issues,
        "panel built"
    );
    Ok(panel)
}

fn parse_observation(
    row: usize,
    cells: &[Option<String>],
    cols: &ColumnIndices,
) -> Result<Option<Observation>> {
    let cell = |i: usize| cells.get(i).and_then(|c| c.as_deref());
    let invalid = |column: &str, value: &str| PanelError::InvalidCell {
        row,
        column: column.to_string(),
        value: value.to_string(),
    };

    let (uni, ano, orc, igc) = (
        cell(cols.universidade),
        cell(cols.ano),
        cell(cols.orcamento),
        cell(cols.igc),
    );
    if uni.is_none() && ano.is_none() && orc.is_none() && igc.is_none() {
        debug!(row, "skipping blank row");
        return Ok(None);
    }

    let universidade = uni
        .ok_or_else(|| invalid(schema::UNIVERSIDADE, ""))?
        .to_string();
    let ano_raw = ano.ok_or_else(|| invalid(schema::ANO, ""))?;
    let ano = utils::parse_year(ano_raw).ok_or_else(|| invalid(schema::ANO, ano_raw))?;
    let orcamento = orc
        .map(|s| utils::parse_number(s).ok_or_else(|| invalid(ORCAMENTO, s)))
        .transpose()?;
    let igc = igc
        .map(|s| utils::parse_number(s).ok_or_else(|| invalid(IGC, s)))
        .transpose()?;

    Ok(Some(Observation {
        row,
        universidade,
        ano,
        orcamento,
        igc,
    }))
}
