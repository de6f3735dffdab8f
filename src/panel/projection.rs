// src/panel/projection.rs
//
// Views of a Panel shaped for its two consumers: the chart renderer and the
// (external) regression engine.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::{Panel, PanelRecord};
use crate::schema::{INTERACAO, LN_IGC, LN_ORCAMENTO, POS_TETO};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// `Orcamento_Milhoes`
    Budget,
    /// repaired `IGC`
    Quality,
}

impl Metric {
    fn value(self, r: &PanelRecord) -> Option<f64> {
        match self {
            Metric::Budget => r.orcamento_milhoes,
            Metric::Quality => r.igc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    pub ano: i32,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub entity: String,
    /// Drawn at full opacity; every other series is dimmed.
    pub highlighted: bool,
    pub points: Vec<ChartPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelSpec {
    /// `ln_IGC ~ ln_Orcamento` + entity effects, entity-clustered errors.
    FixedEffects,
    /// `ln_IGC ~ 1 + ln_Orcamento`, entity effects random.
    RandomEffects,
    /// `ln_IGC ~ 1 + ln_Orcamento + Pos_Teto + Interacao + C(Universidade)`,
    /// entity-clustered errors.
    DifferenceInDifferences,
}

impl ModelSpec {
    pub const ALL: [ModelSpec; 3] = [
        ModelSpec::FixedEffects,
        ModelSpec::RandomEffects,
        ModelSpec::DifferenceInDifferences,
    ];

    pub fn dependent(self) -> &'static str {
        LN_IGC
    }

    pub fn regressors(self) -> &'static [&'static str] {
        match self {
            ModelSpec::FixedEffects | ModelSpec::RandomEffects => &[LN_ORCAMENTO],
            ModelSpec::DifferenceInDifferences => &[LN_ORCAMENTO, POS_TETO, INTERACAO],
        }
    }

    /// Coefficient whose p-value answers the budget question.
    pub fn variable_of_interest(self) -> &'static str {
        match self {
            ModelSpec::FixedEffects | ModelSpec::RandomEffects => LN_ORCAMENTO,
            ModelSpec::DifferenceInDifferences => INTERACAO,
        }
    }

    /// Entity effects absorb the intercept under FE, so its frame carries no
    /// constant column. Engines that add one next to entity effects report
    /// the same slope; this frame leaves it out on purpose.
    pub fn has_constant(self) -> bool {
        !matches!(self, ModelSpec::FixedEffects)
    }

    pub fn entity_effects(self) -> bool {
        !matches!(self, ModelSpec::RandomEffects)
    }

    pub fn clustered_by_entity(self) -> bool {
        !matches!(self, ModelSpec::RandomEffects)
    }

    fn regressor_values(self, r: &PanelRecord) -> Option<Vec<f64>> {
        match self {
            ModelSpec::FixedEffects | ModelSpec::RandomEffects => Some(vec![r.ln_orcamento?]),
            ModelSpec::DifferenceInDifferences => Some(vec![
                r.ln_orcamento?,
                f64::from(r.pos_teto),
                r.interacao?,
            ]),
        }
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ModelSpec::FixedEffects => "fe",
            ModelSpec::RandomEffects => "re",
            ModelSpec::DifferenceInDifferences => "did",
        })
    }
}

impl FromStr for ModelSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fe" | "fixed" | "fixed_effects" => Ok(ModelSpec::FixedEffects),
            "re" | "random" | "random_effects" => Ok(ModelSpec::RandomEffects),
            "did" | "diff_in_diff" | "difference_in_differences" => {
                Ok(ModelSpec::DifferenceInDifferences)
            }
            other => Err(format!("unknown model {:?} (expected fe, re or did)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelRow {
    pub entity: String,
    pub year: i32,
    pub y: f64,
    /// Same order as [`ModelSpec::regressors`].
    pub x: Vec<f64>,
}

/// Regression-ready rows for one specification, indexed by `(entity, year)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelFrame {
    pub spec: ModelSpec,
    pub rows: Vec<ModelRow>,
    /// Source rows left out because a required value is undefined.
    pub excluded_rows: Vec<usize>,
}

impl ModelFrame {
    pub fn dependent(&self) -> &'static str {
        self.spec.dependent()
    }

    pub fn regressors(&self) -> &'static [&'static str] {
        self.spec.regressors()
    }

    pub fn entities(&self) -> usize {
        let mut n = 0;
        let mut last: Option<&str> = None;
        for r in &self.rows {
            if last != Some(r.entity.as_str()) {
                n += 1;
                last = Some(r.entity.as_str());
            }
        }
        n
    }
}

impl Panel {
    /// One series per entity for `metric`, skipping undefined points.
    pub fn chart_series(&self, metric: Metric, highlight: Option<&str>) -> Vec<ChartSeries> {
        self.entity_slices()
            .map(|(entity, recs)| ChartSeries {
                entity: entity.to_string(),
                highlighted: highlight == Some(entity),
                points: recs
                    .iter()
                    .filter_map(|r| metric.value(r).map(|value| ChartPoint { ano: r.ano, value }))
                    .collect(),
            })
            .collect()
    }

    /// Rows usable by `spec`. A row with any undefined dependent or
    /// regressor value is excluded and reported by source row.
    pub fn model_frame(&self, spec: ModelSpec) -> ModelFrame {
        let mut rows = Vec::with_capacity(self.len());
        let mut excluded_rows = Vec::new();
        for r in self.records() {
            match (r.ln_igc, spec.regressor_values(r)) {
                (Some(y), Some(x)) => rows.push(ModelRow {
                    entity: r.universidade.clone(),
                    year: r.ano,
                    y,
                    x,
                }),
                _ => excluded_rows.push(r.source_row),
            }
        }
        ModelFrame {
            spec,
            rows,
            excluded_rows,
        }
    }
}
