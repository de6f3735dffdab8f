// src/stats.rs
use serde::Serialize;
use std::fmt;

use crate::panel::Panel;

/// Spearman coefficients above this read as a moderate or strong association.
pub const MODERATE_SPEARMAN: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strength {
    ModerateOrStrong,
    Weak,
}

impl Strength {
    /// Classify a Spearman coefficient. Negative values count as weak.
    pub fn of_spearman(rho: f64) -> Self {
        if rho > MODERATE_SPEARMAN {
            Strength::ModerateOrStrong
        } else {
            Strength::Weak
        }
    }
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strength::ModerateOrStrong => {
                write!(f, "there is a moderate/strong positive correlation")
            }
            Strength::Weak => write!(
                f,
                "the correlation is weak, the relationship is not simple or direct"
            ),
        }
    }
}

/// Budget vs. quality association over rows where both are defined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Correlation {
    pub pairs: usize,
    pub pearson: Option<f64>,
    pub spearman: Option<f64>,
    /// `None` when Spearman is undefined.
    pub strength: Option<Strength>,
}

impl Panel {
    /// Pearson and Spearman between `Orcamento` and the repaired `IGC`.
    pub fn budget_quality_correlation(&self) -> Correlation {
        let (xs, ys): (Vec<f64>, Vec<f64>) = self
            .records()
            .iter()
            .filter_map(|r| Some((r.orcamento?, r.igc?)))
            .unzip();
        let spearman = spearman(&xs, &ys);
        Correlation {
            pairs: xs.len(),
            pearson: pearson(&xs, &ys),
            spearman,
            strength: spearman.map(Strength::of_spearman),
        }
    }
}

/// `None` for fewer than two pairs, mismatched lengths or a constant series.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let n = xs.len() as f64;
    let mx = xs.iter().sum::<f64>() / n;
    let my = ys.iter().sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let (dx, dy) = (x - mx, y - my);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some(sxy / (sxx * syy).sqrt())
}

/// Pearson on ranks; ties share their average rank.
pub fn spearman(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() {
        return None;
    }
    pearson(&ranks(xs), &ranks(ys))
}

fn ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut out = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        // 1-based ranks i+1 ..= j+1 share their mean
        let avg = (i + j) as f64 / 2.0 + 1.0;
        for &k in &order[i..=j] {
            out[k] = avg;
        }
        i = j + 1;
    }
    out
}
