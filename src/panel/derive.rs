// src/panel/derive.rs
use crate::config::InteractionPolicy;

/// First year under the federal spending cap (Emenda Constitucional 95).
pub const TETO_START_YEAR: i32 = 2017;

/// `Orcamento_Milhoes = Orcamento / BUDGET_SCALE`
pub const BUDGET_SCALE: f64 = 1_000_000.0;

pub fn pos_teto(year: i32) -> u8 {
    u8::from(year >= TETO_START_YEAR)
}

pub fn millions(orcamento: Option<f64>) -> Option<f64> {
    orcamento.map(|v| v / BUDGET_SCALE)
}

/// Natural log, `None` for missing or non-positive input.
pub fn ln_positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v > 0.0).map(f64::ln)
}

/// Shift one entity's series forward by one step; the first slot is undefined.
pub fn lag(series: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(series.len());
    if !series.is_empty() {
        out.push(None);
        out.extend_from_slice(&series[..series.len() - 1]);
    }
    out
}

pub fn interaction(
    policy: InteractionPolicy,
    ln_orcamento: Option<f64>,
    ln_orcamento_lag: Option<f64>,
    pos_teto: u8,
) -> Option<f64> {
    let base = match policy {
        InteractionPolicy::Contemporaneous => ln_orcamento,
        InteractionPolicy::Lagged => ln_orcamento_lag,
    };
    base.map(|v| v * f64::from(pos_teto))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pos_teto_cutoff() {
        assert_eq!(pos_teto(2016), 0);
        assert_eq!(pos_teto(2017), 1);
        assert_eq!(pos_teto(2024), 1);
    }

    #[test]
    fn test_ln_positive() {
        assert_eq!(ln_positive(Some(1.0)), Some(0.0));
        assert_eq!(ln_positive(Some(0.0)), None);
        assert_eq!(ln_positive(Some(-3.0)), None);
        assert_eq!(ln_positive(None), None);
    }

    #[test]
    fn test_lag() {
        assert_eq!(lag(&[Some(1.0), None, Some(3.0)]), vec![None, Some(1.0), None]);
        assert!(lag(&[]).is_empty());
    }

    #[test]
    fn test_interaction_policies() {
        let c = InteractionPolicy::Contemporaneous;
        let l = InteractionPolicy::Lagged;
        assert_eq!(interaction(c, Some(2.0), Some(1.0), 1), Some(2.0));
        assert_eq!(interaction(c, Some(2.0), Some(1.0), 0), Some(0.0));
        assert_eq!(interaction(l, Some(2.0), Some(1.0), 1), Some(1.0));
        assert_eq!(interaction(l, Some(2.0), None, 1), None);
        assert_eq!(interaction(c, None, Some(1.0), 0), None);
    }
}
