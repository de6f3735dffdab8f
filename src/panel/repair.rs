// src/panel/repair.rs
use serde::Serialize;

/// How a repaired IGC value was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Imputation {
    /// Linear between the nearest observed years on both sides.
    Interpolated,
    /// Last observed value carried forward past the end of the series.
    Carried,
}

/// Repair one entity's IGC series in place.
///
/// `years` must be strictly ascending and the same length as `values`.
/// Interior gaps are interpolated against the year, trailing gaps carry the
/// last observation, leading gaps stay `None`.
pub fn repair_series(years: &[i32], values: &mut [Option<f64>]) -> Vec<Option<Imputation>> {
    debug_assert_eq!(years.len(), values.len());

    let observed: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i, v)))
        .collect();
    let mut marks = vec![None; values.len()];

    let mut next_obs: usize = 0;
    for i in 0..values.len() {
        if values[i].is_some() {
            next_obs += 1;
            continue;
        }
        // observed[next_obs - 1] is the last observation before i, observed[next_obs] the first after
        let prev = next_obs.checked_sub(1).map(|k| observed[k]);
        let next = observed.get(next_obs).copied();

        match (prev, next) {
            (Some((p, vp)), Some((n, vn))) => {
                let (yp, yn, yi) = (years[p] as f64, years[n] as f64, years[i] as f64);
                values[i] = Some(vp + (vn - vp) * (yi - yp) / (yn - yp));
                marks[i] = Some(Imputation::Interpolated);
            }
            (Some((_, vp)), None) => {
                values[i] = Some(vp);
                marks[i] = Some(Imputation::Carried);
            }
            (None, _) => {}
        }
    }
    marks
}
