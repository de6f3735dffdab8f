// src/interpret.rs
use serde::Serialize;
use std::fmt;

/// Conventional 5% significance level.
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    RejectNull,
    FailToRejectNull,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interpretation {
    pub verdict: Verdict,
    pub coefficient: f64,
    pub p_value: f64,
    pub threshold: f64,
    pub headline: String,
    pub details: Vec<String>,
}

/// Narrate a budget elasticity estimate. A NaN p-value never rejects.
pub fn interpret(coefficient: f64, p_value: f64, threshold: f64) -> Interpretation {
    let (verdict, headline, details) = if p_value < threshold {
        (
            Verdict::RejectNull,
            "Reject the null hypothesis (H0).".to_string(),
            vec![format!(
                "There is statistical evidence of an effect: a 1% change in budget is associated with a {:.4}% change in IGC.",
                coefficient
            )],
        )
    } else {
        (
            Verdict::FailToRejectNull,
            "Fail to reject the null hypothesis (H0).".to_string(),
            vec![
                "No robust statistical evidence of an immediate effect was found in this model."
                    .to_string(),
                "Possible cause: IGC has inertia and reacts to budget cuts with a delay."
                    .to_string(),
            ],
        )
    };
    Interpretation {
        verdict,
        coefficient,
        p_value,
        threshold,
        headline,
        details,
    }
}

impl fmt::Display for Interpretation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "p-value:     {:.4}", self.p_value)?;
        writeln!(f, "coefficient: {:.4}", self.coefficient)?;
        write!(f, "{}", self.headline)?;
        for line in &self.details {
            write!(f, "\n{}", line)?;
        }
        Ok(())
    }
}
