use rvltl_core::{B4, Tally};
use serde::Serialize;
use std::fmt::Display;

fn print<R: Serialize + Display>(report: &R, json: bool) {
    if json {
        let report = serde_json::ser::to_string_pretty(report).expect("report serialization");
        println!("{report}");
    } else {
        println!("{report}");
    }
}

/// Verdicts of a formula over a recorded trace.
#[derive(Serialize)]
pub(crate) struct ReplayReport {
    pub(crate) formula: String,
    pub(crate) trace: String,
    pub(crate) steps: usize,
    /// Verdict after each step, empty if only the final verdict was requested.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) verdicts: Vec<String>,
    pub(crate) verdict: String,
}

impl ReplayReport {
    pub(crate) fn new(
        formula: String,
        trace: String,
        steps: usize,
        verdicts: &[B4],
        verdict: B4,
    ) -> Self {
        Self {
            formula,
            trace,
            steps,
            verdicts: verdicts.iter().map(B4::to_string).collect(),
            verdict: verdict.to_string(),
        }
    }

    pub(crate) fn print(&self, json: bool) {
        print(self, json);
    }
}

impl Display for ReplayReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "RV-LTL verdicts for {} over {}", self.formula, self.trace)?;
        for (step, verdict) in self.verdicts.iter().enumerate() {
            writeln!(f, "step {step}: {verdict}")?;
        }
        write!(
            f,
            "Final verdict after {} steps: {}",
            self.steps, self.verdict
        )
    }
}

/// Outcomes of a batch of simulated runs.
#[derive(Serialize)]
pub(crate) struct SimulationReport {
    pub(crate) formula: String,
    pub(crate) seed: u64,
    pub(crate) max_length: usize,
    pub(crate) runs: u32,
    pub(crate) mean_length: f64,
    pub(crate) r#true: u32,
    pub(crate) presumably_true: u32,
    pub(crate) presumably_false: u32,
    pub(crate) r#false: u32,
}

impl SimulationReport {
    pub(crate) fn new(formula: String, seed: u64, max_length: usize, tally: &Tally) -> Self {
        Self {
            formula,
            seed,
            max_length,
            runs: tally.runs,
            mean_length: tally.mean_length(),
            r#true: tally.count(B4::True),
            presumably_true: tally.count(B4::PresumablyTrue),
            presumably_false: tally.count(B4::PresumablyFalse),
            r#false: tally.count(B4::False),
        }
    }

    pub(crate) fn print(&self, json: bool) {
        print(self, json);
    }
}

impl Display for SimulationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "RV-LTL simulation of {} (seed {}, max length {})",
            self.formula, self.seed, self.max_length
        )?;
        writeln!(
            f,
            "Completed {} runs of {:.1} steps on average",
            self.runs, self.mean_length
        )?;
        for (verdict, count) in [
            (B4::True, self.r#true),
            (B4::PresumablyTrue, self.presumably_true),
            (B4::PresumablyFalse, self.presumably_false),
            (B4::False, self.r#false),
        ] {
            let rate = if self.runs > 0 {
                count as f64 / self.runs as f64
            } else {
                0f64
            };
            writeln!(f, "{verdict}: {count} ({rate:.3})")?;
        }
        Ok(())
    }
}
