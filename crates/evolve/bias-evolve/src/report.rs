//! Progress reporting

use std::fmt;

use bias_core::{BiasConstant, Candidate, Evaluator, SpecUtility};

/// A new leader together with its per-spec breakdown
#[derive(Debug, Clone, PartialEq)]
pub struct BestReport {
    pub value: BiasConstant,
    pub utility: f32,
    pub breakdown: Vec<SpecUtility>,
}

impl BestReport {
    pub fn new(candidate: &Candidate, evaluator: &Evaluator) -> Self {
        Self {
            value: candidate.value(),
            utility: candidate.utility(),
            breakdown: candidate.spec_utilities(evaluator).to_vec(),
        }
    }
}

impl fmt::Display for BestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Candidate: {:>12} ({}), Utility: {:.4}",
            self.value.get(),
            self.value.bit_groups(),
            self.utility
        )?;
        for entry in &self.breakdown {
            write!(f, "\n  ({:7.4}) {}", entry.utility, entry.spec.description())?;
        }
        Ok(())
    }
}

/// Receives every improvement of the best candidate
pub trait ProgressReporter: Send + Sync {
    fn report(&self, best: &BestReport);
}

impl<F> ProgressReporter for F
where
    F: Fn(&BestReport) + Send + Sync,
{
    fn report(&self, best: &BestReport) {
        self(best)
    }
}

/// Writes reports through the `log` facade at info level
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ProgressReporter for LogReporter {
    fn report(&self, best: &BestReport) {
        log::info!("{best}");
    }
}
