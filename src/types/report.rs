use std::fmt;
use std::time::Duration;

use super::outcome::ValidationOutcome;

/// Gates of the acceptance funnel, in the order candidates meet them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Generated,
    Structural,
    Parsed,
    Compiled,
    Functional,
    Playable,
}

impl Gate {
    pub const ALL: [Gate; 6] = [
        Gate::Generated,
        Gate::Structural,
        Gate::Parsed,
        Gate::Compiled,
        Gate::Functional,
        Gate::Playable,
    ];

    fn label(self) -> &'static str {
        match self {
            Gate::Generated => "valid",
            Gate::Structural => "structural",
            Gate::Parsed => "parse",
            Gate::Compiled => "compile",
            Gate::Functional => "functional",
            Gate::Playable => "playable",
        }
    }
}

/// Aggregate statistics of a pipeline run.
///
/// Returned by [`Pipeline::run_fixed_attempts()`](crate::Pipeline::run_fixed_attempts)
/// and [`Pipeline::run_until_accepted()`](crate::Pipeline::run_until_accepted).
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct PipelineReport {
    attempts: usize,
    outcomes: [usize; ValidationOutcome::ALL.len()],
    passed: [usize; Gate::ALL.len()],
    elapsed: Duration,
    last_accepted: Option<String>,
}

impl PipelineReport {
    pub(crate) fn record(&mut self, outcome: ValidationOutcome) {
        self.attempts += 1;
        self.outcomes[outcome.index()] += 1;
    }

    pub(crate) fn pass(&mut self, gate: Gate) {
        self.passed[gate as usize] += 1;
    }

    pub(crate) fn accept(&mut self, text: String) {
        self.last_accepted = Some(text);
    }

    pub(crate) fn finish(&mut self, elapsed: Duration) {
        self.elapsed = elapsed;
    }

    /// Number of generation attempts made.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// How many attempts ended with the given outcome.
    #[must_use]
    pub fn count(&self, outcome: ValidationOutcome) -> usize {
        self.outcomes[outcome.index()]
    }

    /// How many attempts got past the given gate.
    #[must_use]
    pub fn passed(&self, gate: Gate) -> usize {
        self.passed[gate as usize]
    }

    /// Share of attempts that got past the gate, in percent.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn pass_rate(&self, gate: Gate) -> f64 {
        if self.attempts == 0 {
            return 0.0;
        }
        self.passed(gate) as f64 * 100.0 / self.attempts as f64
    }

    /// Number of accepted candidates.
    #[must_use]
    pub fn accepted(&self) -> usize {
        self.count(ValidationOutcome::Accepted)
    }

    /// Wall-clock duration of the run.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// The most recently accepted candidate text.
    #[must_use]
    pub fn last_accepted(&self) -> Option<&str> {
        self.last_accepted.as_deref()
    }

    #[must_use]
    pub fn into_last_accepted(self) -> Option<String> {
        self.last_accepted
    }
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} random games generated in {:.3}s:",
            self.attempts,
            self.elapsed.as_secs_f64()
        )?;
        for gate in Gate::ALL {
            writeln!(
                f,
                "{} {} ({:.1}%).",
                self.passed(gate),
                gate.label(),
                self.pass_rate(gate)
            )?;
        }
        let rejected: Vec<String> = ValidationOutcome::ALL
            .iter()
            .filter(|o| **o != ValidationOutcome::Accepted && self.count(**o) > 0)
            .map(|o| format!("{o}: {}", self.count(*o)))
            .collect();
        write!(f, "rejections: [{}]", rejected.join(", "))
    }
}
