use std::time::Duration;

use crate::domain::{BatchReport, DispatchOutcome};

/// Folds outcomes (in dispatch order) into a [`BatchReport`].
///
/// Pure aggregation: no I/O, deterministic given its inputs.
#[derive(Clone, Debug, Default)]
pub struct ResultReporter {
    outcomes: Vec<DispatchOutcome>,
}

impl ResultReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            outcomes: Vec::with_capacity(capacity),
        }
    }

    pub fn record(&mut self, outcome: DispatchOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn finish(self, elapsed: Duration) -> BatchReport {
        finalize(self.outcomes, elapsed)
    }
}

pub fn finalize(outcomes: Vec<DispatchOutcome>, elapsed: Duration) -> BatchReport {
    let sent_count = outcomes.iter().filter(|o| o.is_sent()).count();
    let total = outcomes.len();
    BatchReport {
        total,
        sent_count,
        failed_count: total - sent_count,
        duration_seconds: elapsed.as_secs_f64(),
        outcomes,
    }
}
