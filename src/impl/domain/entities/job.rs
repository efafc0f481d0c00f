use std::fmt;

use super::{
    loan::LoanId, quarter::QuarterRange, service_charge_record::ServiceChargeRecord,
};

/// States of the scheduled recompute job.
///
/// `Idle -> Checking -> (Skip | Computing) -> Persisting -> Dispatching -> Done`,
/// with `Failed` reachable from `Computing`, `Persisting` and `Dispatching`.
/// A quarter whose records were persisted by an interrupted run goes
/// straight from `Checking` back to `Dispatching`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Checking,
    Skip,
    Computing,
    Persisting,
    Dispatching,
    Done,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Skip | JobState::Done | JobState::Failed)
    }

    pub(crate) fn can_transition_to(&self, next: JobState) -> bool {
        use JobState::*;
        matches!(
            (self, next),
            (Idle, Checking)
                | (Checking, Skip)
                | (Checking, Computing)
                | (Checking, Dispatching)
                | (Computing, Persisting)
                | (Computing, Failed)
                // Losing the race on the headline uniqueness constraint.
                | (Persisting, Skip)
                | (Persisting, Dispatching)
                | (Persisting, Failed)
                | (Dispatching, Done)
                | (Dispatching, Failed)
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchFailure {
    pub loan_id: LoanId,
    pub reason: String,
}

/// Outcome of applying service charges to a set of loans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub succeeded: Vec<LoanId>,
    pub failures: Vec<DispatchFailure>,
}

impl DispatchReport {
    pub fn failed_loan_ids(&self) -> Vec<LoanId> {
        self.failures.iter().map(|f| f.loan_id.clone()).collect()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub(crate) fn merge(&mut self, other: DispatchReport) {
        self.succeeded.extend(other.succeeded);
        self.failures.extend(other.failures);
    }
}

/// Result of one scheduled job invocation.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub range: QuarterRange,
    /// Every state the run passed through, starting at `Idle`.
    pub transitions: Vec<JobState>,
    /// Headline records the dispatch was derived from. Empty on `Skip`.
    pub records: Vec<ServiceChargeRecord>,
    pub dispatch: DispatchReport,
}

impl JobOutcome {
    pub fn final_state(&self) -> JobState {
        self.transitions.last().copied().unwrap_or(JobState::Idle)
    }

    pub fn skipped(&self) -> bool {
        self.final_state() == JobState::Skip
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_is_reachable_only_from_working_states() {
        use JobState::*;
        for from in [Idle, Checking, Skip, Computing, Persisting, Dispatching, Done, Failed] {
            let expected = matches!(from, Computing | Persisting | Dispatching);
            assert_eq!(from.can_transition_to(Failed), expected, "from {from}");
        }
    }

    #[test]
    fn terminal_states_have_no_successors() {
        use JobState::*;
        let all = [Idle, Checking, Skip, Computing, Persisting, Dispatching, Done, Failed];
        for from in all.iter().filter(|s| s.is_terminal()) {
            for to in all {
                assert!(!from.can_transition_to(to));
            }
        }
    }

    #[test]
    fn interrupted_dispatch_can_be_resumed_from_checking() {
        assert!(JobState::Checking.can_transition_to(JobState::Dispatching));
        assert!(!JobState::Skip.can_transition_to(JobState::Dispatching));
        assert!(!JobState::Idle.can_transition_to(JobState::Dispatching));
    }
}
