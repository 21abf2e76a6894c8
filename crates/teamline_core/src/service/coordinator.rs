//! Integrity coordinator for multi-document write sequences.
//!
//! # Responsibility
//! - Execute ordered write steps against a store that offers only
//!   single-document atomicity.
//! - Retry transient failures with bounded backoff; classify the rest.
//!
//! # Invariants
//! - Steps run strictly in order; a failed step stops the sequence.
//! - Committed steps are never rolled back (the store cannot); a mixed
//!   outcome is reported as a partial failure naming every step.
//! - Deterministic store errors are not retried.

use crate::store::{StoreError, StoreResult};
use log::{error, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::thread;
use std::time::Duration;

/// Bounded retry configuration for transient store failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Attempts per step, first try included.
    pub max_attempts: u32,
    /// Base backoff; attempt `n` waits `backoff * n`.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(25),
        }
    }
}

/// One named, fallible document write inside a sequence.
///
/// The closure re-reads whatever documents it needs when it runs, so a
/// retried step always works on the latest copy.
pub struct WriteStep<'a> {
    name: &'static str,
    op: Box<dyn FnMut() -> StoreResult<()> + 'a>,
}

impl<'a> WriteStep<'a> {
    pub fn new(name: &'static str, op: impl FnMut() -> StoreResult<()> + 'a) -> Self {
        Self {
            name,
            op: Box::new(op),
        }
    }

    /// Step name as reported in partial-failure reports and logs.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Operator-facing record of a sequence that stopped partway through.
///
/// Carries enough to drive reconciliation without replaying the whole
/// operation blindly.
#[derive(Debug)]
pub struct PartialFailureReport {
    /// Operation the sequence belonged to.
    pub operation: &'static str,
    /// Steps that committed, in execution order.
    pub completed: Vec<&'static str>,
    /// Step that exhausted its attempts (or failed deterministically).
    pub failed: &'static str,
    /// Steps never attempted.
    pub pending: Vec<&'static str>,
    /// Error from the failed step's final attempt.
    pub cause: StoreError,
}

impl Display for PartialFailureReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "operation `{}` partially failed at step `{}` (completed: [{}]; pending: [{}]): {}",
            self.operation,
            self.failed,
            self.completed.join(", "),
            self.pending.join(", "),
            self.cause
        )
    }
}

impl Error for PartialFailureReport {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.cause)
    }
}

/// Outcome of a failed write sequence.
#[derive(Debug)]
pub enum SequenceError {
    /// The first step failed: no document was written, the operation
    /// aborted cleanly.
    Aborted {
        step: &'static str,
        cause: StoreError,
    },
    /// At least one step committed before a later step failed.
    Partial(PartialFailureReport),
}

/// Runs `steps` in order under `policy`.
///
/// Each step is attempted up to `policy.max_attempts` times while its error
/// stays transient (SQLite busy/locked); the first deterministic error
/// fails the step immediately.
pub fn run_sequence(
    operation: &'static str,
    steps: Vec<WriteStep<'_>>,
    policy: &RetryPolicy,
) -> Result<(), SequenceError> {
    let names: Vec<&'static str> = steps.iter().map(WriteStep::name).collect();

    for (index, mut step) in steps.into_iter().enumerate() {
        if let Err(cause) = run_step(operation, &mut step, policy) {
            if index == 0 {
                return Err(SequenceError::Aborted {
                    step: step.name,
                    cause,
                });
            }

            let report = PartialFailureReport {
                operation,
                completed: names[..index].to_vec(),
                failed: step.name,
                pending: names[index + 1..].to_vec(),
                cause,
            };
            error!(
                "event=write_sequence_partial module=coordinator status=error operation={} failed_step={} completed={} pending={}",
                operation,
                report.failed,
                report.completed.len(),
                report.pending.len()
            );
            return Err(SequenceError::Partial(report));
        }
    }

    Ok(())
}

fn run_step(
    operation: &'static str,
    step: &mut WriteStep<'_>,
    policy: &RetryPolicy,
) -> StoreResult<()> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match (step.op)() {
            Ok(()) => return Ok(()),
            Err(err) if err.is_transient() && attempt < max_attempts => {
                warn!(
                    "event=write_step_retry module=coordinator status=retry operation={} step={} attempt={} error={}",
                    operation, step.name, attempt, err
                );
                thread::sleep(policy.backoff * attempt);
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{run_sequence, RetryPolicy, SequenceError, WriteStep};
    use crate::model::EntityKind;
    use crate::store::StoreError;
    use std::cell::Cell;
    use uuid::Uuid;

    fn missing_row() -> StoreError {
        StoreError::NotFound {
            entity: EntityKind::User,
            id: Uuid::nil(),
        }
    }

    #[test]
    fn all_steps_run_in_order_on_success() {
        let trace = Cell::new(0u32);
        let steps = vec![
            WriteStep::new("first", || {
                assert_eq!(trace.get(), 0);
                trace.set(1);
                Ok(())
            }),
            WriteStep::new("second", || {
                assert_eq!(trace.get(), 1);
                trace.set(2);
                Ok(())
            }),
        ];

        run_sequence("test_op", steps, &RetryPolicy::default()).unwrap();
        assert_eq!(trace.get(), 2);
    }

    #[test]
    fn first_step_failure_aborts_without_partial_report() {
        let steps = vec![
            WriteStep::new("first", || Err(missing_row())),
            WriteStep::new("second", || panic!("must not run")),
        ];

        let err = run_sequence("test_op", steps, &RetryPolicy::default()).unwrap_err();
        match err {
            SequenceError::Aborted { step, .. } => assert_eq!(step, "first"),
            SequenceError::Partial(report) => panic!("unexpected partial: {report}"),
        }
    }

    #[test]
    fn mid_sequence_failure_reports_completed_and_pending_steps() {
        let steps = vec![
            WriteStep::new("first", || Ok(())),
            WriteStep::new("second", || Err(missing_row())),
            WriteStep::new("third", || panic!("must not run")),
        ];

        let err = run_sequence("test_op", steps, &RetryPolicy::default()).unwrap_err();
        match err {
            SequenceError::Partial(report) => {
                assert_eq!(report.operation, "test_op");
                assert_eq!(report.completed, vec!["first"]);
                assert_eq!(report.failed, "second");
                assert_eq!(report.pending, vec!["third"]);
            }
            SequenceError::Aborted { .. } => panic!("expected partial failure"),
        }
    }

    #[test]
    fn deterministic_errors_are_not_retried() {
        let calls = Cell::new(0u32);
        let steps = vec![WriteStep::new("only", || {
            calls.set(calls.get() + 1);
            Err(missing_row())
        })];

        let policy = RetryPolicy {
            max_attempts: 5,
            ..RetryPolicy::default()
        };
        run_sequence("test_op", steps, &policy).unwrap_err();
        assert_eq!(calls.get(), 1);
    }
}
