//! Isolated execution of packaging units.
//!
//! Every unit runs on its own blocking task with a shared read-only job
//! closure. Units report through a [`UnitReporter`]; messages are printed as
//! they arrive and collected for the [`RunSummary`]. A unit's exit code is 0
//! on success, 1 when its job returned an error and 101 when it panicked. A
//! failing unit never affects its siblings, and artifacts already written by
//! any unit are left in place.

use crate::bundler::Result;
use std::fmt::Display;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

/// Exit code of a unit whose job returned an error.
pub const EXIT_FAILURE: i32 = 1;

/// Exit code of a unit that panicked.
pub const EXIT_PANIC: i32 = 101;

/// Severity of a unit message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Log,
    Error,
}

/// One line reported by a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitMessage {
    pub unit: String,
    pub kind: MessageKind,
    pub message: String,
}

impl UnitMessage {
    fn emit(&self) {
        match self.kind {
            MessageKind::Log => log::info!("[{}] {}", self.unit, self.message),
            MessageKind::Error => log::error!("[{}] {}", self.unit, self.message),
        }
    }
}

/// Message sink handed to a running unit.
#[derive(Debug, Clone)]
pub struct UnitReporter {
    unit: String,
    tx: mpsc::UnboundedSender<UnitMessage>,
}

impl UnitReporter {
    pub fn log(&self, message: impl Into<String>) {
        self.send(MessageKind::Log, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.send(MessageKind::Error, message.into());
    }

    fn send(&self, kind: MessageKind, message: String) {
        // The printer only stops once every reporter is dropped.
        let _ = self.tx.send(UnitMessage {
            unit: self.unit.clone(),
            kind,
            message,
        });
    }
}

/// Final status of one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitOutcome {
    pub unit: String,
    pub exit_code: i32,
}

/// Result of a run: one outcome per unit, in completion order, and every
/// message reported.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<UnitOutcome>,
    pub messages: Vec<UnitMessage>,
}

impl RunSummary {
    /// 0 when every unit succeeded, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.outcomes.iter().all(|o| o.exit_code == 0) {
            0
        } else {
            EXIT_FAILURE
        }
    }

    /// Units with a non-zero exit code.
    pub fn failed(&self) -> impl Iterator<Item = &UnitOutcome> {
        self.outcomes.iter().filter(|o| o.exit_code != 0)
    }
}

/// Runs `job` once per unit, concurrently, and waits for all of them.
///
/// # Arguments
///
/// * `units` - Unit values; their `Display` form identifies them in messages
/// * `job` - Blocking work for one unit
///
/// # Returns
///
/// A [`RunSummary`] with exactly one outcome per unit.
pub async fn run_units<U, F>(units: Vec<U>, job: F) -> RunSummary
where
    U: Display + Send + 'static,
    F: Fn(U, &UnitReporter) -> Result<()> + Send + Sync + 'static,
{
    let job = Arc::new(job);
    let (tx, mut rx) = mpsc::unbounded_channel::<UnitMessage>();

    let printer = tokio::spawn(async move {
        let mut messages = Vec::new();
        while let Some(message) = rx.recv().await {
            message.emit();
            messages.push(message);
        }
        messages
    });

    let ids: Vec<String> = units.iter().map(ToString::to_string).collect();
    let mut tasks = JoinSet::new();

    for unit in units {
        let reporter = UnitReporter {
            unit: unit.to_string(),
            tx: tx.clone(),
        };
        let job = Arc::clone(&job);

        tasks.spawn_blocking(move || {
            let result = catch_unwind(AssertUnwindSafe(|| job(unit, &reporter)));
            let exit_code = match result {
                Ok(Ok(())) => 0,
                Ok(Err(e)) => {
                    reporter.error(e.to_string());
                    EXIT_FAILURE
                }
                Err(panic) => {
                    reporter.error(format!("panicked: {}", panic_message(panic.as_ref())));
                    EXIT_PANIC
                }
            };
            UnitOutcome {
                unit: reporter.unit,
                exit_code,
            }
        });
    }
    drop(tx);

    let mut outcomes = Vec::with_capacity(ids.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => log::error!("Packaging task failed: {e}"),
        }
    }

    // A unit without an outcome did not complete; it counts as failed.
    for id in ids {
        if !outcomes.iter().any(|o| o.unit == id) {
            outcomes.push(UnitOutcome {
                unit: id,
                exit_code: EXIT_FAILURE,
            });
        }
    }

    let messages = printer.await.unwrap_or_else(|e| {
        log::error!("Message printer failed: {e}");
        Vec::new()
    });

    RunSummary { outcomes, messages }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
