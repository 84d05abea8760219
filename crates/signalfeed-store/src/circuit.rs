//! Fast failure for a document store that stopped answering.
//!
//! Only outcomes saying the store itself is unhealthy count against it:
//! [`StoreErrorKind::Unavailable`] and [`StoreErrorKind::Timeout`]. Any other
//! answer, a permission or query rejection included, proves the store is
//! reachable and closes the circuit.

use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};

use crate::{StoreError, StoreErrorKind};

/// Observable circuit state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    Probing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitConfig {
    /// Consecutive unhealthy outcomes that open the circuit.
    pub failure_threshold: u32,
    /// How long round trips are refused once open.
    pub cool_down: Duration,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            cool_down: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Closed { failures: u32 },
    Open { until: Instant },
    // A probe that never reports back is replaced after one cool-down.
    Probing { started: Instant },
}

/// Whether an error of this kind means the store could not be reached.
pub const fn counts_against_store(kind: StoreErrorKind) -> bool {
    matches!(kind, StoreErrorKind::Unavailable | StoreErrorKind::Timeout)
}

/// Guards round trips to one document store.
#[derive(Debug)]
pub struct StoreCircuit {
    config: CircuitConfig,
    phase: Mutex<Phase>,
}

impl Default for StoreCircuit {
    fn default() -> Self {
        Self::new(CircuitConfig::default())
    }
}

impl StoreCircuit {
    pub fn new(config: CircuitConfig) -> Self {
        Self {
            config,
            phase: Mutex::new(Phase::Closed { failures: 0 }),
        }
    }

    /// Admits a round trip or fails fast with `Unavailable`. Once the
    /// cool-down has passed a single probe is admitted.
    pub fn admit(&self) -> Result<(), StoreError> {
        let now = Instant::now();
        let mut phase = self.lock();
        match *phase {
            Phase::Closed { .. } => Ok(()),
            Phase::Open { until } if now >= until => {
                *phase = Phase::Probing { started: now };
                Ok(())
            }
            Phase::Probing { started } if now.duration_since(started) >= self.config.cool_down => {
                *phase = Phase::Probing { started: now };
                Ok(())
            }
            Phase::Open { until } => Err(StoreError::unavailable(format!(
                "document store circuit is open for another {}ms",
                until.saturating_duration_since(now).as_millis()
            ))),
            Phase::Probing { .. } => Err(StoreError::unavailable(
                "document store circuit is waiting on a probe",
            )),
        }
    }

    /// Records the outcome of an admitted round trip.
    pub fn observe<T>(&self, outcome: &Result<T, StoreError>) {
        let unhealthy = matches!(outcome, Err(error) if counts_against_store(error.kind()));
        let mut phase = self.lock();

        let next = match (*phase, unhealthy) {
            (Phase::Closed { failures: 0 }, false) => return,
            (Phase::Open { .. } | Phase::Probing { .. } | Phase::Closed { .. }, false) => {
                info!("document store answered, circuit closed");
                Phase::Closed { failures: 0 }
            }
            (Phase::Closed { failures }, true)
                if failures.saturating_add(1) < self.config.failure_threshold =>
            {
                Phase::Closed {
                    failures: failures + 1,
                }
            }
            // Late outcome of a round trip admitted before the circuit opened.
            (Phase::Open { .. }, true) => return,
            (Phase::Closed { .. } | Phase::Probing { .. }, true) => {
                warn!(
                    cool_down_ms = self.config.cool_down.as_millis() as u64,
                    "document store unhealthy, circuit opened"
                );
                Phase::Open {
                    until: Instant::now() + self.config.cool_down,
                }
            }
        };
        *phase = next;
    }

    pub fn state(&self) -> CircuitState {
        match *self.lock() {
            Phase::Closed { .. } => CircuitState::Closed,
            Phase::Open { .. } => CircuitState::Open,
            Phase::Probing { .. } => CircuitState::Probing,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Phase> {
        self.phase.lock().expect("store circuit lock is not poisoned")
    }
}
