//! Bounded convergence polling after mutating commands.
//!
//! A mutating command returning success only means the tool accepted the
//! request; the observed state catches up asynchronously. Each transition is
//! driven by a bounded poll loop rather than an unbounded wait, and
//! abandonment is silent: the periodic refresh eventually reflects truth.

use super::commands;
use crate::decode;
use crate::invoker::CliInvoker;
use crate::store::EntityStore;
use crate::types::{ContainerState, ContainerSummary};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::debug;

/// Maximum observation attempts per transition.
pub const POLL_ATTEMPTS: u32 = 10;

/// Delay between observation attempts. Together with [`POLL_ATTEMPTS`] this
/// bounds the worst-case wall-clock wait at five seconds.
pub const POLL_DELAY: Duration = Duration::from_millis(500);

/// The observed condition a transition is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergeTarget {
    Running,
    NotRunning,
}

impl ConvergeTarget {
    /// Whether the freshly observed state satisfies this target.
    ///
    /// An entity absent from the observed list satisfies `NotRunning` (a
    /// container that vanished clearly is not running) but not `Running`,
    /// where absence reads as not-yet and the loop keeps polling.
    pub fn satisfied_by(&self, observed: Option<&ContainerState>) -> bool {
        match (self, observed) {
            (ConvergeTarget::Running, Some(state)) => state.is_running(),
            (ConvergeTarget::Running, None) => false,
            (ConvergeTarget::NotRunning, Some(state)) => !state.is_running(),
            (ConvergeTarget::NotRunning, None) => true,
        }
    }
}

/// Cooperative cancellation flag for an in-flight convergence loop.
///
/// A superseding action on the same entity trips the stale loop's flag; the
/// loop checks it at every suspension point and stops observing. The
/// underlying tool command is never killed, only the polling stops.
#[derive(Debug, Clone, Default)]
pub struct AbortFlag(Arc<AtomicBool>);

impl AbortFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Poll the container list until `id` reaches `target`, the attempt budget
/// runs out, or the flag is cancelled.
///
/// The caller has already marked `id` as loading; every exit path of this
/// function clears the marker. Returns whether the target was observed.
pub async fn run_convergence(
    invoker: &dyn CliInvoker,
    store: &EntityStore,
    id: &str,
    target: ConvergeTarget,
    abort: &AbortFlag,
) -> bool {
    let mut converged = false;

    for attempt in 1..=POLL_ATTEMPTS {
        if abort.is_cancelled() {
            debug!("Convergence poll for {} cancelled before attempt {}", id, attempt);
            break;
        }

        tokio::time::sleep(POLL_DELAY).await;

        if abort.is_cancelled() {
            debug!("Convergence poll for {} cancelled during backoff", id);
            break;
        }

        let argv = commands::list_containers();
        let args: Vec<&str> = argv.iter().map(String::as_str).collect();
        let invocation = invoker.invoke(&args).await;
        if invocation.failed {
            // Nothing was observed; absence from a failed listing is not
            // absence from the runtime.
            debug!(
                "Observe attempt {} for {} failed: {}",
                attempt,
                id,
                invocation.diagnostic()
            );
            continue;
        }

        let containers: Vec<ContainerSummary> = decode::decode_list(&invocation);
        let observed = containers
            .iter()
            .find(|container| container.id == id)
            .map(|container| &container.status);

        let satisfied = target.satisfied_by(observed);
        store.set_containers(containers).await;
        if satisfied {
            debug!("Container {} converged after {} attempt(s)", id, attempt);
            converged = true;
            break;
        }
    }

    if !converged {
        debug!("Convergence poll for {} ended without observing target", id);
    }

    store.clear_loading(id).await;
    converged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absence_satisfies_not_running_only() {
        assert!(ConvergeTarget::NotRunning.satisfied_by(None));
        assert!(!ConvergeTarget::Running.satisfied_by(None));
    }

    #[test]
    fn state_checks_match_target() {
        assert!(ConvergeTarget::Running.satisfied_by(Some(&ContainerState::Running)));
        assert!(!ConvergeTarget::Running.satisfied_by(Some(&ContainerState::Stopped)));
        assert!(ConvergeTarget::NotRunning.satisfied_by(Some(&ContainerState::Stopped)));
        assert!(!ConvergeTarget::NotRunning.satisfied_by(Some(&ContainerState::Running)));
    }

    #[test]
    fn transitioning_state_does_not_satisfy_running() {
        assert!(!ConvergeTarget::Running.satisfied_by(Some(&ContainerState::Transitioning)));
    }
}
