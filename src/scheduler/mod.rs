//! Periodic refresh scheduling.
//!
//! One repeating timer fires the fixed observational batch. Each tick spawns
//! the refreshes without awaiting them; the store's change detection absorbs
//! any overlap between a slow cycle and the next tick. Changing the interval
//! tears the timer down and recreates it rather than adjusting it in place.

use crate::orchestrator::Supervisor;
use crate::updates::UpdateChecker;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Wall-clock spacing between application update queries.
const UPDATE_CHECK_COOLDOWN_HOURS: i64 = 6;

/// The selectable refresh cadences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RefreshInterval {
    Fast,
    #[default]
    Standard,
    Relaxed,
    Slow,
}

impl RefreshInterval {
    pub fn duration(self) -> Duration {
        match self {
            RefreshInterval::Fast => Duration::from_secs(5),
            RefreshInterval::Standard => Duration::from_secs(10),
            RefreshInterval::Relaxed => Duration::from_secs(30),
            RefreshInterval::Slow => Duration::from_secs(60),
        }
    }
}

pub struct RefreshScheduler {
    supervisor: Arc<Supervisor>,
    updates: Arc<UpdateChecker>,
    handle: Mutex<Option<JoinHandle<()>>>,
    interval: Mutex<RefreshInterval>,
    last_update_check: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl RefreshScheduler {
    pub fn new(supervisor: Arc<Supervisor>, updates: Arc<UpdateChecker>) -> Self {
        Self {
            supervisor,
            updates,
            handle: Mutex::new(None),
            interval: Mutex::new(RefreshInterval::default()),
            last_update_check: Arc::new(Mutex::new(None)),
        }
    }

    pub fn interval(&self) -> RefreshInterval {
        *self.interval.lock().expect("scheduler interval poisoned")
    }

    /// Start (or restart) the repeating refresh timer.
    pub fn start(&self, interval: RefreshInterval) {
        let mut slot = self.handle.lock().expect("scheduler handle poisoned");
        if let Some(previous) = slot.take() {
            previous.abort();
        }
        *self.interval.lock().expect("scheduler interval poisoned") = interval;

        let supervisor = Arc::clone(&self.supervisor);
        let updates = Arc::clone(&self.updates);
        let last_update_check = Arc::clone(&self.last_update_check);

        info!("🔄 Refresh scheduler running every {:?}", interval.duration());
        *slot = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval.duration());
            loop {
                ticker.tick().await;

                let refresher = Arc::clone(&supervisor);
                tokio::spawn(async move {
                    refresher.refresh_all().await;
                });

                if take_update_check_slot(&last_update_check) {
                    let checker = Arc::clone(&updates);
                    let store = Arc::clone(supervisor.store());
                    tokio::spawn(async move {
                        checker.check_and_publish(&store).await;
                    });
                }
            }
        }));
    }

    /// Change the cadence: tear the timer down and create a fresh one.
    /// Adjusting a live timer's period would risk drift or double-firing.
    pub fn set_interval(&self, interval: RefreshInterval) {
        if self.interval() == interval {
            debug!("Refresh interval unchanged, leaving timer alone");
            return;
        }
        self.start(interval);
    }

    pub fn shutdown(&self) {
        if let Some(handle) = self.handle.lock().expect("scheduler handle poisoned").take() {
            handle.abort();
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Whether enough wall-clock time has passed for another update query.
/// Claims the slot when it has.
fn take_update_check_slot(last: &Mutex<Option<DateTime<Utc>>>) -> bool {
    let mut last = last.lock().expect("update cooldown poisoned");
    let now = Utc::now();
    let due = match *last {
        None => true,
        Some(previous) => now - previous >= ChronoDuration::hours(UPDATE_CHECK_COOLDOWN_HOURS),
    };
    if due {
        *last = Some(now);
    }
    due
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_durations_are_the_enumerated_set() {
        assert_eq!(RefreshInterval::Fast.duration(), Duration::from_secs(5));
        assert_eq!(RefreshInterval::Standard.duration(), Duration::from_secs(10));
        assert_eq!(RefreshInterval::Relaxed.duration(), Duration::from_secs(30));
        assert_eq!(RefreshInterval::Slow.duration(), Duration::from_secs(60));
    }

    #[test]
    fn interval_round_trips_through_toml() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            refresh_interval: RefreshInterval,
        }

        let rendered = toml::to_string(&Wrapper {
            refresh_interval: RefreshInterval::Relaxed,
        })
        .unwrap();
        assert!(rendered.contains("relaxed"));
        let parsed: Wrapper = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.refresh_interval, RefreshInterval::Relaxed);
    }

    #[test]
    fn update_check_slot_respects_cooldown() {
        let last = Mutex::new(None);
        assert!(take_update_check_slot(&last));
        assert!(!take_update_check_slot(&last));

        *last.lock().unwrap() = Some(Utc::now() - ChronoDuration::hours(7));
        assert!(take_update_check_slot(&last));
    }
}
