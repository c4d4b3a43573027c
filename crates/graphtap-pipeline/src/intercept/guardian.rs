//! Self-healing hook guardian
//!
//! The host may rebind a primitive after our observer was installed. The
//! guardian periodically checks every watched slot and wraps whatever is
//! currently bound when the observer has been displaced.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::slot::{HookSlot, Observable};

type Wrap<T> = Box<dyn Fn(Arc<T>) -> Arc<T> + Send + Sync>;

trait HookCheck: Send + Sync {
    fn name(&self) -> &'static str;
    fn is_intact(&self) -> bool;
    fn heal(&self) -> bool;
}

struct SlotCheck<T: ?Sized> {
    name: &'static str,
    slot: Arc<HookSlot<T>>,
    wrap: Wrap<T>,
}

impl<T> HookCheck for SlotCheck<T>
where
    T: ?Sized + Observable + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_intact(&self) -> bool {
        self.slot.is_observed()
    }

    fn heal(&self) -> bool {
        self.slot.ensure_wrapped(|inner| (self.wrap)(inner))
    }
}

/// Periodic health check over hook slots
pub struct Guardian {
    interval: Duration,
    checks: Vec<Box<dyn HookCheck>>,
}

impl Guardian {
    /// Create guardian checking every `interval`
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            checks: Vec::new(),
        }
    }

    /// Watch a slot, re-wrapping with `wrap` when displaced
    pub fn watch<T, F>(&mut self, name: &'static str, slot: Arc<HookSlot<T>>, wrap: F)
    where
        T: ?Sized + Observable + Send + Sync + 'static,
        F: Fn(Arc<T>) -> Arc<T> + Send + Sync + 'static,
    {
        self.checks.push(Box::new(SlotCheck {
            name,
            slot,
            wrap: Box::new(wrap),
        }));
    }

    /// Names of watched hooks
    #[must_use]
    pub fn watched(&self) -> Vec<&'static str> {
        self.checks.iter().map(|c| c.name()).collect()
    }

    /// Run one health check, returning how many hooks were re-wrapped
    pub fn check_now(&self) -> usize {
        let mut healed = 0;
        for check in &self.checks {
            if check.is_intact() {
                continue;
            }
            warn!(hook = check.name(), "hook displaced");
            if check.heal() {
                info!(hook = check.name(), "hook re-wrapped");
                healed += 1;
            }
        }
        healed
    }

    /// Run the check periodically until `shutdown` turns true or closes
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.check_now();
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
            debug!("guardian stopped");
        })
    }
}

impl std::fmt::Debug for Guardian {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Guardian")
            .field("interval", &self.interval)
            .field("watched", &self.watched())
            .finish()
    }
}
