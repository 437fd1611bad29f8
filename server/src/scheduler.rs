//! Global fixed-rate ticker driving every subscribed session.
//!
//! Each cycle ticks all live subscriptions concurrently on a [`JoinSet`],
//! waits for the whole batch, then sleeps for what remains of the interval.
//! A failing or panicking session is logged and skipped; the others proceed.

use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use parking_lot::Mutex;
use tokio::{
    sync::watch,
    task::JoinSet,
    time::{self, Instant},
};
use tracing::{debug, error, info, warn};

use crate::error::TickError;

/// A session the scheduler can drive.
pub trait SessionDriver: Send + Sync {
    /// Short label used in logs.
    fn label(&self) -> &str;

    /// Advances the session by `dt`.
    fn tick(&self, dt: Duration) -> Result<(), TickError>;

    /// Pushes the current state to the session's connections.
    fn broadcast(&self) -> Result<(), TickError>;
}

/// Handle returned by [`Scheduler::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Outcome of one scheduler cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Sessions whose tick completed.
    pub ticked: usize,
    /// Sessions that broadcast a snapshot.
    pub broadcast: usize,
    /// Sessions whose tick or broadcast failed or panicked.
    pub failed: usize,
}

struct Subscription {
    id: SubscriptionId,
    driver: Arc<dyn SessionDriver>,
    alive: Arc<AtomicBool>,
}

enum Outcome {
    Skipped,
    Ticked,
    Broadcast,
}

/// Fixed-rate scheduler shared by every session of a server.
pub struct Scheduler {
    interval: Duration,
    broadcast_every: u64,
    next_id: AtomicU64,
    cycles: AtomicU64,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("interval", &self.interval)
            .field("broadcast_every", &self.broadcast_every)
            .field("subscriptions", &self.len())
            .finish()
    }
}

impl Scheduler {
    /// Creates a scheduler ticking every `interval` and broadcasting every
    /// `broadcast_every` ticks.
    #[must_use]
    pub fn new(interval: Duration, broadcast_every: u32) -> Self {
        Self {
            interval,
            broadcast_every: u64::from(broadcast_every.max(1)),
            next_id: AtomicU64::new(0),
            cycles: AtomicU64::new(0),
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    /// Fixed interval between two cycles; also the `dt` handed to sessions.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of subscribed sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.lock().len()
    }

    /// Reports whether no session is subscribed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.lock().is_empty()
    }

    /// Number of cycles run so far.
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Acquire)
    }

    /// Adds a session to the tick set.
    pub fn subscribe(&self, driver: Arc<dyn SessionDriver>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::AcqRel));
        debug!(subscription = id.get(), session = driver.label(), "session subscribed");
        self.subscriptions.lock().push(Subscription {
            id,
            driver,
            alive: Arc::new(AtomicBool::new(true)),
        });
        id
    }

    /// Removes a session from the tick set.
    ///
    /// Takes effect immediately, including for a cycle already in flight.
    /// Returns `false` when the subscription was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = self.subscriptions.lock();
        let Some(position) = subscriptions.iter().position(|entry| entry.id == id) else {
            return false;
        };
        let removed = subscriptions.swap_remove(position);
        removed.alive.store(false, Ordering::Release);
        debug!(
            subscription = id.get(),
            session = removed.driver.label(),
            "session unsubscribed"
        );
        true
    }

    /// Runs a single cycle: ticks every live session and waits for all of them.
    pub async fn run_once(&self) -> CycleReport {
        let cycle = self.cycles.fetch_add(1, Ordering::AcqRel) + 1;
        let broadcast = cycle % self.broadcast_every == 0;
        let dt = self.interval;

        let batch: Vec<(Arc<dyn SessionDriver>, Arc<AtomicBool>)> = self
            .subscriptions
            .lock()
            .iter()
            .map(|entry| (Arc::clone(&entry.driver), Arc::clone(&entry.alive)))
            .collect();

        let mut tasks = JoinSet::new();
        for (driver, alive) in batch {
            let _ = tasks.spawn(async move {
                let result = drive(driver.as_ref(), &alive, dt, broadcast);
                (driver, result)
            });
        }

        let mut report = CycleReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(Outcome::Skipped))) => {}
                Ok((_, Ok(Outcome::Ticked))) => report.ticked += 1,
                Ok((_, Ok(Outcome::Broadcast))) => {
                    report.ticked += 1;
                    report.broadcast += 1;
                }
                Ok((driver, Err(error))) => {
                    report.failed += 1;
                    warn!(session = driver.label(), %error, "session tick failed");
                }
                Err(error) => {
                    report.failed += 1;
                    error!(%error, "session tick panicked");
                }
            }
        }
        report
    }

    /// Runs cycles at the fixed rate until `shutdown` turns `true` or closes.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(interval_ms = self.interval.as_millis() as u64, "scheduler started");
        loop {
            if *shutdown.borrow() {
                break;
            }
            let started = Instant::now();
            let _ = self.run_once().await;
            let remaining = self.interval.saturating_sub(started.elapsed());
            tokio::select! {
                () = time::sleep(remaining) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        info!(cycles = self.cycles(), "scheduler stopped");
    }
}

fn drive(
    driver: &dyn SessionDriver,
    alive: &AtomicBool,
    dt: Duration,
    broadcast: bool,
) -> Result<Outcome, TickError> {
    if !alive.load(Ordering::Acquire) {
        return Ok(Outcome::Skipped);
    }
    driver.tick(dt)?;
    if !broadcast || !alive.load(Ordering::Acquire) {
        return Ok(Outcome::Ticked);
    }
    driver.broadcast()?;
    Ok(Outcome::Broadcast)
}
