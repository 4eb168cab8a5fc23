use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::constants::{DEMO_PUSH_ICON, DEMO_PUSH_TAG};
use crate::models::NotificationKind;
use crate::push::PushPayload;
use crate::social::SocialCore;

use super::latency::{self, SimulatedLatency};
use super::random::RandomSource;

/// Events the poller can pretend the server sent.
pub const SYNTHETIC_EVENTS: [(&str, &str, NotificationKind); 3] = [
    (
        "New friend request",
        "Someone wants to connect with you",
        NotificationKind::Friend,
    ),
    (
        "Post liked",
        "Someone liked your recent post",
        NotificationKind::Like,
    ),
    (
        "Event reminder",
        "You have an event starting soon",
        NotificationKind::Event,
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Scheduled,
    Firing,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Cancelled before or during the tick
    Stopped,
    /// A previous tick was still in flight
    Suppressed,
    /// Fetched but the roll did not fire
    Quiet,
    /// Id of the injected notification
    Injected(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub fired: u64,
    pub injected: u64,
    pub suppressed: u64,
}

/// Clears the in-flight flag however the tick ends, including when the
/// tick task is dropped mid-await.
struct InFlightGuard<'a>(&'a Cell<bool>);

impl<'a> InFlightGuard<'a> {
    fn set(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Recurring timer that simulates the server pushing new events.
///
/// Each timer fire spawns its tick as a separate local task, so a tick
/// whose fetch outlasts the interval overlaps the next fire and the
/// in-flight guard suppresses the newcomer.
pub struct PollingScheduler {
    core: Rc<RefCell<SocialCore>>,
    interval: Duration,
    probability: f64,
    latency: SimulatedLatency,
    rng: RefCell<Box<dyn RandomSource>>,
    state: Cell<SchedulerState>,
    in_flight: Cell<bool>,
    cancelled: Cell<bool>,
    stats: Cell<SchedulerStats>,
    timer: RefCell<Option<JoinHandle<()>>>,
}

impl PollingScheduler {
    pub fn new(
        core: Rc<RefCell<SocialCore>>,
        interval: Duration,
        probability: f64,
        latency: SimulatedLatency,
        rng: Box<dyn RandomSource>,
    ) -> Self {
        Self {
            core,
            interval: interval.max(Duration::from_millis(1)),
            probability: probability.clamp(0.0, 1.0),
            latency,
            rng: RefCell::new(rng),
            state: Cell::new(SchedulerState::Idle),
            in_flight: Cell::new(false),
            cancelled: Cell::new(false),
            stats: Cell::new(SchedulerStats::default()),
            timer: RefCell::new(None),
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state.get()
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats.get()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.get()
    }

    /// Start the timer. The first tick fires one interval from now.
    /// Must run inside a `LocalSet`. No-op if already started or stopped.
    pub fn start(self: &Rc<Self>) {
        if self.cancelled.get() || self.timer.borrow().is_some() {
            return;
        }
        self.state.set(SchedulerState::Scheduled);

        let weak = Rc::downgrade(self);
        let period = self.interval;
        let handle = tokio::task::spawn_local(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let Some(scheduler) = weak.upgrade() else {
                    break;
                };
                if scheduler.cancelled.get() {
                    break;
                }
                tokio::task::spawn_local(async move {
                    scheduler.tick().await;
                });
            }
        });
        *self.timer.borrow_mut() = Some(handle);
        tracing::info!("Polling every {:?} (p = {})", period, self.probability);
    }

    /// Cancel future ticks. A tick already awaiting its fetch sees the flag
    /// afterwards and records nothing.
    pub fn stop(&self) {
        if self.cancelled.replace(true) {
            return;
        }
        self.state.set(SchedulerState::Stopped);
        if let Some(handle) = self.timer.borrow_mut().take() {
            handle.abort();
        }
        let stats = self.stats.get();
        tracing::info!(
            fired = stats.fired,
            injected = stats.injected,
            suppressed = stats.suppressed,
            "Polling stopped"
        );
    }

    /// Run one polling round.
    pub async fn tick(&self) -> TickOutcome {
        if self.cancelled.get() {
            return TickOutcome::Stopped;
        }
        if self.in_flight.get() {
            self.update_stats(|s| s.suppressed += 1);
            tracing::debug!("Poll skipped, previous fetch still in flight");
            return TickOutcome::Suppressed;
        }

        let _guard = InFlightGuard::set(&self.in_flight);
        self.state.set(SchedulerState::Firing);
        self.update_stats(|s| s.fired += 1);

        let delay = {
            let mut rng = self.rng.borrow_mut();
            self.latency.sample(&mut **rng)
        };
        latency::simulate(delay).await;

        if self.cancelled.get() {
            return TickOutcome::Stopped;
        }

        let outcome = match self.roll() {
            Some(index) => {
                let (title, body, kind) = SYNTHETIC_EVENTS[index];
                let payload = PushPayload::new(title, body)
                    .with_kind(kind)
                    .with_icon(DEMO_PUSH_ICON)
                    .with_tag(DEMO_PUSH_TAG);
                let record = self.core.borrow_mut().push_notification(payload);
                self.update_stats(|s| s.injected += 1);
                TickOutcome::Injected(record.id)
            }
            None => TickOutcome::Quiet,
        };

        let idle_state = if self.timer.borrow().is_some() {
            SchedulerState::Scheduled
        } else {
            SchedulerState::Idle
        };
        self.state.set(idle_state);
        outcome
    }

    fn roll(&self) -> Option<usize> {
        let mut rng = self.rng.borrow_mut();
        if rng.next_f64() < self.probability {
            Some(rng.pick(SYNTHETIC_EVENTS.len()))
        } else {
            None
        }
    }

    fn update_stats(&self, f: impl FnOnce(&mut SchedulerStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }
}
