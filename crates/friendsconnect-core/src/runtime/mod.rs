pub mod latency;
pub mod polling;
pub mod random;
pub mod responder;

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::config::CoreConfig;
use crate::constants::TOAST_SWEEP_INTERVAL_MS;
use crate::error::CoreError;
use crate::models::ConversationId;
use crate::push::{LoggingPushSink, PushSink};
use crate::social::SocialCore;
use crate::store::PersistentStore;

pub use latency::SimulatedLatency;
pub use polling::{PollingScheduler, SchedulerState, SchedulerStats, TickOutcome};
pub use random::{ConstantRandom, RandomSource, StdRandom};
pub use responder::AutoResponder;

/// Composition root: owns the one `SocialCore` and the background tasks
/// that feed it. Everything runs on the current thread inside a `LocalSet`.
pub struct CoreRuntime {
    config: CoreConfig,
    core: Rc<RefCell<SocialCore>>,
    scheduler: Rc<PollingScheduler>,
    responder: Rc<AutoResponder>,
    toast_sweeper: Option<JoinHandle<()>>,
}

impl CoreRuntime {
    /// Open the file store under `config.data_dir` and rehydrate from it.
    pub fn new(config: CoreConfig) -> Result<Self, CoreError> {
        let store = PersistentStore::open_dir(&config.data_dir)?;
        Ok(Self::with_parts(config, store, Rc::new(LoggingPushSink::new())))
    }

    pub fn with_parts(config: CoreConfig, store: PersistentStore, push: Rc<dyn PushSink>) -> Self {
        let core = Rc::new(RefCell::new(SocialCore::new(&config, store, push)));

        // Independent streams so replies do not shift the polling rolls
        let scheduler = Rc::new(PollingScheduler::new(
            core.clone(),
            config.poll_interval(),
            config.fire_probability(),
            SimulatedLatency::fixed(config.fetch_latency()),
            Box::new(StdRandom::from_seed(config.seed)),
        ));
        let responder = Rc::new(AutoResponder::new(
            core.clone(),
            Box::new(StdRandom::from_seed(config.seed.map(|s| s.wrapping_add(1)))),
        ));

        Self {
            config,
            core,
            scheduler,
            responder,
            toast_sweeper: None,
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn core(&self) -> Rc<RefCell<SocialCore>> {
        self.core.clone()
    }

    pub fn scheduler(&self) -> &Rc<PollingScheduler> {
        &self.scheduler
    }

    pub fn responder(&self) -> &Rc<AutoResponder> {
        &self.responder
    }

    /// Start polling and the toast auto-hide sweep. Must run inside a
    /// `LocalSet`.
    pub fn start(&mut self) {
        self.scheduler.start();
        if self.toast_sweeper.is_none() {
            self.toast_sweeper = Some(spawn_toast_sweeper(Rc::downgrade(&self.core)));
        }
    }

    /// Send as the owner and schedule the other side's reply.
    pub fn send_message(
        &self,
        id: ConversationId,
        text: impl Into<String>,
    ) -> Result<JoinHandle<()>, CoreError> {
        self.core.borrow_mut().send_message(id, text)?;
        Ok(self.responder.spawn_reply(id))
    }

    pub fn shutdown(&mut self) {
        self.scheduler.stop();
        if let Some(handle) = self.toast_sweeper.take() {
            handle.abort();
        }
        tracing::info!("Core runtime shut down");
    }
}

fn spawn_toast_sweeper(core: std::rc::Weak<RefCell<SocialCore>>) -> JoinHandle<()> {
    tokio::task::spawn_local(async move {
        let mut sweep = tokio::time::interval(Duration::from_millis(TOAST_SWEEP_INTERVAL_MS));
        sweep.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            sweep.tick().await;
            let Some(core) = core.upgrade() else {
                break;
            };
            core.borrow_mut().expire_toast(Instant::now());
        }
    })
}
