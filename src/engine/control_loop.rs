use anyhow::Result;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;

use crate::agent::{AgentController, TickReport};
use crate::config::SimConfig;
use crate::error::KarisError;
use crate::messaging::{Publisher, Topics};
use crate::types::{AgentSnapshot, InboundCommand};

/// The single lock guarding the whole agent state. Held for the duration of
/// every tick and every command.
pub type SharedController = Arc<Mutex<AgentController>>;

pub struct ControlLoop {
    controller: SharedController,
    publisher: Arc<dyn Publisher>,
    topics: Topics,
    period: Duration,
    status_log_interval: u64,
}

impl ControlLoop {
    pub fn new(
        controller: AgentController,
        publisher: Arc<dyn Publisher>,
        config: &SimConfig,
    ) -> Result<Self, KarisError> {
        config.validate()?;
        let topics = Topics::for_agent(controller.name());
        Ok(Self {
            controller: Arc::new(Mutex::new(controller)),
            publisher,
            topics,
            period: config.tick_period(),
            status_log_interval: config.status_log_interval_ticks,
        })
    }

    pub fn controller(&self) -> SharedController {
        self.controller.clone()
    }

    pub fn topics(&self) -> &Topics {
        &self.topics
    }

    /// Ticks at the configured frequency until `shutdown` resolves or
    /// `max_ticks` ticks have run. Returns the number of ticks run.
    pub async fn run(
        &self,
        max_ticks: Option<u64>,
        shutdown: impl Future<Output = ()>,
    ) -> Result<u64> {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        let mut ticks = 0;
        loop {
            if max_ticks.is_some_and(|max| ticks >= max) {
                log::info!("tick limit of {} reached", ticks);
                break;
            }

            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    log::info!("shutdown requested after {} ticks", ticks);
                    break;
                }
                _ = interval.tick() => {
                    self.run_single_tick().await?;
                    ticks += 1;
                }
            }
        }

        Ok(ticks)
    }

    /// Runs one tick under the lock, then publishes what it produced.
    pub async fn run_single_tick(&self) -> Result<TickReport> {
        let (report, snapshot, depleted_now) = {
            let mut controller = self.controller.lock().await;
            let was_depleted = controller.is_battery_depleted();
            let report = controller.tick();
            let depleted_now = !was_depleted && controller.is_battery_depleted();
            (report, controller.snapshot(), depleted_now)
        };

        for message in &report.messages {
            self.publisher.publish(self.topics.route(message), message)?;
        }

        if depleted_now {
            log::warn!("{}: battery depleted at tick {}", snapshot.name, report.tick);
        }
        if self.should_log_status(report.tick) {
            log::info!("{}", snapshot.status_line());
        }

        Ok(report)
    }

    pub async fn apply_command(&self, command: InboundCommand) -> Result<(), KarisError> {
        let mut controller = self.controller.lock().await;
        controller.handle(command)
    }

    pub async fn snapshot(&self) -> AgentSnapshot {
        self.controller.lock().await.snapshot()
    }

    fn should_log_status(&self, tick: u64) -> bool {
        self.status_log_interval > 0 && tick % self.status_log_interval == 0
    }
}
