//! Real-time loop: one tick per period, commands applied between ticks.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::grid::Direction;
use crate::settings::ArcadeSettings;
use crate::snake_core::SnakeCore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArcadeCommand {
    Start,
    Turn(Direction),
    Restart,
    Stop,
}

/// Receives credits as the score crosses reward thresholds.
#[async_trait]
pub trait RewardSink: Send {
    async fn grant(&mut self, credits: u32);
}

#[async_trait]
impl RewardSink for Vec<u32> {
    async fn grant(&mut self, credits: u32) {
        self.push(credits);
    }
}

#[async_trait]
impl RewardSink for mpsc::UnboundedSender<u32> {
    async fn grant(&mut self, credits: u32) {
        let _ = self.send(credits);
    }
}

#[derive(Debug, Clone)]
pub struct DriverReport {
    pub core: SnakeCore,
    pub ticks: u64,
    pub credits: u32,
}

#[derive(Debug)]
pub struct TickDriver {
    core: SnakeCore,
    period: Duration,
    stop_on_game_over: bool,
}

impl TickDriver {
    pub fn new(core: SnakeCore, period: Duration) -> Self {
        Self {
            core,
            period,
            stop_on_game_over: false,
        }
    }

    pub fn from_settings(settings: &ArcadeSettings, seed: u64) -> Self {
        let settings = settings.sanitized();
        Self::new(SnakeCore::new(&settings, seed), settings.tick_period)
    }

    pub fn stop_on_game_over(mut self, enabled: bool) -> Self {
        self.stop_on_game_over = enabled;
        self
    }

    /// Runs until `Stop`, until the command channel closes, or (when enabled)
    /// until the game ends. Commands already queued are applied before the
    /// next tick.
    pub async fn run<S>(
        mut self,
        mut commands: mpsc::UnboundedReceiver<ArcadeCommand>,
        sink: &mut S,
    ) -> DriverReport
    where
        S: RewardSink + ?Sized,
    {
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first interval tick completes immediately.
        ticker.tick().await;

        let mut ticks = 0u64;
        let mut credits = 0u32;
        loop {
            tokio::select! {
                biased;
                command = commands.recv() => match command {
                    Some(ArcadeCommand::Stop) | None => break,
                    Some(command) => self.apply(command),
                },
                _ = ticker.tick() => {
                    let outcome = self.core.tick();
                    ticks += 1;
                    if outcome.credits > 0 {
                        credits += outcome.credits;
                        sink.grant(outcome.credits).await;
                    }
                    if outcome.event.ended_game() {
                        info!(
                            score = self.core.score(),
                            high_score = self.core.high_score(),
                            event = ?outcome.event,
                            "game over"
                        );
                        if self.stop_on_game_over {
                            break;
                        }
                    }
                }
            }
        }

        DriverReport {
            core: self.core,
            ticks,
            credits,
        }
    }

    fn apply(&mut self, command: ArcadeCommand) {
        debug!(?command, "arcade command");
        match command {
            ArcadeCommand::Start => self.core.start(),
            ArcadeCommand::Turn(direction) => {
                self.core.turn(direction);
            }
            ArcadeCommand::Restart => self.core.restart(),
            ArcadeCommand::Stop => {}
        }
    }
}
