use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::signal::MonitorEvent;
use crate::task::MonitorTask;

/// Outcome of one countdown step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTick {
    Remaining(u32),
    Expired,
}

/// Seconds left in a session, clamped at zero
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    remaining: u32,
}

impl Countdown {
    #[must_use]
    pub const fn new(duration_seconds: u32) -> Self {
        Self {
            remaining: duration_seconds,
        }
    }

    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Take one second off; reports expiry once zero is reached
    pub fn tick(&mut self) -> TimerTick {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            TimerTick::Expired
        } else {
            TimerTick::Remaining(self.remaining)
        }
    }
}

/// Wall-clock countdown for a running session
pub struct SessionTimer {
    countdown: Countdown,
}

impl SessionTimer {
    #[must_use]
    pub const fn new(duration_seconds: u32) -> Self {
        Self {
            countdown: Countdown::new(duration_seconds),
        }
    }

    /// Start ticking once per second, sending `Tick` after each second and
    /// a single `Expired` at zero
    #[must_use]
    pub fn spawn(self, events: mpsc::Sender<MonitorEvent>) -> MonitorTask {
        MonitorTask::spawn("session timer", self.run(events))
    }

    async fn run(mut self, events: mpsc::Sender<MonitorEvent>) {
        let period = Duration::from_secs(1);
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

        loop {
            ticker.tick().await;
            match self.countdown.tick() {
                TimerTick::Remaining(left) => {
                    if events.send(MonitorEvent::Tick(left)).await.is_err() {
                        return;
                    }
                }
                TimerTick::Expired => {
                    log::info!("Session time is up");
                    if events.send(MonitorEvent::Tick(0)).await.is_ok() {
                        let _ = events.send(MonitorEvent::Expired).await;
                    }
                    return;
                }
            }
        }
    }
}
