use std::sync::Arc;
use tokio::sync::mpsc;

use crate::capability::{EventSubscription, PageEvent, PageEvents, UserNotifier};
use crate::signal::{MonitorEvent, Signal};
use crate::task::MonitorTask;

/// Shown whenever the page leaves fullscreen
pub const FULLSCREEN_WARNING: &str =
    "You have exited fullscreen mode. Please stay in fullscreen during the exam.";

/// Keys that count toward the escape bypass threshold
pub const ESCAPE_CLASS_KEYS: [&str; 4] = ["Escape", "F5", "Tab", "Alt"];

/// Key counted in its own bucket under the normal threshold
pub const SPECIAL_KEY: &str = "F11";

/// Map a page event to the violation it represents, if any
#[must_use]
pub fn signal_for(event: &PageEvent) -> Option<Signal> {
    match event {
        PageEvent::FullscreenChange { fullscreen: false } => Some(Signal::FullscreenExit),
        PageEvent::FullscreenChange { fullscreen: true } => None,
        PageEvent::KeyDown { key } if ESCAPE_CLASS_KEYS.contains(&key.as_str()) => {
            Some(Signal::EscapeAttempt)
        }
        PageEvent::KeyDown { key } if key == SPECIAL_KEY => Some(Signal::SpecialKeyPress),
        PageEvent::KeyDown { .. } => None,
        PageEvent::ContextMenu => Some(Signal::RightClick),
    }
}

/// Converts page events into violation signals while a session runs
pub struct EventWatcher {
    page: Arc<dyn PageEvents>,
    notifier: Arc<dyn UserNotifier>,
}

impl EventWatcher {
    #[must_use]
    pub fn new(page: Arc<dyn PageEvents>, notifier: Arc<dyn UserNotifier>) -> Self {
        Self { page, notifier }
    }

    /// Register page listeners now and forward signals from a spawned task.
    ///
    /// Listeners are removed when the returned task is shut down or dropped.
    #[must_use]
    pub fn spawn(self, events: mpsc::Sender<MonitorEvent>) -> MonitorTask {
        let subscription = self.page.subscribe();
        MonitorTask::spawn("event watcher", self.run(subscription, events))
    }

    async fn run(self, mut subscription: EventSubscription, events: mpsc::Sender<MonitorEvent>) {
        while let Some(event) = subscription.next().await {
            match event {
                PageEvent::ContextMenu => self.page.suppress_context_menu(),
                PageEvent::FullscreenChange { fullscreen: false } => {
                    self.notifier.warn(FULLSCREEN_WARNING);
                }
                _ => {}
            }

            let Some(signal) = signal_for(&event) else {
                log::debug!("Ignoring page event {event:?}");
                continue;
            };

            log::debug!("Page event {event:?} -> {signal:?}");
            if events.send(MonitorEvent::Signal(signal)).await.is_err() {
                break;
            }
        }
        log::debug!("Event watcher finished");
    }
}
