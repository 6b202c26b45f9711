//! Session lifecycle: `NotStarted -> Running -> {Halted, Expired}`.
//!
//! The controller acquires fullscreen and the camera on start, runs the
//! timer, the event watcher and the frame sampler together, and funnels
//! every event they produce through one channel into the aggregator. It is
//! the only writer of [`SessionState`]; the presentation layer reads a
//! [`SessionView`] through a watch channel.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

use crate::aggregator::{HaltReason, IntegrityAggregator, Verdict, ViolationCounters};
use crate::capability::{
    CameraApi, CameraHandle, ClassificationService, FullscreenApi, PageEvents, UserNotifier,
};
use crate::config::MonitorConfig;
use crate::error::{SessionError, SessionResult};
use crate::sampler::FrameSampler;
use crate::signal::{FrameClassification, MonitorEvent, Signal};
use crate::task::MonitorTask;
use crate::timer::SessionTimer;
use crate::watcher::EventWatcher;

pub const STATUS_WAITING: &str = "Waiting for camera...";
pub const STATUS_MONITORING: &str = "Camera access granted. Monitoring...";
pub const STATUS_CAMERA_DENIED: &str = "Unable to access camera.";
pub const STATUS_FULLSCREEN_REJECTED: &str = "Fullscreen is required to take this exam.";

pub const HALT_TITLE: &str = "Exam Halted";
pub const HALT_MESSAGE: &str = "Suspicious activity detected. Your exam has been paused.";

const EVENT_BUFFER: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    NotStarted,
    Running,
    /// Ended by violations; answers are discarded
    Halted,
    /// Ended by the clock; answers go to submission
    Expired,
}

impl SessionState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Halted | Self::Expired)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not started",
            Self::Running => "running",
            Self::Halted => "halted",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a running session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Halted(HaltReason),
    /// Time ran out; the caller owns answer submission
    Expired,
}

impl SessionOutcome {
    #[must_use]
    pub const fn state(self) -> SessionState {
        match self {
            Self::Halted(_) => SessionState::Halted,
            Self::Expired => SessionState::Expired,
        }
    }
}

/// What the presentation layer shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub state: SessionState,
    pub remaining_seconds: u32,
    pub status_message: String,
    pub last_classification: Option<FrameClassification>,
    pub counters: ViolationCounters,
    pub escape_attempts: u32,
    pub halt_reason: Option<HaltReason>,
    pub started_at: Option<DateTime<Utc>>,
}

impl SessionView {
    fn new(duration_seconds: u32) -> Self {
        Self {
            state: SessionState::NotStarted,
            remaining_seconds: duration_seconds,
            status_message: STATUS_WAITING.to_string(),
            last_classification: None,
            counters: ViolationCounters::default(),
            escape_attempts: 0,
            halt_reason: None,
            started_at: None,
        }
    }

    /// Remaining time as `M:SS`
    #[must_use]
    pub fn clock(&self) -> String {
        format!(
            "{}:{:02}",
            self.remaining_seconds / 60,
            self.remaining_seconds % 60
        )
    }

    /// Title and body of the blocking notice shown once halted
    #[must_use]
    pub fn halt_notice(&self) -> Option<(&'static str, &'static str)> {
        (self.state == SessionState::Halted).then_some((HALT_TITLE, HALT_MESSAGE))
    }
}

/// Injected browser-level resources
#[derive(Clone)]
pub struct Capabilities {
    pub fullscreen: Arc<dyn FullscreenApi>,
    pub camera: Arc<dyn CameraApi>,
    pub page: Arc<dyn PageEvents>,
    pub classifier: Arc<dyn ClassificationService>,
    pub notifier: Arc<dyn UserNotifier>,
}

struct RunningSession {
    aggregator: IntegrityAggregator,
    events: mpsc::Receiver<MonitorEvent>,
    monitors: Vec<MonitorTask>,
}

impl RunningSession {
    async fn stop(self) {
        for monitor in self.monitors {
            monitor.shutdown().await;
        }
    }
}

/// Orchestrates one exam session. A new assessment needs a new controller.
pub struct SessionController {
    config: MonitorConfig,
    capabilities: Capabilities,
    view: watch::Sender<SessionView>,
    session: Option<RunningSession>,
}

impl SessionController {
    /// # Errors
    ///
    /// Returns [`SessionError::Config`] if the configuration is invalid.
    pub fn new(config: MonitorConfig, capabilities: Capabilities) -> SessionResult<Self> {
        config.validate()?;
        let (view, _) = watch::channel(SessionView::new(config.duration_seconds));
        Ok(Self {
            config,
            capabilities,
            view,
            session: None,
        })
    }

    /// Follow view updates
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.subscribe()
    }

    #[must_use]
    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.view.borrow().state
    }

    /// Acquire fullscreen and the camera, then start all monitors.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::FullscreenRejected`] or
    /// [`SessionError::CameraUnavailable`] when a resource cannot be
    /// acquired; the session stays `NotStarted`. Returns
    /// [`SessionError::AlreadyStarted`] for any state but `NotStarted`.
    pub async fn start(&mut self) -> SessionResult<()> {
        let state = self.state();
        if state != SessionState::NotStarted {
            return Err(SessionError::AlreadyStarted(state));
        }

        if let Err(e) = self.capabilities.fullscreen.request_fullscreen().await {
            log::error!("Fullscreen request rejected: {e:#}");
            self.set_status(STATUS_FULLSCREEN_REJECTED);
            return Err(SessionError::FullscreenRejected(format!("{e:#}")));
        }

        let camera = match self.capabilities.camera.open_stream().await {
            Ok(stream) => CameraHandle::new(stream),
            Err(e) => {
                log::error!("Error accessing camera: {e:#}");
                self.set_status(STATUS_CAMERA_DENIED);
                return Err(SessionError::CameraUnavailable(format!("{e:#}")));
            }
        };

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let caps = &self.capabilities;
        let monitors = vec![
            SessionTimer::new(self.config.duration_seconds).spawn(tx.clone()),
            EventWatcher::new(caps.page.clone(), caps.notifier.clone()).spawn(tx.clone()),
            FrameSampler::new(camera, caps.classifier.clone(), self.config.sample_interval())
                .spawn(tx),
        ];

        self.session = Some(RunningSession {
            aggregator: IntegrityAggregator::new(self.config.thresholds),
            events: rx,
            monitors,
        });

        let duration = self.config.duration_seconds;
        self.view.send_modify(|v| {
            v.state = SessionState::Running;
            v.remaining_seconds = duration;
            v.status_message = STATUS_MONITORING.to_string();
            v.started_at = Some(Utc::now());
        });
        log::info!("Exam session started ({duration}s)");
        Ok(())
    }

    /// Process monitor events until the session halts or expires.
    ///
    /// All monitors are stopped and the camera released before this returns.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotRunning`] if the session was never
    /// started or already ended, and [`SessionError::MonitorsStopped`] if
    /// every monitor exited without an outcome.
    pub async fn run(&mut self) -> SessionResult<SessionOutcome> {
        let state = self.state();
        let Some(session) = self.session.as_mut() else {
            return Err(SessionError::NotRunning(state));
        };

        let outcome = loop {
            let Some(event) = session.events.recv().await else {
                break None;
            };
            if let Some(outcome) = Self::handle_event(&mut session.aggregator, &self.view, event) {
                break Some(outcome);
            }
        };

        if let Some(session) = self.session.take() {
            session.stop().await;
        }

        let outcome = outcome.ok_or(SessionError::MonitorsStopped)?;
        self.finish(outcome);
        Ok(outcome)
    }

    /// Start and run to completion
    ///
    /// # Errors
    ///
    /// See [`start`](Self::start) and [`run`](Self::run).
    pub async fn start_and_run(&mut self) -> SessionResult<SessionOutcome> {
        self.start().await?;
        self.run().await
    }

    fn handle_event(
        aggregator: &mut IntegrityAggregator,
        view: &watch::Sender<SessionView>,
        event: MonitorEvent,
    ) -> Option<SessionOutcome> {
        match event {
            MonitorEvent::Tick(left) => {
                view.send_modify(|v| v.remaining_seconds = left);
                None
            }
            MonitorEvent::Expired => Some(SessionOutcome::Expired),
            MonitorEvent::Signal(signal) => {
                let verdict = aggregator.apply(signal);
                let counters = aggregator.counters();
                let escape_attempts = aggregator.escape_attempts();
                view.send_modify(|v| {
                    if let Signal::Frame(label) = signal {
                        v.status_message = label.status_message().to_string();
                        v.last_classification = Some(label);
                    }
                    v.counters = counters;
                    v.escape_attempts = escape_attempts;
                });
                match verdict {
                    Verdict::Halt(reason) => Some(SessionOutcome::Halted(reason)),
                    Verdict::Continue | Verdict::Ignored => None,
                }
            }
        }
    }

    fn finish(&self, outcome: SessionOutcome) {
        self.view.send_modify(|v| {
            v.state = outcome.state();
            if let SessionOutcome::Halted(reason) = outcome {
                v.halt_reason = Some(reason);
            }
        });
        match outcome {
            SessionOutcome::Halted(reason) => {
                log::info!("Exam session halted: {reason}");
            }
            SessionOutcome::Expired => {
                log::info!("Exam session expired; answers are ready for submission");
            }
        }
    }

    fn set_status(&self, message: &str) {
        self.view
            .send_modify(|v| v.status_message = message.to_string());
    }
}
