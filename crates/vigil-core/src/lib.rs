//! Exam integrity monitor.
//!
//! Watches a running exam session for malpractice signals and decides,
//! through one serialized decision point, when the session must halt:
//!
//! - [`EventWatcher`] turns page events (fullscreen changes, key presses,
//!   context menus) into typed [`Signal`]s
//! - [`FrameSampler`] classifies a camera frame on a fixed interval
//! - [`SessionTimer`] counts the session down to expiry
//! - [`IntegrityAggregator`] owns every violation counter and the halt rule
//! - [`SessionController`] acquires fullscreen and camera, runs the three
//!   monitors together and publishes a [`SessionView`]
//!
//! Browser-level resources sit behind the traits in [`capability`] so the
//! whole state machine runs against fakes in tests.

pub mod aggregator;
pub mod capability;
pub mod config;
pub mod controller;
pub mod error;
pub mod frame;
pub mod sampler;
pub mod signal;
pub mod task;
pub mod timer;
pub mod watcher;

#[cfg(test)]
mod testing;

pub use aggregator::{
    Bucket, HaltReason, IntegrityAggregator, IntegrityState, Verdict, ViolationCounters,
};
pub use capability::{
    CameraApi, CameraHandle, CameraStream, ClassificationService, EventSubscription, FullscreenApi,
    PageEvent, PageEvents, UserNotifier,
};
pub use config::{MonitorConfig, ServiceConfig, Thresholds};
pub use controller::{Capabilities, SessionController, SessionOutcome, SessionState, SessionView};
pub use error::{SessionError, SessionResult};
pub use frame::Frame;
pub use sampler::FrameSampler;
pub use signal::{FrameClassification, MonitorEvent, Signal};
pub use timer::{Countdown, SessionTimer, TimerTick};
pub use watcher::EventWatcher;
