//! Capability interfaces for the browser-level resources the monitor uses.
//!
//! Each resource has an explicit acquire/release lifecycle. Release happens
//! in `Drop` so that teardown on any exit path, including task abort, gives
//! the hardware back.

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::frame::Frame;
use crate::signal::FrameClassification;

/// Fullscreen control for the exam page
#[async_trait]
pub trait FullscreenApi: Send + Sync {
    /// Ask for fullscreen; an error means the request was rejected
    async fn request_fullscreen(&self) -> Result<()>;
}

/// Camera access
#[async_trait]
pub trait CameraApi: Send + Sync {
    /// Acquire a live video stream; an error means permission was denied
    /// or no device is available
    async fn open_stream(&self) -> Result<Box<dyn CameraStream>>;
}

/// A live camera stream
#[async_trait]
pub trait CameraStream: Send {
    /// Draw the current frame and encode it
    async fn capture_frame(&mut self) -> Result<Frame>;

    /// Stop the underlying media track
    fn stop(&mut self);
}

/// Owns a camera stream and stops it exactly once
pub struct CameraHandle {
    stream: Box<dyn CameraStream>,
    stopped: bool,
}

impl CameraHandle {
    #[must_use]
    pub fn new(stream: Box<dyn CameraStream>) -> Self {
        Self {
            stream,
            stopped: false,
        }
    }

    /// Capture one frame from the live stream
    ///
    /// # Errors
    ///
    /// Returns an error if the stream was released or capture fails.
    pub async fn capture(&mut self) -> Result<Frame> {
        if self.stopped {
            anyhow::bail!("Camera stream already released");
        }
        self.stream.capture_frame().await
    }

    /// Stop the media track; later calls are no-ops
    pub fn release(&mut self) {
        if !self.stopped {
            self.stream.stop();
            self.stopped = true;
            log::info!("Camera stream released");
        }
    }

    #[must_use]
    pub const fn is_released(&self) -> bool {
        self.stopped
    }
}

impl Drop for CameraHandle {
    fn drop(&mut self) {
        self.release();
    }
}

/// Browser-level page signal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    FullscreenChange { fullscreen: bool },
    KeyDown { key: String },
    ContextMenu,
}

/// Source of page events
pub trait PageEvents: Send + Sync {
    /// Register listeners; they stay registered until the subscription drops
    fn subscribe(&self) -> EventSubscription;

    /// Keep the browser from showing its own context menu
    fn suppress_context_menu(&self);
}

/// Live listener registration. Dropping it removes the listeners.
pub struct EventSubscription {
    events: mpsc::UnboundedReceiver<PageEvent>,
    unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl EventSubscription {
    pub fn new(
        events: mpsc::UnboundedReceiver<PageEvent>,
        unsubscribe: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            events,
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// Next page event, or `None` once the page stops delivering
    pub async fn next(&mut self) -> Option<PageEvent> {
        self.events.recv().await
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
            log::debug!("Page listeners removed");
        }
    }
}

/// Synchronous user-facing warnings
pub trait UserNotifier: Send + Sync {
    fn warn(&self, message: &str);
}

/// External frame classification service
#[async_trait]
pub trait ClassificationService: Send + Sync {
    /// Classify one frame. Failures are transient to the monitor.
    async fn classify(&self, frame: &Frame) -> Result<FrameClassification>;
}
