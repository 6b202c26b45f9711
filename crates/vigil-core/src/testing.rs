//! In-memory fakes for every capability trait

use anyhow::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::capability::{
    CameraApi, CameraStream, ClassificationService, EventSubscription, FullscreenApi, PageEvent,
    PageEvents, UserNotifier,
};
use crate::frame::Frame;
use crate::signal::FrameClassification;

pub struct FakeFullscreen {
    reject: bool,
    requests: AtomicUsize,
}

impl FakeFullscreen {
    pub fn granting() -> Self {
        Self {
            reject: false,
            requests: AtomicUsize::new(0),
        }
    }

    pub fn rejecting() -> Self {
        Self {
            reject: true,
            requests: AtomicUsize::new(0),
        }
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FullscreenApi for FakeFullscreen {
    async fn request_fullscreen(&self) -> Result<()> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.reject {
            anyhow::bail!("fullscreen not allowed");
        }
        Ok(())
    }
}

/// Shared counters observing a fake camera's streams
#[derive(Clone, Default)]
pub struct CameraProbe {
    opened: Arc<AtomicUsize>,
    captured: Arc<AtomicUsize>,
    stopped: Arc<AtomicUsize>,
}

impl CameraProbe {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn captured(&self) -> usize {
        self.captured.load(Ordering::SeqCst)
    }

    pub fn stopped(&self) -> usize {
        self.stopped.load(Ordering::SeqCst)
    }
}

pub struct FakeCamera {
    deny: bool,
    probe: CameraProbe,
}

impl FakeCamera {
    pub fn granting() -> Self {
        Self {
            deny: false,
            probe: CameraProbe::default(),
        }
    }

    pub fn denying() -> Self {
        Self {
            deny: true,
            probe: CameraProbe::default(),
        }
    }

    pub fn probe(&self) -> CameraProbe {
        self.probe.clone()
    }
}

#[async_trait]
impl CameraApi for FakeCamera {
    async fn open_stream(&self) -> Result<Box<dyn CameraStream>> {
        if self.deny {
            anyhow::bail!("Permission denied");
        }
        self.probe.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeStream {
            probe: self.probe.clone(),
        }))
    }
}

pub struct FakeStream {
    probe: CameraProbe,
}

#[async_trait]
impl CameraStream for FakeStream {
    async fn capture_frame(&mut self) -> Result<Frame> {
        self.probe.captured.fetch_add(1, Ordering::SeqCst);
        Ok(Frame::png(vec![0x89, b'P', b'N', b'G']))
    }

    fn stop(&mut self) {
        self.probe.stopped.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct PageState {
    sender: Mutex<Option<mpsc::UnboundedSender<PageEvent>>>,
    unsubscriptions: AtomicUsize,
    suppressed: AtomicUsize,
}

/// Page whose events are emitted by the test
#[derive(Clone, Default)]
pub struct FakePage {
    state: Arc<PageState>,
}

impl FakePage {
    /// Deliver an event to the current subscriber; false if none is listening
    pub fn emit(&self, event: PageEvent) -> bool {
        match self.state.sender.lock().unwrap().as_ref() {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }

    pub fn press(&self, key: &str) -> bool {
        self.emit(PageEvent::KeyDown {
            key: key.to_string(),
        })
    }

    pub fn is_subscribed(&self) -> bool {
        self.state.sender.lock().unwrap().is_some()
    }

    pub fn unsubscriptions(&self) -> usize {
        self.state.unsubscriptions.load(Ordering::SeqCst)
    }

    pub fn suppressed(&self) -> usize {
        self.state.suppressed.load(Ordering::SeqCst)
    }
}

impl PageEvents for FakePage {
    fn subscribe(&self) -> EventSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.state.sender.lock().unwrap() = Some(tx);
        let state = self.state.clone();
        EventSubscription::new(rx, move || {
            state.sender.lock().unwrap().take();
            state.unsubscriptions.fetch_add(1, Ordering::SeqCst);
        })
    }

    fn suppress_context_menu(&self) {
        self.state.suppressed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Classifier replaying a script, then a fixed answer
pub struct ScriptedClassifier {
    script: Mutex<VecDeque<Result<FrameClassification, String>>>,
    fallback: FrameClassification,
    latency: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedClassifier {
    pub fn answering(fallback: FrameClassification) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback,
            latency: Duration::ZERO,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_script(
        self,
        script: impl IntoIterator<Item = Result<FrameClassification, String>>,
    ) -> Self {
        *self.script.lock().unwrap() = script.into_iter().collect();
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClassificationService for ScriptedClassifier {
    async fn classify(&self, frame: &Frame) -> Result<FrameClassification> {
        assert!(!frame.is_empty());
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let next = self.script.lock().unwrap().pop_front();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match next {
            Some(Ok(label)) => Ok(label),
            Some(Err(message)) => Err(anyhow::anyhow!(message)),
            None => Ok(self.fallback),
        }
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    warnings: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().unwrap().clone()
    }
}

impl UserNotifier for RecordingNotifier {
    fn warn(&self, message: &str) {
        self.warnings.lock().unwrap().push(message.to_string());
    }
}
