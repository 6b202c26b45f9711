use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::capability::{CameraHandle, ClassificationService};
use crate::signal::{FrameClassification, MonitorEvent, Signal};
use crate::task::MonitorTask;

/// Periodically classifies a camera frame.
///
/// Each round trip is awaited before the next tick is taken, so there is
/// never more than one classification request in flight. A slow service
/// delays the schedule instead of stacking requests.
pub struct FrameSampler {
    camera: CameraHandle,
    classifier: Arc<dyn ClassificationService>,
    interval: Duration,
}

impl FrameSampler {
    #[must_use]
    pub fn new(
        camera: CameraHandle,
        classifier: Arc<dyn ClassificationService>,
        interval: Duration,
    ) -> Self {
        Self {
            camera,
            classifier,
            interval,
        }
    }

    /// Start sampling. The camera is released when the task ends.
    #[must_use]
    pub fn spawn(self, events: mpsc::Sender<MonitorEvent>) -> MonitorTask {
        MonitorTask::spawn("frame sampler", self.run(events))
    }

    async fn run(mut self, events: mpsc::Sender<MonitorEvent>) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match self.sample_once().await {
                Ok(label) => {
                    log::debug!("Frame classified as {label}");
                    let event = MonitorEvent::Signal(Signal::Frame(label));
                    if events.send(event).await.is_err() {
                        break;
                    }
                }
                Err(e) => log::warn!("Frame classification failed: {e:#}"),
            }
        }
        self.camera.release();
    }

    async fn sample_once(&mut self) -> Result<FrameClassification> {
        let frame = self
            .camera
            .capture()
            .await
            .context("Failed to capture frame")?;
        self.classifier
            .classify(&frame)
            .await
            .context("Failed to classify frame")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::CameraApi;
    use crate::signal::FrameClassification::{Normal, PhoneDetected, Suspicious};
    use crate::testing::{FakeCamera, ScriptedClassifier};

    async fn sampler_with(
        classifier: Arc<ScriptedClassifier>,
    ) -> (FrameSampler, crate::testing::CameraProbe) {
        let camera = FakeCamera::granting();
        let probe = camera.probe();
        let stream = camera.open_stream().await.unwrap();
        let sampler = FrameSampler::new(
            CameraHandle::new(stream),
            classifier,
            Duration::from_secs(5),
        );
        (sampler, probe)
    }

    #[tokio::test(start_paused = true)]
    async fn test_samples_every_interval() {
        let classifier = Arc::new(
            ScriptedClassifier::answering(Normal)
                .with_script([Ok(Suspicious), Ok(PhoneDetected)]),
        );
        let (sampler, probe) = sampler_with(classifier.clone()).await;
        let (tx, mut rx) = mpsc::channel(16);
        let started = Instant::now();
        let task = sampler.spawn(tx);

        let expected = [Suspicious, PhoneDetected, Normal];
        for (i, label) in expected.into_iter().enumerate() {
            assert_eq!(rx.recv().await, Some(MonitorEvent::Signal(Signal::Frame(label))));
            assert_eq!(started.elapsed(), Duration::from_secs(5 * (i as u64 + 1)));
        }
        assert_eq!(probe.captured(), 3);

        task.shutdown().await;
        assert_eq!(probe.stopped(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_classification_is_skipped() {
        let classifier = Arc::new(
            ScriptedClassifier::answering(Normal)
                .with_script([Err("service unavailable".to_string()), Ok(Suspicious)]),
        );
        let (sampler, probe) = sampler_with(classifier.clone()).await;
        let (tx, mut rx) = mpsc::channel(16);
        let task = sampler.spawn(tx);

        assert_eq!(
            rx.recv().await,
            Some(MonitorEvent::Signal(Signal::Frame(Suspicious)))
        );
        assert_eq!(classifier.calls(), 2);
        assert_eq!(probe.captured(), 2);

        task.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_service_never_overlaps_requests() {
        let classifier = Arc::new(
            ScriptedClassifier::answering(Normal).with_latency(Duration::from_secs(12)),
        );
        let (sampler, probe) = sampler_with(classifier.clone()).await;
        let (tx, mut rx) = mpsc::channel(16);
        let task = sampler.spawn(tx);

        for _ in 0..4 {
            assert!(rx.recv().await.is_some());
        }
        assert_eq!(classifier.max_in_flight(), 1);
        assert_eq!(classifier.calls(), probe.captured());

        task.shutdown().await;
        assert_eq!(probe.stopped(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_channel_stops_sampler_and_releases_camera() {
        let classifier = Arc::new(ScriptedClassifier::answering(Normal));
        let (sampler, probe) = sampler_with(classifier).await;
        let (tx, rx) = mpsc::channel(16);
        drop(rx);
        let task = sampler.spawn(tx);

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(probe.captured(), 1);
        assert_eq!(probe.stopped(), 1);
        task.shutdown().await;
        assert_eq!(probe.stopped(), 1);
    }
}
