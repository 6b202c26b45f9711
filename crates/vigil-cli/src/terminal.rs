//! Capability adapters for a terminal-hosted session.
//!
//! Fullscreen is implicit, the camera replays PNG frames from a directory,
//! and page events are typed on stdin one per line.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use vigil_core::{
    CameraApi, CameraStream, EventSubscription, Frame, FullscreenApi, PageEvent, PageEvents,
    UserNotifier,
};

pub struct TerminalFullscreen;

#[async_trait]
impl FullscreenApi for TerminalFullscreen {
    async fn request_fullscreen(&self) -> Result<()> {
        log::info!("Fullscreen requested (terminal session)");
        Ok(())
    }
}

/// Camera backed by a directory of PNG frames, replayed in name order
pub struct DirectoryCamera {
    dir: PathBuf,
}

impl DirectoryCamera {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }
}

#[async_trait]
impl CameraApi for DirectoryCamera {
    async fn open_stream(&self) -> Result<Box<dyn CameraStream>> {
        let frames = list_frames(&self.dir)?;
        if frames.is_empty() {
            anyhow::bail!("no camera frames in {}", self.dir.display());
        }
        log::info!("Camera opened: {} frames in {}", frames.len(), self.dir.display());
        Ok(Box::new(DirectoryStream { frames, next: 0 }))
    }
}

struct DirectoryStream {
    frames: Vec<PathBuf>,
    next: usize,
}

#[async_trait]
impl CameraStream for DirectoryStream {
    async fn capture_frame(&mut self) -> Result<Frame> {
        if self.frames.is_empty() {
            anyhow::bail!("camera stream stopped");
        }
        let path = &self.frames[self.next % self.frames.len()];
        self.next += 1;
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read frame {}", path.display()))?;
        Ok(Frame::png(bytes))
    }

    fn stop(&mut self) {
        self.frames.clear();
        log::debug!("Directory camera stopped");
    }
}

/// PNG files in `dir`, sorted by name
pub fn list_frames(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Cannot open camera directory {}", dir.display()))?;

    let mut frames: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
        })
        .collect();
    frames.sort();
    Ok(frames)
}

type LineSource = Box<dyn Fn() -> Box<dyn BufRead + Send> + Send + Sync>;

/// Page events typed one per line, stdin by default.
///
/// Lines are read on a plain thread. A blocked read never holds up runtime
/// shutdown; the thread ends on the first line after the subscription drops.
pub struct LinePage {
    source: LineSource,
}

impl LinePage {
    pub fn stdin() -> Self {
        Self::new(|| Box::new(std::io::BufReader::new(std::io::stdin())))
    }

    pub fn new(source: impl Fn() -> Box<dyn BufRead + Send> + Send + Sync + 'static) -> Self {
        Self {
            source: Box::new(source),
        }
    }
}

impl PageEvents for LinePage {
    fn subscribe(&self) -> EventSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let reader = (self.source)();
        let spawned = std::thread::Builder::new()
            .name("vigil-page-events".to_string())
            .spawn(move || forward_lines(reader, &tx));
        if let Err(e) = spawned {
            log::warn!("Failed to start page event reader: {e}");
        }
        EventSubscription::new(rx, || log::debug!("Page event reader detached"))
    }

    fn suppress_context_menu(&self) {
        log::debug!("Context menu suppressed");
    }
}

fn forward_lines(reader: Box<dyn BufRead + Send>, tx: &mpsc::UnboundedSender<PageEvent>) {
    for line in reader.lines() {
        let Ok(line) = line else { break };
        if let Some(event) = parse_page_event(&line) {
            if tx.send(event).is_err() {
                break;
            }
        }
    }
}

/// Parse one stdin line into a page event
pub fn parse_page_event(line: &str) -> Option<PageEvent> {
    match line.trim() {
        "" => None,
        "exit-fullscreen" => Some(PageEvent::FullscreenChange { fullscreen: false }),
        "enter-fullscreen" => Some(PageEvent::FullscreenChange { fullscreen: true }),
        "contextmenu" | "right-click" => Some(PageEvent::ContextMenu),
        key => Some(PageEvent::KeyDown {
            key: key.to_string(),
        }),
    }
}

pub struct StderrNotifier;

impl UserNotifier for StderrNotifier {
    fn warn(&self, message: &str) {
        eprintln!("WARNING: {message}");
    }
}
