use anyhow::Result;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tabled::{Table, Tabled};
use tokio::sync::watch;
use vigil_client::{HttpClassifier, QuizClient};
use vigil_core::{
    Capabilities, MonitorConfig, SessionController, SessionOutcome, SessionState, SessionView,
};

use crate::commands::quiz::print_quiz_header;
use crate::terminal::{DirectoryCamera, LinePage, StderrNotifier, TerminalFullscreen};

const EXIT_EXPIRED: u8 = 0;
const EXIT_NOT_STARTED: u8 = 1;
/// Exit code for a halted session
const EXIT_HALTED: u8 = 2;

#[derive(Tabled)]
struct CounterRow {
    #[tabled(rename = "Signal")]
    name: &'static str,
    #[tabled(rename = "Count")]
    count: u32,
}

pub async fn run_command(
    config: MonitorConfig,
    frames: &Path,
    quiz_id: Option<u64>,
) -> Result<ExitCode> {
    let quiz_id = quiz_id.unwrap_or(config.quiz_id);
    match QuizClient::from_config(&config.service)?
        .fetch_quiz(quiz_id)
        .await
    {
        Ok(quiz) => print_quiz_header(&quiz),
        Err(e) => log::warn!("Error fetching quiz data: {e:#}"),
    }

    let capabilities = Capabilities {
        fullscreen: Arc::new(TerminalFullscreen),
        camera: Arc::new(DirectoryCamera::new(frames)),
        page: Arc::new(LinePage::stdin()),
        classifier: Arc::new(HttpClassifier::from_config(&config.service)?),
        notifier: Arc::new(StderrNotifier),
    };

    println!(
        "Type a key name (Escape, F5, Tab, Alt, F11), 'contextmenu' or 'exit-fullscreen' and press Enter."
    );
    run_session(config, capabilities).await.map(ExitCode::from)
}

/// Drive one session to its end and map the outcome to a process exit code
async fn run_session(config: MonitorConfig, capabilities: Capabilities) -> Result<u8> {
    let mut controller = SessionController::new(config, capabilities)?;
    let renderer = tokio::spawn(render_view(controller.subscribe()));

    let result = controller.start_and_run().await;
    renderer.abort();

    match result {
        Ok(outcome) => {
            print_summary(&controller.view());
            Ok(match outcome {
                SessionOutcome::Halted(_) => EXIT_HALTED,
                SessionOutcome::Expired => EXIT_EXPIRED,
            })
        }
        Err(e) if e.is_precondition_failure() => {
            eprintln!("Cannot start the exam: {e}");
            eprintln!("{}", controller.view().status_message);
            Ok(EXIT_NOT_STARTED)
        }
        Err(e) => Err(e.into()),
    }
}

async fn render_view(mut view_rx: watch::Receiver<SessionView>) {
    let mut last: Option<(SessionState, String)> = None;

    while view_rx.changed().await.is_ok() {
        let view = view_rx.borrow_and_update().clone();
        let key = (view.state, view.status_message.clone());
        let minute_mark = view.remaining_seconds % 60 == 0;

        if last.as_ref() != Some(&key) || minute_mark {
            println!(
                "[{}] {} | {}",
                view.clock(),
                view.state,
                view.status_message
            );
            last = Some(key);
        }
    }
}

fn counter_rows(view: &SessionView) -> Vec<CounterRow> {
    vec![
        CounterRow {
            name: "Fullscreen exits",
            count: view.counters.fullscreen_exits,
        },
        CounterRow {
            name: "F11 presses",
            count: view.counters.special_key_presses,
        },
        CounterRow {
            name: "Right clicks",
            count: view.counters.right_clicks,
        },
        CounterRow {
            name: "Consecutive suspicious frames",
            count: view.counters.consecutive_suspicious_frames,
        },
        CounterRow {
            name: "Escape attempts",
            count: view.escape_attempts,
        },
    ]
}

fn print_summary(view: &SessionView) {
    println!();
    if let Some((title, message)) = view.halt_notice() {
        println!("{title}");
        println!("{message}");
        if let Some(reason) = view.halt_reason {
            println!("Reason: {reason}");
        }
    } else if view.state == SessionState::Expired {
        println!("Time is up. Your answers are ready for submission.");
    }
    println!("{}", Table::new(counter_rows(view)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::tests::OpenInput;
    use async_trait::async_trait;
    use std::io::BufReader;
    use std::sync::Mutex;
    use std::time::Duration;
    use vigil_core::{ClassificationService, Frame, FrameClassification, ViolationCounters};

    struct AlwaysNormal;

    #[async_trait]
    impl ClassificationService for AlwaysNormal {
        async fn classify(&self, _frame: &Frame) -> anyhow::Result<FrameClassification> {
            Ok(FrameClassification::Normal)
        }
    }

    fn short_config(duration_seconds: u32) -> MonitorConfig {
        MonitorConfig {
            duration_seconds,
            sample_interval_secs: 60,
            ..MonitorConfig::default()
        }
    }

    /// Terminal capabilities whose page input stays open for the whole test
    fn terminal_capabilities(
        frames: &Path,
        typed: &[&str],
    ) -> (Capabilities, std::sync::mpsc::Sender<Vec<u8>>) {
        let (input, keyboard) = OpenInput::new();
        for line in typed {
            keyboard.send(format!("{line}\n").into_bytes()).unwrap();
        }
        let input = Mutex::new(Some(input));
        let page = LinePage::new(move || {
            Box::new(BufReader::new(input.lock().unwrap().take().unwrap()))
        });
        let capabilities = Capabilities {
            fullscreen: Arc::new(TerminalFullscreen),
            camera: Arc::new(DirectoryCamera::new(frames)),
            page: Arc::new(page),
            classifier: Arc::new(AlwaysNormal),
            notifier: Arc::new(StderrNotifier),
        };
        (capabilities, keyboard)
    }

    fn frames_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("0001.png"), b"frame").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_expired_session_returns_with_input_still_open() {
        let frames = frames_dir();
        let (capabilities, _keyboard) = terminal_capabilities(frames.path(), &[]);

        let code = tokio::time::timeout(
            Duration::from_secs(10),
            run_session(short_config(1), capabilities),
        )
        .await
        .expect("session should end on expiry")
        .unwrap();
        assert_eq!(code, EXIT_EXPIRED);
    }

    #[tokio::test]
    async fn test_halted_session_exits_with_halt_code() {
        let frames = frames_dir();
        let (capabilities, _keyboard) = terminal_capabilities(
            frames.path(),
            &["contextmenu", "contextmenu", "contextmenu"],
        );

        let code = tokio::time::timeout(
            Duration::from_secs(10),
            run_session(short_config(60), capabilities),
        )
        .await
        .expect("session should end on halt")
        .unwrap();
        assert_eq!(code, EXIT_HALTED);
    }

    #[tokio::test]
    async fn test_denied_camera_exits_without_starting() {
        let empty = tempfile::tempdir().unwrap();
        let (capabilities, _keyboard) = terminal_capabilities(empty.path(), &[]);

        let code = run_session(short_config(60), capabilities).await.unwrap();
        assert_eq!(code, EXIT_NOT_STARTED);
    }

    #[test]
    fn test_counter_rows_cover_every_counter() {
        let view = SessionView {
            state: SessionState::Halted,
            remaining_seconds: 100,
            status_message: String::new(),
            last_classification: None,
            counters: ViolationCounters {
                fullscreen_exits: 1,
                special_key_presses: 2,
                right_clicks: 3,
                consecutive_suspicious_frames: 4,
            },
            escape_attempts: 5,
            halt_reason: None,
            started_at: None,
        };
        let counts: Vec<u32> = counter_rows(&view).iter().map(|r| r.count).collect();
        assert_eq!(counts, [1, 2, 3, 4, 5]);

        let table = Table::new(counter_rows(&view)).to_string();
        assert!(table.contains("Right clicks"));
        assert!(table.contains("Escape attempts"));
    }
}
