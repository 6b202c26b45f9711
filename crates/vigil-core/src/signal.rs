use serde::{Deserialize, Serialize};
use std::fmt;

/// Label the classification service assigns to one camera frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameClassification {
    /// A face is visible
    Normal,
    /// A phone is visible; reported but never halts
    PhoneDetected,
    /// No face is visible
    Suspicious,
}

impl FrameClassification {
    /// Wire name used by the classification service
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::PhoneDetected => "phone_detected",
            Self::Suspicious => "suspicious",
        }
    }

    /// Status line shown to the student
    #[must_use]
    pub const fn status_message(self) -> &'static str {
        match self {
            Self::Normal => "Face Detected (Normal)",
            Self::PhoneDetected => "Cell Phone Detected (Suspicious)",
            Self::Suspicious => "No Face Detected (Suspicious)",
        }
    }
}

impl fmt::Display for FrameClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed violation increment (or reset) fed to the aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Page left fullscreen
    FullscreenExit,
    /// One of Escape, F5, Tab or Alt was pressed
    EscapeAttempt,
    /// F11 was pressed
    SpecialKeyPress,
    /// Context menu was opened
    RightClick,
    /// A sampled frame came back from the classifier
    Frame(FrameClassification),
}

impl Signal {
    /// Fullscreen exits and escape keys share the bypass counter
    #[must_use]
    pub const fn is_escape_class(self) -> bool {
        matches!(self, Self::FullscreenExit | Self::EscapeAttempt)
    }
}

/// Everything the monitors push to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorEvent {
    Signal(Signal),
    /// Seconds left after a timer tick
    Tick(u32),
    Expired,
}
