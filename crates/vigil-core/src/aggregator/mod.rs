//! Violation counters and the halt decision.
//!
//! [`IntegrityState::transition`] is a pure function from one state and a
//! [`Signal`] to the next state. [`IntegrityAggregator`] wraps it with the
//! session's [`Thresholds`] and is the only place counters are written.
//!
//! Two rules can halt a session:
//!
//! - escape bypass: escape-class signals (fullscreen exits and Escape, F5,
//!   Tab, Alt) share one counter; when the next one would reach
//!   `escape_bypass` the session halts before any bucket is consulted
//! - per-bucket: fullscreen exits, F11 presses, right clicks and
//!   consecutive suspicious frames each halt on reaching `normal`
//!
//! Escape keys only feed the bypass counter. A `PhoneDetected` frame is
//! recorded by the caller but changes no counter.

use serde::Serialize;
use std::fmt;

use crate::config::Thresholds;
use crate::signal::{FrameClassification, Signal};

/// Per-bucket violation counters.
///
/// All are monotonic for the life of a session except
/// `consecutive_suspicious_frames`, which resets on a `Normal` frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ViolationCounters {
    pub fullscreen_exits: u32,
    pub special_key_presses: u32,
    pub right_clicks: u32,
    pub consecutive_suspicious_frames: u32,
}

impl ViolationCounters {
    #[must_use]
    pub const fn get(&self, bucket: Bucket) -> u32 {
        match bucket {
            Bucket::FullscreenExits => self.fullscreen_exits,
            Bucket::SpecialKeyPresses => self.special_key_presses,
            Bucket::RightClicks => self.right_clicks,
            Bucket::SuspiciousFrames => self.consecutive_suspicious_frames,
        }
    }

    fn bump(&mut self, bucket: Bucket) {
        let slot = match bucket {
            Bucket::FullscreenExits => &mut self.fullscreen_exits,
            Bucket::SpecialKeyPresses => &mut self.special_key_presses,
            Bucket::RightClicks => &mut self.right_clicks,
            Bucket::SuspiciousFrames => &mut self.consecutive_suspicious_frames,
        };
        *slot = slot.saturating_add(1);
    }
}

/// Counter subject to the normal threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    FullscreenExits,
    SpecialKeyPresses,
    RightClicks,
    SuspiciousFrames,
}

impl Bucket {
    /// Bucket a signal increments, if any
    #[must_use]
    pub const fn for_signal(signal: Signal) -> Option<Self> {
        match signal {
            Signal::FullscreenExit => Some(Self::FullscreenExits),
            Signal::SpecialKeyPress => Some(Self::SpecialKeyPresses),
            Signal::RightClick => Some(Self::RightClicks),
            Signal::Frame(FrameClassification::Suspicious) => Some(Self::SuspiciousFrames),
            Signal::EscapeAttempt | Signal::Frame(_) => None,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FullscreenExits => "fullscreen exits",
            Self::SpecialKeyPresses => "F11 presses",
            Self::RightClicks => "right clicks",
            Self::SuspiciousFrames => "consecutive suspicious frames",
        }
    }
}

/// Why a session was halted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum HaltReason {
    EscapeBypass { attempts: u32 },
    Threshold { bucket: Bucket, count: u32 },
}

impl fmt::Display for HaltReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EscapeBypass { attempts } => write!(f, "{attempts} escape attempts"),
            Self::Threshold { bucket, count } => write!(f, "{count} {}", bucket.label()),
        }
    }
}

/// Counters plus the one-way halt flag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IntegrityState {
    pub counters: ViolationCounters,
    pub escape_attempts: u32,
    pub halted: Option<HaltReason>,
}

impl IntegrityState {
    #[must_use]
    pub const fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    /// Apply one signal. A halted state is returned unchanged.
    #[must_use]
    pub fn transition(self, signal: Signal, thresholds: &Thresholds) -> Self {
        if self.is_halted() {
            return self;
        }
        let mut next = self;

        if signal.is_escape_class() {
            next.escape_attempts = next.escape_attempts.saturating_add(1);
            if next.escape_attempts >= thresholds.escape_bypass {
                if signal == Signal::FullscreenExit {
                    next.counters.bump(Bucket::FullscreenExits);
                }
                next.halted = Some(HaltReason::EscapeBypass {
                    attempts: next.escape_attempts,
                });
                return next;
            }
        }

        if signal == Signal::Frame(FrameClassification::Normal) {
            next.counters.consecutive_suspicious_frames = 0;
        }

        if let Some(bucket) = Bucket::for_signal(signal) {
            next.counters.bump(bucket);
            let count = next.counters.get(bucket);
            if count >= thresholds.normal {
                next.halted = Some(HaltReason::Threshold { bucket, count });
            }
        }

        next
    }
}

/// Result of [`IntegrityAggregator::apply`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Counted; session continues
    Continue,
    /// This signal halted the session
    Halt(HaltReason),
    /// Session was already halted; nothing changed
    Ignored,
}

/// Sole owner of the violation counters and the halt decision
#[derive(Debug, Clone)]
pub struct IntegrityAggregator {
    state: IntegrityState,
    thresholds: Thresholds,
}

impl IntegrityAggregator {
    #[must_use]
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            state: IntegrityState::default(),
            thresholds,
        }
    }

    /// Count a signal and decide whether the session halts
    pub fn apply(&mut self, signal: Signal) -> Verdict {
        if self.state.is_halted() {
            log::debug!("Ignoring {signal:?}: session already halted");
            return Verdict::Ignored;
        }

        self.state = self.state.transition(signal, &self.thresholds);

        match self.state.halted {
            Some(reason) => {
                log::warn!("Halt threshold reached: {reason}");
                Verdict::Halt(reason)
            }
            None => {
                log::debug!(
                    "Applied {signal:?}: {:?}, escape attempts {}",
                    self.state.counters,
                    self.state.escape_attempts
                );
                Verdict::Continue
            }
        }
    }

    #[must_use]
    pub const fn state(&self) -> &IntegrityState {
        &self.state
    }

    #[must_use]
    pub const fn counters(&self) -> ViolationCounters {
        self.state.counters
    }

    #[must_use]
    pub const fn escape_attempts(&self) -> u32 {
        self.state.escape_attempts
    }

    #[must_use]
    pub const fn is_halted(&self) -> bool {
        self.state.is_halted()
    }

    #[must_use]
    pub const fn halt_reason(&self) -> Option<HaltReason> {
        self.state.halted
    }
}
