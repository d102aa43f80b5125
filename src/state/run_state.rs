/// Run phase definitions for the crawl state machine
///
/// `Seeding → Draining → {Done, Stopped, Exhausted}`
use crate::SweepError;
use std::fmt;

/// Represents the current phase of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunPhase {
    // ===== Active Phases =====
    /// The frontier is being populated from the plan or start URLs
    Seeding,

    /// Items are being dequeued and fetched
    Draining,

    // ===== Terminal Phases =====
    /// Frontier empty or budget reached, with at least one successful fetch
    Done,

    /// The stop signal was observed between items
    Stopped,

    /// Draining ended without a single successful fetch
    Exhausted,
}

impl RunPhase {
    /// Returns true if `next` is a legal successor of this phase
    pub fn can_transition_to(&self, next: RunPhase) -> bool {
        matches!(
            (self, next),
            (Self::Seeding, Self::Draining)
                | (Self::Draining, Self::Done)
                | (Self::Draining, Self::Stopped)
                | (Self::Draining, Self::Exhausted)
        )
    }

    /// Lowercase name used in log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seeding => "seeding",
            Self::Draining => "draining",
            Self::Done => "done",
            Self::Stopped => "stopped",
            Self::Exhausted => "exhausted",
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The phase of one run, advanced only along legal transitions
#[derive(Debug, Clone)]
pub struct RunState {
    phase: RunPhase,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            phase: RunPhase::Seeding,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Moves to `next`, rejecting illegal transitions
    pub fn transition(&mut self, next: RunPhase) -> Result<(), SweepError> {
        if !self.phase.can_transition_to(next) {
            return Err(SweepError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        tracing::debug!("Run phase {} -> {}", self.phase, next);
        self.phase = next;
        Ok(())
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}
