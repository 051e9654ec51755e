//! Orchestrator lifecycle
//!
//! `Idle` → `Running { depth: 0 }` → … → `Running { depth: max_depth - 1 }` → `Done`.
//! A run whose queue empties early jumps straight to `Done`.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlPhase {
    /// Constructed, seeds may still be added
    Idle,

    /// Draining the queue for one BFS level
    Running { depth: u32 },

    /// Queue exhausted or depth bound reached
    Done,
}

impl CrawlPhase {
    /// Returns true once the run can make no further progress
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// The level currently being processed, if any
    pub fn depth(&self) -> Option<u32> {
        match self {
            Self::Running { depth } => Some(*depth),
            _ => None,
        }
    }

    /// Whether moving from `self` to `next` is a legal step
    pub fn can_transition_to(&self, next: &CrawlPhase) -> bool {
        match (self, next) {
            (Self::Idle, Self::Running { depth: 0 }) => true,
            (Self::Idle, Self::Done) => true,
            (Self::Running { depth }, Self::Running { depth: next }) => *next == depth + 1,
            (Self::Running { .. }, Self::Done) => true,
            _ => false,
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running { depth } => write!(f, "running (depth {})", depth),
            Self::Done => write!(f, "done"),
        }
    }
}
