//! Batch state tracking.
//!
//! A batch moves through
//! `Idle → Validating → {Empty | Rejected | Open}`, then
//! `Open → Executing(i) → … → {Committed | RolledBack}`.
//! `Empty`, `Rejected`, `Committed` and `RolledBack` are terminal.

use std::fmt;

/// Where a batch is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    Validating,
    /// Empty batch, no transaction was opened.
    Empty,
    /// Failed validation, no transaction was opened.
    Rejected,
    /// Transaction open, no operation started yet.
    Open,
    Executing {
        index: usize,
        expansion: Option<usize>,
    },
    Committed,
    RolledBack,
}

impl BatchState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BatchState::Empty | BatchState::Rejected | BatchState::Committed | BatchState::RolledBack
        )
    }

    pub fn in_transaction(&self) -> bool {
        matches!(self, BatchState::Open | BatchState::Executing { .. })
    }
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchState::Idle => write!(f, "idle"),
            BatchState::Validating => write!(f, "validating"),
            BatchState::Empty => write!(f, "empty"),
            BatchState::Rejected => write!(f, "rejected"),
            BatchState::Open => write!(f, "open"),
            BatchState::Executing {
                index,
                expansion: Some(e),
            } => write!(f, "executing({}.{})", index, e),
            BatchState::Executing { index, .. } => write!(f, "executing({})", index),
            BatchState::Committed => write!(f, "committed"),
            BatchState::RolledBack => write!(f, "rolled back"),
        }
    }
}

/// Transition that the lifecycle does not allow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid batch transition: {from} -> {to}")]
pub struct InvalidTransition {
    pub from: BatchState,
    pub to: BatchState,
}

/// Batch state tracker.
#[derive(Debug)]
pub struct BatchTracker {
    state: BatchState,
}

impl BatchTracker {
    /// Create a new tracker in `Idle`.
    pub fn new() -> Self {
        Self {
            state: BatchState::Idle,
        }
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    fn advance(&mut self, to: BatchState) -> Result<(), InvalidTransition> {
        let allowed = match (self.state, to) {
            (BatchState::Idle, BatchState::Validating) => true,
            (BatchState::Validating, BatchState::Empty | BatchState::Rejected | BatchState::Open) => {
                true
            }
            (BatchState::Open | BatchState::Executing { .. }, BatchState::Executing { .. }) => true,
            (BatchState::Open | BatchState::Executing { .. }, BatchState::Committed) => true,
            (BatchState::Open | BatchState::Executing { .. }, BatchState::RolledBack) => true,
            _ => false,
        };
        if !allowed {
            return Err(InvalidTransition {
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }

    pub fn validate(&mut self) -> Result<(), InvalidTransition> {
        self.advance(BatchState::Validating)
    }

    pub fn finish_empty(&mut self) -> Result<(), InvalidTransition> {
        self.advance(BatchState::Empty)
    }

    pub fn reject(&mut self) -> Result<(), InvalidTransition> {
        self.advance(BatchState::Rejected)
    }

    pub fn open(&mut self) -> Result<(), InvalidTransition> {
        self.advance(BatchState::Open)
    }

    pub fn execute(&mut self, index: usize, expansion: Option<usize>) -> Result<(), InvalidTransition> {
        self.advance(BatchState::Executing { index, expansion })
    }

    pub fn commit(&mut self) -> Result<(), InvalidTransition> {
        self.advance(BatchState::Committed)
    }

    pub fn rollback(&mut self) -> Result<(), InvalidTransition> {
        self.advance(BatchState::RolledBack)
    }
}

impl Default for BatchTracker {
    fn default() -> Self {
        Self::new()
    }
}
