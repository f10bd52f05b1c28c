//! Controller activity state.
//!
//! ```text
//! Created -> Active      <-> Paused -> Ended   (primary slot)
//! Created -> ModalActive <-> Paused -> Ended   (modal slot)
//! ```
//!
//! `Ended` is terminal. `pause`/`resume` are advisory and idempotent.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The two positions an orchestrator can fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Primary,
    Modal,
}

impl Slot {
    #[must_use]
    pub const fn for_modal(is_modal: bool) -> Self {
        if is_modal { Slot::Modal } else { Slot::Primary }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Slot::Primary => "primary",
            Slot::Modal => "modal",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    #[default]
    Created,
    Active,
    ModalActive,
    Paused,
    Ended,
}

impl LifecycleState {
    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, LifecycleState::Active | LifecycleState::ModalActive)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Begin,
    Pause,
    Resume,
    End,
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verb::Begin => "begin",
            Verb::Pause => "pause",
            Verb::Resume => "resume",
            Verb::End => "end",
        })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("{0} before begin")]
    NotBegun(Verb),
    #[error("begin called twice")]
    AlreadyBegun,
    #[error("{0} after end")]
    Ended(Verb),
}

/// Tracks one controller's lifecycle and rejects illegal verbs.
#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    state: LifecycleState,
    slot: Option<Slot>,
}

impl Lifecycle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Slot recorded at `begin`.
    #[must_use]
    pub fn slot(&self) -> Option<Slot> {
        self.slot
    }

    /// Begun and not yet ended.
    #[must_use]
    pub fn is_live(&self) -> bool {
        !matches!(self.state, LifecycleState::Created | LifecycleState::Ended)
    }

    pub fn begin(&mut self, slot: Slot) -> Result<LifecycleState, LifecycleError> {
        match self.state {
            LifecycleState::Created => {
                self.slot = Some(slot);
                self.state = running_state(slot);
                Ok(self.state)
            }
            LifecycleState::Ended => Err(LifecycleError::Ended(Verb::Begin)),
            _ => Err(LifecycleError::AlreadyBegun),
        }
    }

    pub fn pause(&mut self) -> Result<LifecycleState, LifecycleError> {
        match self.state {
            LifecycleState::Created => Err(LifecycleError::NotBegun(Verb::Pause)),
            LifecycleState::Ended => Err(LifecycleError::Ended(Verb::Pause)),
            _ => {
                self.state = LifecycleState::Paused;
                Ok(self.state)
            }
        }
    }

    pub fn resume(&mut self) -> Result<LifecycleState, LifecycleError> {
        match (self.state, self.slot) {
            (LifecycleState::Created, _) | (_, None) => {
                Err(LifecycleError::NotBegun(Verb::Resume))
            }
            (LifecycleState::Ended, _) => Err(LifecycleError::Ended(Verb::Resume)),
            (_, Some(slot)) => {
                self.state = running_state(slot);
                Ok(self.state)
            }
        }
    }

    /// Ending a controller that never began is allowed; ending twice is not.
    pub fn end(&mut self) -> Result<LifecycleState, LifecycleError> {
        if self.state == LifecycleState::Ended {
            return Err(LifecycleError::Ended(Verb::End));
        }
        self.state = LifecycleState::Ended;
        Ok(self.state)
    }
}

fn running_state(slot: Slot) -> LifecycleState {
    match slot {
        Slot::Primary => LifecycleState::Active,
        Slot::Modal => LifecycleState::ModalActive,
    }
}
