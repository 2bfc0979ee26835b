//! Refresh coordination state machine using rust-fsm.
//!
//! One machine exists per authenticated client. It has no terminal state:
//! it cycles for the lifetime of the process.
//!
//! ## State Diagram
//!
//! ```text
//! ┌─────────────────┐   Unauthorized (401, no refresh in flight)   ┌─────────────────┐
//! │      Idle       │ ────────────────────────────────────────────► │   Refreshing    │
//! │    (initial)    │ ◄──────────────────────────────────────────── │                 │
//! └─────────────────┘     Settled (refresh succeeded or failed)     └─────────────────┘
//! ```
//!
//! Feeding `Unauthorized` to a machine that is already `Refreshing` is an
//! impossible transition. The coordinator uses that rejection as its
//! "a refresh is already in flight, queue instead" signal, which makes the
//! transition itself the guarded check-and-set.

use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub refresh_machine(Idle)

    Idle => {
        Unauthorized => Refreshing
    },
    Refreshing => {
        Settled => Idle
    }
}

pub use refresh_machine::Input as RefreshMachineInput;
pub use refresh_machine::State as RefreshMachineState;
pub use refresh_machine::StateMachine as RefreshMachine;

/// Public view of the coordinator's state for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPhase {
    /// No refresh in flight.
    Idle,
    /// A refresh call is in flight; 401s are queued behind it.
    Refreshing,
}

impl RefreshPhase {
    pub fn is_refreshing(&self) -> bool {
        matches!(self, RefreshPhase::Refreshing)
    }
}

impl From<&RefreshMachineState> for RefreshPhase {
    fn from(state: &RefreshMachineState) -> Self {
        match state {
            RefreshMachineState::Idle => RefreshPhase::Idle,
            RefreshMachineState::Refreshing => RefreshPhase::Refreshing,
        }
    }
}
