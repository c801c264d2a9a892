//! Client core for the routine recommendation and workout coaching flow.

pub mod api;
pub mod cancel_dialog;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod routine_board;
pub mod session;
pub mod time_selector;

pub use api::{CoachingApi, HttpCoachingApi};
pub use cancel_dialog::{CancelDialog, CancellationRequest};
pub use config::{load_settings, Settings};
pub use controller::{CancelOutcome, CoachingController, FlowSnapshot};
pub use error::{CoachError, FailureKind, FlowError, FlowStage};
pub use events::CoachingEvent;
pub use routine_board::{CardView, ExerciseLine, RoutineBoard};
pub use session::{ActiveSession, Guidance, NextTransition, SessionMachine, SessionPhase};
pub use time_selector::TimeSelector;

#[cfg(test)]
#[path = "tests/fixtures.rs"]
mod fixtures;
