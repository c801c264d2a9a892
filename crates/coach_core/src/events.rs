use shared::domain::{CancellationReason, DurationChoice, RoutineId, SessionId};

use crate::{error::FlowError, session::Guidance};

#[derive(Debug, Clone)]
pub enum CoachingEvent {
    CandidatesLoaded {
        duration: DurationChoice,
        count: usize,
    },
    SessionStarted {
        routine_id: RoutineId,
        session_id: SessionId,
        current_index: u32,
        guidance: Guidance,
    },
    StepAdvanced {
        session_id: SessionId,
        current_index: u32,
        guidance: Guidance,
    },
    SessionFinished {
        routine_id: RoutineId,
        total_calories: f64,
        closing: Option<Guidance>,
    },
    SessionCancelled {
        session_id: SessionId,
        reason: CancellationReason,
    },
    /// The session was already ended locally but the server did not confirm.
    CancelNotAcknowledged {
        session_id: SessionId,
        error: FlowError,
    },
    SelectionReset,
    Error(FlowError),
}
