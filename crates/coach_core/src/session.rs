//! Coaching session lifecycle for the selected routine.
//!
//! `SessionMachine` is synchronous: the controller calls a `begin_*` method
//! before issuing a request and the matching `complete_*` method with the
//! request's result.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use shared::{
    domain::{RoutineId, SessionId},
    protocol::{ClosingStep, CoachingStep, MalformedResponse, RoutineCandidate, StepOutcome},
};

use crate::error::CoachError;

/// Text and decoded audio for one coaching step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guidance {
    pub text: String,
    pub audio: Vec<u8>,
}

impl Guidance {
    fn decode(text: &str, audio_b64: &str) -> Result<Self, MalformedResponse> {
        let audio = STANDARD
            .decode(audio_b64.trim())
            .map_err(|e| MalformedResponse::new(format!("tts_audio is not base64: {e}")))?;
        Ok(Self {
            text: text.to_string(),
            audio,
        })
    }

    fn from_step(step: &CoachingStep) -> Result<Self, MalformedResponse> {
        Self::decode(&step.tts_text, &step.tts_audio_b64)
    }

    fn from_closing(closing: &ClosingStep) -> Result<Self, MalformedResponse> {
        Self::decode(&closing.tts_text, &closing.tts_audio_b64)
    }

    /// `data:` URI for players that take the clip inline.
    pub fn data_uri(&self) -> String {
        format!("data:audio/mp3;base64,{}", STANDARD.encode(&self.audio))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    pub session_id: SessionId,
    pub current_index: u32,
    pub guidance: Guidance,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionPhase {
    Idle,
    Starting {
        candidate: RoutineCandidate,
    },
    Active {
        candidate: RoutineCandidate,
        session: ActiveSession,
    },
    Finished {
        candidate: RoutineCandidate,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        closing: Option<Guidance>,
    },
}

impl SessionPhase {
    pub fn name(&self) -> &'static str {
        match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Starting { .. } => "starting",
            SessionPhase::Active { .. } => "active",
            SessionPhase::Finished { .. } => "finished",
        }
    }

    pub fn candidate(&self) -> Option<&RoutineCandidate> {
        match self {
            SessionPhase::Idle => None,
            SessionPhase::Starting { candidate }
            | SessionPhase::Active { candidate, .. }
            | SessionPhase::Finished { candidate, .. } => Some(candidate),
        }
    }

    pub fn session(&self) -> Option<&ActiveSession> {
        match self {
            SessionPhase::Active { session, .. } => Some(session),
            _ => None,
        }
    }

    /// Farewell guidance of a finished routine, if the server sent one.
    pub fn closing(&self) -> Option<&Guidance> {
        match self {
            SessionPhase::Finished { closing, .. } => closing.as_ref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextTransition {
    Advanced { current_index: u32 },
    Finished,
}

#[derive(Debug, Clone)]
pub struct SessionMachine {
    phase: SessionPhase,
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Idle,
        }
    }
}

impl SessionMachine {
    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn begin_start(&mut self, candidate: RoutineCandidate) -> Result<RoutineId, CoachError> {
        if !matches!(self.phase, SessionPhase::Idle) {
            return Err(self.invalid("start"));
        }
        let routine_id = candidate.id.clone();
        self.phase = SessionPhase::Starting { candidate };
        Ok(routine_id)
    }

    /// Applies the start response. Any failure, including a response without
    /// a session id, drops back to `Idle`.
    pub fn complete_start(
        &mut self,
        result: Result<StepOutcome, CoachError>,
    ) -> Result<ActiveSession, CoachError> {
        let candidate = match std::mem::replace(&mut self.phase, SessionPhase::Idle) {
            SessionPhase::Starting { candidate } => candidate,
            other => {
                self.phase = other;
                return Err(CoachError::Superseded { operation: "start" });
            }
        };

        let step = match result? {
            StepOutcome::Continuing(step) => step,
            StepOutcome::Completed { .. } => {
                return Err(
                    MalformedResponse::new("start response without coaching_session_id").into(),
                );
            }
        };
        let session = ActiveSession {
            guidance: Guidance::from_step(&step)?,
            session_id: step.session_id,
            current_index: step.current_index,
            started_at: Utc::now(),
        };
        self.phase = SessionPhase::Active {
            candidate,
            session: session.clone(),
        };
        Ok(session)
    }

    pub fn begin_next(&self) -> Result<SessionId, CoachError> {
        match &self.phase {
            SessionPhase::Active { session, .. } => Ok(session.session_id.clone()),
            _ => Err(self.invalid("next")),
        }
    }

    /// Applies a next-step response. Failures leave the session where it was.
    pub fn complete_next(
        &mut self,
        result: Result<StepOutcome, CoachError>,
    ) -> Result<NextTransition, CoachError> {
        let outcome = result?;
        let SessionPhase::Active { candidate, session } = &mut self.phase else {
            return Err(CoachError::Superseded { operation: "next" });
        };

        match outcome {
            StepOutcome::Continuing(step) => {
                if step.current_index < session.current_index {
                    return Err(MalformedResponse::new(format!(
                        "current_index went backwards from {} to {}",
                        session.current_index, step.current_index
                    ))
                    .into());
                }
                session.guidance = Guidance::from_step(&step)?;
                session.session_id = step.session_id;
                session.current_index = step.current_index;
                Ok(NextTransition::Advanced {
                    current_index: step.current_index,
                })
            }
            StepOutcome::Completed { closing } => {
                let closing = closing.as_ref().map(Guidance::from_closing).transpose()?;
                self.phase = SessionPhase::Finished {
                    candidate: candidate.clone(),
                    started_at: session.started_at,
                    finished_at: Utc::now(),
                    closing,
                };
                Ok(NextTransition::Finished)
            }
        }
    }

    /// Ends an active session locally and hands back the id to report.
    pub fn cancel(&mut self) -> Result<SessionId, CoachError> {
        match std::mem::replace(&mut self.phase, SessionPhase::Idle) {
            SessionPhase::Active { session, .. } => Ok(session.session_id),
            other => {
                self.phase = other;
                Err(self.invalid("cancel"))
            }
        }
    }

    pub fn reset(&mut self) {
        self.phase = SessionPhase::Idle;
    }

    fn invalid(&self, operation: &'static str) -> CoachError {
        CoachError::InvalidTransition {
            operation,
            phase: self.phase.name(),
        }
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
