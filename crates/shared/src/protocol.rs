use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{
    CancellationReason, DurationChoice, InjuryArea, RoutineId, SessionId, Strategy,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendRequest {
    pub total_time_min: DurationChoice,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartCoachingRequest {
    pub ai_routine_id: RoutineId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextCoachingRequest {
    pub coaching_session_id: SessionId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelCoachingRequest {
    pub coaching_session_id: SessionId,
    pub cancellation_reason: CancellationReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub injury_area: Option<InjuryArea>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawExercise")]
pub struct ExerciseDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub sets: u32,
    #[serde(default)]
    pub reps: u32,
    /// Work time of a single set; absent for rep-counted exercises.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_sec: Option<u32>,
    #[serde(default)]
    pub rest_sec: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub est_calories: Option<f64>,
}

/// Ids arrive as strings from current backends and as numbers from older
/// ones.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Number(i64),
}

impl From<WireId> for String {
    fn from(id: WireId) -> Self {
        match id {
            WireId::Text(text) => text,
            WireId::Number(number) => number.to_string(),
        }
    }
}

/// Exercises carry `name` and a localized `name_ko` side by side; either
/// may be missing.
#[derive(Deserialize)]
struct RawExercise {
    #[serde(default)]
    exercise_id: Option<WireId>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    name_ko: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    category_ko: Option<String>,
    sets: u32,
    #[serde(default)]
    reps: u32,
    #[serde(default)]
    duration_sec: Option<u32>,
    #[serde(default)]
    rest_sec: u32,
    #[serde(default)]
    est_calories: Option<f64>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl TryFrom<RawExercise> for ExerciseDescriptor {
    type Error = MalformedResponse;

    fn try_from(raw: RawExercise) -> Result<Self, Self::Error> {
        let name = non_blank(raw.name)
            .or_else(|| non_blank(raw.name_ko))
            .ok_or_else(|| MalformedResponse::new("exercise without name"))?;
        Ok(Self {
            exercise_id: raw.exercise_id.map(String::from),
            name,
            category: non_blank(raw.category).or_else(|| non_blank(raw.category_ko)),
            sets: raw.sets,
            reps: raw.reps,
            duration_sec: raw.duration_sec.filter(|secs| *secs > 0),
            rest_sec: raw.rest_sec,
            est_calories: raw.est_calories,
        })
    }
}

/// A server-proposed routine for the requested duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRoutineCandidate")]
pub struct RoutineCandidate {
    #[serde(rename = "ai_routine_id")]
    pub id: RoutineId,
    pub strategy: Strategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    pub total_time_min: f64,
    pub total_calories: f64,
    pub exercises: Vec<ExerciseDescriptor>,
}

/// Recommendation payloads carry `ai_routine_id` and, in older builds, only
/// a plain `id`.
#[derive(Deserialize)]
struct RawRoutineCandidate {
    #[serde(default)]
    ai_routine_id: Option<WireId>,
    #[serde(default)]
    id: Option<WireId>,
    strategy: Strategy,
    #[serde(default)]
    score: Option<f64>,
    total_time_min: f64,
    total_calories: f64,
    #[serde(default)]
    exercises: Vec<ExerciseDescriptor>,
}

impl TryFrom<RawRoutineCandidate> for RoutineCandidate {
    type Error = MalformedResponse;

    fn try_from(raw: RawRoutineCandidate) -> Result<Self, Self::Error> {
        let id = raw
            .ai_routine_id
            .or(raw.id)
            .map(String::from)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| MalformedResponse::new("routine candidate without ai_routine_id"))?;
        Ok(Self {
            id: RoutineId(id),
            strategy: raw.strategy,
            score: raw.score,
            total_time_min: raw.total_time_min,
            total_calories: raw.total_calories,
            exercises: raw.exercises,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed coaching response: {0}")]
pub struct MalformedResponse(pub String);

impl MalformedResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Body of a `start`/`next` response as the backend sends it: every field
/// may be missing, and a missing session id marks the end of the routine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoachingStepPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coaching_session_id: Option<SessionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tts_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tts_audio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_index: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoachingStep {
    pub session_id: SessionId,
    pub tts_text: String,
    pub tts_audio_b64: String,
    pub current_index: u32,
}

/// Farewell message some backends attach to the terminal `next` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosingStep {
    pub tts_text: String,
    pub tts_audio_b64: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Continuing(CoachingStep),
    Completed { closing: Option<ClosingStep> },
}

impl TryFrom<CoachingStepPayload> for StepOutcome {
    type Error = MalformedResponse;

    fn try_from(payload: CoachingStepPayload) -> Result<Self, Self::Error> {
        let Some(session_id) = payload.coaching_session_id else {
            let closing = non_blank(payload.tts_text).map(|tts_text| ClosingStep {
                tts_text,
                tts_audio_b64: payload.tts_audio.unwrap_or_default(),
            });
            return Ok(StepOutcome::Completed { closing });
        };
        let tts_text = payload
            .tts_text
            .ok_or_else(|| MalformedResponse::new("missing tts_text"))?;
        let tts_audio_b64 = payload
            .tts_audio
            .ok_or_else(|| MalformedResponse::new("missing tts_audio"))?;
        let current_index = payload
            .current_index
            .ok_or_else(|| MalformedResponse::new("missing current_index"))?;
        Ok(StepOutcome::Continuing(CoachingStep {
            session_id,
            tts_text,
            tts_audio_b64,
            current_index,
        }))
    }
}

impl From<CoachingStep> for CoachingStepPayload {
    fn from(step: CoachingStep) -> Self {
        Self {
            coaching_session_id: Some(step.session_id),
            tts_text: Some(step.tts_text),
            tts_audio: Some(step.tts_audio_b64),
            current_index: Some(step.current_index),
        }
    }
}
