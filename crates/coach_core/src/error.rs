use shared::{
    error::{ApiError, ApiException},
    protocol::MalformedResponse,
};
use thiserror::Error;

/// Broad failure classes used to decide what the user is told.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    Status,
    Malformed,
    Validation,
    Conflict,
}

#[derive(Debug, Error)]
pub enum CoachError {
    #[error("request to coaching backend failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("coaching backend returned {status}: {}", .error.message)]
    Status { status: u16, error: ApiError },
    #[error(transparent)]
    Malformed(#[from] MalformedResponse),
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("{operation} is not allowed while {phase}")]
    InvalidTransition {
        operation: &'static str,
        phase: &'static str,
    },
    #[error("another coaching request is still in flight")]
    RequestInFlight,
    #[error("response discarded: the flow was reset while {operation} was in flight")]
    Superseded { operation: &'static str },
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl CoachError {
    pub fn kind(&self) -> FailureKind {
        match self {
            CoachError::Transport(_) => FailureKind::Transport,
            CoachError::Status { .. } => FailureKind::Status,
            CoachError::Malformed(_) => FailureKind::Malformed,
            CoachError::Validation(_) | CoachError::Config(_) => FailureKind::Validation,
            CoachError::InvalidTransition { .. }
            | CoachError::RequestInFlight
            | CoachError::Superseded { .. } => FailureKind::Conflict,
        }
    }
}

impl From<ApiException> for CoachError {
    fn from(value: ApiException) -> Self {
        CoachError::Validation(value.message)
    }
}

/// Which transition a recorded failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStage {
    Recommend,
    Start,
    Next,
    Cancel,
}

impl FlowStage {
    pub fn as_str(self) -> &'static str {
        match self {
            FlowStage::Recommend => "recommend",
            FlowStage::Start => "start",
            FlowStage::Next => "next",
            FlowStage::Cancel => "cancel",
        }
    }
}

/// Cloneable record of a failed transition, kept in snapshots and events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowError {
    pub stage: FlowStage,
    pub kind: FailureKind,
    pub message: String,
}

impl FlowError {
    pub fn new(stage: FlowStage, err: &CoachError) -> Self {
        Self {
            stage,
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    /// Short text suitable for a toast or status line.
    pub fn user_message(&self) -> String {
        let what = match self.stage {
            FlowStage::Recommend => "Could not load routines",
            FlowStage::Start => "Could not start coaching",
            FlowStage::Next => "Could not move to the next exercise",
            FlowStage::Cancel => "The server did not confirm the cancellation",
        };
        let hint = match self.kind {
            FailureKind::Transport => "check the connection and try again",
            FailureKind::Status => "the server rejected the request",
            FailureKind::Malformed => "the server sent an unexpected response",
            FailureKind::Validation => "the request was incomplete",
            FailureKind::Conflict => "please wait for the current step",
        };
        format!("{what}; {hint}.")
    }
}
