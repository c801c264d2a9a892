//! Drives the routine flow: duration → candidates → coaching session.
//!
//! All methods take `&self`; state lives behind a mutex that is never held
//! across a request. At most one recommend/start/next request is outstanding
//! at a time. `cancel` and `reset` are always accepted and bump an epoch so
//! that responses to requests issued before them are dropped.

use std::sync::Arc;

use shared::{
    domain::{DurationChoice, RoutineId, SessionId},
    protocol::{CancelCoachingRequest, RoutineCandidate},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

use crate::{
    api::CoachingApi,
    cancel_dialog::CancellationRequest,
    error::{CoachError, FlowError, FlowStage},
    events::CoachingEvent,
    routine_board::{CardView, RoutineBoard},
    session::{ActiveSession, Guidance, NextTransition, SessionMachine, SessionPhase},
    time_selector::TimeSelector,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelOutcome {
    Acknowledged,
    /// Local state was reset anyway; the server rejected or never saw the
    /// cancellation.
    NotAcknowledged(FlowError),
}

#[derive(Debug, Clone)]
pub struct FlowSnapshot {
    pub duration: Option<DurationChoice>,
    pub candidates: Vec<RoutineCandidate>,
    pub cards: Vec<CardView>,
    pub phase: SessionPhase,
    pub in_flight: Option<FlowStage>,
    pub last_error: Option<FlowError>,
}

impl FlowSnapshot {
    pub fn phase_name(&self) -> &'static str {
        self.phase.name()
    }

    pub fn selected(&self) -> Option<&RoutineCandidate> {
        self.phase.candidate()
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.phase.session().map(|s| &s.session_id)
    }

    pub fn current_index(&self) -> Option<u32> {
        self.phase.session().map(|s| s.current_index)
    }

    pub fn guidance(&self) -> Option<&Guidance> {
        self.phase.session().map(|s| &s.guidance)
    }

    pub fn closing(&self) -> Option<&Guidance> {
        self.phase.closing()
    }
}

struct FlowState {
    board: RoutineBoard,
    session: SessionMachine,
    in_flight: Option<FlowStage>,
    epoch: u64,
    last_error: Option<FlowError>,
}

impl FlowState {
    /// Every claimed request starts a new epoch, so anything that finishes
    /// later under an older epoch knows the flow has moved on.
    fn claim(&mut self, stage: FlowStage) -> Result<u64, CoachError> {
        if self.in_flight.is_some() {
            return Err(CoachError::RequestInFlight);
        }
        self.epoch += 1;
        self.in_flight = Some(stage);
        Ok(self.epoch)
    }

    /// Releases the in-flight slot if the request is still current.
    fn release(&mut self, epoch: u64, operation: &'static str) -> Result<(), CoachError> {
        if self.epoch != epoch {
            return Err(CoachError::Superseded { operation });
        }
        self.in_flight = None;
        Ok(())
    }

    fn invalidate(&mut self) {
        self.epoch += 1;
        self.in_flight = None;
        self.last_error = None;
    }
}

pub struct CoachingController {
    api: Arc<dyn CoachingApi>,
    inner: Mutex<FlowState>,
    events: broadcast::Sender<CoachingEvent>,
}

impl CoachingController {
    pub fn new(api: Arc<dyn CoachingApi>) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            api,
            inner: Mutex::new(FlowState {
                board: RoutineBoard::default(),
                session: SessionMachine::default(),
                in_flight: None,
                epoch: 0,
                last_error: None,
            }),
            events,
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<CoachingEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> FlowSnapshot {
        let guard = self.inner.lock().await;
        let phase = guard.session.phase().clone();
        let highlight = phase.session().map(|s| s.current_index);
        FlowSnapshot {
            duration: guard.board.duration(),
            candidates: guard.board.candidates().to_vec(),
            cards: guard.board.cards(highlight),
            phase,
            in_flight: guard.in_flight,
            last_error: guard.last_error.clone(),
        }
    }

    /// Leaves the time selector and fetches candidates for the duration.
    /// A failed fetch leaves an empty card list.
    pub async fn choose_duration(&self, minutes: u32) -> Result<usize, CoachError> {
        let duration = TimeSelector::choose(minutes)?;
        let epoch = {
            let mut guard = self.inner.lock().await;
            if !matches!(guard.session.phase(), SessionPhase::Idle) {
                return Err(CoachError::InvalidTransition {
                    operation: "choose_duration",
                    phase: guard.session.phase().name(),
                });
            }
            guard.claim(FlowStage::Recommend)?
        };

        info!(minutes = duration.minutes(), "requesting routine candidates");
        let result = self.api.recommend(duration).await;

        let mut guard = self.inner.lock().await;
        guard.release(epoch, "recommend")?;
        match result {
            Ok(candidates) => {
                let count = candidates.len();
                guard.board.load(duration, candidates);
                guard.last_error = None;
                drop(guard);
                info!(minutes = duration.minutes(), count, "routine candidates loaded");
                self.emit(CoachingEvent::CandidatesLoaded { duration, count });
                Ok(count)
            }
            Err(err) => {
                guard.board.load_failed(duration);
                self.record_failure(&mut guard, FlowStage::Recommend, &err);
                Err(err)
            }
        }
    }

    /// Selects a card and starts coaching it. Returns `None` when a card is
    /// already selected, in which case nothing is sent.
    pub async fn select_candidate(
        &self,
        routine_id: RoutineId,
    ) -> Result<Option<ActiveSession>, CoachError> {
        let epoch = {
            let mut guard = self.inner.lock().await;
            if guard.in_flight.is_some() {
                return Err(CoachError::RequestInFlight);
            }
            if guard.board.selected().is_some() {
                return Ok(None);
            }
            let candidate = guard.board.select(routine_id.clone()).ok_or_else(|| {
                CoachError::Validation(format!("no routine candidate with id {routine_id}"))
            })?;
            if let Err(err) = guard.session.begin_start(candidate) {
                guard.board.clear_selection();
                return Err(err);
            }
            guard.claim(FlowStage::Start)?
        };

        info!(%routine_id, "starting coaching session");
        let result = self.api.start(routine_id.clone()).await;

        let mut guard = self.inner.lock().await;
        guard.release(epoch, "start")?;
        match guard.session.complete_start(result) {
            Ok(session) => {
                guard.last_error = None;
                drop(guard);
                info!(
                    %routine_id,
                    session_id = %session.session_id,
                    current_index = session.current_index,
                    "coaching session active"
                );
                self.emit(CoachingEvent::SessionStarted {
                    routine_id,
                    session_id: session.session_id.clone(),
                    current_index: session.current_index,
                    guidance: session.guidance.clone(),
                });
                Ok(Some(session))
            }
            Err(err) => {
                guard.board.clear_selection();
                self.record_failure(&mut guard, FlowStage::Start, &err);
                Err(err)
            }
        }
    }

    pub async fn next(&self) -> Result<NextTransition, CoachError> {
        let (epoch, session_id) = {
            let mut guard = self.inner.lock().await;
            if guard.in_flight.is_some() {
                return Err(CoachError::RequestInFlight);
            }
            let session_id = guard.session.begin_next()?;
            (guard.claim(FlowStage::Next)?, session_id)
        };

        let result = self.api.next(&session_id).await;

        let mut guard = self.inner.lock().await;
        guard.release(epoch, "next")?;
        match guard.session.complete_next(result) {
            Ok(transition) => {
                guard.last_error = None;
                let event = match guard.session.phase() {
                    SessionPhase::Active { session, .. } => {
                        info!(
                            session_id = %session.session_id,
                            current_index = session.current_index,
                            "advanced to next exercise"
                        );
                        Some(CoachingEvent::StepAdvanced {
                            session_id: session.session_id.clone(),
                            current_index: session.current_index,
                            guidance: session.guidance.clone(),
                        })
                    }
                    SessionPhase::Finished {
                        candidate, closing, ..
                    } => {
                        info!(%session_id, routine_id = %candidate.id, "coaching session finished");
                        Some(CoachingEvent::SessionFinished {
                            routine_id: candidate.id.clone(),
                            total_calories: candidate.total_calories,
                            closing: closing.clone(),
                        })
                    }
                    SessionPhase::Idle | SessionPhase::Starting { .. } => None,
                };
                drop(guard);
                if let Some(event) = event {
                    self.emit(event);
                }
                Ok(transition)
            }
            Err(err) => {
                self.record_failure(&mut guard, FlowStage::Next, &err);
                Err(err)
            }
        }
    }

    /// Ends the active session locally right away, then reports the
    /// cancellation. The local reset stands whatever the server answers.
    pub async fn cancel(&self, request: CancellationRequest) -> Result<CancelOutcome, CoachError> {
        let (epoch, session_id) = {
            let mut guard = self.inner.lock().await;
            let session_id = guard.session.cancel()?;
            guard.board.clear_selection();
            guard.invalidate();
            (guard.epoch, session_id)
        };
        info!(%session_id, reason = request.reason().as_wire(), "coaching session cancelled");
        self.emit(CoachingEvent::SessionCancelled {
            session_id: session_id.clone(),
            reason: request.reason(),
        });

        let wire = CancelCoachingRequest {
            coaching_session_id: session_id.clone(),
            cancellation_reason: request.reason(),
            injury_area: request.injury_area(),
        };
        match self.api.cancel(&wire).await {
            Ok(()) => Ok(CancelOutcome::Acknowledged),
            Err(err) => {
                let failure = FlowError::new(FlowStage::Cancel, &err);
                warn!(%session_id, "cancellation not acknowledged: {err}");
                {
                    let mut guard = self.inner.lock().await;
                    if guard.epoch == epoch {
                        guard.last_error = Some(failure.clone());
                    }
                }
                self.emit(CoachingEvent::CancelNotAcknowledged {
                    session_id,
                    error: failure.clone(),
                });
                Ok(CancelOutcome::NotAcknowledged(failure))
            }
        }
    }

    /// Drops the selected card and any session, back to the card list.
    pub async fn reset(&self) {
        {
            let mut guard = self.inner.lock().await;
            guard.board.clear_selection();
            guard.session.reset();
            guard.invalidate();
        }
        self.emit(CoachingEvent::SelectionReset);
    }

    /// Like `reset`, and also forgets the chosen duration.
    pub async fn return_to_time_selection(&self) {
        {
            let mut guard = self.inner.lock().await;
            guard.board.clear();
            guard.session.reset();
            guard.invalidate();
        }
        self.emit(CoachingEvent::SelectionReset);
    }

    fn record_failure(&self, state: &mut FlowState, stage: FlowStage, err: &CoachError) {
        let failure = FlowError::new(stage, err);
        warn!(stage = stage.as_str(), kind = ?failure.kind, "coaching request failed: {err}");
        state.last_error = Some(failure.clone());
        self.emit(CoachingEvent::Error(failure));
    }

    fn emit(&self, event: CoachingEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
