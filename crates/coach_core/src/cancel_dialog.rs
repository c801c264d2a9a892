//! Modal that collects why the user is stopping before the session is
//! cancelled.

use shared::domain::{CancellationReason, InjuryArea};

use crate::{
    controller::{CancelOutcome, CoachingController},
    error::CoachError,
};

/// Validated cancellation input: an injury area is present exactly when the
/// reason is an injury.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancellationRequest {
    reason: CancellationReason,
    injury_area: Option<InjuryArea>,
}

impl CancellationRequest {
    pub fn new(
        reason: CancellationReason,
        injury_area: Option<InjuryArea>,
    ) -> Result<Self, CoachError> {
        if !reason.requires_injury_area() {
            return Ok(Self {
                reason,
                injury_area: None,
            });
        }
        match injury_area {
            Some(area) => Ok(Self {
                reason,
                injury_area: Some(area),
            }),
            None => Err(CoachError::Validation(
                "injury area is required when cancelling because of an injury".into(),
            )),
        }
    }

    pub fn reason(&self) -> CancellationReason {
        self.reason
    }

    pub fn injury_area(&self) -> Option<InjuryArea> {
        self.injury_area
    }
}

#[derive(Debug, Default, Clone)]
pub struct CancelDialog {
    open: bool,
    reason: Option<CancellationReason>,
    injury_area: Option<InjuryArea>,
}

impl CancelDialog {
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Opens with a blank form.
    pub fn open(&mut self) {
        *self = Self {
            open: true,
            ..Self::default()
        };
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn reason(&self) -> Option<CancellationReason> {
        self.reason
    }

    pub fn set_reason(&mut self, reason: CancellationReason) {
        self.reason = Some(reason);
        if !reason.requires_injury_area() {
            self.injury_area = None;
        }
    }

    /// Only shown, and only kept, while the reason is an injury.
    pub fn shows_injury_area(&self) -> bool {
        self.reason.is_some_and(CancellationReason::requires_injury_area)
    }

    pub fn set_injury_area(&mut self, area: InjuryArea) {
        self.injury_area = Some(area);
    }

    pub fn request(&self) -> Result<CancellationRequest, CoachError> {
        let reason = self
            .reason
            .ok_or_else(|| CoachError::Validation("a cancellation reason is required".into()))?;
        CancellationRequest::new(reason, self.injury_area)
    }

    pub fn can_submit(&self) -> bool {
        self.request().is_ok()
    }

    /// Submits the form. An incomplete form stays open and nothing is sent;
    /// otherwise the dialog closes whatever the controller reports.
    pub async fn confirm(
        &mut self,
        controller: &CoachingController,
    ) -> Result<CancelOutcome, CoachError> {
        let request = self.request()?;
        let outcome = controller.cancel(request).await;
        self.close();
        outcome
    }
}

#[cfg(test)]
#[path = "tests/cancel_dialog_tests.rs"]
mod tests;
