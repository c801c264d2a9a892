use std::sync::Arc;

use super::*;
use crate::fixtures::{continuing, controller_with, efficiency_card, ApiCall, ScriptedApi};
use shared::domain::RoutineId;

async fn active_controller(api: &Arc<ScriptedApi>) -> CoachingController {
    let controller = controller_with(api);
    api.push_recommend(Ok(vec![efficiency_card()])).await;
    controller.choose_duration(30).await.expect("candidates");
    api.push_start(Ok(continuing("s1", 0, "Plank first"))).await;
    controller
        .select_candidate(RoutineId::new("1"))
        .await
        .expect("start");
    controller
}

#[test]
fn reason_is_required() {
    let mut dialog = CancelDialog::default();
    dialog.open();
    assert!(!dialog.can_submit());
    assert!(matches!(dialog.request(), Err(CoachError::Validation(_))));
}

#[test]
fn injury_requires_an_area() {
    let mut dialog = CancelDialog::default();
    dialog.open();
    dialog.set_reason(CancellationReason::Injury);
    assert!(dialog.shows_injury_area());
    assert!(!dialog.can_submit());

    dialog.set_injury_area(InjuryArea::Ankle);
    let request = dialog.request().expect("complete");
    assert_eq!(request.reason(), CancellationReason::Injury);
    assert_eq!(request.injury_area(), Some(InjuryArea::Ankle));
}

#[test]
fn switching_away_from_injury_drops_the_area() {
    let mut dialog = CancelDialog::default();
    dialog.open();
    dialog.set_reason(CancellationReason::Injury);
    dialog.set_injury_area(InjuryArea::Shoulder);
    dialog.set_reason(CancellationReason::TooHard);

    assert!(!dialog.shows_injury_area());
    let request = dialog.request().expect("complete");
    assert_eq!(request.injury_area(), None);
}

#[test]
fn area_is_ignored_for_other_reasons() {
    let request = CancellationRequest::new(CancellationReason::Interrupted, Some(InjuryArea::Knee))
        .expect("valid");
    assert_eq!(request.injury_area(), None);
}

#[test]
fn reopening_clears_the_previous_answers() {
    let mut dialog = CancelDialog::default();
    dialog.open();
    dialog.set_reason(CancellationReason::TooLong);
    dialog.close();
    dialog.open();
    assert!(dialog.is_open());
    assert_eq!(dialog.reason(), None);
}

#[tokio::test]
async fn incomplete_form_stays_open_and_sends_nothing() {
    let api = Arc::new(ScriptedApi::default());
    let controller = active_controller(&api).await;
    let calls_before = api.calls().await.len();

    let mut dialog = CancelDialog::default();
    dialog.open();
    dialog.set_reason(CancellationReason::Injury);
    dialog
        .confirm(&controller)
        .await
        .expect_err("area missing");

    assert!(dialog.is_open());
    assert_eq!(api.calls().await.len(), calls_before);
    assert_eq!(controller.snapshot().await.phase_name(), "active");
}

#[tokio::test]
async fn confirm_cancels_and_closes_even_if_server_fails() {
    let api = Arc::new(ScriptedApi::default());
    let controller = active_controller(&api).await;
    api.push_cancel(Err(CoachError::Validation("offline".into())))
        .await;

    let mut dialog = CancelDialog::default();
    dialog.open();
    dialog.set_reason(CancellationReason::Injury);
    dialog.set_injury_area(InjuryArea::Knee);
    let outcome = dialog.confirm(&controller).await.expect("cancelled locally");

    assert!(matches!(outcome, CancelOutcome::NotAcknowledged(_)));
    assert!(!dialog.is_open());
    assert_eq!(controller.snapshot().await.phase_name(), "idle");
    assert!(matches!(api.calls().await.last(), Some(ApiCall::Cancel(_))));
}

#[tokio::test]
async fn confirm_closes_when_there_is_nothing_to_cancel() {
    let api = Arc::new(ScriptedApi::default());
    let controller = controller_with(&api);

    let mut dialog = CancelDialog::default();
    dialog.open();
    dialog.set_reason(CancellationReason::TooHard);
    let err = dialog.confirm(&controller).await.expect_err("idle");

    assert!(matches!(err, CoachError::InvalidTransition { .. }));
    assert!(!dialog.is_open());
    assert!(api.calls().await.is_empty());
}
