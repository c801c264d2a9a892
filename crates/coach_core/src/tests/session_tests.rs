use super::*;
use crate::fixtures::{continuing, efficiency_card};

fn active_machine() -> SessionMachine {
    let mut machine = SessionMachine::default();
    machine.begin_start(efficiency_card()).expect("begin start");
    machine
        .complete_start(Ok(continuing("s1", 0, "Let's warm up")))
        .expect("start");
    machine
}

#[test]
fn start_success_enters_active_with_response_index() {
    let mut machine = SessionMachine::default();
    assert_eq!(
        machine.begin_start(efficiency_card()).expect("begin"),
        RoutineId::new("1")
    );
    assert_eq!(machine.phase().name(), "starting");

    let session = machine
        .complete_start(Ok(continuing("s1", 0, "Let's warm up")))
        .expect("start");
    assert_eq!(session.session_id, SessionId("s1".into()));
    assert_eq!(session.current_index, 0);
    assert_eq!(session.guidance.text, "Let's warm up");
    assert_eq!(session.guidance.audio, b"ID3".to_vec());
    assert_eq!(machine.phase().name(), "active");
}

#[test]
fn start_without_session_id_falls_back_to_idle() {
    let mut machine = SessionMachine::default();
    machine.begin_start(efficiency_card()).expect("begin");
    let err = machine
        .complete_start(Ok(StepOutcome::Completed { closing: None }))
        .expect_err("no session id");
    assert!(matches!(err, CoachError::Malformed(_)));
    assert_eq!(machine.phase(), &SessionPhase::Idle);
}

#[test]
fn start_failure_falls_back_to_idle() {
    let mut machine = SessionMachine::default();
    machine.begin_start(efficiency_card()).expect("begin");
    let err = machine
        .complete_start(Err(CoachError::Validation("boom".into())))
        .expect_err("failure");
    assert!(matches!(err, CoachError::Validation(_)));
    assert_eq!(machine.phase(), &SessionPhase::Idle);
}

#[test]
fn start_with_invalid_audio_is_malformed() {
    let mut machine = SessionMachine::default();
    machine.begin_start(efficiency_card()).expect("begin");
    let outcome = StepOutcome::Continuing(CoachingStep {
        session_id: SessionId("s1".into()),
        tts_text: "hi".into(),
        tts_audio_b64: "***".into(),
        current_index: 0,
    });
    let err = machine.complete_start(Ok(outcome)).expect_err("bad audio");
    assert!(matches!(err, CoachError::Malformed(_)));
    assert_eq!(machine.phase(), &SessionPhase::Idle);
}

#[test]
fn start_is_rejected_outside_idle() {
    let mut machine = active_machine();
    let err = machine.begin_start(efficiency_card()).expect_err("busy");
    assert!(matches!(
        err,
        CoachError::InvalidTransition {
            operation: "start",
            phase: "active"
        }
    ));
}

#[test]
fn next_overwrites_guidance_and_index() {
    let mut machine = active_machine();
    assert_eq!(
        machine.begin_next().expect("next"),
        SessionId("s1".into())
    );
    let transition = machine
        .complete_next(Ok(continuing("s1", 1, "Side crunches now")))
        .expect("advance");
    assert_eq!(transition, NextTransition::Advanced { current_index: 1 });

    let session = machine.phase().session().expect("still active");
    assert_eq!(session.current_index, 1);
    assert_eq!(session.guidance.text, "Side crunches now");
}

#[test]
fn next_without_session_id_finishes() {
    let mut machine = active_machine();
    let transition = machine
        .complete_next(Ok(StepOutcome::Completed { closing: None }))
        .expect("finish");
    assert_eq!(transition, NextTransition::Finished);
    assert_eq!(machine.phase().name(), "finished");
    assert_eq!(machine.phase().candidate(), Some(&efficiency_card()));
    assert!(machine.phase().session().is_none());
    assert!(machine.phase().closing().is_none());
}

#[test]
fn finishing_message_is_kept_on_the_finished_phase() {
    let mut machine = active_machine();
    machine
        .complete_next(Ok(StepOutcome::Completed {
            closing: Some(ClosingStep {
                tts_text: "Great work, routine complete".into(),
                tts_audio_b64: "SUQz".into(),
            }),
        }))
        .expect("finish");
    let closing = machine.phase().closing().expect("closing guidance");
    assert_eq!(closing.text, "Great work, routine complete");
    assert_eq!(closing.audio, b"ID3".to_vec());
}

#[test]
fn finishing_message_with_bad_audio_keeps_the_session() {
    let mut machine = active_machine();
    let err = machine
        .complete_next(Ok(StepOutcome::Completed {
            closing: Some(ClosingStep {
                tts_text: "Done".into(),
                tts_audio_b64: "%%%".into(),
            }),
        }))
        .expect_err("bad audio");
    assert!(matches!(err, CoachError::Malformed(_)));
    assert_eq!(machine.phase().name(), "active");
}

#[test]
fn next_failure_keeps_the_session() {
    let mut machine = active_machine();
    machine
        .complete_next(Err(CoachError::Validation("offline".into())))
        .expect_err("failure");
    let session = machine.phase().session().expect("still active");
    assert_eq!(session.current_index, 0);
    assert_eq!(session.guidance.text, "Let's warm up");
}

#[test]
fn next_rejects_index_going_backwards() {
    let mut machine = active_machine();
    machine
        .complete_next(Ok(continuing("s1", 2, "Knee-ups")))
        .expect("advance");
    let err = machine
        .complete_next(Ok(continuing("s1", 1, "Crunch")))
        .expect_err("backwards");
    assert!(matches!(err, CoachError::Malformed(_)));
    assert_eq!(
        machine.phase().session().map(|s| s.current_index),
        Some(2)
    );
}

#[test]
fn next_is_only_valid_while_active() {
    let machine = SessionMachine::default();
    assert!(matches!(
        machine.begin_next(),
        Err(CoachError::InvalidTransition { operation: "next", .. })
    ));
}

#[test]
fn cancel_returns_session_id_and_resets() {
    let mut machine = active_machine();
    assert_eq!(machine.cancel().expect("cancel"), SessionId("s1".into()));
    assert_eq!(machine.phase(), &SessionPhase::Idle);
}

#[test]
fn cancel_outside_active_keeps_phase() {
    let mut machine = SessionMachine::default();
    machine.begin_start(efficiency_card()).expect("begin");
    assert!(machine.cancel().is_err());
    assert_eq!(machine.phase().name(), "starting");
}

#[test]
fn reset_from_any_phase_is_idle() {
    let mut starting = SessionMachine::default();
    starting.begin_start(efficiency_card()).expect("begin");

    let active = active_machine();

    let mut finished = active_machine();
    finished
        .complete_next(Ok(StepOutcome::Completed { closing: None }))
        .expect("finish");

    for mut machine in [starting, active, finished] {
        machine.reset();
        assert_eq!(machine.phase(), &SessionPhase::Idle);
    }
}

#[test]
fn late_start_response_after_reset_is_superseded() {
    let mut machine = SessionMachine::default();
    machine.begin_start(efficiency_card()).expect("begin");
    machine.reset();
    let err = machine
        .complete_start(Ok(continuing("s1", 0, "hi")))
        .expect_err("superseded");
    assert!(matches!(err, CoachError::Superseded { operation: "start" }));
    assert_eq!(machine.phase(), &SessionPhase::Idle);
}

#[test]
fn data_uri_wraps_audio_as_mp3() {
    let machine = active_machine();
    let guidance = &machine.phase().session().expect("active").guidance;
    assert_eq!(guidance.data_uri(), "data:audio/mp3;base64,SUQz");
}
