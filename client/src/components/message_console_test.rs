use super::*;

#[test]
fn debug_summary_at_rest() {
    assert_eq!(
        debug_summary(&SessionState::default()),
        "Stream: Inactive | Processing: No | Paused: No"
    );
}

#[test]
fn debug_summary_while_streaming_paused() {
    let mut session = SessionState::default();
    session.streaming.active = true;
    session.streaming.paused = true;
    session.processing.active = true;
    assert_eq!(debug_summary(&session), "Stream: Active | Processing: Yes | Paused: Yes");
}
