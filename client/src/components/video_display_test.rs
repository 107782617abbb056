use super::*;

#[test]
fn idle_session_asks_for_upload() {
    let p = Placeholder::for_session(&SessionState::default());
    assert_eq!(p, Placeholder::Idle);
    assert_eq!(p.text(), "Upload a video");
    assert!(!p.is_loading());
}

#[test]
fn transitioning_wins_over_upload_and_processing() {
    let mut session = SessionState::default();
    session.begin_upload();
    session.begin_processing();
    assert_eq!(Placeholder::for_session(&session).text(), "Starting stream...");
}

#[test]
fn uploading_placeholder() {
    let mut session = SessionState::default();
    session.begin_upload();
    assert_eq!(Placeholder::for_session(&session).text(), "Uploading video...");
}

#[test]
fn processing_placeholders_follow_paused_flag() {
    let mut session = SessionState::default();
    session.processing.active = true;
    assert_eq!(Placeholder::for_session(&session).text(), "Processing and streaming video...");
    session.streaming.paused = true;
    assert_eq!(Placeholder::for_session(&session).text(), "Processing paused");
}

#[test]
fn container_class_marks_paused() {
    assert_eq!(video_container_class(false), "video-container");
    assert_eq!(video_container_class(true), "video-container paused");
}
