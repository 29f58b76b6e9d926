use super::*;
use crate::testing::{CapturingSink, ScriptedInputSource};
use rdev::{Button, Key};
use std::sync::Arc;

fn scripted_recorder() -> (Arc<ScriptedInputSource>, Recorder) {
    let source = Arc::new(ScriptedInputSource::new());
    let recorder = Recorder::new(source.clone(), RecorderConfig::default());
    (source, recorder)
}

#[test]
fn test_recorder_config_default() {
    let config = RecorderConfig::default();

    assert!(config.record_mouse);
    assert!(config.record_keyboard);
}

#[test]
fn test_player_config_default() {
    let config = PlayerConfig::default();

    assert_eq!(config.speed, 1.0);
    assert!(config.interruptible_sleep);
}

#[test]
fn test_recorder_captures_in_delivery_order() {
    let (source, mut recorder) = scripted_recorder();

    recorder.start().unwrap();
    source.feed_at(10.0, EventType::MouseMove { x: 100.0, y: 200.0 }, None);
    source.feed_at(10.1, EventType::ButtonPress(Button::Left), None);
    source.feed_at(10.2, EventType::ButtonRelease(Button::Left), None);
    source.feed_at(
        10.3,
        EventType::Wheel {
            delta_x: 0,
            delta_y: -1,
        },
        None,
    );
    source.feed_at(10.4, EventType::KeyPress(Key::KeyH), Some("h"));
    source.feed_at(10.5, EventType::KeyRelease(Key::KeyH), None);
    recorder.stop().unwrap();

    let events = recorder.events();
    let kinds: Vec<EventKind> = events.iter().map(|e| e.kind.clone()).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::MouseMove { x: 100, y: 200 },
            EventKind::MouseClick {
                x: 100,
                y: 200,
                button: MouseButton::Left,
                pressed: true
            },
            EventKind::MouseClick {
                x: 100,
                y: 200,
                button: MouseButton::Left,
                pressed: false
            },
            EventKind::MouseScroll {
                x: 100,
                y: 200,
                dx: 0,
                dy: -1
            },
            EventKind::key_press("h"),
            EventKind::key_release("h"),
        ]
    );
    assert!(events.windows(2).all(|pair| pair[0].time <= pair[1].time));
    assert!((events[0].time - 10.0).abs() < 1e-6);
}

#[test]
fn test_recorder_ignores_input_after_stop() {
    let (source, mut recorder) = scripted_recorder();

    recorder.start().unwrap();
    source.feed_at(1.0, EventType::KeyPress(Key::Escape), None);
    recorder.stop().unwrap();
    source.feed_at(2.0, EventType::KeyRelease(Key::Escape), None);

    assert_eq!(recorder.event_count(), 1);
    assert_eq!(source.subscriber_count(), 0);
    assert!(!recorder.is_recording());
}

#[test]
fn test_recorder_stop_is_idempotent() {
    let (source, mut recorder) = scripted_recorder();

    recorder.stop().unwrap();
    recorder.start().unwrap();
    source.feed_at(1.0, EventType::KeyPress(Key::Tab), None);
    recorder.stop().unwrap();
    recorder.stop().unwrap();

    assert_eq!(recorder.event_count(), 1);
    assert!(!recorder.is_recording());
}

#[test]
fn test_recorder_start_twice_fails() {
    let (source, mut recorder) = scripted_recorder();

    recorder.start().unwrap();
    assert!(matches!(
        recorder.start(),
        Err(MacroError::AlreadyRecording)
    ));
    assert_eq!(source.subscriber_count(), 1);
}

#[test]
fn test_recorder_start_clears_previous_recording() {
    let (source, mut recorder) = scripted_recorder();

    recorder.start().unwrap();
    source.feed_at(1.0, EventType::KeyPress(Key::KeyA), Some("a"));
    recorder.stop().unwrap();
    assert_eq!(recorder.event_count(), 1);

    recorder.start().unwrap();
    assert_eq!(recorder.event_count(), 0);
}

#[test]
fn test_recorder_key_capture_policy() {
    let (source, mut recorder) = scripted_recorder();

    recorder.start().unwrap();
    source.feed_at(1.0, EventType::KeyPress(Key::ShiftRight), None);
    source.feed_at(1.1, EventType::KeyPress(Key::KeyQ), Some("Q"));
    source.feed_at(1.2, EventType::KeyPress(Key::Unknown(222)), None);
    recorder.stop().unwrap();

    let keys: Vec<String> = recorder
        .events()
        .into_iter()
        .filter_map(|event| match event.kind {
            EventKind::KeyPress { key } => Some(key),
            _ => None,
        })
        .collect();
    assert_eq!(keys, vec!["shift_r", "Q", "Unknown(222)"]);
}

#[test]
fn test_recorder_dropped_while_recording_detaches() {
    let (source, mut recorder) = scripted_recorder();

    recorder.start().unwrap();
    assert_eq!(source.subscriber_count(), 1);
    drop(recorder);

    assert_eq!(source.subscriber_count(), 0);
}

#[test]
fn test_player_load_failure_keeps_events() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.rec");
    let bad = dir.path().join("bad.rec");
    EventLog::from(vec![Event::new(0.0, EventKind::key_press("a"))])
        .save(&good)
        .unwrap();
    std::fs::write(&bad, "not json").unwrap();

    let player = Player::new(Arc::new(CapturingSink::new()), PlayerConfig::default());
    player.load(&good).unwrap();

    assert!(matches!(player.load(&bad), Err(MacroError::ParseError(_))));
    assert!(matches!(
        player.load(dir.path().join("missing.rec")),
        Err(MacroError::IoError(_))
    ));
    assert_eq!(player.events().len(), 1);
}

#[test]
fn test_error_types() {
    let init_error = MacroError::InitializationError("no display".to_string());
    let key_error = MacroError::UnmappableKey("hyper".to_string());
    let simulation_error = MacroError::SimulationError("denied".to_string());

    assert!(format!("{}", init_error).contains("no display"));
    assert!(format!("{}", key_error).contains("hyper"));
    assert!(format!("{}", simulation_error).contains("denied"));
    let already = MacroError::AlreadyRecording.to_string();
    assert!(already.contains("recording"));
}
