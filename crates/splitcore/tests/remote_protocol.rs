//! Remote-control frames driven against both sink flavours

use pretty_assertions::assert_eq;
use splitcore::engine::ManualClock;
use splitcore::remote::handle_frame;
use splitcore::{
    CommandSink, Engine, EventSink, FixedChoice, LocalEngine, NoopObserver, Run, TimeSpan, Timer,
    TimerPhase,
};
use std::sync::Arc;

fn command_sink() -> (Arc<ManualClock>, CommandSink) {
    command_sink_choosing(1)
}

fn command_sink_choosing(choice: usize) -> (Arc<ManualClock>, CommandSink) {
    let clock = Arc::new(ManualClock::new());
    let engine: Arc<dyn Engine> = Arc::new(LocalEngine::with_clock(clock.clone()));
    let timer = Timer::new(Run::with_segments(engine, ["Intro", "Boss"]))
        .unwrap()
        .into_shared();
    let sink = CommandSink::new(timer, Arc::new(NoopObserver), Arc::new(FixedChoice(choice)));
    (clock, sink)
}

#[tokio::test]
async fn test_setgametime_sets_game_time() {
    let (_clock, mut sink) = command_sink();
    assert_eq!(handle_frame(&mut sink, "start").await, None);

    assert_eq!(handle_frame(&mut sink, "setgametime 1:23.45").await, None);
    assert_eq!(
        sink.current_time().game_time,
        Some(TimeSpan::from_millis(83_450))
    );
}

#[tokio::test]
async fn test_unparsable_setgametime_changes_nothing() {
    let (_clock, mut sink) = command_sink();
    handle_frame(&mut sink, "start").await;
    let before = sink.snapshot();

    assert_eq!(handle_frame(&mut sink, "setgametime notatime").await, None);
    assert_eq!(handle_frame(&mut sink, "setgametime").await, None);
    assert_eq!(sink.snapshot(), before);
}

#[tokio::test]
async fn test_phase_query_replies() {
    let (_clock, mut sink) = command_sink();
    assert_eq!(
        handle_frame(&mut sink, "getcurrenttimerphase").await,
        Some("NotRunning".to_string())
    );
    handle_frame(&mut sink, "splitorstart").await;
    assert_eq!(
        handle_frame(&mut sink, "getcurrenttimerphase").await,
        Some("Running".to_string())
    );
}

#[tokio::test]
async fn test_unknown_frame_is_ignored() {
    let (_clock, mut sink) = command_sink();
    handle_frame(&mut sink, "start").await;
    let before = sink.snapshot();

    assert_eq!(handle_frame(&mut sink, "doSomethingUnknown").await, None);
    assert_eq!(sink.snapshot(), before);
}

#[tokio::test]
async fn test_current_time_uses_timing_method() {
    let (clock, mut sink) = command_sink();
    handle_frame(&mut sink, "start").await;
    clock.advance(TimeSpan::from_millis(3_723_040));
    assert_eq!(
        handle_frame(&mut sink, "getcurrenttime").await,
        Some("01:02:03.04".to_string())
    );

    // Game time is not initialized, so the reply falls back to real time
    sink.toggle_timing_method().unwrap();
    assert_eq!(
        handle_frame(&mut sink, "getcurrenttime").await,
        Some("01:02:03.04".to_string())
    );

    handle_frame(&mut sink, "setgametime 10").await;
    assert_eq!(
        handle_frame(&mut sink, "getcurrenttime").await,
        Some("00:10.00".to_string())
    );
}

#[tokio::test]
async fn test_setvariable_frames() {
    let (_clock, mut sink) = command_sink();
    assert_eq!(
        handle_frame(&mut sink, r#"setvariable ["route", "glitchless"]"#).await,
        None
    );
    assert_eq!(sink.all_custom_variables(), vec!["route".to_string()]);

    // Malformed JSON is logged and dropped
    let before = sink.snapshot();
    assert_eq!(handle_frame(&mut sink, "setvariable [route]").await, None);
    assert_eq!(sink.snapshot(), before);
}

#[tokio::test]
async fn test_remote_reset_with_new_bests_asks_dialog() {
    let (clock, mut sink) = command_sink();
    handle_frame(&mut sink, "start").await;
    clock.advance(TimeSpan::from_millis(12_000));
    handle_frame(&mut sink, "split").await;

    // FixedChoice(1) discards the new best segment but still resets
    handle_frame(&mut sink, "reset").await;
    let snapshot = sink.snapshot();
    assert_eq!(snapshot.phase, TimerPhase::NotRunning);
    assert_eq!(snapshot.run.segments[0].best_segment_time.real_time, None);
}

#[tokio::test]
async fn test_event_sink_is_drivable() {
    let clock = Arc::new(ManualClock::new());
    let engine: Arc<dyn Engine> = Arc::new(LocalEngine::with_clock(clock.clone()));
    let timer = Timer::new(Run::with_segments(engine, ["Only"])).unwrap();
    let mut sink = EventSink::new(timer, Arc::new(NoopObserver), Arc::new(FixedChoice(0)));

    handle_frame(&mut sink, "togglepause").await;
    handle_frame(&mut sink, "pause").await;
    assert_eq!(
        handle_frame(&mut sink, "getcurrenttimerphase").await,
        Some("Paused".to_string())
    );
    handle_frame(&mut sink, "resume").await;
    clock.advance(TimeSpan::from_millis(1_000));
    handle_frame(&mut sink, "split").await;
    assert_eq!(
        handle_frame(&mut sink, "getcurrenttimerphase").await,
        Some("Ended".to_string())
    );
    assert_eq!(
        handle_frame(&mut sink, "getcurrenttime").await,
        Some("00:01.00".to_string())
    );
}

#[tokio::test]
async fn test_extreme_times_do_not_overflow_reset() {
    let (clock, mut sink) = command_sink_choosing(0);
    for frame in [
        "start",
        "initgametime",
        "setloadingtimes 9000000000",
        "split",
        "setgametime 9000000000",
    ] {
        assert_eq!(handle_frame(&mut sink, frame).await, None);
    }
    clock.advance(TimeSpan::from_millis(1_000));
    assert_eq!(handle_frame(&mut sink, "split").await, None);
    assert_eq!(sink.current_phase(), TimerPhase::Ended);

    assert_eq!(handle_frame(&mut sink, "reset").await, None);
    assert_eq!(sink.current_phase(), TimerPhase::NotRunning);
    let run = sink.snapshot().run;
    assert_eq!(run.attempt_count, 1);
    assert_eq!(
        run.segments[1].best_segment_time.game_time,
        Some(TimeSpan::from_nanos(i64::MAX))
    );
}
