//! Playback session behaviour with a fake engine and resolver

mod common;

use common::{harness, stream_url, tracks, EngineCall, FakeResolver};
use std::sync::Arc;
use std::time::Duration;
use tempo_core::TrackId;
use tempo_playback::{
    EngineStatus, PlayOutcome, PlaybackError, PlaybackEvent, PlaybackState, RepeatMode,
};

fn finished() -> EngineStatus {
    EngineStatus {
        position_ms: 200_000,
        duration_ms: 200_000,
        is_playing: false,
        did_just_finish: true,
    }
}

// ===== Queue navigation =====

#[tokio::test]
async fn next_from_first_loads_second() {
    let h = harness(FakeResolver::default());
    h.session.set_queue(Some(tracks(&["A", "B", "C"])));

    assert_eq!(h.session.play_at_index(0).await.unwrap(), PlayOutcome::Started);
    assert_eq!(h.session.next().await.unwrap(), PlayOutcome::Started);

    let snapshot = h.session.snapshot();
    assert_eq!(snapshot.current_index, Some(1));
    assert_eq!(snapshot.current_track.unwrap().id, TrackId::new("B"));
    assert_eq!(snapshot.state, PlaybackState::Playing);
    assert_eq!(h.engine.loads(), vec![stream_url("A"), stream_url("B")]);
}

#[tokio::test]
async fn finishing_last_track_wraps_to_first() {
    let h = harness(FakeResolver::default());
    h.session.set_queue(Some(tracks(&["A", "B", "C"])));
    h.session.play_at_index(2).await.unwrap();

    h.session.apply_status(finished()).await;

    let snapshot = h.session.snapshot();
    assert_eq!(snapshot.current_index, Some(0));
    assert_eq!(snapshot.current_track.unwrap().id, TrackId::new("A"));
    assert_eq!(h.engine.loads().last(), Some(&stream_url("A")));
}

#[tokio::test]
async fn previous_from_first_wraps_to_last() {
    let h = harness(FakeResolver::default());
    h.session.set_queue(Some(tracks(&["A", "B", "C"])));
    h.session.play_at_index(0).await.unwrap();

    h.session.previous().await.unwrap();
    assert_eq!(h.session.snapshot().current_index, Some(2));
}

#[tokio::test]
async fn next_on_empty_queue_is_noop() {
    let h = harness(FakeResolver::default());
    h.session.set_queue(None);

    assert_eq!(h.session.next().await.unwrap(), PlayOutcome::Skipped);
    assert_eq!(h.session.previous().await.unwrap(), PlayOutcome::Skipped);
    assert!(h.engine.calls().is_empty());
    assert_eq!(h.session.snapshot().state, PlaybackState::Idle);
}

#[tokio::test]
async fn play_at_invalid_index_errors() {
    let h = harness(FakeResolver::default());
    h.session.set_queue(Some(tracks(&["A"])));

    let err = h.session.play_at_index(3).await.unwrap_err();
    assert!(matches!(err, PlaybackError::IndexOutOfBounds(3)));
    assert!(!h.session.snapshot().is_busy);

    h.session.set_queue(None);
    let err = h.session.play_at_index(0).await.unwrap_err();
    assert!(matches!(err, PlaybackError::QueueEmpty));
}

// ===== Play by id =====

#[tokio::test]
async fn play_by_id_uses_queue_position() {
    let h = harness(FakeResolver::default());
    h.session.set_queue(Some(tracks(&["A", "B", "C"])));

    h.session
        .play_track_by_id(&TrackId::new("B"), None, None)
        .await
        .unwrap();
    assert_eq!(h.session.snapshot().current_index, Some(1));
}

#[tokio::test]
async fn direct_play_uses_hints_and_upstream_metadata() {
    let h = harness(FakeResolver::default().with_title("X", "Upstream Title"));

    h.session
        .play_track_by_id(
            &TrackId::new("X"),
            Some("Hint Title"),
            Some("https://img.test/x.jpg"),
        )
        .await
        .unwrap();

    let snapshot = h.session.snapshot();
    let track = snapshot.current_track.unwrap();
    assert_eq!(snapshot.current_index, None);
    assert_eq!(track.title, "Upstream Title");
    assert_eq!(track.artist, "Upstream Channel");
    assert_eq!(track.poster_url, "https://img.test/x.jpg");
    assert_eq!(snapshot.duration_ms, 200_000);
}

#[tokio::test]
async fn direct_play_without_poster_uses_default() {
    let h = harness(FakeResolver::default());
    h.session
        .play_track_by_id(&TrackId::new("Y"), Some("Hint"), None)
        .await
        .unwrap();

    let track = h.session.snapshot().current_track.unwrap();
    assert_eq!(track.poster_url, "https://i.ytimg.com/vi/Y/maxresdefault.jpg");
    // no upstream title for Y, the hint stays
    assert_eq!(track.title, "Hint");
}

#[tokio::test]
async fn playing_current_track_resumes() {
    let h = harness(FakeResolver::default());
    h.session.set_queue(Some(tracks(&["A", "B"])));
    h.session.play_at_index(0).await.unwrap();
    h.session.pause().await.unwrap();
    h.engine.clear();

    let outcome = h
        .session
        .play_track_by_id(&TrackId::new("A"), None, None)
        .await
        .unwrap();

    assert_eq!(outcome, PlayOutcome::Resumed);
    assert_eq!(h.engine.calls(), vec![EngineCall::Play]);
    assert_eq!(h.resolver.requests(), vec!["A".to_string()]);
    assert_eq!(h.session.snapshot().state, PlaybackState::Playing);
}

// ===== Single-flight =====

#[tokio::test]
async fn requests_while_busy_are_dropped() {
    let h = harness(FakeResolver::default());
    h.session.set_queue(Some(tracks(&["A", "B", "C"])));

    let gate = h.resolver.hold();
    let session = Arc::clone(&h.session);
    let first = tokio::spawn(async move { session.play_at_index(0).await });

    gate.entered.notified().await;
    let snapshot = h.session.snapshot();
    assert!(snapshot.is_busy);
    assert_eq!(snapshot.state, PlaybackState::Loading);

    assert_eq!(h.session.play_at_index(1).await.unwrap(), PlayOutcome::Dropped);
    assert_eq!(h.session.next().await.unwrap(), PlayOutcome::Dropped);
    assert!(!h.session.seek(5_000).await.unwrap());

    gate.release.notify_one();
    assert_eq!(first.await.unwrap().unwrap(), PlayOutcome::Started);

    let snapshot = h.session.snapshot();
    assert!(!snapshot.is_busy);
    assert_eq!(snapshot.current_index, Some(0));
    assert_eq!(h.resolver.requests(), vec!["A".to_string()]);
}

#[tokio::test]
async fn stop_during_resolution_supersedes_load() {
    let h = harness(FakeResolver::default());
    h.session.set_queue(Some(tracks(&["A"])));

    let gate = h.resolver.hold();
    let session = Arc::clone(&h.session);
    let pending = tokio::spawn(async move { session.play_at_index(0).await });

    gate.entered.notified().await;
    h.session.stop().await.unwrap();
    gate.release.notify_one();

    assert_eq!(pending.await.unwrap().unwrap(), PlayOutcome::Superseded);
    assert!(h.engine.loads().is_empty());

    let snapshot = h.session.snapshot();
    assert_eq!(snapshot.state, PlaybackState::Idle);
    assert!(snapshot.current_track.is_none());
}

#[tokio::test]
async fn set_queue_during_resolution_restores_previous_state() {
    let h = harness(FakeResolver::default());
    h.session.set_queue(Some(tracks(&["A", "B"])));
    h.session.play_at_index(0).await.unwrap();

    let gate = h.resolver.hold();
    let session = Arc::clone(&h.session);
    let pending = tokio::spawn(async move { session.play_at_index(1).await });

    gate.entered.notified().await;
    h.session.set_queue(Some(tracks(&["C"])));
    gate.release.notify_one();

    assert_eq!(pending.await.unwrap().unwrap(), PlayOutcome::Superseded);
    let snapshot = h.session.snapshot();
    assert_eq!(snapshot.state, PlaybackState::Playing);
    assert_eq!(snapshot.current_track.unwrap().id, TrackId::new("A"));
    assert_eq!(snapshot.current_index, None);
    assert_eq!(h.engine.loads(), vec![stream_url("A")]);
}

#[tokio::test]
async fn set_queue_during_direct_play_keeps_the_load() {
    let h = harness(FakeResolver::default());

    let gate = h.resolver.hold();
    let session = Arc::clone(&h.session);
    let pending = tokio::spawn(async move {
        session
            .play_track_by_id(&TrackId::new("X"), None, None)
            .await
    });

    gate.entered.notified().await;
    h.session.set_queue(Some(tracks(&["A", "B"])));
    gate.release.notify_one();

    assert_eq!(pending.await.unwrap().unwrap(), PlayOutcome::Started);
    let snapshot = h.session.snapshot();
    assert_eq!(snapshot.current_track.unwrap().id, TrackId::new("X"));
    assert_eq!(snapshot.current_index, None);
    assert_eq!(snapshot.queue_len, 2);
    assert_eq!(h.engine.loads(), vec![stream_url("X")]);
}

// ===== Failures =====

#[tokio::test]
async fn unplayable_track_keeps_previous_state() {
    let h = harness(FakeResolver::default().unplayable("B"));
    h.session.set_queue(Some(tracks(&["A", "B"])));
    h.session.play_at_index(0).await.unwrap();
    let mut events = h.session.subscribe();

    let err = h.session.next().await.unwrap_err();
    assert!(matches!(err, PlaybackError::Unplayable { ref track_id, .. } if track_id.as_str() == "B"));

    let snapshot = h.session.snapshot();
    assert_eq!(snapshot.state, PlaybackState::Playing);
    assert_eq!(snapshot.current_index, Some(0));
    assert!(!snapshot.is_busy);

    let mut saw_error = false;
    while let Ok(event) = events.try_recv() {
        if matches!(event, PlaybackEvent::Error { .. }) {
            saw_error = true;
        }
    }
    assert!(saw_error);
}

#[tokio::test]
async fn pause_during_failed_load_stays_paused() {
    let h = harness(FakeResolver::default().unplayable("B"));
    h.session.set_queue(Some(tracks(&["A", "B"])));
    h.session.play_at_index(0).await.unwrap();

    let gate = h.resolver.hold();
    let session = Arc::clone(&h.session);
    let pending = tokio::spawn(async move { session.next().await });

    gate.entered.notified().await;
    h.session.pause().await.unwrap();
    gate.release.notify_one();

    assert!(matches!(
        pending.await.unwrap(),
        Err(PlaybackError::Unplayable { .. })
    ));
    let snapshot = h.session.snapshot();
    assert_eq!(snapshot.state, PlaybackState::Paused);
    assert!(!snapshot.is_playing);
    assert_eq!(snapshot.current_track.unwrap().id, TrackId::new("A"));
}

#[tokio::test]
async fn engine_failure_keeps_queue() {
    let h = harness(FakeResolver::default());
    h.session.set_queue(Some(tracks(&["A", "B"])));
    h.engine.fail_loads(true);

    let err = h.session.play_at_index(0).await.unwrap_err();
    assert!(matches!(err, PlaybackError::Engine(_)));

    let snapshot = h.session.snapshot();
    assert_eq!(snapshot.queue_len, 2);
    assert_eq!(snapshot.state, PlaybackState::Idle);

    h.engine.fail_loads(false);
    assert_eq!(h.session.play_at_index(1).await.unwrap(), PlayOutcome::Started);
}

#[tokio::test]
async fn transport_without_track_errors() {
    let h = harness(FakeResolver::default());
    assert!(matches!(h.session.pause().await, Err(PlaybackError::NoTrackLoaded)));
    assert!(matches!(h.session.resume().await, Err(PlaybackError::NoTrackLoaded)));
    assert!(matches!(h.session.seek(10).await, Err(PlaybackError::NoTrackLoaded)));
}

// ===== Repeat modes =====

#[tokio::test]
async fn cycle_repeat_mode_three_times_is_identity() {
    let h = harness(FakeResolver::default());
    assert_eq!(h.session.cycle_repeat_mode(), RepeatMode::RepeatOne);
    assert_eq!(h.session.cycle_repeat_mode(), RepeatMode::Shuffle);
    assert_eq!(h.session.cycle_repeat_mode(), RepeatMode::Off);
    assert_eq!(h.session.snapshot().repeat_mode, RepeatMode::Off);
}

#[tokio::test]
async fn repeat_one_restarts_without_resolving() {
    let h = harness(FakeResolver::default());
    h.session.set_queue(Some(tracks(&["A", "B"])));
    h.session.play_at_index(0).await.unwrap();
    h.session.cycle_repeat_mode();
    h.engine.clear();

    h.session.apply_status(finished()).await;

    assert_eq!(h.engine.calls(), vec![EngineCall::Seek(0), EngineCall::Play]);
    assert_eq!(h.resolver.requests().len(), 1);
    let snapshot = h.session.snapshot();
    assert_eq!(snapshot.current_index, Some(0));
    assert_eq!(snapshot.position_ms, 0);
    assert_eq!(snapshot.state, PlaybackState::Playing);
}

#[tokio::test]
async fn repeat_one_restarts_direct_play() {
    let h = harness(FakeResolver::default());
    h.session.set_queue(Some(tracks(&["A", "B"])));
    h.session
        .play_track_by_id(&TrackId::new("X"), None, None)
        .await
        .unwrap();
    h.session.cycle_repeat_mode();
    h.engine.clear();

    h.session.apply_status(finished()).await;

    assert_eq!(h.engine.calls(), vec![EngineCall::Seek(0), EngineCall::Play]);
    let snapshot = h.session.snapshot();
    assert_eq!(snapshot.current_track.unwrap().id, TrackId::new("X"));
    assert_eq!(snapshot.current_index, None);
    assert_eq!(snapshot.position_ms, 0);
    assert_eq!(snapshot.state, PlaybackState::Playing);
}

#[tokio::test]
async fn finishing_only_track_rewinds_it() {
    let h = harness(FakeResolver::default());
    h.session.set_queue(Some(tracks(&["A"])));
    h.session.play_at_index(0).await.unwrap();
    h.engine.clear();

    h.session.apply_status(finished()).await;

    assert_eq!(h.engine.calls(), vec![EngineCall::Seek(0), EngineCall::Play]);
    assert_eq!(h.resolver.requests().len(), 1);
    let snapshot = h.session.snapshot();
    assert_eq!(snapshot.current_index, Some(0));
    assert_eq!(snapshot.position_ms, 0);
    assert_eq!(snapshot.state, PlaybackState::Playing);
}

#[tokio::test]
async fn shuffle_finish_on_only_track_rewinds_it() {
    let h = harness(FakeResolver::default());
    h.session.set_queue(Some(tracks(&["A"])));
    h.session.play_at_index(0).await.unwrap();
    h.session.cycle_repeat_mode();
    assert_eq!(h.session.cycle_repeat_mode(), RepeatMode::Shuffle);
    h.engine.clear();

    h.session.apply_status(finished()).await;

    assert_eq!(h.engine.calls(), vec![EngineCall::Seek(0), EngineCall::Play]);
    let snapshot = h.session.snapshot();
    assert_eq!(snapshot.position_ms, 0);
    assert_eq!(snapshot.state, PlaybackState::Playing);
}

#[tokio::test]
async fn shuffle_finish_plays_a_queue_track_from_the_start() {
    let h = harness(FakeResolver::default());
    let queue = tracks(&["A", "B", "C"]);
    h.session.set_queue(Some(queue.clone()));
    h.session.play_at_index(0).await.unwrap();
    h.session.cycle_repeat_mode();
    h.session.cycle_repeat_mode();
    h.engine.clear();

    h.session.apply_status(finished()).await;

    let snapshot = h.session.snapshot();
    let index = snapshot.current_index.unwrap();
    assert!(index < 3);
    assert_eq!(snapshot.current_track.unwrap().id, queue[index].id);
    assert_eq!(snapshot.position_ms, 0);
    assert_eq!(snapshot.state, PlaybackState::Playing);

    let calls = h.engine.calls();
    if index == 0 {
        assert_eq!(calls, vec![EngineCall::Seek(0), EngineCall::Play]);
    } else {
        assert_eq!(h.engine.loads(), vec![stream_url(queue[index].id.as_str())]);
    }
}

#[tokio::test]
async fn finish_with_empty_queue_goes_idle() {
    let h = harness(FakeResolver::default());
    h.session
        .play_track_by_id(&TrackId::new("solo"), None, None)
        .await
        .unwrap();

    h.session.apply_status(finished()).await;

    assert_eq!(h.session.snapshot().state, PlaybackState::Idle);
    assert_eq!(h.engine.loads().len(), 1);
}

// ===== Status reconciliation =====

#[tokio::test]
async fn status_drives_position_and_state() {
    let h = harness(FakeResolver::default());
    h.session.set_queue(Some(tracks(&["A"])));
    h.session.play_at_index(0).await.unwrap();

    h.session
        .apply_status(EngineStatus {
            position_ms: 42_000,
            duration_ms: 180_000,
            is_playing: false,
            did_just_finish: false,
        })
        .await;

    let snapshot = h.session.snapshot();
    assert_eq!(snapshot.position_ms, 42_000);
    assert_eq!(snapshot.duration_ms, 180_000);
    assert_eq!(snapshot.state, PlaybackState::Paused);

    h.session
        .apply_status(EngineStatus {
            position_ms: 43_000,
            duration_ms: 180_000,
            is_playing: true,
            did_just_finish: false,
        })
        .await;
    assert_eq!(h.session.snapshot().state, PlaybackState::Playing);
}

#[tokio::test]
async fn status_loop_advances_on_finish() {
    let h = harness(FakeResolver::default());
    h.session.set_queue(Some(tracks(&["A", "B"])));
    h.session.play_at_index(0).await.unwrap();

    let mut events = h.session.subscribe();
    let (tx, rx) = h.session.status_channel();
    h.session.spawn_status_loop(rx);
    tx.send(finished()).await.unwrap();

    let changed = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Ok(PlaybackEvent::TrackChanged { track_id, index, .. }) = events.recv().await {
                return (track_id, index);
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(changed, (TrackId::new("B"), Some(1)));
    h.session.shutdown().await.unwrap();
    assert_eq!(h.session.snapshot().state, PlaybackState::Idle);
}

#[tokio::test]
async fn seek_updates_position() {
    let h = harness(FakeResolver::default());
    h.session.set_queue(Some(tracks(&["A"])));
    h.session.play_at_index(0).await.unwrap();

    assert!(h.session.seek(30_000).await.unwrap());
    assert_eq!(h.session.snapshot().position_ms, 30_000);
    assert_eq!(h.engine.calls().last(), Some(&EngineCall::Seek(30_000)));
}
