//! End-to-end tests for the execution-window scheduling engine against
//! in-memory SQLite storage.

use chrono::{NaiveDate, NaiveDateTime};
use taskmaster::engine::{Engine, EngineError, Scheduled};
use taskmaster::model::{Cadence, WindowCandidate, WindowStatus};
use taskmaster::Storage;

async fn test_engine() -> Engine {
    Engine::new(Storage::in_memory().await.unwrap())
}

fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

// Scenario A: default daily frequency yields the next calendar day.
#[tokio::test]
async fn next_window_for_daily_task_is_the_following_day() {
    let engine = test_engine().await;
    let task = engine.create_task("Water plants").await.unwrap();

    let candidate = engine
        .generate_next_window(task.id, at(2024, 1, 10, 15))
        .await
        .unwrap();
    assert_eq!(candidate.start, at(2024, 1, 11, 0));
    assert_eq!(candidate.end, at(2024, 1, 12, 0));
}

// Scenario B: a candidate intersecting an open window reports the overlap.
#[tokio::test]
async fn check_overlap_returns_the_existing_open_window() {
    let engine = test_engine().await;
    let task = engine.create_task("Water plants").await.unwrap();

    let existing = match engine
        .schedule_window(WindowCandidate {
            task_id: task.id,
            start: at(2024, 1, 11, 0),
            end: at(2024, 1, 12, 0),
        })
        .await
        .unwrap()
    {
        Scheduled::Created(w) => w,
        Scheduled::Overlapping(w) => panic!("unexpected overlap with window {}", w.id),
    };

    let candidate = WindowCandidate {
        task_id: task.id,
        start: at(2024, 1, 11, 12),
        end: at(2024, 1, 12, 12),
    };
    let overlap = engine.check_overlap(&candidate).await.unwrap();
    assert_eq!(overlap.map(|w| w.id), Some(existing.id));

    // Probe is read-only: the candidate was not persisted.
    let detail = engine.task_detail(task.id).await.unwrap();
    assert_eq!(detail.windows.len(), 1);
}

// Scenario C: an execution inside an open window hits it.
#[tokio::test]
async fn execution_inside_open_window_marks_it_hit() {
    let engine = test_engine().await;
    let task = engine.create_task("Water plants").await.unwrap();
    let window = engine
        .schedule_window(WindowCandidate {
            task_id: task.id,
            start: at(2024, 1, 11, 0),
            end: at(2024, 1, 12, 0),
        })
        .await
        .unwrap()
        .window()
        .clone();

    let execution = engine
        .record_execution(task.id, at(2024, 1, 11, 8))
        .await
        .unwrap();
    assert_eq!(execution.execution_window_id, Some(window.id));

    let detail = engine.task_detail(task.id).await.unwrap();
    assert_eq!(detail.windows[0].status, WindowStatus::Hit);
}

// Scenario D: with no open windows the execution stands alone.
#[tokio::test]
async fn execution_without_open_window_has_no_window_reference() {
    let engine = test_engine().await;
    let task = engine.create_task("Water plants").await.unwrap();

    let execution = engine
        .record_execution(task.id, at(2024, 1, 11, 8))
        .await
        .unwrap();
    assert_eq!(execution.execution_window_id, None);

    let detail = engine.task_detail(task.id).await.unwrap();
    assert!(detail.windows.is_empty());
}

// Scenario E: replacing daily with weekly persists the new variant.
#[tokio::test]
async fn replace_frequency_switches_variant() {
    let engine = test_engine().await;
    let task = engine.create_task("Water plants").await.unwrap();

    engine
        .replace_frequency(task.id, Cadence::Weekly { day_of_week: 3 })
        .await
        .unwrap();

    let detail = engine.task_detail(task.id).await.unwrap();
    assert_eq!(
        detail.frequency.unwrap().cadence,
        Cadence::Weekly { day_of_week: 3 }
    );
}

#[tokio::test]
async fn weekly_frequency_cannot_generate_windows() {
    let engine = test_engine().await;
    let task = engine.create_task("Bins out").await.unwrap();
    engine
        .replace_frequency(task.id, Cadence::Weekly { day_of_week: 1 })
        .await
        .unwrap();

    let err = engine
        .generate_next_window(task.id, at(2024, 1, 10, 15))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::UnsupportedFrequency("weekly")));
}

#[tokio::test]
async fn schedule_window_never_persists_an_overlapping_candidate() {
    let engine = test_engine().await;
    let task = engine.create_task("Water plants").await.unwrap();

    let first = engine
        .schedule_next_window(task.id, at(2024, 1, 10, 15))
        .await
        .unwrap();
    assert!(matches!(first, Scheduled::Created(_)));

    // Same reference instant derives the same interval, which now overlaps.
    let second = engine
        .schedule_next_window(task.id, at(2024, 1, 10, 18))
        .await
        .unwrap();
    match second {
        Scheduled::Overlapping(w) => assert_eq!(w.id, first.window().id),
        Scheduled::Created(w) => panic!("overlapping window {} was persisted", w.id),
    }

    let detail = engine.task_detail(task.id).await.unwrap();
    assert_eq!(detail.windows.len(), 1);
}

#[tokio::test]
async fn touching_windows_schedule_back_to_back() {
    let engine = test_engine().await;
    let task = engine.create_task("Water plants").await.unwrap();

    for day in [11, 12] {
        let scheduled = engine
            .schedule_window(WindowCandidate {
                task_id: task.id,
                start: at(2024, 1, day, 0),
                end: at(2024, 1, day + 1, 0),
            })
            .await
            .unwrap();
        assert!(matches!(scheduled, Scheduled::Created(_)));
    }
}

// Boundary instants: containment is inclusive on both ends, wider than the
// strict half-open overlap test.
#[tokio::test]
async fn execution_at_window_end_still_hits() {
    let engine = test_engine().await;
    let task = engine.create_task("Water plants").await.unwrap();
    let window = engine
        .schedule_window(WindowCandidate {
            task_id: task.id,
            start: at(2024, 1, 11, 0),
            end: at(2024, 1, 12, 0),
        })
        .await
        .unwrap()
        .window()
        .clone();

    let execution = engine
        .record_execution(task.id, at(2024, 1, 12, 0))
        .await
        .unwrap();
    assert_eq!(execution.execution_window_id, Some(window.id));
}

#[tokio::test]
async fn hit_windows_do_not_reconcile_twice() {
    let engine = test_engine().await;
    let task = engine.create_task("Meds").await.unwrap();
    engine
        .schedule_window(WindowCandidate {
            task_id: task.id,
            start: at(2024, 1, 11, 0),
            end: at(2024, 1, 12, 0),
        })
        .await
        .unwrap();

    let first = engine.record_execution(task.id, at(2024, 1, 11, 8)).await.unwrap();
    assert!(first.execution_window_id.is_some());

    // Window is terminal now; a second execution in the same interval stands alone.
    let second = engine.record_execution(task.id, at(2024, 1, 11, 9)).await.unwrap();
    assert_eq!(second.execution_window_id, None);

    let detail = engine.task_detail(task.id).await.unwrap();
    assert_eq!(detail.executions.len(), 2);
}

// Two containing windows should not normally exist, but if storage holds
// them the earliest start wins, deterministically.
#[tokio::test]
async fn earliest_containing_window_wins() {
    let engine = test_engine().await;
    let task = engine.create_task("Meds").await.unwrap();

    let early = engine
        .schedule_window(WindowCandidate {
            task_id: task.id,
            start: at(2024, 1, 11, 0),
            end: at(2024, 1, 11, 12),
        })
        .await
        .unwrap()
        .window()
        .clone();
    // Touches the first window's end, so the overlap guard admits it; the
    // shared instant 12:00 is inside both under inclusive containment.
    engine
        .schedule_window(WindowCandidate {
            task_id: task.id,
            start: at(2024, 1, 11, 12),
            end: at(2024, 1, 12, 0),
        })
        .await
        .unwrap();

    let execution = engine
        .record_execution(task.id, at(2024, 1, 11, 12))
        .await
        .unwrap();
    assert_eq!(execution.execution_window_id, Some(early.id));
}

#[tokio::test]
async fn unknown_task_is_reported() {
    let engine = test_engine().await;
    let err = engine.record_execution(999, at(2024, 1, 11, 8)).await.unwrap_err();
    assert!(matches!(err, EngineError::TaskNotFound(999)));

    let err = engine.task_detail(999).await.unwrap_err();
    assert!(matches!(err, EngineError::TaskNotFound(999)));
}

#[tokio::test]
async fn closed_windows_never_reopen() {
    let engine = test_engine().await;
    let task = engine.create_task("Meds").await.unwrap();
    let window = engine
        .schedule_window(WindowCandidate {
            task_id: task.id,
            start: at(2024, 1, 11, 0),
            end: at(2024, 1, 12, 0),
        })
        .await
        .unwrap()
        .window()
        .clone();

    engine
        .close_window(window.id, WindowStatus::Skipped)
        .await
        .unwrap();

    let err = engine
        .close_window(window.id, WindowStatus::Missed)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::WindowNotOpen(_)));

    // A skipped window no longer reconciles executions.
    let execution = engine
        .record_execution(task.id, at(2024, 1, 11, 8))
        .await
        .unwrap();
    assert_eq!(execution.execution_window_id, None);
}
