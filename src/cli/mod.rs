//! Command handlers for the taskmaster CLI.
//!
//! Input validation (names, datetimes, interval bounds) happens here, at the
//! boundary — the engine assumes well-formed values.

use anyhow::{bail, Context as _, Result};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::engine::{Engine, Scheduled};
use crate::model::{Cadence, ExecutionWindow, TaskDetail, WindowCandidate, WindowStatus};

/// Coerce loosely formatted user input into a datetime.
///
/// Accepted formats:
/// * `%Y-%m-%d %H:%M`
/// * `%Y-%m-%d` (midnight)
/// * `%m-%d` (current year, midnight)
pub fn fuzzy_datetime(input: &str) -> Result<NaiveDateTime> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M") {
        return Ok(dt);
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN));
    }
    let with_year = format!("{}-{}", Utc::now().year(), input);
    if let Ok(date) = NaiveDate::parse_from_str(&with_year, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN));
    }
    bail!("'{input}' cannot be parsed as a datetime (expected 'YYYY-MM-DD HH:MM', 'YYYY-MM-DD', or 'MM-DD')")
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

pub async fn task_add(engine: &Engine, name: &str, json: bool) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        bail!("task name must not be empty");
    }
    let task = engine.create_task(name).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&task)?);
    } else {
        println!("{} - {}", task.id, task.name);
    }
    Ok(())
}

pub async fn task_list(engine: &Engine, json: bool) -> Result<()> {
    let tasks = engine.list_tasks().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&tasks)?);
        return Ok(());
    }
    for task in tasks {
        println!("{} - {}", task.id, task.name);
    }
    Ok(())
}

pub async fn task_show(engine: &Engine, task_id: i64, json: bool) -> Result<()> {
    let detail = engine.task_detail(task_id).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&detail)?);
        return Ok(());
    }
    print_detail(&detail);
    Ok(())
}

fn print_detail(detail: &TaskDetail) {
    println!("{} - {}", detail.task.id, detail.task.name);
    match &detail.frequency {
        Some(f) => match f.cadence {
            Cadence::Daily => println!("  frequency: daily"),
            Cadence::Weekly { day_of_week } => {
                println!("  frequency: weekly (day {day_of_week})")
            }
        },
        None => println!("  frequency: none"),
    }
    for w in &detail.windows {
        println!("  window {}: [{} .. {}) {}", w.id, w.start, w.end, w.status);
    }
    for e in &detail.executions {
        match e.execution_window_id {
            Some(wid) => println!("  executed {} (window {})", e.executed_at, wid),
            None => println!("  executed {} (no window)", e.executed_at),
        }
    }
}

pub async fn do_task(engine: &Engine, task_id: i64, at: Option<&str>, json: bool) -> Result<()> {
    let executed_at = match at {
        Some(input) => fuzzy_datetime(input)?,
        None => now(),
    };
    let execution = engine.record_execution(task_id, executed_at).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&execution)?);
        return Ok(());
    }
    match execution.execution_window_id {
        Some(wid) => println!(
            "execution {} recorded at {} (hit window {})",
            execution.id, execution.executed_at, wid
        ),
        None => println!(
            "execution {} recorded at {} (no open window)",
            execution.id, execution.executed_at
        ),
    }
    Ok(())
}

pub async fn window_next(engine: &Engine, task_id: i64, json: bool) -> Result<()> {
    let scheduled = engine.schedule_next_window(task_id, now()).await?;
    print_scheduled(&scheduled, json)
}

pub async fn window_add(
    engine: &Engine,
    task_id: i64,
    start: &str,
    end: &str,
    json: bool,
) -> Result<()> {
    let start = fuzzy_datetime(start).context("invalid window start")?;
    let end = fuzzy_datetime(end).context("invalid window end")?;
    if start >= end {
        bail!("window start must be before its end ({start} >= {end})");
    }
    let scheduled = engine
        .schedule_window(WindowCandidate {
            task_id,
            start,
            end,
        })
        .await?;
    print_scheduled(&scheduled, json)
}

fn print_scheduled(scheduled: &Scheduled, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(scheduled.window())?);
        return Ok(());
    }
    match scheduled {
        Scheduled::Created(w) => println!("window {} scheduled: [{} .. {})", w.id, w.start, w.end),
        Scheduled::Overlapping(w) => println!(
            "an open window already covers this interval: window {} [{} .. {})",
            w.id, w.start, w.end
        ),
    }
    Ok(())
}

pub async fn window_close(
    engine: &Engine,
    window_id: i64,
    status: WindowStatus,
    json: bool,
) -> Result<()> {
    let window = engine.close_window(window_id, status).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&window)?);
    } else {
        print_window(&window);
    }
    Ok(())
}

fn print_window(w: &ExecutionWindow) {
    println!("window {}: [{} .. {}) {}", w.id, w.start, w.end, w.status);
}

pub async fn frequency_set(
    engine: &Engine,
    task_id: i64,
    cadence: Cadence,
    json: bool,
) -> Result<()> {
    let frequency = engine.replace_frequency(task_id, cadence).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&frequency)?);
        return Ok(());
    }
    match frequency.cadence {
        Cadence::Daily => println!("task {} frequency set to daily", task_id),
        Cadence::Weekly { day_of_week } => {
            println!("task {} frequency set to weekly (day {})", task_id, day_of_week)
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_datetime() {
        let dt = fuzzy_datetime("2024-01-10 15:00").unwrap();
        assert_eq!(dt.to_string(), "2024-01-10 15:00:00");
    }

    #[test]
    fn parses_date_as_midnight() {
        let dt = fuzzy_datetime("2024-01-10").unwrap();
        assert_eq!(dt.to_string(), "2024-01-10 00:00:00");
    }

    #[test]
    fn parses_month_day_with_current_year() {
        let dt = fuzzy_datetime("01-10").unwrap();
        assert_eq!(dt.date().month(), 1);
        assert_eq!(dt.date().day(), 10);
        assert_eq!(dt.date().year(), Utc::now().year());
        assert_eq!(dt.time(), NaiveTime::MIN);
    }

    #[test]
    fn rejects_garbage() {
        assert!(fuzzy_datetime("not a date").is_err());
        assert!(fuzzy_datetime("2024-13-40").is_err());
    }
}
