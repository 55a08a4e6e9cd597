//! Frequency policy: derive the next execution window from a cadence.

use chrono::{Days, Duration, NaiveDateTime, NaiveTime};

use super::error::EngineError;
use crate::model::Cadence;

/// Compute the boundaries `[start, end)` of the next execution window for
/// `cadence`, relative to `from`.
///
/// `Daily` yields the full calendar day after `from` (midnight to midnight).
/// `Weekly` has no window-generation rule and fails with
/// [`EngineError::UnsupportedFrequency`].
pub fn next_window(
    cadence: &Cadence,
    from: NaiveDateTime,
) -> Result<(NaiveDateTime, NaiveDateTime), EngineError> {
    match cadence {
        Cadence::Daily => {
            let start = (from.date() + Days::new(1)).and_time(NaiveTime::MIN);
            Ok((start, start + Duration::days(1)))
        }
        Cadence::Weekly { .. } => Err(EngineError::UnsupportedFrequency(cadence.kind())),
    }
}
