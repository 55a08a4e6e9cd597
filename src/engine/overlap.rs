//! Overlap detection between a proposed window and already-open windows.

use crate::model::{ExecutionWindow, WindowCandidate};

/// Return the first open window that overlaps `candidate`, if any.
///
/// Two windows overlap iff `candidate.start < w.end && candidate.end > w.start`
/// (strict half-open comparison); windows that merely touch at an endpoint do
/// not overlap. Iteration order of `open_windows` decides ties; callers that
/// need a specific tie-break must pre-sort.
pub fn find_overlap<'a>(
    open_windows: &'a [ExecutionWindow],
    candidate: &WindowCandidate,
) -> Option<&'a ExecutionWindow> {
    open_windows
        .iter()
        .find(|w| candidate.start < w.end && candidate.end > w.start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WindowStatus;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn open(id: i64, start: NaiveDateTime, end: NaiveDateTime) -> ExecutionWindow {
        ExecutionWindow {
            id,
            task_id: 1,
            start,
            end,
            status: WindowStatus::Open,
        }
    }

    fn candidate(start: NaiveDateTime, end: NaiveDateTime) -> WindowCandidate {
        WindowCandidate {
            task_id: 1,
            start,
            end,
        }
    }

    #[test]
    fn partial_overlap_is_detected() {
        let windows = vec![open(7, at(11, 0), at(12, 0))];
        let cand = candidate(at(11, 12), at(12, 12));
        assert_eq!(find_overlap(&windows, &cand).map(|w| w.id), Some(7));
    }

    #[test]
    fn containment_is_overlap() {
        let windows = vec![open(1, at(11, 0), at(12, 0))];
        let cand = candidate(at(11, 6), at(11, 18));
        assert!(find_overlap(&windows, &cand).is_some());
    }

    #[test]
    fn touching_endpoints_do_not_overlap() {
        let windows = vec![open(1, at(11, 0), at(12, 0))];
        assert!(find_overlap(&windows, &candidate(at(12, 0), at(13, 0))).is_none());
        assert!(find_overlap(&windows, &candidate(at(10, 0), at(11, 0))).is_none());
    }

    #[test]
    fn disjoint_windows_do_not_overlap() {
        let windows = vec![open(1, at(11, 0), at(12, 0))];
        assert!(find_overlap(&windows, &candidate(at(14, 0), at(15, 0))).is_none());
    }

    #[test]
    fn first_overlapping_window_in_iteration_order_wins() {
        let windows = vec![open(3, at(11, 0), at(12, 0)), open(4, at(11, 12), at(13, 0))];
        let cand = candidate(at(11, 6), at(13, 0));
        assert_eq!(find_overlap(&windows, &cand).map(|w| w.id), Some(3));
    }

    #[test]
    fn detection_is_idempotent() {
        let windows = vec![open(1, at(11, 0), at(12, 0))];
        let cand = candidate(at(11, 12), at(12, 12));
        let first = find_overlap(&windows, &cand).map(|w| w.id);
        let second = find_overlap(&windows, &cand).map(|w| w.id);
        assert_eq!(first, second);
    }
}
