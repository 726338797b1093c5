use crate::models::ChallengeState;
use chrono::NaiveDate;

/// Upper bound on how many past dates a single scan walks.
pub const SCAN_LIMIT: usize = 365;

/// Finds the first past day since the start date with nothing completed.
///
/// Dates are matched to records by day number (`offset + 1`), so a record
/// whose stored date drifted still counts for the day it claims. Dates past
/// day 100 have no record and therefore count as missed.
pub fn first_missed_day(state: &ChallengeState, today: NaiveDate) -> Option<u32> {
    state
        .start_date
        .iter_days()
        .take_while(|date| *date < today)
        .take(SCAN_LIMIT)
        .enumerate()
        .map(|(offset, _)| offset as u32 + 1)
        .find(|day| {
            state
                .days
                .iter()
                .find(|record| record.day == *day)
                .is_none_or(|record| record.completed_tasks == 0)
        })
}
