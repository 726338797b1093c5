use crate::models::{ChallengeState, TOTAL_DAYS};
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChallengeStats {
    pub score: u32,
    pub days_left: u32,
}

pub fn build_stats_at(today: NaiveDate, state: &ChallengeState) -> ChallengeStats {
    ChallengeStats {
        score: score(state),
        days_left: days_left(state, today),
    }
}

pub fn score(state: &ChallengeState) -> u32 {
    state
        .days
        .iter()
        .map(|record| u32::from(record.completed_tasks))
        .sum()
}

pub fn days_left(state: &ChallengeState, today: NaiveDate) -> u32 {
    let total = TOTAL_DAYS as u32;
    if let Some(index) = state.days.iter().position(|record| record.date == today) {
        return total - index as u32;
    }

    // Before the first day, or with no records, the whole challenge remains.
    match state.days.last() {
        Some(last) if last.date < today => 0,
        _ => total,
    }
}
