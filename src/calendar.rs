use crate::models::{ChallengeState, DayRecord, TOTAL_DAYS};
use chrono::{Days, NaiveDate};

pub const DEFAULT_START_DATE: &str = "2025-12-23";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalendarError {
    #[error("invalid start date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("start date {0} leaves no room for a {TOTAL_DAYS}-day challenge")]
    OutOfRange(NaiveDate),
}

/// Parses a start date and checks that the whole challenge window exists.
pub fn parse_start_date(value: &str) -> Result<NaiveDate, CalendarError> {
    let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| CalendarError::InvalidDate(value.to_string()))?;
    date.checked_add_days(Days::new(TOTAL_DAYS as u64 - 1))
        .ok_or(CalendarError::OutOfRange(date))?;
    Ok(date)
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Builds the blank 100-day sequence starting at `start`.
pub fn generate_challenge_days(start: NaiveDate) -> Vec<DayRecord> {
    start
        .iter_days()
        .take(TOTAL_DAYS)
        .enumerate()
        .map(|(index, date)| DayRecord::blank(index as u32 + 1, date))
        .collect()
}

/// Calendar date a given 1-based day number falls on.
pub fn date_for_day(start: NaiveDate, day: u32) -> Option<NaiveDate> {
    let offset = day.checked_sub(1)?;
    start.checked_add_days(Days::new(u64::from(offset)))
}

impl ChallengeState {
    pub fn new(start_date: NaiveDate) -> Self {
        Self {
            start_date,
            days: generate_challenge_days(start_date),
        }
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.days.last().map(|record| record.date)
    }

    /// True when the sequence is exactly the 100 contiguous days from `start_date`.
    pub fn is_well_formed(&self) -> bool {
        self.days.len() == TOTAL_DAYS
            && self.days.iter().enumerate().all(|(index, record)| {
                record.day == index as u32 + 1
                    && date_for_day(self.start_date, record.day) == Some(record.date)
                    && record.completed_tasks == record.tasks.completed_count()
            })
    }
}
