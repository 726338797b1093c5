use crate::models::DayStatus;
use chrono::{Local, NaiveDate};

/// Today's calendar date in the server's local timezone.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn classify_day(date: NaiveDate, completed_tasks: u8, today: NaiveDate) -> DayStatus {
    if date > today {
        DayStatus::Future
    } else if date == today {
        DayStatus::Current
    } else if completed_tasks > 0 {
        DayStatus::Completed
    } else {
        DayStatus::Missed
    }
}

/// Only today's cell can be edited. A completed day is always in the past,
/// so "completed and today" never adds a case.
pub fn is_clickable(status: DayStatus) -> bool {
    status == DayStatus::Current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChallengeState;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn classifies_each_partition() {
        let mut state = ChallengeState::new(ymd(2026, 1, 1));
        let today = ymd(2026, 1, 5);
        state.days[2].completed_tasks = 2;

        let status = |index: usize| {
            let record = &state.days[index];
            classify_day(record.date, record.completed_tasks, today)
        };
        assert_eq!(status(4), DayStatus::Current);
        assert_eq!(status(2), DayStatus::Completed);
        assert_eq!(status(1), DayStatus::Missed);
        assert_eq!(status(9), DayStatus::Future);
    }

    #[test]
    fn today_is_current_regardless_of_count() {
        let today = ymd(2026, 3, 1);
        for count in 0..=3 {
            assert_eq!(classify_day(today, count, today), DayStatus::Current);
        }
    }

    #[test]
    fn only_current_days_are_clickable() {
        let today = ymd(2026, 1, 5);
        assert!(is_clickable(classify_day(today, 0, today)));
        assert!(is_clickable(classify_day(today, 3, today)));
        assert!(!is_clickable(classify_day(ymd(2026, 1, 4), 3, today)));
        assert!(!is_clickable(classify_day(ymd(2026, 1, 4), 0, today)));
        assert!(!is_clickable(classify_day(ymd(2026, 1, 6), 0, today)));
    }
}
