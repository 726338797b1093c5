use crate::backend::Backend;
use crate::calendar::date_key;
use crate::errors::AppError;
use crate::models::{
    ChallengeState, ChallengeView, DayView, DialogView, Phase, SyncStatus, TaskState,
};
use crate::stats::build_stats_at;
use crate::status::{classify_day, is_clickable};
use chrono::NaiveDate;
use std::{collections::BTreeMap, sync::Arc};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error};

/// Everything one signed-in (or anonymous) visitor is looking at.
pub struct ChallengeSession {
    backend: Backend,
    phase: Phase,
    state: ChallengeState,
    loaded_on: Option<NaiveDate>,
    sync: BTreeMap<u32, SyncStatus>,
    selected: Option<usize>,
    dialog_open: bool,
}

impl ChallengeSession {
    fn new(backend: Backend) -> Self {
        let state = ChallengeState {
            start_date: backend.default_start(),
            days: Vec::new(),
        };
        Self {
            backend,
            phase: Phase::Uninitialized,
            state,
            loaded_on: None,
            sync: BTreeMap::new(),
            selected: None,
            dialog_open: false,
        }
    }

    fn is_fresh(&self, today: NaiveDate) -> bool {
        self.phase == Phase::Ready && self.loaded_on == Some(today)
    }

    /// Replaces the cached challenge after a load or reset. An open dialog
    /// survives only while the calendar keeps its start date.
    fn adopt(&mut self, state: ChallengeState, today: NaiveDate) {
        if state.start_date != self.state.start_date {
            self.close_dialog();
        }
        self.state = state;
        self.loaded_on = Some(today);
        self.sync.clear();
        self.phase = Phase::Ready;
    }

    fn close_dialog(&mut self) {
        self.selected = None;
        self.dialog_open = false;
    }

    fn view(&self, today: NaiveDate) -> ChallengeView {
        let stats = build_stats_at(today, &self.state);
        let days = self
            .state
            .days
            .iter()
            .map(|record| {
                let status = classify_day(record.date, record.completed_tasks, today);
                DayView {
                    day: record.day,
                    date: date_key(record.date),
                    completed_tasks: record.completed_tasks,
                    tasks: record.tasks,
                    status,
                    clickable: is_clickable(status),
                    sync: self.sync.get(&record.day).copied().unwrap_or_default(),
                }
            })
            .collect();

        let selected = self
            .selected
            .filter(|_| self.dialog_open)
            .and_then(|index| self.state.days.get(index).map(|record| (index, record)));

        ChallengeView {
            mode: self.backend.mode().to_string(),
            phase: self.phase,
            today: date_key(today),
            start_date: date_key(self.state.start_date),
            end_date: self.state.end_date().map(date_key).unwrap_or_default(),
            score: stats.score,
            max_score: crate::models::MAX_SCORE,
            days_left: stats.days_left,
            dialog: DialogView {
                open: selected.is_some(),
                index: selected.map(|(index, _)| index),
                day: selected.map(|(_, record)| record.day),
                tasks: selected.map(|(_, record)| record.tasks).unwrap_or_default(),
            },
            days,
        }
    }
}

/// Shared handle to a session.
///
/// Lock order is `writes` then `session`. Backend saves, loads and resets
/// all run under `writes`, one at a time and in the order they were issued.
/// A reload therefore never overtakes a save still in flight.
#[derive(Clone)]
pub struct SessionHandle {
    session: Arc<Mutex<ChallengeSession>>,
    writes: Arc<Mutex<()>>,
}

impl SessionHandle {
    pub fn new(backend: Backend) -> Self {
        Self {
            session: Arc::new(Mutex::new(ChallengeSession::new(backend))),
            writes: Arc::new(Mutex::new(())),
        }
    }

    /// Locks the session, loading first if nothing was loaded for `today`.
    async fn ready(&self, today: NaiveDate) -> MutexGuard<'_, ChallengeSession> {
        {
            let session = self.session.lock().await;
            if session.is_fresh(today) {
                return session;
            }
        }
        self.reload(today).await
    }

    /// Rebuilds the cache from the backend once pending writes have landed.
    async fn reload(&self, today: NaiveDate) -> MutexGuard<'_, ChallengeSession> {
        let _writes = self.writes.lock().await;
        let mut session = self.session.lock().await;
        session.phase = Phase::Loading;
        let backend = session.backend.clone();
        let state = backend.load(today).await;
        session.adopt(state, today);
        session
    }

    /// Reloads from the backend and renders the result.
    pub async fn view(&self, today: NaiveDate) -> ChallengeView {
        self.reload(today).await.view(today)
    }

    /// Selects a day and opens its task dialog. Only editable days open.
    pub async fn open_day(&self, index: usize, today: NaiveDate) -> Result<ChallengeView, AppError> {
        let mut session = self.ready(today).await;
        let record = session
            .state
            .days
            .get(index)
            .ok_or_else(|| AppError::not_found(format!("no day at index {index}")))?;
        let status = classify_day(record.date, record.completed_tasks, today);
        if !is_clickable(status) {
            return Err(AppError::conflict(format!(
                "day {} cannot be edited today",
                record.day
            )));
        }
        session.selected = Some(index);
        session.dialog_open = true;
        Ok(session.view(today))
    }

    pub async fn close_dialog(&self, today: NaiveDate) -> ChallengeView {
        let mut session = self.ready(today).await;
        session.close_dialog();
        session.view(today)
    }

    /// Saves the dialog's day and closes the dialog.
    pub async fn save_selected(
        &self,
        tasks: TaskState,
        today: NaiveDate,
    ) -> Result<ChallengeView, AppError> {
        let index = {
            let session = self.ready(today).await;
            session
                .selected
                .filter(|_| session.dialog_open)
                .ok_or_else(|| AppError::conflict("no day is selected"))?
        };

        self.save_day(index, tasks, today).await?;

        let mut session = self.session.lock().await;
        session.close_dialog();
        Ok(session.view(today))
    }

    /// Applies `tasks` to the cached day and tags it `pending`, then writes it
    /// through the backend without holding the session lock. Write failures
    /// only flip the day's sync tag to `failed`.
    pub async fn save_day(
        &self,
        index: usize,
        tasks: TaskState,
        today: NaiveDate,
    ) -> Result<(), AppError> {
        drop(self.ready(today).await);

        let _writes = self.writes.lock().await;
        let (backend, snapshot, day) = {
            let mut session = self.session.lock().await;
            let record = session
                .state
                .days
                .get_mut(index)
                .ok_or_else(|| AppError::not_found(format!("no day at index {index}")))?;
            record.apply_tasks(tasks);
            let day = record.day;
            session.sync.insert(day, SyncStatus::Pending);
            (session.backend.clone(), session.state.clone(), day)
        };

        let outcome = backend.save(&snapshot, index).await;

        let mut session = self.session.lock().await;
        match outcome {
            Ok(()) => {
                debug!(day, mode = backend.mode(), "day saved");
                session.sync.insert(day, SyncStatus::Confirmed);
            }
            Err(err) => {
                error!(day, mode = backend.mode(), "error saving day: {err}");
                session.sync.insert(day, SyncStatus::Failed);
            }
        }
        Ok(())
    }

    /// Restarts the challenge from today and adopts the fresh calendar.
    pub async fn reset(&self, today: NaiveDate) -> ChallengeView {
        let _writes = self.writes.lock().await;
        let mut session = self.session.lock().await;
        session.phase = Phase::Loading;
        let backend = session.backend.clone();
        let state = backend.reset(today).await;
        session.adopt(state, today);
        session.close_dialog();
        session.view(today)
    }
}
