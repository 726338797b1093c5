use crate::calendar::{date_for_day, date_key, parse_start_date};
use crate::missed::first_missed_day;
use crate::models::{ChallengeState, DayRecord, TOTAL_DAYS, TaskName, TaskState};
use crate::remote::{NewDayEntry, RemoteStore, StoreError, UserId};
use crate::storage::{load_data, persist_data};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::{
    collections::{BTreeMap, HashMap},
    path::PathBuf,
    sync::Arc,
};
use tracing::{error, info, warn};

/// Where a session's challenge lives. Picked once when the session starts.
#[derive(Clone)]
pub enum Backend {
    Local(LocalBackend),
    Remote(RemoteBackend),
}

#[derive(Clone)]
pub struct LocalBackend {
    path: PathBuf,
    default_start: NaiveDate,
}

#[derive(Clone)]
pub struct RemoteBackend {
    user: UserId,
    store: Arc<dyn RemoteStore>,
    default_start: NaiveDate,
}

impl Backend {
    pub fn local(path: PathBuf, default_start: NaiveDate) -> Self {
        Self::Local(LocalBackend {
            path,
            default_start,
        })
    }

    pub fn remote(user: UserId, store: Arc<dyn RemoteStore>, default_start: NaiveDate) -> Self {
        Self::Remote(RemoteBackend {
            user,
            store,
            default_start,
        })
    }

    pub fn mode(&self) -> &'static str {
        match self {
            Backend::Local(_) => "local",
            Backend::Remote(_) => "remote",
        }
    }

    pub fn default_start(&self) -> NaiveDate {
        match self {
            Backend::Local(local) => local.default_start,
            Backend::Remote(remote) => remote.default_start,
        }
    }

    /// Never fails: anything unreadable falls back to a fresh calendar.
    pub async fn load(&self, today: NaiveDate) -> ChallengeState {
        match self {
            Backend::Local(local) => local.load().await,
            Backend::Remote(remote) => remote.load(today).await,
        }
    }

    /// Writes the record at `index` of `state`.
    pub async fn save(&self, state: &ChallengeState, index: usize) -> Result<(), StoreError> {
        match self {
            Backend::Local(local) => persist_data(&local.path, state).await,
            Backend::Remote(remote) => remote.save(state, index).await,
        }
    }

    /// Restarts the challenge from `today`. Store failures are logged only.
    pub async fn reset(&self, today: NaiveDate) -> ChallengeState {
        match self {
            Backend::Local(local) => local.reset(today).await,
            Backend::Remote(remote) => remote.reset(today).await,
        }
    }
}

impl LocalBackend {
    async fn load(&self) -> ChallengeState {
        if let Some(state) = load_data(&self.path).await {
            return state;
        }

        let state = ChallengeState::new(self.default_start);
        if let Err(err) = persist_data(&self.path, &state).await {
            error!(path = %self.path.display(), "failed to write fresh challenge: {err}");
        }
        state
    }

    async fn reset(&self, today: NaiveDate) -> ChallengeState {
        let state = ChallengeState::new(today);
        if let Err(err) = persist_data(&self.path, &state).await {
            error!(path = %self.path.display(), "failed to write reset challenge: {err}");
        }
        state
    }
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

impl RemoteBackend {
    async fn load(&self, today: NaiveDate) -> ChallengeState {
        match self.fetch().await {
            Ok(state) => match first_missed_day(&state, today) {
                Some(day) => {
                    info!(user = %self.user, day, "day {day} was missed, restarting challenge");
                    self.reset(today).await
                }
                None => state,
            },
            Err(err) => {
                error!(user = %self.user, "error fetching challenge data: {err}");
                ChallengeState::new(self.default_start)
            }
        }
    }

    async fn start_date(&self) -> Result<NaiveDate, StoreError> {
        match self.store.challenge_start_date(&self.user).await? {
            Some(value) => Ok(parse_start_date(&value)?),
            None => {
                self.store
                    .set_challenge_start_date(&self.user, &date_key(self.default_start))
                    .await?;
                Ok(self.default_start)
            }
        }
    }

    async fn fetch(&self) -> Result<ChallengeState, StoreError> {
        let start = self.start_date().await?;
        let mut fetched: BTreeMap<u32, DayRecord> = BTreeMap::new();

        for entry in self.store.list_day_entries(&self.user).await? {
            let expected = match date_for_day(start, entry.day) {
                Some(date) if (1..=TOTAL_DAYS as u32).contains(&entry.day) => date,
                _ => {
                    warn!(user = %self.user, day = entry.day, "ignoring entry outside the challenge");
                    continue;
                }
            };

            let mut tasks = TaskState::default();
            for task in self.store.list_tasks(&self.user, &entry.id).await? {
                if let Some(name) = TaskName::parse(&task.name) {
                    tasks.set(name, task.completed);
                }
            }

            let stored_date = entry.date.date_naive();
            if stored_date != expected {
                warn!(
                    user = %self.user,
                    day = entry.day,
                    "entry dated {stored_date} does not match day {}; using {expected}",
                    entry.day
                );
            }

            let mut record = DayRecord::blank(entry.day, expected);
            record.apply_tasks(tasks);
            if record.completed_tasks != entry.completed_tasks {
                warn!(
                    user = %self.user,
                    day = entry.day,
                    stored = entry.completed_tasks,
                    derived = record.completed_tasks,
                    "completed count disagrees with task records"
                );
            }
            fetched.insert(entry.day, record);
        }

        let mut state = ChallengeState::new(start);
        for record in state.days.iter_mut() {
            if let Some(found) = fetched.remove(&record.day) {
                *record = found;
            }
        }
        Ok(state)
    }

    async fn save(&self, state: &ChallengeState, index: usize) -> Result<(), StoreError> {
        let record = state
            .days
            .get(index)
            .ok_or_else(|| StoreError::NotFound(format!("day index {index}")))?;

        let entry_id = match self.store.find_day_entry(&self.user, record.day).await? {
            Some(entry) => {
                self.store
                    .update_completed_tasks(&self.user, &entry.id, record.completed_tasks)
                    .await?;
                entry.id
            }
            None => {
                self.store
                    .create_day_entry(
                        &self.user,
                        NewDayEntry {
                            date: midnight_utc(record.date),
                            day: record.day,
                            completed_tasks: record.completed_tasks,
                        },
                    )
                    .await?
            }
        };

        let existing: HashMap<String, String> = self
            .store
            .list_tasks(&self.user, &entry_id)
            .await?
            .into_iter()
            .map(|task| (task.name, task.id))
            .collect();

        for name in TaskName::ALL {
            let completed = record.tasks.get(name);
            match existing.get(name.as_str()) {
                Some(task_id) => {
                    self.store
                        .update_task(&self.user, &entry_id, task_id, completed)
                        .await?
                }
                None => {
                    self.store
                        .create_task(&self.user, &entry_id, name.as_str(), completed)
                        .await?;
                }
            }
        }
        Ok(())
    }

    async fn reset(&self, today: NaiveDate) -> ChallengeState {
        match self.store.delete_day_entries(&self.user).await {
            Ok(deleted) => info!(user = %self.user, deleted, "cleared challenge entries"),
            Err(err) => {
                // Old entries are keyed by day number; moving the start date
                // under them would shift them onto the new calendar.
                error!(user = %self.user, "failed to clear challenge entries, keeping start date: {err}");
                return ChallengeState::new(today);
            }
        }
        if let Err(err) = self
            .store
            .set_challenge_start_date(&self.user, &date_key(today))
            .await
        {
            error!(user = %self.user, "failed to store new start date: {err}");
        }
        ChallengeState::new(today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{DayEntry, MemoryStore, TaskEntry};
    use async_trait::async_trait;
    use chrono::Duration;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn user() -> UserId {
        UserId::new("runner")
    }

    fn all_done() -> TaskState {
        TaskState {
            exercise: true,
            programming: true,
            healthy_food: true,
        }
    }

    fn remote(store: Arc<MemoryStore>) -> Backend {
        Backend::remote(user(), store, ymd(2025, 12, 23))
    }

    async fn save_day(backend: &Backend, state: &mut ChallengeState, index: usize, tasks: TaskState) {
        state.days[index].apply_tasks(tasks);
        backend.save(state, index).await.unwrap();
    }

    struct DownStore;

    #[async_trait]
    impl RemoteStore for DownStore {
        async fn challenge_start_date(&self, _: &UserId) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable("offline".into()))
        }
        async fn set_challenge_start_date(&self, _: &UserId, _: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("offline".into()))
        }
        async fn list_day_entries(&self, _: &UserId) -> Result<Vec<DayEntry>, StoreError> {
            Err(StoreError::Unavailable("offline".into()))
        }
        async fn find_day_entry(&self, _: &UserId, _: u32) -> Result<Option<DayEntry>, StoreError> {
            Err(StoreError::Unavailable("offline".into()))
        }
        async fn create_day_entry(&self, _: &UserId, _: NewDayEntry) -> Result<String, StoreError> {
            Err(StoreError::Unavailable("offline".into()))
        }
        async fn update_completed_tasks(&self, _: &UserId, _: &str, _: u8) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("offline".into()))
        }
        async fn list_tasks(&self, _: &UserId, _: &str) -> Result<Vec<TaskEntry>, StoreError> {
            Err(StoreError::Unavailable("offline".into()))
        }
        async fn create_task(&self, _: &UserId, _: &str, _: &str, _: bool) -> Result<String, StoreError> {
            Err(StoreError::Unavailable("offline".into()))
        }
        async fn update_task(&self, _: &UserId, _: &str, _: &str, _: bool) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("offline".into()))
        }
        async fn delete_day_entries(&self, _: &UserId) -> Result<usize, StoreError> {
            Err(StoreError::Unavailable("offline".into()))
        }
    }

    #[tokio::test]
    async fn first_remote_load_initializes_default_start() {
        let store = Arc::new(MemoryStore::new());
        let backend = remote(store.clone());
        let today = ymd(2025, 12, 23);

        let state = backend.load(today).await;
        assert_eq!(state.start_date, today);
        assert!(state.is_well_formed());
        assert_eq!(
            store.challenge_start_date(&user()).await.unwrap().as_deref(),
            Some("2025-12-23")
        );
    }

    #[tokio::test]
    async fn saved_days_survive_reload() {
        let store = Arc::new(MemoryStore::new());
        let backend = remote(store.clone());
        let today = ymd(2025, 12, 25);
        store
            .set_challenge_start_date(&user(), "2025-12-23")
            .await
            .unwrap();

        let mut state = backend.load(ymd(2025, 12, 23)).await;
        save_day(&backend, &mut state, 0, all_done()).await;
        save_day(
            &backend,
            &mut state,
            1,
            TaskState {
                programming: true,
                ..TaskState::default()
            },
        )
        .await;

        let reloaded = backend.load(today).await;
        assert_eq!(reloaded.days, state.days);
        assert_eq!(reloaded.days[1].completed_tasks, 1);
        assert!(reloaded.days[1].tasks.programming);
    }

    #[tokio::test]
    async fn saving_twice_updates_instead_of_duplicating() {
        let store = Arc::new(MemoryStore::new());
        let backend = remote(store.clone());
        let mut state = backend.load(ymd(2025, 12, 23)).await;

        save_day(&backend, &mut state, 0, all_done()).await;
        save_day(
            &backend,
            &mut state,
            0,
            TaskState {
                exercise: true,
                ..TaskState::default()
            },
        )
        .await;

        let entries = store.list_day_entries(&user()).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].completed_tasks, 1);
        assert_eq!(entries[0].date, midnight_utc(ymd(2025, 12, 23)));
        let tasks = store.list_tasks(&user(), &entries[0].id).await.unwrap();
        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks.iter().filter(|task| task.completed).count(), 1);
    }

    #[tokio::test]
    async fn missed_day_triggers_reset() {
        let store = Arc::new(MemoryStore::new());
        let backend = remote(store.clone());
        let today = ymd(2026, 1, 6);
        let start = today - Duration::days(5);
        store
            .set_challenge_start_date(&user(), &date_key(start))
            .await
            .unwrap();

        let mut state = ChallengeState::new(start);
        for index in 0..3 {
            save_day(&backend, &mut state, index, all_done()).await;
        }

        let loaded = backend.load(today).await;
        assert_eq!(loaded.start_date, today);
        assert_eq!(loaded, ChallengeState::new(today));
        assert!(store.list_day_entries(&user()).await.unwrap().is_empty());
        assert_eq!(
            store.challenge_start_date(&user()).await.unwrap(),
            Some(date_key(today))
        );
    }

    #[tokio::test]
    async fn zero_count_entry_also_triggers_reset() {
        let store = Arc::new(MemoryStore::new());
        let backend = remote(store.clone());
        let today = ymd(2026, 1, 6);
        let start = today - Duration::days(5);
        store
            .set_challenge_start_date(&user(), &date_key(start))
            .await
            .unwrap();

        let mut state = ChallengeState::new(start);
        for index in 0..3 {
            save_day(&backend, &mut state, index, all_done()).await;
        }
        save_day(&backend, &mut state, 3, TaskState::default()).await;
        save_day(&backend, &mut state, 4, all_done()).await;

        let loaded = backend.load(today).await;
        assert_eq!(loaded, ChallengeState::new(today));
    }

    #[tokio::test]
    async fn unbroken_streak_is_kept() {
        let store = Arc::new(MemoryStore::new());
        let backend = remote(store.clone());
        let today = ymd(2026, 1, 6);
        let start = today - Duration::days(5);
        store
            .set_challenge_start_date(&user(), &date_key(start))
            .await
            .unwrap();

        let mut state = ChallengeState::new(start);
        for index in 0..5 {
            save_day(&backend, &mut state, index, all_done()).await;
        }

        let loaded = backend.load(today).await;
        assert_eq!(loaded.start_date, start);
        assert_eq!(loaded.days[4].completed_tasks, 3);
    }

    #[tokio::test]
    async fn reset_twice_yields_same_calendar() {
        let store = Arc::new(MemoryStore::new());
        let backend = remote(store.clone());
        let today = ymd(2026, 2, 1);
        let mut state = backend.load(today).await;
        save_day(&backend, &mut state, 0, all_done()).await;

        let first = backend.reset(today).await;
        assert!(store.list_day_entries(&user()).await.unwrap().is_empty());
        let second = backend.reset(today).await;
        assert_eq!(first, second);
        assert_eq!(second, ChallengeState::new(today));
        assert_eq!(store.delete_day_entries(&user()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unknown_task_names_are_ignored() {
        let store = Arc::new(MemoryStore::new());
        let backend = remote(store.clone());
        let start = ymd(2026, 1, 1);
        store
            .set_challenge_start_date(&user(), &date_key(start))
            .await
            .unwrap();
        let entry = store
            .create_day_entry(
                &user(),
                NewDayEntry {
                    date: midnight_utc(start),
                    day: 1,
                    completed_tasks: 2,
                },
            )
            .await
            .unwrap();
        store.create_task(&user(), &entry, "exercise", true).await.unwrap();
        store.create_task(&user(), &entry, "meditation", true).await.unwrap();

        let state = backend.load(start).await;
        assert!(state.days[0].tasks.exercise);
        assert!(!state.days[0].tasks.programming);
        assert_eq!(state.days[0].completed_tasks, 1);
    }

    #[tokio::test]
    async fn drifted_dates_and_stray_days_are_reconciled() {
        let store = Arc::new(MemoryStore::new());
        let backend = remote(store.clone());
        let start = ymd(2026, 1, 1);
        store
            .set_challenge_start_date(&user(), &date_key(start))
            .await
            .unwrap();
        for (day, date) in [(1, ymd(2026, 1, 2)), (250, ymd(2026, 9, 7))] {
            let entry = store
                .create_day_entry(
                    &user(),
                    NewDayEntry {
                        date: midnight_utc(date),
                        day,
                        completed_tasks: 1,
                    },
                )
                .await
                .unwrap();
            store.create_task(&user(), &entry, "exercise", true).await.unwrap();
        }

        let state = backend.load(start).await;
        assert!(state.is_well_formed());
        assert_eq!(state.days[0].date, start);
        assert_eq!(state.days[0].completed_tasks, 1);
        assert_eq!(state.days[1].completed_tasks, 0);
    }

    #[tokio::test]
    async fn unreachable_store_falls_back_to_default_calendar() {
        let backend = Backend::remote(user(), Arc::new(DownStore), ymd(2025, 12, 23));
        let state = backend.load(ymd(2026, 3, 1)).await;
        assert_eq!(state, ChallengeState::new(ymd(2025, 12, 23)));

        let reset = backend.reset(ymd(2026, 3, 1)).await;
        assert_eq!(reset, ChallengeState::new(ymd(2026, 3, 1)));

        assert!(backend.save(&state, 0).await.is_err());
    }

    /// Delegates to a `MemoryStore` but refuses to delete entries.
    struct StuckEntries(MemoryStore);

    #[async_trait]
    impl RemoteStore for StuckEntries {
        async fn challenge_start_date(&self, user: &UserId) -> Result<Option<String>, StoreError> {
            self.0.challenge_start_date(user).await
        }
        async fn set_challenge_start_date(&self, user: &UserId, date: &str) -> Result<(), StoreError> {
            self.0.set_challenge_start_date(user, date).await
        }
        async fn list_day_entries(&self, user: &UserId) -> Result<Vec<DayEntry>, StoreError> {
            self.0.list_day_entries(user).await
        }
        async fn find_day_entry(&self, user: &UserId, day: u32) -> Result<Option<DayEntry>, StoreError> {
            self.0.find_day_entry(user, day).await
        }
        async fn create_day_entry(&self, user: &UserId, entry: NewDayEntry) -> Result<String, StoreError> {
            self.0.create_day_entry(user, entry).await
        }
        async fn update_completed_tasks(&self, user: &UserId, id: &str, count: u8) -> Result<(), StoreError> {
            self.0.update_completed_tasks(user, id, count).await
        }
        async fn list_tasks(&self, user: &UserId, id: &str) -> Result<Vec<TaskEntry>, StoreError> {
            self.0.list_tasks(user, id).await
        }
        async fn create_task(&self, user: &UserId, id: &str, name: &str, done: bool) -> Result<String, StoreError> {
            self.0.create_task(user, id, name, done).await
        }
        async fn update_task(&self, user: &UserId, id: &str, task: &str, done: bool) -> Result<(), StoreError> {
            self.0.update_task(user, id, task, done).await
        }
        async fn delete_day_entries(&self, _: &UserId) -> Result<usize, StoreError> {
            Err(StoreError::Unavailable("delete rejected".into()))
        }
    }

    #[tokio::test]
    async fn failed_clear_keeps_old_start_date() {
        let store = Arc::new(StuckEntries(MemoryStore::new()));
        let backend = Backend::remote(user(), store.clone(), ymd(2025, 12, 23));
        let start = ymd(2026, 1, 1);
        let today = ymd(2026, 1, 2);
        store
            .set_challenge_start_date(&user(), &date_key(start))
            .await
            .unwrap();
        let mut state = ChallengeState::new(start);
        save_day(&backend, &mut state, 0, all_done()).await;

        let reset = backend.reset(today).await;
        assert_eq!(reset, ChallengeState::new(today));
        assert_eq!(
            store.challenge_start_date(&user()).await.unwrap(),
            Some(date_key(start))
        );

        // The surviving day 1 entry still belongs to the old calendar.
        let reloaded = backend.load(today).await;
        assert_eq!(reloaded.start_date, start);
        assert_eq!(reloaded.days[0].date, start);
        assert_eq!(reloaded.days[0].completed_tasks, 3);
        assert_eq!(reloaded.days[1].completed_tasks, 0);
    }

    #[tokio::test]
    async fn corrupt_start_date_falls_back() {
        let store = Arc::new(MemoryStore::new());
        store
            .set_challenge_start_date(&user(), "not a date")
            .await
            .unwrap();
        let state = remote(store).load(ymd(2026, 1, 1)).await;
        assert_eq!(state, ChallengeState::new(ymd(2025, 12, 23)));
    }

    #[tokio::test]
    async fn local_backend_materializes_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let backend = Backend::local(path.clone(), ymd(2025, 12, 23));

        let mut state = backend.load(ymd(2026, 1, 1)).await;
        assert_eq!(state, ChallengeState::new(ymd(2025, 12, 23)));
        assert!(path.exists());

        save_day(&backend, &mut state, 9, all_done()).await;
        let reloaded = backend.load(ymd(2026, 1, 1)).await;
        assert_eq!(reloaded.days, state.days);

        let reset = backend.reset(ymd(2026, 1, 1)).await;
        assert_eq!(backend.load(ymd(2026, 1, 1)).await, reset);
        assert_eq!(reset.start_date, ymd(2026, 1, 1));
    }

    #[tokio::test]
    async fn local_backend_has_no_missed_day_rule() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let backend = Backend::local(path, ymd(2025, 12, 23));
        let state = backend.load(ymd(2026, 2, 1)).await;
        assert_eq!(state.start_date, ymd(2025, 12, 23));
    }
}
