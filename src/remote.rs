//! Per-user document store behind the authenticated backend.
//!
//! Documents are laid out as `users/{uid}` (holding `challengeStartDate`),
//! `users/{uid}/dailyEntries/{id}` and `users/{uid}/dailyEntries/{id}/tasks/{id}`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
};
use tokio::{fs, sync::Mutex};
use tracing::error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("document not found: {0}")]
    NotFound(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("stored start date is unusable: {0}")]
    InvalidStartDate(#[from] crate::calendar::CalendarError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayEntry {
    pub id: String,
    pub date: DateTime<Utc>,
    pub day: u32,
    pub completed_tasks: u8,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDayEntry {
    pub date: DateTime<Utc>,
    pub day: u32,
    pub completed_tasks: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEntry {
    pub id: String,
    pub name: String,
    pub completed: bool,
}

#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn challenge_start_date(&self, user: &UserId) -> Result<Option<String>, StoreError>;
    async fn set_challenge_start_date(&self, user: &UserId, date: &str) -> Result<(), StoreError>;
    async fn list_day_entries(&self, user: &UserId) -> Result<Vec<DayEntry>, StoreError>;
    async fn find_day_entry(&self, user: &UserId, day: u32) -> Result<Option<DayEntry>, StoreError>;
    async fn create_day_entry(&self, user: &UserId, entry: NewDayEntry) -> Result<String, StoreError>;
    async fn update_completed_tasks(
        &self,
        user: &UserId,
        entry_id: &str,
        completed_tasks: u8,
    ) -> Result<(), StoreError>;
    async fn list_tasks(&self, user: &UserId, entry_id: &str) -> Result<Vec<TaskEntry>, StoreError>;
    async fn create_task(
        &self,
        user: &UserId,
        entry_id: &str,
        name: &str,
        completed: bool,
    ) -> Result<String, StoreError>;
    async fn update_task(
        &self,
        user: &UserId,
        entry_id: &str,
        task_id: &str,
        completed: bool,
    ) -> Result<(), StoreError>;
    /// Removes every day entry of the user, tasks included, in one batch.
    /// Returns how many entries were deleted.
    async fn delete_day_entries(&self, user: &UserId) -> Result<usize, StoreError>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredTask {
    name: String,
    completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredEntry {
    date: DateTime<Utc>,
    day: u32,
    completed_tasks: u8,
    created_at: DateTime<Utc>,
    #[serde(default)]
    tasks: BTreeMap<String, StoredTask>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    challenge_start_date: Option<String>,
    #[serde(default)]
    daily_entries: BTreeMap<String, StoredEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreData {
    #[serde(default)]
    users: BTreeMap<String, StoredUser>,
}

/// In-process document tree, optionally mirrored to a JSON file after each write.
pub struct MemoryStore {
    path: Option<PathBuf>,
    data: Mutex<StoreData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            path: None,
            data: Mutex::new(StoreData::default()),
        }
    }

    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let data = match fs::read(path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => StoreData::default(),
            Err(err) => return Err(err.into()),
        };
        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        Ok(Self {
            path: Some(path.to_path_buf()),
            data: Mutex::new(data),
        })
    }

    async fn flush(&self, data: &StoreData) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let payload = serde_json::to_vec_pretty(data)?;
        if let Err(err) = fs::write(path, payload).await {
            error!(path = %path.display(), "failed to write remote store: {err}");
            return Err(err.into());
        }
        Ok(())
    }

    /// Mirrors `next` to disk, then makes it the live tree. On a failed write
    /// the live tree keeps its previous contents.
    async fn commit(&self, live: &mut StoreData, next: StoreData) -> Result<(), StoreError> {
        self.flush(&next).await?;
        *live = next;
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn entry_not_found(user: &UserId, entry_id: &str) -> StoreError {
    StoreError::NotFound(format!("users/{user}/dailyEntries/{entry_id}"))
}

fn to_day_entry(id: &str, entry: &StoredEntry) -> DayEntry {
    DayEntry {
        id: id.to_string(),
        date: entry.date,
        day: entry.day,
        completed_tasks: entry.completed_tasks,
        created_at: entry.created_at,
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn challenge_start_date(&self, user: &UserId) -> Result<Option<String>, StoreError> {
        let data = self.data.lock().await;
        Ok(data
            .users
            .get(user.as_str())
            .and_then(|doc| doc.challenge_start_date.clone()))
    }

    async fn set_challenge_start_date(&self, user: &UserId, date: &str) -> Result<(), StoreError> {
        let mut data = self.data.lock().await;
        let mut next = data.clone();
        next.users
            .entry(user.as_str().to_string())
            .or_default()
            .challenge_start_date = Some(date.to_string());
        self.commit(&mut data, next).await
    }

    async fn list_day_entries(&self, user: &UserId) -> Result<Vec<DayEntry>, StoreError> {
        let data = self.data.lock().await;
        Ok(data
            .users
            .get(user.as_str())
            .map(|doc| {
                doc.daily_entries
                    .iter()
                    .map(|(id, entry)| to_day_entry(id, entry))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default())
    }

    async fn find_day_entry(&self, user: &UserId, day: u32) -> Result<Option<DayEntry>, StoreError> {
        let data = self.data.lock().await;
        Ok(data.users.get(user.as_str()).and_then(|doc| {
            doc.daily_entries
                .iter()
                .find(|(_, entry)| entry.day == day)
                .map(|(id, entry)| to_day_entry(id, entry))
        }))
    }

    async fn create_day_entry(&self, user: &UserId, entry: NewDayEntry) -> Result<String, StoreError> {
        let mut data = self.data.lock().await;
        let mut next = data.clone();
        let id = new_id();
        next.users
            .entry(user.as_str().to_string())
            .or_default()
            .daily_entries
            .insert(
                id.clone(),
                StoredEntry {
                    date: entry.date,
                    day: entry.day,
                    completed_tasks: entry.completed_tasks,
                    created_at: Utc::now(),
                    tasks: BTreeMap::new(),
                },
            );
        self.commit(&mut data, next).await?;
        Ok(id)
    }

    async fn update_completed_tasks(
        &self,
        user: &UserId,
        entry_id: &str,
        completed_tasks: u8,
    ) -> Result<(), StoreError> {
        let mut data = self.data.lock().await;
        let mut next = data.clone();
        let entry = next
            .users
            .get_mut(user.as_str())
            .and_then(|doc| doc.daily_entries.get_mut(entry_id))
            .ok_or_else(|| entry_not_found(user, entry_id))?;
        entry.completed_tasks = completed_tasks;
        self.commit(&mut data, next).await
    }

    async fn list_tasks(&self, user: &UserId, entry_id: &str) -> Result<Vec<TaskEntry>, StoreError> {
        let data = self.data.lock().await;
        let entry = data
            .users
            .get(user.as_str())
            .and_then(|doc| doc.daily_entries.get(entry_id))
            .ok_or_else(|| entry_not_found(user, entry_id))?;
        Ok(entry
            .tasks
            .iter()
            .map(|(id, task)| TaskEntry {
                id: id.clone(),
                name: task.name.clone(),
                completed: task.completed,
            })
            .collect())
    }

    async fn create_task(
        &self,
        user: &UserId,
        entry_id: &str,
        name: &str,
        completed: bool,
    ) -> Result<String, StoreError> {
        let mut data = self.data.lock().await;
        let mut next = data.clone();
        let entry = next
            .users
            .get_mut(user.as_str())
            .and_then(|doc| doc.daily_entries.get_mut(entry_id))
            .ok_or_else(|| entry_not_found(user, entry_id))?;
        let id = new_id();
        entry.tasks.insert(
            id.clone(),
            StoredTask {
                name: name.to_string(),
                completed,
            },
        );
        self.commit(&mut data, next).await?;
        Ok(id)
    }

    async fn update_task(
        &self,
        user: &UserId,
        entry_id: &str,
        task_id: &str,
        completed: bool,
    ) -> Result<(), StoreError> {
        let mut data = self.data.lock().await;
        let mut next = data.clone();
        let task = next
            .users
            .get_mut(user.as_str())
            .and_then(|doc| doc.daily_entries.get_mut(entry_id))
            .and_then(|entry| entry.tasks.get_mut(task_id))
            .ok_or_else(|| {
                StoreError::NotFound(format!(
                    "users/{user}/dailyEntries/{entry_id}/tasks/{task_id}"
                ))
            })?;
        task.completed = completed;
        self.commit(&mut data, next).await
    }

    async fn delete_day_entries(&self, user: &UserId) -> Result<usize, StoreError> {
        let mut data = self.data.lock().await;
        let mut next = data.clone();
        let removed = match next.users.get_mut(user.as_str()) {
            Some(doc) => std::mem::take(&mut doc.daily_entries).len(),
            None => 0,
        };
        if removed > 0 {
            self.commit(&mut data, next).await?;
        }
        Ok(removed)
    }
}
