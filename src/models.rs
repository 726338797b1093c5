use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const TOTAL_DAYS: usize = 100;
pub const TASKS_PER_DAY: u8 = 3;
pub const MAX_SCORE: u32 = TOTAL_DAYS as u32 * TASKS_PER_DAY as u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskState {
    #[serde(default)]
    pub exercise: bool,
    #[serde(default)]
    pub programming: bool,
    #[serde(default)]
    pub healthy_food: bool,
}

impl TaskState {
    pub fn completed_count(&self) -> u8 {
        TaskName::ALL.iter().filter(|name| self.get(**name)).count() as u8
    }

    pub fn get(&self, name: TaskName) -> bool {
        match name {
            TaskName::Exercise => self.exercise,
            TaskName::Programming => self.programming,
            TaskName::HealthyFood => self.healthy_food,
        }
    }

    pub fn set(&mut self, name: TaskName, completed: bool) {
        match name {
            TaskName::Exercise => self.exercise = completed,
            TaskName::Programming => self.programming = completed,
            TaskName::HealthyFood => self.healthy_food = completed,
        }
    }
}

/// The three fixed tasks, named the way the remote store names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskName {
    Exercise,
    Programming,
    HealthyFood,
}

impl TaskName {
    pub const ALL: [TaskName; 3] = [
        TaskName::Exercise,
        TaskName::Programming,
        TaskName::HealthyFood,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskName::Exercise => "exercise",
            TaskName::Programming => "programming",
            TaskName::HealthyFood => "healthyFood",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|task| task.as_str() == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayRecord {
    pub day: u32,
    pub date: NaiveDate,
    pub completed_tasks: u8,
    pub tasks: TaskState,
}

impl DayRecord {
    pub fn blank(day: u32, date: NaiveDate) -> Self {
        Self {
            day,
            date,
            completed_tasks: 0,
            tasks: TaskState::default(),
        }
    }

    /// Overwrites the tasks and recomputes the derived count.
    pub fn apply_tasks(&mut self, tasks: TaskState) {
        self.completed_tasks = tasks.completed_count();
        self.tasks = tasks;
    }
}

/// The serialized shape kept in local storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeState {
    pub start_date: NaiveDate,
    pub days: Vec<DayRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayStatus {
    /// Reserved; no current rule produces it.
    Locked,
    Current,
    Future,
    Completed,
    Missed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Pending,
    #[default]
    Confirmed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Uninitialized,
    Loading,
    Ready,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub user_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignInResponse {
    pub token: String,
    pub user_id: String,
    pub expires_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IdentityResponse {
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DayView {
    pub day: u32,
    pub date: String,
    pub completed_tasks: u8,
    pub tasks: TaskState,
    pub status: DayStatus,
    pub clickable: bool,
    pub sync: SyncStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DialogView {
    pub open: bool,
    pub index: Option<usize>,
    pub day: Option<u32>,
    pub tasks: TaskState,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChallengeView {
    pub mode: String,
    pub phase: Phase,
    pub today: String,
    pub start_date: String,
    pub end_date: String,
    pub score: u32,
    pub max_score: u32,
    pub days_left: u32,
    pub dialog: DialogView,
    pub days: Vec<DayView>,
}
