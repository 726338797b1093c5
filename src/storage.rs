use crate::models::ChallengeState;
use crate::remote::StoreError;
use std::path::Path;
use tokio::fs;
use tracing::{error, warn};

/// Reads the local challenge blob. `None` means the caller should start fresh.
pub async fn load_data(path: &Path) -> Option<ChallengeState> {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice::<ChallengeState>(&bytes) {
            Ok(state) if state.is_well_formed() => Some(state),
            Ok(_) => {
                warn!(path = %path.display(), "local challenge data is malformed, regenerating");
                None
            }
            Err(err) => {
                error!("failed to parse data file: {err}");
                None
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
        Err(err) => {
            error!("failed to read data file: {err}");
            None
        }
    }
}

pub async fn persist_data(path: &Path, state: &ChallengeState) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let payload = serde_json::to_vec_pretty(state)?;
    fs::write(path, payload).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskState;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn persisted_state_reloads_identically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let mut state = ChallengeState::new(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        state.days[3].apply_tasks(TaskState {
            exercise: true,
            programming: false,
            healthy_food: true,
        });

        persist_data(&path, &state).await.unwrap();
        let loaded = load_data(&path).await.unwrap();
        assert_eq!(loaded.days, state.days);
        assert_eq!(loaded.start_date, state.start_date);
    }

    #[tokio::test]
    async fn missing_or_corrupt_file_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        assert!(load_data(&path).await.is_none());

        fs::write(&path, b"{not json").await.unwrap();
        assert!(load_data(&path).await.is_none());
    }

    #[tokio::test]
    async fn truncated_calendar_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let mut state = ChallengeState::new(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        state.days.truncate(40);
        persist_data(&path, &state).await.unwrap();
        assert!(load_data(&path).await.is_none());
    }
}
