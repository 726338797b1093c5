use crate::calendar::{CalendarError, DEFAULT_START_DATE, parse_start_date};
use chrono::NaiveDate;
use std::{env, path::PathBuf};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub data_path: PathBuf,
    pub remote_store_path: Option<PathBuf>,
    pub default_start: NaiveDate,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, CalendarError> {
        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(8080);
        let default_start = match env::var("CHALLENGE_DEFAULT_START") {
            Ok(value) => parse_start_date(&value)?,
            Err(_) => parse_start_date(DEFAULT_START_DATE)?,
        };

        Ok(Self {
            port,
            data_path: resolve_data_path(),
            remote_store_path: env::var("REMOTE_STORE_PATH").ok().map(PathBuf::from),
            default_start,
        })
    }
}

pub fn resolve_data_path() -> PathBuf {
    if let Ok(path) = env::var("APP_DATA_PATH") {
        return PathBuf::from(path);
    }

    PathBuf::from("data/state.json")
}
