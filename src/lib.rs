pub mod app;
pub mod backend;
pub mod calendar;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod identity;
pub mod missed;
pub mod models;
pub mod remote;
pub mod session;
pub mod state;
pub mod stats;
pub mod status;
pub mod storage;
pub mod ui;

pub use app::router;
pub use config::AppConfig;
pub use remote::{MemoryStore, RemoteStore};
pub use state::AppState;
