//! REST backend for a TOEIC learning platform: accounts, lessons with
//! reading and listening exercises, graded submissions, progress tracking,
//! study roadmaps and schedules.

#[cfg(feature = "assessment")]
pub mod assessment;
pub mod auth;
pub mod core;
pub mod exercises;
pub mod lessons;
pub mod main_module;
pub mod progress;
pub mod roadmaps;
#[cfg(feature = "schedules")]
pub mod schedules;
pub mod security;
pub mod users;

pub use crate::core::config::AppConfig;
pub use crate::core::shared::state::AppState;
pub use crate::main_module::{create_router, run_axum_server};
