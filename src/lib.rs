pub mod commands;
pub mod detection;
pub mod executor;
pub mod models;
pub mod utils;

pub use commands::uninstall::Uninstaller;
pub use models::{
    Application, CandidateArtifact, ExecuteConfig, Identity, RemovalOutcome, RemovalPlan,
    RemovalStatus, UninstallSettings, UninstallSummary,
};
pub use utils::{AppError, AppResult};
