pub mod plan;
pub mod remover;
pub mod state;

pub use plan::build_plan;
pub use remover::{BatchReport, Remover, SystemRemover};
pub use state::{execute, RemovalPhase};
