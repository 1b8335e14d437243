pub mod app;
pub mod settings;
pub mod uninstall;

pub use app::*;
pub use settings::*;
pub use uninstall::*;
