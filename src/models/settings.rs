use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::utils::AppResult;

/// User preferences read by the uninstall core. Never written back by it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UninstallSettings {
    /// Skip the unprivileged pass and go straight to one escalated batch.
    pub always_elevate: bool,
    /// Path prefixes that are never part of a removal plan. `~/` is allowed.
    pub excluded_paths: Vec<String>,
    /// Pause before checking that the bundle is gone.
    pub settle_delay_ms: u64,
    /// Optional `SUDO_ASKPASS` helper used instead of an AppleScript prompt.
    pub askpass_helper: Option<PathBuf>,
}

impl Default for UninstallSettings {
    fn default() -> Self {
        Self {
            always_elevate: false,
            excluded_paths: Vec::new(),
            settle_delay_ms: 1000,
            askpass_helper: None,
        }
    }
}

impl UninstallSettings {
    /// `~/.config/appsweep/settings.json` (platform config dir).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("appsweep").join("settings.json"))
    }

    /// Read settings from `path`; a missing file means defaults.
    pub fn load(path: &Path) -> AppResult<Self> {
        match std::fs::read_to_string(path) {
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("no settings at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn execute_config(&self) -> ExecuteConfig {
        ExecuteConfig {
            always_elevate: self.always_elevate,
            settle_delay: Duration::from_millis(self.settle_delay_ms),
        }
    }
}

/// Knobs recognised by the removal executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecuteConfig {
    pub always_elevate: bool,
    pub settle_delay: Duration,
}

impl Default for ExecuteConfig {
    fn default() -> Self {
        UninstallSettings::default().execute_config()
    }
}
