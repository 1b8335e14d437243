use std::path::{Path, PathBuf};
use std::sync::OnceLock;

static HELPER: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Register the `SUDO_ASKPASS` helper from the settings. Only the first call
/// has any effect; an unusable helper registers nothing and escalation goes
/// through `osascript` instead.
pub fn register_askpass_helper(helper: Option<&Path>) {
    HELPER.get_or_init(|| helper.and_then(usable_helper));
}

/// The registered askpass helper, if any.
pub fn askpass_helper() -> Option<&'static Path> {
    HELPER.get().and_then(|p| p.as_deref())
}

/// `sudo -A` refuses helpers it cannot execute, so those are rejected here
/// rather than surfacing as a failed escalation later.
fn usable_helper(path: &Path) -> Option<PathBuf> {
    let meta = match std::fs::metadata(path) {
        Ok(m) if m.is_file() => m,
        _ => {
            log::warn!("askpass helper not found at {}", path.display());
            return None;
        }
    };

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if meta.permissions().mode() & 0o111 == 0 {
            log::warn!(
                "askpass helper {} is not executable, ignoring it",
                path.display()
            );
            return None;
        }
    }
    #[cfg(not(unix))]
    let _ = meta;

    log::info!("using askpass helper {}", path.display());
    Some(path.to_path_buf())
}
