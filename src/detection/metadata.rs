use std::path::Path;

use crate::utils::command::run_command_stdout;
use crate::utils::AppResult;

/// Looks up the bundle identifier the system has indexed for a bundle.
pub trait MetadataQuery: Send + Sync {
    /// `Ok(None)` when the index has no identifier for the path.
    fn query_bundle_identifier(&self, path: &Path) -> AppResult<Option<String>>;
}

/// Spotlight metadata via `mdls`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MdlsMetadata;

impl MetadataQuery for MdlsMetadata {
    fn query_bundle_identifier(&self, path: &Path) -> AppResult<Option<String>> {
        let path = path.to_string_lossy();
        let raw = run_command_stdout(
            "mdls",
            &["-name", "kMDItemCFBundleIdentifier", "-raw", &*path],
        )?;
        Ok(parse_mdls_raw(&raw))
    }
}

/// `mdls -raw` prints `(null)` for attributes it does not have.
fn parse_mdls_raw(raw: &str) -> Option<String> {
    let value = raw.trim().trim_matches('"').trim();
    if value.is_empty() || value == "(null)" {
        None
    } else {
        Some(value.to_string())
    }
}
