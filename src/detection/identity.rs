use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::metadata::MetadataQuery;
use crate::models::{Application, Identity};
use crate::utils::plist_parser::{get_string, read_info_plist};
use crate::utils::{AppError, AppResult};

static RE_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static RE_NON_ALNUM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}]+").unwrap());

/// Manifest keys whose values are used as extra identifiers.
const ALIAS_KEYS: &[&str] = &[
    "CFBundleExecutable",
    "CFBundleIdentifier",
    "CFBundleName",
    "CFBundleDisplayName",
];

/// Reads the key/value manifest embedded in a bundle.
pub trait ManifestReader: Send + Sync {
    /// `Ok(None)` when the bundle carries no manifest.
    fn read_manifest(&self, bundle_path: &Path) -> AppResult<Option<plist::Dictionary>>;
}

/// Reads `Contents/Info.plist`.
#[derive(Debug, Default, Clone, Copy)]
pub struct InfoPlistReader;

impl ManifestReader for InfoPlistReader {
    fn read_manifest(&self, bundle_path: &Path) -> AppResult<Option<plist::Dictionary>> {
        match read_info_plist(bundle_path) {
            Ok(dict) => Ok(Some(dict)),
            Err(AppError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

pub fn normalize_no_spaces(name: &str) -> String {
    RE_WHITESPACE.replace_all(&name.to_lowercase(), "").into_owned()
}

pub fn normalize_alnum(no_spaces: &str) -> String {
    RE_NON_ALNUM.replace_all(no_spaces, "").into_owned()
}

/// Derive every identifier the application is known by.
///
/// Metadata and manifest lookups degrade to "absent" on failure; they only
/// shrink the set of identifiers, never fail the request.
pub fn resolve_identity(
    app: &Application,
    metadata: &dyn MetadataQuery,
    manifest: &dyn ManifestReader,
) -> Identity {
    let normalized_no_spaces = normalize_no_spaces(&app.name);
    let normalized_alnum = normalize_alnum(&normalized_no_spaces);

    let bundle_identifier = match metadata.query_bundle_identifier(&app.install_path) {
        Ok(Some(id)) => {
            log::info!("{}: bundle identifier {}", app.name, id);
            Some(id)
        }
        Ok(None) => {
            log::info!("{}: no bundle identifier indexed", app.name);
            None
        }
        Err(e) => {
            log::warn!("{}: bundle identifier lookup failed: {}", app.name, e);
            None
        }
    };

    let manifest_aliases: BTreeSet<String> = match manifest.read_manifest(&app.install_path) {
        Ok(Some(dict)) => ALIAS_KEYS
            .iter()
            .filter_map(|key| get_string(&dict, key))
            .collect(),
        Ok(None) => {
            log::debug!("{}: bundle has no manifest", app.name);
            BTreeSet::new()
        }
        Err(e) => {
            log::warn!("{}: manifest unreadable: {}", app.name, e);
            BTreeSet::new()
        }
    };

    Identity {
        display_name: app.name.clone(),
        normalized_no_spaces,
        normalized_alnum,
        bundle_identifier,
        manifest_aliases,
    }
}
