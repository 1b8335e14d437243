use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::detection::probe::FsProbe;
use crate::models::{Application, CandidateArtifact, RemovalPlan};
use crate::utils::{AppError, AppResult};

/// Bundles under these roots belong to the OS and are never planned for removal.
const PROTECTED_ROOTS: &[&str] = &["/System", "/usr", "/bin", "/sbin"];

/// Put the bundle in front of the discovered artifacts and size the lot.
///
/// The total comes from one aggregate measurement, so it can differ from the
/// sum of the per-item sizes.
pub fn build_plan(
    app: &Application,
    artifacts: Vec<CandidateArtifact>,
    probe: &dyn FsProbe,
) -> AppResult<RemovalPlan> {
    let bundle_path = app.install_path.clone();
    if !bundle_path.is_absolute() || bundle_path.parent().is_none() {
        return Err(AppError::Protected(bundle_path.display().to_string()));
    }
    if let Some(root) = PROTECTED_ROOTS
        .iter()
        .find(|root| bundle_path.starts_with(Path::new(root)))
    {
        log::warn!("{} lives under {}, refusing", bundle_path.display(), root);
        return Err(AppError::Protected(bundle_path.display().to_string()));
    }

    let mut seen: HashSet<PathBuf> = HashSet::from([bundle_path.clone()]);
    let artifacts: Vec<CandidateArtifact> = artifacts
        .into_iter()
        .filter(|a| seen.insert(a.path.clone()))
        .collect();

    let bundle_size_bytes = probe.size_of(&bundle_path);
    let all_paths: Vec<PathBuf> = std::iter::once(bundle_path.clone())
        .chain(artifacts.iter().map(|a| a.path.clone()))
        .collect();
    let total_size_bytes = probe.size_of_many(&all_paths);

    log::info!(
        "{}: plan has bundle + {} related paths, {} bytes",
        app.name,
        artifacts.len(),
        total_size_bytes
    );

    Ok(RemovalPlan {
        bundle_path,
        bundle_size_bytes,
        artifacts,
        total_size_bytes,
    })
}
