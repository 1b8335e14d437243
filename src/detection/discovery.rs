use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::stream::{self, StreamExt};

use super::probe::FsProbe;
use super::templates::{DiscoveryRoots, PathTemplate, TEMPLATES};
use crate::models::{ArtifactKind, CandidateArtifact, Identity};
use crate::utils::expand_tilde;

/// Upper bound on probes in flight at once.
pub const PROBE_CONCURRENCY: usize = 8;

/// Find the artifacts of `identity` that exist on disk, using the built-in
/// template table.
pub async fn discover(
    identity: &Identity,
    exclusions: &[String],
    roots: &DiscoveryRoots,
    probe: Arc<dyn FsProbe>,
) -> Vec<CandidateArtifact> {
    discover_with(TEMPLATES, identity, exclusions, roots, probe).await
}

/// Expand every template with every identifier, drop duplicates and
/// excluded paths, then keep what exists. Order follows identifiers first,
/// then the template table.
pub async fn discover_with(
    templates: &[PathTemplate],
    identity: &Identity,
    exclusions: &[String],
    roots: &DiscoveryRoots,
    probe: Arc<dyn FsProbe>,
) -> Vec<CandidateArtifact> {
    let exclusions = exclusion_paths(exclusions, &roots.home);
    let candidates = candidate_paths(templates, identity, roots);
    let total = candidates.len();

    let candidates: Vec<(PathBuf, ArtifactKind)> = candidates
        .into_iter()
        .filter(|(path, _)| match exclusions.iter().find(|ex| path.starts_with(ex)) {
            Some(ex) => {
                log::debug!("excluded {} (under {})", path.display(), ex.display());
                false
            }
            None => true,
        })
        .collect();

    log::debug!(
        "{}: probing {} of {} candidate paths",
        identity.display_name,
        candidates.len(),
        total
    );

    let probed: Vec<Option<(CandidateArtifact, Option<(u64, u64)>)>> = stream::iter(candidates)
        .map(|(path, kind)| {
            let probe = Arc::clone(&probe);
            async move {
                let task_path = path.clone();
                let result = tokio::task::spawn_blocking(move || {
                    if probe.exists(&task_path) {
                        Some((probe.size_of(&task_path), probe.file_id(&task_path)))
                    } else {
                        None
                    }
                })
                .await;

                match result {
                    Ok(Some((size_bytes, id))) => Some((
                        CandidateArtifact {
                            path,
                            kind,
                            exists: true,
                            size_bytes,
                        },
                        id,
                    )),
                    Ok(None) => None,
                    Err(e) => {
                        log::warn!("probe of {} failed: {}", path.display(), e);
                        None
                    }
                }
            }
        })
        .buffered(PROBE_CONCURRENCY)
        .collect()
        .await;

    // Differently spelled paths can name one object on case-insensitive
    // volumes; the first spelling wins.
    let mut ids = HashSet::new();
    let found: Vec<CandidateArtifact> = probed
        .into_iter()
        .flatten()
        .filter_map(|(artifact, id)| match id {
            Some(id) if !ids.insert(id) => {
                log::debug!("{} already found under another spelling", artifact.path.display());
                None
            }
            _ => Some(artifact),
        })
        .collect();
    log::info!(
        "{}: found {} related paths",
        identity.display_name,
        found.len()
    );
    for artifact in &found {
        log::debug!("found {:?} {}", artifact.kind, artifact.path.display());
    }
    found
}

fn candidate_paths(
    templates: &[PathTemplate],
    identity: &Identity,
    roots: &DiscoveryRoots,
) -> Vec<(PathBuf, ArtifactKind)> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for id in identity.identifiers() {
        for template in templates {
            let Some(path) = template.render(roots, id) else {
                log::debug!("skipping template {} for {:?}", template.pattern, id);
                continue;
            };
            if seen.insert(path.clone()) {
                out.push((path, template.kind));
            }
        }
    }
    out
}

fn exclusion_paths(exclusions: &[String], home: &Path) -> Vec<PathBuf> {
    exclusions
        .iter()
        .map(|e| e.trim())
        .filter(|e| !e.is_empty())
        .map(|e| expand_tilde(e, home))
        .collect()
}
