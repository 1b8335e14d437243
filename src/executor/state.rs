use std::path::{Path, PathBuf};

use super::remover::Remover;
use crate::detection::probe::FsProbe;
use crate::models::{ExecuteConfig, FailureReason, RemovalOutcome, RemovalPlan, RemovalStatus};
use crate::utils::elevation::ElevatedError;

/// Where a removal run currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalPhase {
    Pending,
    UnprivilegedAttempt,
    EscalatedAttempt,
    Verifying,
    Completed,
    Failed,
}

struct Run<'a> {
    plan: &'a RemovalPlan,
    phase: RemovalPhase,
    removed_count: usize,
    failed_paths: Vec<PathBuf>,
    used_elevated_privileges: bool,
    failure: Option<FailureReason>,
}

impl Run<'_> {
    fn enter(&mut self, next: RemovalPhase) {
        log::debug!(
            "{}: {:?} -> {:?}",
            self.plan.bundle_path.display(),
            self.phase,
            next
        );
        self.phase = next;
    }
}

/// Delete everything in `plan`, then check that the bundle is gone.
///
/// Deletions run one at a time in plan order. Any unprivileged failure hands
/// the whole plan to a single escalated batch. Only the bundle is
/// re-checked afterwards; its survival always fails the run.
pub fn execute(
    plan: &RemovalPlan,
    config: &ExecuteConfig,
    remover: &dyn Remover,
    probe: &dyn FsProbe,
) -> RemovalOutcome {
    let mut run = Run {
        plan,
        phase: RemovalPhase::Pending,
        removed_count: 0,
        failed_paths: Vec::new(),
        used_elevated_privileges: false,
        failure: None,
    };

    if config.always_elevate {
        run.enter(RemovalPhase::EscalatedAttempt);
    } else {
        run.enter(RemovalPhase::UnprivilegedAttempt);
        match remove_unprivileged(plan, remover, probe, &mut run.removed_count) {
            Ok(()) => run.enter(RemovalPhase::Verifying),
            Err(path) => {
                log::info!(
                    "could not remove {} without privileges, escalating for all {} paths",
                    path.display(),
                    plan.path_count()
                );
                run.enter(RemovalPhase::EscalatedAttempt);
            }
        }
    }

    if run.phase == RemovalPhase::EscalatedAttempt {
        run.used_elevated_privileges = true;
        let paths: Vec<PathBuf> = plan.paths().map(Path::to_path_buf).collect();
        match remover.delete_batch_elevated(&paths) {
            Ok(report) => {
                run.removed_count += report.removed_count;
                if !report.failed_paths.is_empty() {
                    log::warn!("{} paths survived privileged removal", report.failed_paths.len());
                    run.failed_paths = report.failed_paths;
                    run.failure = Some(FailureReason::ResidualFailures);
                }
            }
            Err(ElevatedError::UserCancelled) => {
                log::info!("authorization declined");
                run.failure = Some(FailureReason::Declined);
            }
            Err(e) => {
                log::warn!("privileged removal failed: {}", e);
                run.failure = Some(FailureReason::ElevationUnavailable(e.to_string()));
            }
        }
        run.enter(RemovalPhase::Verifying);
    }

    if !config.settle_delay.is_zero() {
        std::thread::sleep(config.settle_delay);
    }
    let bundle_still_present = probe.exists(&plan.bundle_path);
    if bundle_still_present {
        log::warn!("{} still exists after removal", plan.bundle_path.display());
        if matches!(run.failure, None | Some(FailureReason::ResidualFailures)) {
            run.failure = Some(FailureReason::BundleNotRemoved);
        }
    }

    let status = if run.failure.is_none() {
        run.enter(RemovalPhase::Completed);
        RemovalStatus::Completed
    } else {
        run.enter(RemovalPhase::Failed);
        RemovalStatus::Failed
    };

    RemovalOutcome {
        status,
        removed_count: run.removed_count,
        failed_paths: run.failed_paths,
        used_elevated_privileges: run.used_elevated_privileges,
        bundle_still_present,
        failure: run.failure,
    }
}

/// Stops at the first failure and returns the path that failed.
fn remove_unprivileged(
    plan: &RemovalPlan,
    remover: &dyn Remover,
    probe: &dyn FsProbe,
    removed_count: &mut usize,
) -> Result<(), PathBuf> {
    for path in plan.paths() {
        if !probe.exists(path) {
            log::debug!("{} already gone", path.display());
            continue;
        }
        match remover.delete_unprivileged(path) {
            Ok(()) => *removed_count += 1,
            Err(e) => {
                log::debug!("unprivileged removal of {} failed: {}", path.display(), e);
                return Err(path.to_path_buf());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod fakes {
    use super::*;
    use crate::detection::discovery::fakes::FakeProbe;
    use crate::executor::remover::BatchReport;
    use crate::utils::{AppError, AppResult};
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Elevation {
        Allow,
        Decline,
        Unavailable,
    }

    /// Remover working against a [`FakeProbe`].
    pub struct FakeRemover {
        pub probe: Arc<FakeProbe>,
        /// Paths only removable with privileges.
        pub protected: HashSet<PathBuf>,
        /// Paths not even removable with privileges.
        pub immovable: HashSet<PathBuf>,
        pub elevation: Elevation,
        pub unprivileged_calls: Mutex<Vec<PathBuf>>,
        pub batches: Mutex<Vec<Vec<PathBuf>>>,
    }

    impl FakeRemover {
        pub fn new(probe: Arc<FakeProbe>) -> Self {
            Self {
                probe,
                protected: HashSet::new(),
                immovable: HashSet::new(),
                elevation: Elevation::Allow,
                unprivileged_calls: Mutex::new(Vec::new()),
                batches: Mutex::new(Vec::new()),
            }
        }
    }

    impl Remover for FakeRemover {
        fn delete_unprivileged(&self, path: &Path) -> AppResult<()> {
            self.unprivileged_calls.lock().unwrap().push(path.to_path_buf());
            if self.protected.contains(path) || self.immovable.contains(path) {
                return Err(AppError::Io(std::io::Error::from(
                    std::io::ErrorKind::PermissionDenied,
                )));
            }
            self.probe.remove(path);
            Ok(())
        }

        fn delete_batch_elevated(&self, paths: &[PathBuf]) -> Result<BatchReport, ElevatedError> {
            self.batches.lock().unwrap().push(paths.to_vec());
            match self.elevation {
                Elevation::Decline => return Err(ElevatedError::UserCancelled),
                Elevation::Unavailable => {
                    return Err(ElevatedError::CommandFailed("osascript missing".into()))
                }
                Elevation::Allow => {}
            }
            let mut report = BatchReport::default();
            for path in paths {
                if !self.probe.exists(path) {
                    continue;
                }
                if self.immovable.contains(path) {
                    report.failed_paths.push(path.clone());
                } else {
                    self.probe.remove(path);
                    report.removed_count += 1;
                }
            }
            Ok(report)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fakes::*;
    use super::*;
    use crate::detection::discovery::fakes::FakeProbe;
    use crate::models::{ArtifactKind, CandidateArtifact};
    use std::sync::Arc;
    use std::time::Duration;

    const BUNDLE: &str = "/Applications/Bar.app";
    const PREFS: &str = "/Library/Preferences/Bar.plist";
    const CACHE: &str = "/Users/me/Library/Caches/Bar";

    fn plan(artifacts: &[&str]) -> RemovalPlan {
        RemovalPlan {
            bundle_path: PathBuf::from(BUNDLE),
            bundle_size_bytes: 0,
            artifacts: artifacts
                .iter()
                .map(|p| CandidateArtifact {
                    path: PathBuf::from(p),
                    kind: ArtifactKind::Preferences,
                    exists: true,
                    size_bytes: 0,
                })
                .collect(),
            total_size_bytes: 0,
        }
    }

    fn config(always_elevate: bool) -> ExecuteConfig {
        ExecuteConfig {
            always_elevate,
            settle_delay: Duration::ZERO,
        }
    }

    fn setup(paths: &[&str]) -> (Arc<FakeProbe>, FakeRemover) {
        let probe = Arc::new(FakeProbe::with(
            &paths.iter().map(|p| (*p, 1u64)).collect::<Vec<_>>(),
        ));
        let remover = FakeRemover::new(probe.clone());
        (probe, remover)
    }

    #[test]
    fn unprivileged_success_completes() {
        let (probe, remover) = setup(&[BUNDLE, CACHE]);
        let outcome = execute(&plan(&[CACHE]), &config(false), &remover, probe.as_ref());

        assert_eq!(outcome.status, RemovalStatus::Completed);
        assert_eq!(outcome.removed_count, 2);
        assert!(!outcome.used_elevated_privileges);
        assert!(!outcome.bundle_still_present);
        assert!(remover.batches.lock().unwrap().is_empty());
    }

    #[test]
    fn any_unprivileged_failure_escalates_the_whole_plan() {
        let (probe, mut remover) = setup(&[BUNDLE, PREFS, CACHE]);
        remover.protected.insert(PathBuf::from(PREFS));
        let outcome = execute(&plan(&[PREFS, CACHE]), &config(false), &remover, probe.as_ref());

        assert_eq!(outcome.status, RemovalStatus::Completed);
        assert!(outcome.used_elevated_privileges);
        assert_eq!(outcome.removed_count, 3);
        let batches = remover.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(
            batches[0],
            vec![PathBuf::from(BUNDLE), PathBuf::from(PREFS), PathBuf::from(CACHE)]
        );
        // The unprivileged pass stopped at the first failure.
        assert_eq!(
            *remover.unprivileged_calls.lock().unwrap(),
            vec![PathBuf::from(BUNDLE), PathBuf::from(PREFS)]
        );
    }

    #[test]
    fn always_elevate_skips_the_unprivileged_pass() {
        let (probe, remover) = setup(&[BUNDLE, CACHE]);
        let outcome = execute(&plan(&[CACHE]), &config(true), &remover, probe.as_ref());

        assert!(outcome.is_completed());
        assert!(outcome.used_elevated_privileges);
        assert!(remover.unprivileged_calls.lock().unwrap().is_empty());
        assert_eq!(remover.batches.lock().unwrap().len(), 1);
    }

    #[test]
    fn declined_authorization_fails() {
        let (probe, mut remover) = setup(&[BUNDLE, PREFS]);
        remover.protected.insert(PathBuf::from(BUNDLE));
        remover.elevation = Elevation::Decline;
        let outcome = execute(&plan(&[PREFS]), &config(false), &remover, probe.as_ref());

        assert_eq!(outcome.status, RemovalStatus::Failed);
        assert_eq!(outcome.failure, Some(FailureReason::Declined));
        assert!(outcome.used_elevated_privileges);
        assert!(outcome.bundle_still_present);
    }

    #[test]
    fn unavailable_elevation_fails() {
        let (probe, mut remover) = setup(&[BUNDLE]);
        remover.elevation = Elevation::Unavailable;
        let outcome = execute(&plan(&[]), &config(true), &remover, probe.as_ref());
        assert!(matches!(
            outcome.failure,
            Some(FailureReason::ElevationUnavailable(_))
        ));
        assert!(outcome.bundle_still_present);
    }

    #[test]
    fn residual_failures_are_reported() {
        let (probe, mut remover) = setup(&[BUNDLE, PREFS]);
        remover.immovable.insert(PathBuf::from(PREFS));
        let outcome = execute(&plan(&[PREFS]), &config(false), &remover, probe.as_ref());

        assert_eq!(outcome.status, RemovalStatus::Failed);
        assert_eq!(outcome.failure, Some(FailureReason::ResidualFailures));
        assert_eq!(outcome.failed_paths, vec![PathBuf::from(PREFS)]);
        assert!(!outcome.bundle_still_present);
        assert_eq!(outcome.removed_count, 1);
    }

    #[test]
    fn surviving_bundle_fails_even_when_every_delete_succeeded() {
        let (probe, remover) = setup(&[BUNDLE, CACHE]);
        probe.sticky.lock().unwrap().insert(PathBuf::from(BUNDLE));
        let outcome = execute(&plan(&[CACHE]), &config(false), &remover, probe.as_ref());

        assert_eq!(outcome.status, RemovalStatus::Failed);
        assert_eq!(outcome.failure, Some(FailureReason::BundleNotRemoved));
        assert!(outcome.bundle_still_present);
        assert!(outcome.failed_paths.is_empty());
        assert!(!outcome.used_elevated_privileges);
    }

    #[test]
    fn immovable_bundle_is_reported_as_not_removed() {
        let (probe, mut remover) = setup(&[BUNDLE]);
        remover.immovable.insert(PathBuf::from(BUNDLE));
        let outcome = execute(&plan(&[]), &config(false), &remover, probe.as_ref());
        assert_eq!(outcome.failure, Some(FailureReason::BundleNotRemoved));
        assert_eq!(outcome.failed_paths, vec![PathBuf::from(BUNDLE)]);
    }

    #[test]
    fn second_run_is_a_no_op() {
        let (probe, remover) = setup(&[BUNDLE, CACHE]);
        let plan = plan(&[CACHE]);
        assert!(execute(&plan, &config(false), &remover, probe.as_ref()).is_completed());

        let again = execute(&plan, &config(false), &remover, probe.as_ref());
        assert!(again.is_completed());
        assert_eq!(again.removed_count, 0);
        assert!(!again.bundle_still_present);

        let elevated = execute(&plan, &config(true), &remover, probe.as_ref());
        assert!(elevated.is_completed());
        assert_eq!(elevated.removed_count, 0);
    }

    #[test]
    fn completed_implies_bundle_absent() {
        for protected in [false, true] {
            for always_elevate in [false, true] {
                let (probe, mut remover) = setup(&[BUNDLE, PREFS]);
                if protected {
                    remover.protected.insert(PathBuf::from(PREFS));
                }
                let outcome = execute(&plan(&[PREFS]), &config(always_elevate), &remover, probe.as_ref());
                if outcome.is_completed() {
                    assert!(!probe.exists(Path::new(BUNDLE)));
                }
                if protected && !always_elevate {
                    assert!(outcome.used_elevated_privileges);
                }
            }
        }
    }
}
