use humansize::{format_size, DECIMAL};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::models::Application;

/// What sort of thing an artifact path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    ApplicationSupport,
    ApplicationScripts,
    Preferences,
    Caches,
    HttpStorage,
    Cookies,
    WebKit,
    SavedState,
    Container,
    AppExtension,
    GroupContainer,
    Logs,
    LaunchAgent,
    LaunchDaemon,
    KernelExtension,
    InputMethod,
    PreferencePane,
    QuickLook,
    ScreenSaver,
    Service,
    SpotlightImporter,
    StartupItem,
    PrivilegedHelper,
    Receipt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateArtifact {
    pub path: PathBuf,
    pub kind: ArtifactKind,
    pub exists: bool,
    pub size_bytes: u64,
}

/// Everything that will be deleted for one application, bundle first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovalPlan {
    pub bundle_path: PathBuf,
    pub bundle_size_bytes: u64,
    pub artifacts: Vec<CandidateArtifact>,
    /// Aggregate size of bundle and artifacts as measured in one pass. Not
    /// necessarily the sum of the per-item sizes.
    pub total_size_bytes: u64,
}

impl RemovalPlan {
    /// Deletion order: the bundle, then artifacts in discovery order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.bundle_path.as_path())
            .chain(self.artifacts.iter().map(|a| a.path.as_path()))
    }

    /// Bundle plus artifacts.
    pub fn path_count(&self) -> usize {
        self.artifacts.len() + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalStatus {
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    /// The user refused the authorization prompt.
    Declined,
    /// The escalated batch could not be run at all.
    ElevationUnavailable(String),
    /// The escalated batch ran but some paths survived it.
    ResidualFailures,
    /// Deletion reported success, yet the bundle is still on disk.
    BundleNotRemoved,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::Declined => write!(f, "authorization was declined"),
            FailureReason::ElevationUnavailable(msg) => {
                write!(f, "privileged removal could not run: {}", msg)
            }
            FailureReason::ResidualFailures => write!(f, "some files could not be removed"),
            FailureReason::BundleNotRemoved => write!(f, "bundle not removed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovalOutcome {
    pub status: RemovalStatus,
    pub removed_count: usize,
    pub failed_paths: Vec<PathBuf>,
    pub used_elevated_privileges: bool,
    pub bundle_still_present: bool,
    pub failure: Option<FailureReason>,
}

impl RemovalOutcome {
    pub fn is_completed(&self) -> bool {
        self.status == RemovalStatus::Completed
    }
}

/// Caller-facing record of one uninstall request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UninstallSummary {
    pub name: String,
    pub bundle_path: PathBuf,
    pub success: bool,
    pub related_count: usize,
    pub removed_count: usize,
    pub failed_paths: Vec<PathBuf>,
    pub used_elevated_privileges: bool,
    pub bundle_size: String,
    pub total_size: String,
    pub message: String,
}

impl UninstallSummary {
    pub fn from_outcome(app: &Application, plan: &RemovalPlan, outcome: &RemovalOutcome) -> Self {
        let message = match &outcome.failure {
            None => format!("Removed {} of {} paths", outcome.removed_count, plan.path_count()),
            Some(FailureReason::ResidualFailures) => format!(
                "Failed to uninstall {}: {} paths could not be removed",
                app.name,
                outcome.failed_paths.len()
            ),
            Some(reason) => format!("Failed to uninstall {}: {}", app.name, reason),
        };

        Self {
            name: app.name.clone(),
            bundle_path: plan.bundle_path.clone(),
            success: outcome.is_completed(),
            related_count: plan.artifacts.len(),
            removed_count: outcome.removed_count,
            failed_paths: outcome.failed_paths.clone(),
            used_elevated_privileges: outcome.used_elevated_privileges,
            bundle_size: human_size(plan.bundle_size_bytes),
            total_size: human_size(plan.total_size_bytes),
            message,
        }
    }
}

pub fn human_size(bytes: u64) -> String {
    format_size(bytes, DECIMAL)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> RemovalPlan {
        RemovalPlan {
            bundle_path: "/Applications/Foo.app".into(),
            bundle_size_bytes: 4096,
            artifacts: vec![CandidateArtifact {
                path: "/Users/me/Library/Caches/Foo".into(),
                kind: ArtifactKind::Caches,
                exists: true,
                size_bytes: 2048,
            }],
            total_size_bytes: 6144,
        }
    }

    #[test]
    fn plan_lists_bundle_first() {
        let plan = plan();
        let paths: Vec<_> = plan.paths().collect();
        assert_eq!(paths[0], Path::new("/Applications/Foo.app"));
        assert_eq!(paths[1], Path::new("/Users/me/Library/Caches/Foo"));
        assert_eq!(plan.path_count(), 2);
    }

    #[test]
    fn summary_reports_failure_reason() {
        let app = Application::new("Foo", "/Applications/Foo.app");
        let outcome = RemovalOutcome {
            status: RemovalStatus::Failed,
            removed_count: 1,
            failed_paths: Vec::new(),
            used_elevated_privileges: false,
            bundle_still_present: true,
            failure: Some(FailureReason::BundleNotRemoved),
        };
        let summary = UninstallSummary::from_outcome(&app, &plan(), &outcome);
        assert!(!summary.success);
        assert_eq!(summary.related_count, 1);
        assert_eq!(summary.message, "Failed to uninstall Foo: bundle not removed");
    }

    #[test]
    fn summary_reports_success() {
        let app = Application::new("Foo", "/Applications/Foo.app");
        let outcome = RemovalOutcome {
            status: RemovalStatus::Completed,
            removed_count: 2,
            failed_paths: Vec::new(),
            used_elevated_privileges: false,
            bundle_still_present: false,
            failure: None,
        };
        let summary = UninstallSummary::from_outcome(&app, &plan(), &outcome);
        assert!(summary.success);
        assert_eq!(summary.message, "Removed 2 of 2 paths");
        assert!(summary.total_size.ends_with("kB"));
    }

    #[test]
    fn failure_reason_serializes_with_tag() {
        let json = serde_json::to_string(&FailureReason::Declined).unwrap();
        assert_eq!(json, r#"{"reason":"declined"}"#);
    }
}
