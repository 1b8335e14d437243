use std::sync::Arc;

use crate::detection::{
    self, DiscoveryRoots, DiskProbe, FsProbe, InfoPlistReader, ManifestReader, MdlsMetadata,
    MetadataQuery,
};
use crate::executor::{self, Remover, SystemRemover};
use crate::models::{
    Application, CandidateArtifact, ExecuteConfig, Identity, RemovalOutcome, RemovalPlan,
};
use crate::utils::{AppError, AppResult};

/// Entry point for callers: the four uninstall steps over a fixed set of
/// capabilities. Holds no per-request state; every step takes and returns
/// plain values.
#[derive(Clone)]
pub struct Uninstaller {
    metadata: Arc<dyn MetadataQuery>,
    manifest: Arc<dyn ManifestReader>,
    probe: Arc<dyn FsProbe>,
    remover: Arc<dyn Remover>,
    roots: Option<DiscoveryRoots>,
}

impl Default for Uninstaller {
    fn default() -> Self {
        Self::new(
            Arc::new(MdlsMetadata),
            Arc::new(InfoPlistReader),
            Arc::new(DiskProbe),
            Arc::new(SystemRemover),
        )
    }
}

impl Uninstaller {
    pub fn new(
        metadata: Arc<dyn MetadataQuery>,
        manifest: Arc<dyn ManifestReader>,
        probe: Arc<dyn FsProbe>,
        remover: Arc<dyn Remover>,
    ) -> Self {
        Self {
            metadata,
            manifest,
            probe,
            remover,
            roots: None,
        }
    }

    /// Resolve templates against these roots instead of the current user's.
    pub fn with_roots(mut self, roots: DiscoveryRoots) -> Self {
        self.roots = Some(roots);
        self
    }

    pub async fn resolve_identity(&self, app: &Application) -> AppResult<Identity> {
        let app = app.clone();
        let metadata = Arc::clone(&self.metadata);
        let manifest = Arc::clone(&self.manifest);
        tokio::task::spawn_blocking(move || {
            detection::resolve_identity(&app, metadata.as_ref(), manifest.as_ref())
        })
        .await
        .map_err(|e| AppError::Custom(format!("Identity task failed: {}", e)))
    }

    /// Fails only when the home directory cannot be determined; nothing has
    /// been deleted at that point.
    pub async fn discover_artifacts(
        &self,
        identity: &Identity,
        exclusions: &[String],
    ) -> AppResult<Vec<CandidateArtifact>> {
        let roots = match &self.roots {
            Some(r) => r.clone(),
            None => DiscoveryRoots::from_env()?,
        };
        Ok(detection::discover(identity, exclusions, &roots, Arc::clone(&self.probe)).await)
    }

    pub async fn build_plan(
        &self,
        app: &Application,
        artifacts: Vec<CandidateArtifact>,
    ) -> AppResult<RemovalPlan> {
        let app = app.clone();
        let probe = Arc::clone(&self.probe);
        tokio::task::spawn_blocking(move || executor::build_plan(&app, artifacts, probe.as_ref()))
            .await
            .map_err(|e| AppError::Custom(format!("Sizing task failed: {}", e)))?
    }

    /// Runs to completion once started, including any authorization prompt.
    pub async fn execute(
        &self,
        plan: RemovalPlan,
        config: ExecuteConfig,
    ) -> AppResult<RemovalOutcome> {
        let remover = Arc::clone(&self.remover);
        let probe = Arc::clone(&self.probe);
        tokio::task::spawn_blocking(move || {
            executor::execute(&plan, &config, remover.as_ref(), probe.as_ref())
        })
        .await
        .map_err(|e| AppError::Custom(format!("Removal task failed: {}", e)))
    }

    /// Identity, discovery and planning in one go.
    pub async fn plan_for(&self, app: &Application, exclusions: &[String]) -> AppResult<RemovalPlan> {
        let identity = self.resolve_identity(app).await?;
        let artifacts = self.discover_artifacts(&identity, exclusions).await?;
        self.build_plan(app, artifacts).await
    }
}
