use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use log::{debug, info};
use netdeploy_backend::{
    AppVersion, DeployError, DeploymentBackend, DeploymentIdentity, DeploymentProvider,
    FileVersionInfo, LaunchContext, UpdateCheckResult, VersionInfoSource,
};
use netdeploy_core::{PollOptions, fallback};
use tokio_util::sync::CancellationToken;

use crate::active::ActiveProvider;

/// Deployment status and update operations for one application.
///
/// The backend is chosen once, when the facade is built. Whether the
/// application is network deployed is fixed at that point as well;
/// [`refresh`](Self::refresh) only re-reads file metadata.
pub struct DeploymentFacade {
    backend: Box<dyn DeploymentBackend>,
    network_deployed: bool,
    identity: DeploymentIdentity,
    version_source: Arc<dyn VersionInfoSource>,
    file_info: RwLock<FileVersionInfo>,
}

impl DeploymentFacade {
    #[must_use]
    pub fn builder() -> DeploymentFacadeBuilder {
        DeploymentFacadeBuilder::default()
    }

    /// Facade for the running executable with no update location.
    ///
    /// # Errors
    /// Returns an error if the executable, its metadata, or the compiled-in
    /// backend cannot be resolved.
    pub fn new(version_source: Arc<dyn VersionInfoSource>) -> Result<Self, DeployError> {
        Self::builder().version_source(version_source).build()
    }

    /// # Errors
    /// Same as [`DeploymentFacade::new`].
    pub fn with_update_location(
        version_source: Arc<dyn VersionInfoSource>,
        location: impl Into<String>,
    ) -> Result<Self, DeployError> {
        Self::builder()
            .version_source(version_source)
            .update_location(location)
            .build()
    }

    fn deployed(&self) -> Option<&dyn DeploymentBackend> {
        self.network_deployed.then_some(self.backend.as_ref())
    }

    fn file_info(&self) -> FileVersionInfo {
        self.file_info
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn is_network_deployed(&self) -> bool {
        self.network_deployed
    }

    #[must_use]
    pub fn current_version(&self) -> AppVersion {
        fallback::current_version(
            self.deployed(),
            |backend| backend.current_version(),
            self.file_info().file_version,
        )
    }

    #[must_use]
    pub fn is_first_run(&self) -> bool {
        fallback::is_first_run(self.deployed(), |backend| backend.is_first_run())
    }

    #[must_use]
    pub fn data_directory(&self) -> PathBuf {
        fallback::data_directory(
            self.deployed(),
            |backend| backend.data_directory(),
            || self.identity.executable_directory(),
        )
    }

    #[must_use]
    pub fn last_check_time(&self) -> DateTime<Utc> {
        fallback::last_check_time(
            self.deployed(),
            |backend| backend.last_check_time(),
            Utc::now,
        )
    }

    #[must_use]
    pub fn executable_path(&self) -> &Path {
        self.identity.executable_path()
    }

    #[must_use]
    pub fn update_location(&self) -> Option<String> {
        fallback::resolve(
            self.deployed(),
            |backend| backend.update_location(),
            || self.identity.update_location().map(str::to_string),
        )
    }

    #[must_use]
    pub fn product_name(&self) -> String {
        self.file_info().product_name
    }

    #[must_use]
    pub fn company_name(&self) -> String {
        self.file_info().company_name
    }

    #[must_use]
    pub fn comments(&self) -> String {
        self.file_info().comments
    }

    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Whether the server offers a version newer than
    /// [`current_version`](Self::current_version). Failures and cancellation
    /// read as `false`.
    pub async fn check_update_available(&self, token: &CancellationToken) -> bool {
        match self.deployed() {
            Some(backend) => backend.check_update_available(token).await,
            None => false,
        }
    }

    /// Always asks the backend, which reports a failed result explaining
    /// that the application is not network deployed when that is the case.
    pub async fn check_for_detailed_update(&self, token: &CancellationToken) -> UpdateCheckResult {
        self.backend.check_server_version(token).await
    }

    pub async fn update(&self, token: &CancellationToken) -> bool {
        match self.deployed() {
            Some(backend) => backend.update_application(token).await,
            None => false,
        }
    }

    /// Version the server offers, or the current version when the check
    /// does not succeed.
    pub async fn updated_version(&self, token: &CancellationToken) -> AppVersion {
        let result = self.check_for_detailed_update(token).await;
        match result.available_version() {
            Some(version) if !result.cancelled_or_failed() => version,
            _ => self.current_version(),
        }
    }

    /// Re-reads the executable's file metadata.
    ///
    /// # Errors
    /// Returns an error if the metadata can no longer be read; the previous
    /// values are kept.
    pub fn refresh(&self) -> Result<(), DeployError> {
        let info = self.version_source.read(self.identity.executable_path())?;
        debug!(
            "Refreshed file metadata for {}: {}",
            info.product_name, info.file_version
        );
        *self
            .file_info
            .write()
            .unwrap_or_else(PoisonError::into_inner) = info;
        Ok(())
    }
}

#[derive(Default)]
pub struct DeploymentFacadeBuilder {
    executable_path: Option<PathBuf>,
    update_location: Option<String>,
    poll_options: PollOptions,
    version_source: Option<Arc<dyn VersionInfoSource>>,
    provider: Option<Arc<dyn DeploymentProvider>>,
}

impl DeploymentFacadeBuilder {
    /// Defaults to the running executable.
    #[must_use]
    pub fn executable_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn update_location(mut self, location: impl Into<String>) -> Self {
        self.update_location = Some(location.into());
        self
    }

    #[must_use]
    pub fn poll_options(mut self, options: PollOptions) -> Self {
        self.poll_options = options;
        self
    }

    /// Required. Hosts usually pass `embedded_version_info!()` expanded in
    /// their own crate.
    #[must_use]
    pub fn version_source(mut self, source: Arc<dyn VersionInfoSource>) -> Self {
        self.version_source = Some(source);
        self
    }

    /// Defaults to [`ActiveProvider`].
    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn DeploymentProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// # Errors
    /// Returns an error if the executable cannot be resolved, no version
    /// source was given, its metadata cannot be read, or the provider fails
    /// to load a backend.
    pub fn build(self) -> Result<DeploymentFacade, DeployError> {
        let executable_path = match self.executable_path {
            Some(path) => path,
            None => netdeploy_platform::current_executable().map_err(|error| {
                DeployError::ExecutableUnresolved {
                    details: error.to_string(),
                }
            })?,
        };
        let Some(version_source) = self.version_source else {
            return Err(DeployError::metadata(
                executable_path,
                "no version information source configured",
            ));
        };
        let provider = self
            .provider
            .unwrap_or_else(|| Arc::new(ActiveProvider::default()));

        let file_info = version_source.read(&executable_path)?;
        let identity = DeploymentIdentity::new(executable_path, self.update_location);
        let context = LaunchContext {
            identity: identity.clone(),
            local_version: file_info.file_version,
            poll_interval: self.poll_options.interval(),
        };
        let backend = provider.load(&context)?;
        let network_deployed = backend.is_network_deployed();

        info!(
            "Deployment facade ready: backend={}, network_deployed={network_deployed}, version={}",
            backend.name(),
            file_info.file_version
        );

        Ok(DeploymentFacade {
            backend,
            network_deployed,
            identity,
            version_source,
            file_info: RwLock::new(file_info),
        })
    }
}
