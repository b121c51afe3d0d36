use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::error::DeployError;
use crate::result::UpdateCheckResult;
use crate::types::{AppVersion, DeploymentIdentity, FileVersionInfo};

/// Everything a provider needs to build an adapter for one facade.
#[derive(Debug, Clone)]
pub struct LaunchContext {
    pub identity: DeploymentIdentity,
    /// Version read from the executable's own metadata, used whenever the
    /// application is not network deployed.
    pub local_version: AppVersion,
    pub poll_interval: Duration,
}

/// Builds the adapter for one deployment mechanism.
pub trait DeploymentProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// # Errors
    /// Returns an error when the native mechanism cannot be bound for this
    /// identity.
    fn load(&self, context: &LaunchContext) -> Result<Box<dyn DeploymentBackend>, DeployError>;
}

/// Reads the version header embedded in an executable.
pub trait VersionInfoSource: Send + Sync {
    /// # Errors
    /// Returns an error when the file is missing or carries no usable metadata.
    fn read(&self, path: &Path) -> Result<FileVersionInfo, DeployError>;
}

/// Uniform capability set over one deployment mechanism.
#[async_trait]
pub trait DeploymentBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn is_network_deployed(&self) -> bool;

    fn current_version(&self) -> AppVersion;

    fn is_first_run(&self) -> bool;

    fn data_directory(&self) -> PathBuf;

    fn last_check_time(&self) -> DateTime<Utc>;

    fn update_location(&self) -> Option<String>;

    /// Contacts the update source. Never errors: failures and cancellation
    /// are folded into the returned result.
    async fn check_server_version(&self, token: &CancellationToken) -> UpdateCheckResult;

    /// Downloads and installs the latest version. `true` only when the
    /// mechanism reports the update fully applied.
    async fn update_application(&self, token: &CancellationToken) -> bool;

    async fn check_update_available(&self, token: &CancellationToken) -> bool {
        if !self.is_network_deployed() {
            return false;
        }
        let result = self.check_server_version(token).await;
        result.is_newer_than(self.current_version())
    }
}
