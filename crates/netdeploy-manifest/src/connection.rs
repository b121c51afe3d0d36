use std::path::{Path, PathBuf};
use std::sync::Arc;

use netdeploy_backend::{AppVersion, DeployError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestEvent {
    /// The server manifest was read; carries the version it advertises.
    VersionResolved(AppVersion),
    VersionFailed(String),
    UpdateApplied,
    UpdateFailed(String),
    /// The in-flight operation stopped after `abort`.
    Aborted,
}

impl ManifestEvent {
    /// Whether this event ends a `begin_server_version` request.
    #[must_use]
    pub fn ends_version_check(&self) -> bool {
        matches!(
            self,
            Self::VersionResolved(_) | Self::VersionFailed(_) | Self::Aborted
        )
    }

    /// Whether this event ends a `begin_update` request.
    #[must_use]
    pub fn ends_update(&self) -> bool {
        matches!(
            self,
            Self::UpdateApplied | Self::UpdateFailed(_) | Self::Aborted
        )
    }
}

pub type ManifestEventHandler = Box<dyn Fn(&ManifestEvent) + Send + Sync>;

/// An open connection to the deployment manifests of one installation.
///
/// `begin_*` and `abort` return once the request is accepted; the outcome is
/// delivered to every subscribed handler, possibly from another thread.
pub trait ManifestDeployment: Send + Sync {
    fn is_network_deployment(&self) -> bool;

    fn current_version(&self) -> AppVersion;

    fn data_dir(&self) -> PathBuf;

    /// # Errors
    /// Returns an error if the request cannot be issued.
    fn begin_server_version(&self) -> Result<(), DeployError>;

    /// # Errors
    /// Returns an error if the request cannot be issued.
    fn begin_update(&self) -> Result<(), DeployError>;

    /// # Errors
    /// Returns an error if the abort request cannot be issued.
    fn abort(&self) -> Result<(), DeployError>;

    fn subscribe(&self, handler: ManifestEventHandler) -> SubscriptionId;

    fn unsubscribe(&self, id: SubscriptionId);
}

/// Opens manifest connections.
pub trait ManifestConnector: Send + Sync {
    /// # Errors
    /// Returns an error if the installation or its manifests cannot be read.
    fn connect(
        &self,
        executable: &Path,
        update_location: &str,
    ) -> Result<Arc<dyn ManifestDeployment>, DeployError>;
}
