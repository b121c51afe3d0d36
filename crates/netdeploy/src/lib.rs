//! Deployment status and self-update checks for applications installed
//! through a network deployment mechanism.
//!
//! The mechanism is picked at compile time through the `manifest` (default)
//! and `system` features. [`DeploymentFacade`] wraps it with fallbacks for
//! side-loaded copies, and [`EntryPoint`] shares one facade per process.

mod active;
mod entry_point;
mod facade;

pub use active::{ACTIVE_BACKEND, ActiveProvider, BackendKind};
pub use entry_point::{EntryPoint, entry_point, install_entry_point};
pub use facade::{DeploymentFacade, DeploymentFacadeBuilder};

pub use netdeploy_backend::{
    AppVersion, CancellationToken, DeployError, DeploymentBackend, DeploymentProvider,
    FileVersionInfo, UpdateCheckResult, VersionInfoSource, VersionParseError,
};
pub use netdeploy_core::{EmbeddedVersionInfo, PollOptions, embedded_version_info};

/// Native binding points for the manifest mechanism.
#[cfg(feature = "manifest")]
pub use netdeploy_manifest as manifest;
/// Native binding points for the system deployment service.
#[cfg(feature = "system")]
pub use netdeploy_system as system;
