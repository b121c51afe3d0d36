mod error;
mod result;
mod traits;
mod types;

pub use error::DeployError;
pub use result::UpdateCheckResult;
pub use traits::{DeploymentBackend, DeploymentProvider, LaunchContext, VersionInfoSource};
pub use types::{
    AppVersion, DeploymentIdentity, FileVersionInfo, VersionComponent, VersionParseError,
};

/// Re-exported so backends and callers agree on a single token type.
pub use tokio_util::sync::CancellationToken;
