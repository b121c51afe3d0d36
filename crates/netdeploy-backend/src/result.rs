use crate::error::DeployError;
use crate::types::AppVersion;

/// Outcome of one server version check.
///
/// `error` is advisory: callers should branch on
/// [`cancelled_or_failed`](Self::cancelled_or_failed) and only inspect the
/// error to tell a failure apart from a cancellation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCheckResult {
    available_version: Option<AppVersion>,
    cancelled_or_failed: bool,
    error: Option<DeployError>,
}

impl UpdateCheckResult {
    #[must_use]
    pub fn succeeded(version: AppVersion) -> Self {
        Self {
            available_version: Some(version),
            cancelled_or_failed: false,
            error: None,
        }
    }

    #[must_use]
    pub fn cancelled() -> Self {
        Self {
            available_version: None,
            cancelled_or_failed: true,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(error: DeployError) -> Self {
        Self {
            available_version: None,
            cancelled_or_failed: true,
            error: Some(error),
        }
    }

    #[must_use]
    pub fn not_deployed() -> Self {
        Self::failed(DeployError::NotNetworkDeployed)
    }

    #[must_use]
    pub fn available_version(&self) -> Option<AppVersion> {
        self.available_version
    }

    #[must_use]
    pub fn cancelled_or_failed(&self) -> bool {
        self.cancelled_or_failed
    }

    #[must_use]
    pub fn error(&self) -> Option<&DeployError> {
        self.error.as_ref()
    }

    /// True only for a successful check that found a version newer than
    /// `current`.
    #[must_use]
    pub fn is_newer_than(&self, current: AppVersion) -> bool {
        !self.cancelled_or_failed && self.available_version.is_some_and(|v| v > current)
    }
}
