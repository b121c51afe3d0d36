use chrono::{DateTime, Utc};
use std::path::PathBuf;

use netdeploy_backend::{AppVersion, DeployError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(pub u64);

/// Payload of the service's "check for update completed" event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CheckForUpdateCompleted {
    pub update_available: bool,
    pub available_version: Option<AppVersion>,
    pub cancelled: bool,
    pub error: Option<String>,
}

/// Payload of the service's "update completed" event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateCompleted {
    pub cancelled: bool,
    pub error: Option<String>,
}

pub type CheckCompletedHandler = Box<dyn Fn(&CheckForUpdateCompleted) + Send + Sync>;
pub type UpdateCompletedHandler = Box<dyn Fn(&UpdateCompleted) + Send + Sync>;

/// Binding to the OS-integrated deployment service.
///
/// The `*_async` calls return as soon as the service has accepted the
/// request; completion arrives through the registered handlers, possibly on
/// another thread. Implementations must allow several handlers to be
/// registered at once.
pub trait SystemDeployment: Send + Sync {
    fn is_network_deployed(&self) -> bool;

    fn current_version(&self) -> AppVersion;

    fn is_first_run(&self) -> bool;

    fn data_directory(&self) -> PathBuf;

    fn update_location(&self) -> Option<String>;

    fn time_of_last_update_check(&self) -> DateTime<Utc>;

    /// # Errors
    /// Returns an error if the service refuses to start the check.
    fn check_for_update_async(&self) -> Result<(), DeployError>;

    /// # Errors
    /// Returns an error if the service refuses the cancellation request.
    fn check_for_update_async_cancel(&self) -> Result<(), DeployError>;

    /// # Errors
    /// Returns an error if the service refuses to start the update.
    fn update_async(&self) -> Result<(), DeployError>;

    /// # Errors
    /// Returns an error if the service refuses the cancellation request.
    fn update_async_cancel(&self) -> Result<(), DeployError>;

    fn add_check_for_update_completed(&self, handler: CheckCompletedHandler) -> HandlerId;

    fn remove_check_for_update_completed(&self, id: HandlerId);

    fn add_update_completed(&self, handler: UpdateCompletedHandler) -> HandlerId;

    fn remove_update_completed(&self, id: HandlerId);
}
