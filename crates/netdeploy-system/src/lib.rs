//! Adapter over the operating system's integrated deployment service.
//!
//! The service is process-wide: it knows whether this process was launched
//! through a managed deployment and reports check/update completion through
//! events rather than futures.

mod backend;
mod native;
mod provider;

pub use backend::SystemBackend;
pub use native::{
    CheckCompletedHandler, CheckForUpdateCompleted, HandlerId, SystemDeployment, UpdateCompleted,
    UpdateCompletedHandler,
};
pub use provider::SystemProvider;
