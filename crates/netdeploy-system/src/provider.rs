use std::sync::Arc;

use log::debug;
use netdeploy_backend::{DeployError, DeploymentBackend, DeploymentProvider, LaunchContext};

use crate::backend::SystemBackend;
use crate::native::SystemDeployment;

/// Provider for the OS-integrated deployment service.
///
/// Without a native binding every adapter it builds reports the application
/// as not network deployed.
#[derive(Default, Clone)]
pub struct SystemProvider {
    native: Option<Arc<dyn SystemDeployment>>,
}

impl SystemProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_native(native: Arc<dyn SystemDeployment>) -> Self {
        Self {
            native: Some(native),
        }
    }
}

impl DeploymentProvider for SystemProvider {
    fn name(&self) -> &'static str {
        "system"
    }

    fn load(&self, context: &LaunchContext) -> Result<Box<dyn DeploymentBackend>, DeployError> {
        let backend = match &self.native {
            Some(native) => SystemBackend::new(Arc::clone(native), context),
            None => {
                debug!("No system deployment binding; using detached adapter");
                SystemBackend::detached(context)
            }
        };
        Ok(Box::new(backend))
    }
}
