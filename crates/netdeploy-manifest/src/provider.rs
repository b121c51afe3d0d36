use std::sync::Arc;

use log::debug;
use netdeploy_backend::{DeployError, DeploymentBackend, DeploymentProvider, LaunchContext};

use crate::backend::ManifestBackend;
use crate::connection::ManifestConnector;

/// Provider for the manifest-reading deployment layer.
///
/// A connection is only opened when both a connector is bound and the
/// identity names an update location; otherwise the adapter is detached.
#[derive(Default, Clone)]
pub struct ManifestProvider {
    connector: Option<Arc<dyn ManifestConnector>>,
}

impl ManifestProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_connector(connector: Arc<dyn ManifestConnector>) -> Self {
        Self {
            connector: Some(connector),
        }
    }
}

impl DeploymentProvider for ManifestProvider {
    fn name(&self) -> &'static str {
        "manifest"
    }

    fn load(&self, context: &LaunchContext) -> Result<Box<dyn DeploymentBackend>, DeployError> {
        let (Some(connector), Some(location)) =
            (&self.connector, context.identity.update_location())
        else {
            debug!("No manifest connector or update location; using detached adapter");
            return Ok(Box::new(ManifestBackend::detached(context)));
        };

        debug!("Opening manifest connection for {location}");
        let connection = connector.connect(context.identity.executable_path(), location)?;
        Ok(Box::new(ManifestBackend::new(connection, context)))
    }
}
