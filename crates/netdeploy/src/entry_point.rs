use std::path::PathBuf;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use log::debug;
use netdeploy_backend::{DeployError, DeploymentProvider, VersionInfoSource};
use netdeploy_core::PollOptions;

use crate::active::ActiveProvider;
use crate::facade::{DeploymentFacade, DeploymentFacadeBuilder};

static ENTRY_POINT: OnceLock<EntryPoint> = OnceLock::new();

/// Process-wide registry. Unless the host installed one with a version
/// source, building its facade fails with [`DeployError::Metadata`].
pub fn entry_point() -> &'static EntryPoint {
    ENTRY_POINT.get_or_init(EntryPoint::new)
}

/// Replaces the default registry configuration. Only succeeds before the
/// first call to [`entry_point`]; otherwise the registry is handed back.
///
/// # Errors
/// Returns `registry` unchanged if the process-wide registry already exists.
pub fn install_entry_point(registry: EntryPoint) -> Result<(), EntryPoint> {
    ENTRY_POINT.set(registry)
}

/// Holds the facade the host application shares across its components.
pub struct EntryPoint {
    provider: Arc<dyn DeploymentProvider>,
    version_source: Option<Arc<dyn VersionInfoSource>>,
    executable_path: Option<PathBuf>,
    poll_options: PollOptions,
    slot: RwLock<Option<Arc<DeploymentFacade>>>,
}

impl Default for EntryPoint {
    fn default() -> Self {
        Self::new()
    }
}

impl EntryPoint {
    #[must_use]
    pub fn new() -> Self {
        Self {
            provider: Arc::new(ActiveProvider::default()),
            version_source: None,
            executable_path: None,
            poll_options: PollOptions::default(),
            slot: RwLock::new(None),
        }
    }

    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn DeploymentProvider>) -> Self {
        self.provider = provider;
        self
    }

    /// Required before a facade can be built. Hosts usually pass
    /// `embedded_version_info!()` expanded in their own crate here.
    #[must_use]
    pub fn with_version_source(mut self, source: Arc<dyn VersionInfoSource>) -> Self {
        self.version_source = Some(source);
        self
    }

    #[must_use]
    pub fn with_executable_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_poll_options(mut self, options: PollOptions) -> Self {
        self.poll_options = options;
        self
    }

    fn facade_builder(&self) -> DeploymentFacadeBuilder {
        let mut builder = DeploymentFacade::builder()
            .provider(Arc::clone(&self.provider))
            .poll_options(self.poll_options);
        if let Some(source) = &self.version_source {
            builder = builder.version_source(Arc::clone(source));
        }
        if let Some(path) = &self.executable_path {
            builder = builder.executable_path(path.clone());
        }
        builder
    }

    /// The registered facade, building one without an update location on
    /// first access.
    ///
    /// # Errors
    /// Returns the construction error; the registry stays empty and the next
    /// call tries again.
    pub fn current(&self) -> Result<Arc<DeploymentFacade>, DeployError> {
        if let Some(facade) = self
            .slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Ok(Arc::clone(facade));
        }

        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(facade) = slot.as_ref() {
            return Ok(Arc::clone(facade));
        }
        debug!("Building default deployment facade");
        let facade = Arc::new(self.facade_builder().build()?);
        *slot = Some(Arc::clone(&facade));
        Ok(facade)
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Registers `facade`. `None` leaves the current registration in place.
    pub fn setup(&self, facade: Option<Arc<DeploymentFacade>>) {
        if let Some(facade) = facade {
            *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(facade);
        }
    }

    /// Builds and registers a facade for `location`. A blank location is
    /// ignored.
    ///
    /// # Errors
    /// Returns the construction error; the current registration is kept.
    pub fn setup_with_location(&self, location: &str) -> Result<(), DeployError> {
        if location.trim().is_empty() {
            debug!("Ignoring blank update location");
            return Ok(());
        }
        let facade = self.facade_builder().update_location(location).build()?;
        self.setup(Some(Arc::new(facade)));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use netdeploy_backend::{AppVersion, DeployError, FileVersionInfo};
    use netdeploy_core::EmbeddedVersionInfo;
    use tempfile::NamedTempFile;

    use super::EntryPoint;

    fn registry(executable: &NamedTempFile) -> EntryPoint {
        EntryPoint::new()
            .with_executable_path(executable.path())
            .with_version_source(Arc::new(EmbeddedVersionInfo::new(FileVersionInfo {
                product_name: "Probe".to_string(),
                company_name: "Example Corp".to_string(),
                comments: String::new(),
                file_version: AppVersion::new(1, 0, 0, 0),
            })))
    }

    #[test]
    fn current_builds_once_and_reuses() {
        let executable = NamedTempFile::new().expect("temp executable");
        let registry = registry(&executable);
        assert!(!registry.is_initialized());

        let first = registry.current().expect("default facade");
        let second = registry.current().expect("default facade");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.update_location(), None);
        assert!(!first.is_network_deployed());
    }

    #[test]
    fn construction_failure_leaves_registry_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let registry = EntryPoint::new()
            .with_executable_path(dir.path().join("missing"))
            .with_version_source(Arc::new(EmbeddedVersionInfo::new(FileVersionInfo {
                product_name: "Probe".to_string(),
                company_name: String::new(),
                comments: String::new(),
                file_version: AppVersion::default(),
            })));

        assert!(registry.current().is_err());
        assert!(!registry.is_initialized());
        assert!(registry.setup_with_location("https://updates.example/").is_err());
        assert!(!registry.is_initialized());
    }

    #[test]
    fn registry_without_version_source_builds_nothing() {
        let executable = NamedTempFile::new().expect("temp executable");
        let registry = EntryPoint::new().with_executable_path(executable.path());

        assert!(matches!(
            registry.current(),
            Err(DeployError::Metadata { .. })
        ));
        assert!(!registry.is_initialized());
    }

    #[test]
    fn setup_none_keeps_existing_facade() {
        let executable = NamedTempFile::new().expect("temp executable");
        let registry = registry(&executable);
        let existing = registry.current().expect("default facade");

        registry.setup(None);

        assert!(Arc::ptr_eq(
            &existing,
            &registry.current().expect("registered facade")
        ));
    }

    #[test]
    fn blank_location_is_ignored() {
        let executable = NamedTempFile::new().expect("temp executable");
        let registry = registry(&executable);

        registry
            .setup_with_location("   ")
            .expect("blank location is not an error");

        assert!(!registry.is_initialized());
    }

    #[test]
    fn setup_with_location_replaces_registration() {
        let executable = NamedTempFile::new().expect("temp executable");
        let registry = registry(&executable);
        registry.current().expect("default facade");

        registry
            .setup_with_location("https://updates.example/app/")
            .expect("facade for location");

        assert_eq!(
            registry
                .current()
                .expect("registered facade")
                .update_location()
                .as_deref(),
            Some("https://updates.example/app/")
        );
    }
}
