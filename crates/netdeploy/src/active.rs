//! The deployment mechanism compiled into this build.

#[cfg(not(any(feature = "manifest", feature = "system")))]
compile_error!("enable at least one of the `manifest` or `system` features");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Manifest,
    System,
}

impl BackendKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Manifest => "manifest",
            Self::System => "system",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "system")]
pub const ACTIVE_BACKEND: BackendKind = BackendKind::System;
#[cfg(feature = "system")]
pub type ActiveProvider = netdeploy_system::SystemProvider;

#[cfg(all(feature = "manifest", not(feature = "system")))]
pub const ACTIVE_BACKEND: BackendKind = BackendKind::Manifest;
#[cfg(all(feature = "manifest", not(feature = "system")))]
pub type ActiveProvider = netdeploy_manifest::ManifestProvider;

#[cfg(test)]
mod tests {
    use netdeploy_backend::DeploymentProvider;

    use super::{ACTIVE_BACKEND, ActiveProvider, BackendKind};

    #[test]
    fn active_provider_matches_active_backend() {
        assert_eq!(ActiveProvider::default().name(), ACTIVE_BACKEND.as_str());
    }

    #[cfg(feature = "system")]
    #[test]
    fn system_takes_precedence() {
        assert_eq!(ACTIVE_BACKEND, BackendKind::System);
    }

    #[cfg(not(feature = "system"))]
    #[test]
    fn manifest_is_the_default() {
        assert_eq!(ACTIVE_BACKEND, BackendKind::Manifest);
    }

    #[test]
    fn display_outputs_backend_name() {
        assert_eq!(BackendKind::Manifest.to_string(), "manifest");
        assert_eq!(BackendKind::System.to_string(), "system");
    }
}
