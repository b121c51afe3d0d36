use std::path::Path;

use netdeploy_backend::{AppVersion, DeployError, FileVersionInfo, VersionInfoSource};

/// Version header captured from the host package at build time.
///
/// Use [`embedded_version_info!`](crate::embedded_version_info) from the host
/// crate so the values describe the application rather than this library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedVersionInfo {
    info: FileVersionInfo,
}

impl EmbeddedVersionInfo {
    #[must_use]
    pub fn new(info: FileVersionInfo) -> Self {
        Self { info }
    }

    /// Builds the header from Cargo package fields. `authors` is the
    /// colon-separated `CARGO_PKG_AUTHORS` value; the first entry becomes the
    /// company name.
    ///
    /// # Errors
    /// Returns an error if `version` is not a valid version string.
    pub fn from_package(
        name: &str,
        authors: &str,
        description: &str,
        version: &str,
    ) -> Result<Self, DeployError> {
        let file_version: AppVersion = version.parse()?;
        let company_name = authors
            .split(':')
            .next()
            .map(|author| {
                author
                    .split_once('<')
                    .map_or(author, |(name, _)| name)
                    .trim()
                    .to_string()
            })
            .unwrap_or_default();

        Ok(Self::new(FileVersionInfo {
            product_name: name.to_string(),
            company_name,
            comments: description.to_string(),
            file_version,
        }))
    }

    #[must_use]
    pub fn info(&self) -> &FileVersionInfo {
        &self.info
    }
}

impl VersionInfoSource for EmbeddedVersionInfo {
    fn read(&self, path: &Path) -> Result<FileVersionInfo, DeployError> {
        let metadata =
            std::fs::metadata(path).map_err(|error| DeployError::metadata_from(path, error))?;
        if !metadata.is_file() {
            return Err(DeployError::metadata(path, "not a regular file"));
        }
        Ok(self.info.clone())
    }
}

/// Expands to an [`EmbeddedVersionInfo`] built from the calling crate's
/// Cargo metadata.
#[macro_export]
macro_rules! embedded_version_info {
    () => {
        $crate::EmbeddedVersionInfo::from_package(
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_AUTHORS"),
            env!("CARGO_PKG_DESCRIPTION"),
            env!("CARGO_PKG_VERSION"),
        )
    };
}
