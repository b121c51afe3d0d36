use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Four-part deployment version (`major.minor.build.revision`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AppVersion {
    pub major: u32,
    pub minor: u32,
    pub build: u32,
    pub revision: u32,
}

impl AppVersion {
    #[must_use]
    pub const fn new(major: u32, minor: u32, build: u32, revision: u32) -> Self {
        Self {
            major,
            minor,
            build,
            revision,
        }
    }
}

impl Ord for AppVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.build.cmp(&other.build))
            .then(self.revision.cmp(&other.revision))
    }
}

impl PartialOrd for AppVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for AppVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionComponent {
    Major,
    Minor,
    Build,
    Revision,
}

impl VersionComponent {
    const ORDER: [Self; 4] = [Self::Major, Self::Minor, Self::Build, Self::Revision];
}

impl fmt::Display for VersionComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Major => write!(f, "major"),
            Self::Minor => write!(f, "minor"),
            Self::Build => write!(f, "build"),
            Self::Revision => write!(f, "revision"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionParseError {
    #[error("Expected two to four dot-separated numbers, got: {input}")]
    InvalidFormat { input: String },
    #[error("Invalid {component} version: {value}")]
    InvalidComponent {
        component: VersionComponent,
        value: String,
    },
}

impl FromStr for AppVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
        let core = trimmed
            .find(['-', '+'])
            .map_or(trimmed, |idx| &trimmed[..idx]);

        if core.is_empty() {
            return Err(VersionParseError::InvalidFormat {
                input: s.to_string(),
            });
        }

        let parts: Vec<&str> = core.split('.').collect();
        if !(2..=VersionComponent::ORDER.len()).contains(&parts.len()) {
            return Err(VersionParseError::InvalidFormat {
                input: s.to_string(),
            });
        }

        let mut values = [0_u32; 4];
        for ((slot, part), component) in values
            .iter_mut()
            .zip(&parts)
            .zip(VersionComponent::ORDER)
        {
            *slot = part
                .parse()
                .map_err(|_| VersionParseError::InvalidComponent {
                    component,
                    value: (*part).to_string(),
                })?;
        }

        let [major, minor, build, revision] = values;
        Ok(AppVersion::new(major, minor, build, revision))
    }
}

/// Metadata embedded in an executable, as reported by a [`crate::VersionInfoSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileVersionInfo {
    pub product_name: String,
    pub company_name: String,
    pub comments: String,
    pub file_version: AppVersion,
}

/// Where the running application lives and where it updates from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentIdentity {
    executable_path: PathBuf,
    update_location: Option<String>,
}

impl DeploymentIdentity {
    /// Blank update locations are treated as absent.
    #[must_use]
    pub fn new(executable_path: PathBuf, update_location: Option<String>) -> Self {
        let update_location = update_location
            .map(|location| location.trim().to_string())
            .filter(|location| !location.is_empty());
        Self {
            executable_path,
            update_location,
        }
    }

    #[must_use]
    pub fn executable_path(&self) -> &Path {
        &self.executable_path
    }

    #[must_use]
    pub fn update_location(&self) -> Option<&str> {
        self.update_location.as_deref()
    }

    /// Directory containing the executable; falls back to the path itself
    /// when it has no parent.
    #[must_use]
    pub fn executable_directory(&self) -> PathBuf {
        self.executable_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map_or_else(|| self.executable_path.clone(), Path::to_path_buf)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{AppVersion, DeploymentIdentity, VersionComponent, VersionParseError};

    #[test]
    fn parses_partial_versions_with_zero_fill() {
        assert_eq!(
            "1.2".parse::<AppVersion>().expect("two components"),
            AppVersion::new(1, 2, 0, 0)
        );
        assert_eq!(
            "v3.4.5.6".parse::<AppVersion>().expect("four components"),
            AppVersion::new(3, 4, 5, 6)
        );
        assert_eq!(
            "0.3.0-beta.2".parse::<AppVersion>().expect("pre-release suffix"),
            AppVersion::new(0, 3, 0, 0)
        );
    }

    #[test]
    fn rejects_too_few_or_many_components_and_garbage() {
        assert!(matches!(
            "7".parse::<AppVersion>(),
            Err(VersionParseError::InvalidFormat { .. })
        ));
        assert!(matches!(
            "v7-beta".parse::<AppVersion>(),
            Err(VersionParseError::InvalidFormat { .. })
        ));
        assert!(matches!(
            "1.2.3.4.5".parse::<AppVersion>(),
            Err(VersionParseError::InvalidFormat { .. })
        ));
        assert!(matches!(
            "".parse::<AppVersion>(),
            Err(VersionParseError::InvalidFormat { .. })
        ));
        assert_eq!(
            "1.x.0".parse::<AppVersion>(),
            Err(VersionParseError::InvalidComponent {
                component: VersionComponent::Minor,
                value: "x".to_string(),
            })
        );
    }

    #[test]
    fn ordering_is_component_wise() {
        let base = AppVersion::new(1, 0, 0, 0);
        assert!(AppVersion::new(1, 2, 0, 0) > base);
        assert!(AppVersion::new(1, 0, 0, 1) > base);
        assert!(AppVersion::new(0, 9, 9, 9) < base);
        assert_eq!(base.to_string(), "1.0.0.0");
    }

    #[test]
    fn identity_drops_blank_update_location() {
        let identity = DeploymentIdentity::new(PathBuf::from("/opt/app/app"), Some("  ".into()));
        assert_eq!(identity.update_location(), None);

        let identity = DeploymentIdentity::new(
            PathBuf::from("/opt/app/app"),
            Some(" https://updates.example/app/ ".into()),
        );
        assert_eq!(
            identity.update_location(),
            Some("https://updates.example/app/")
        );
        assert_eq!(identity.executable_directory(), PathBuf::from("/opt/app"));
    }
}
