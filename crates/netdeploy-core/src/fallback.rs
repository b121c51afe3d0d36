//! Property chains of the form "deployed value if network deployed, local
//! value otherwise".
//!
//! `deployed` is `Some` only for a network-deployed application, and carries
//! whatever answers for the deployment (a native handle or a backend). The
//! deployed branch is lazy, so a side-loaded application never queries it.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use netdeploy_backend::AppVersion;

pub fn resolve<N: ?Sized, T>(
    deployed: Option<&N>,
    read: impl FnOnce(&N) -> T,
    local: impl FnOnce() -> T,
) -> T {
    match deployed {
        Some(source) => read(source),
        None => local(),
    }
}

pub fn current_version<N: ?Sized>(
    deployed: Option<&N>,
    read: impl FnOnce(&N) -> AppVersion,
    local: AppVersion,
) -> AppVersion {
    resolve(deployed, read, || local)
}

pub fn data_directory<N: ?Sized>(
    deployed: Option<&N>,
    read: impl FnOnce(&N) -> PathBuf,
    executable_directory: impl FnOnce() -> PathBuf,
) -> PathBuf {
    resolve(deployed, read, executable_directory)
}

/// A side-loaded application has never "checked", so it reports `now`.
pub fn last_check_time<N: ?Sized>(
    deployed: Option<&N>,
    read: impl FnOnce(&N) -> DateTime<Utc>,
    now: impl FnOnce() -> DateTime<Utc>,
) -> DateTime<Utc> {
    resolve(deployed, read, now)
}

pub fn is_first_run<N: ?Sized>(deployed: Option<&N>, read: impl FnOnce(&N) -> bool) -> bool {
    resolve(deployed, read, || false)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use chrono::{DateTime, TimeZone, Utc};
    use netdeploy_backend::AppVersion;

    use super::{current_version, data_directory, is_first_run, last_check_time, resolve};

    struct Deployed {
        version: AppVersion,
        data_dir: PathBuf,
        last_check: DateTime<Utc>,
        first_run: bool,
    }

    fn deployed() -> Deployed {
        Deployed {
            version: AppVersion::new(2, 0, 0, 0),
            data_dir: PathBuf::from("/deployments/app/data"),
            last_check: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
            first_run: true,
        }
    }

    #[test]
    fn resolve_never_touches_deployed_branch_when_local() {
        let value = resolve::<Deployed, _>(None, |_| panic!("deployed branch queried"), || 7);
        assert_eq!(value, 7);
    }

    #[test]
    fn current_version_prefers_deployed_value() {
        let local = AppVersion::new(1, 0, 0, 0);
        let source = deployed();

        assert_eq!(
            current_version(Some(&source), |d| d.version, local),
            source.version
        );
        assert_eq!(current_version::<Deployed>(None, |d| d.version, local), local);
    }

    #[test]
    fn data_directory_uses_executable_directory_when_local() {
        let dir = data_directory::<Deployed>(None, |d| d.data_dir.clone(), || {
            PathBuf::from("/opt/app")
        });
        assert_eq!(dir, PathBuf::from("/opt/app"));

        let source = deployed();
        let dir = data_directory(Some(&source), |d| d.data_dir.clone(), || {
            PathBuf::from("/opt/app")
        });
        assert_eq!(dir, source.data_dir);
    }

    #[test]
    fn last_check_and_first_run_fall_back() {
        let source = deployed();
        let now = Utc.with_ymd_and_hms(2025, 6, 7, 8, 9, 10).unwrap();

        assert_eq!(
            last_check_time(Some(&source), |d| d.last_check, || now),
            source.last_check
        );
        assert_eq!(last_check_time::<Deployed>(None, |d| d.last_check, || now), now);
        assert!(is_first_run(Some(&source), |d| d.first_run));
        assert!(!is_first_run::<Deployed>(None, |d| d.first_run));
    }
}
