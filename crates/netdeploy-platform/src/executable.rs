use std::path::PathBuf;

use log::debug;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("failed to resolve the running executable: {source}")]
pub struct ExecutableError {
    #[source]
    source: std::io::Error,
}

/// Path of the running executable.
///
/// # Errors
/// Returns an error when the platform cannot report the executable path.
pub fn current_executable() -> Result<PathBuf, ExecutableError> {
    let exe = std::env::current_exe().map_err(|source| ExecutableError { source })?;
    Ok(strip_deleted_suffix(exe))
}

// After an in-place binary replacement Linux reports the old inode as
// "<path> (deleted)"; the new binary lives at the original path.
fn strip_deleted_suffix(exe: PathBuf) -> PathBuf {
    let stripped = exe
        .to_str()
        .and_then(|path| path.strip_suffix(" (deleted)"))
        .map(PathBuf::from);
    match stripped {
        Some(fixed) => {
            debug!("Adjusted exe path from deleted inode: {}", fixed.display());
            fixed
        }
        None => exe,
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{current_executable, strip_deleted_suffix};

    #[test]
    fn current_executable_points_at_test_binary() {
        let exe = current_executable().expect("test binary path should resolve");
        assert!(exe.is_absolute());
    }

    #[test]
    fn deleted_suffix_is_removed() {
        assert_eq!(
            strip_deleted_suffix(PathBuf::from("/usr/bin/app (deleted)")),
            PathBuf::from("/usr/bin/app")
        );
        assert_eq!(
            strip_deleted_suffix(PathBuf::from("/usr/bin/app")),
            PathBuf::from("/usr/bin/app")
        );
    }
}
