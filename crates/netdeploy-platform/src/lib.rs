mod executable;
mod paths;

pub use executable::{ExecutableError, current_executable};
pub use paths::{AppPaths, AppPathsError};
