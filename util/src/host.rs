//! Host platform utility functions

use std::path::PathBuf;

/// Environment variable holding the root directory of the software installation.
pub const SW_ROOT_ENV_VAR: &str = "ROBOARM_SW_ROOT";

/// Retrieve the software root directory from the environment.
///
/// Parameter files are found in `<root>/params` and sessions are created
/// under the root.
pub fn get_sw_root() -> Result<PathBuf, std::env::VarError> {
    std::env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}
