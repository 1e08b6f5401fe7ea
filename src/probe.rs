use log::debug;

use crate::error::AppError;

/// Executables the switch workflow shells out to
pub const REQUIRED_TOOLS: &[&str] = &["git", "gh"];

/// Checks that every tool in `tools` resolves on the PATH
///
/// The first missing tool ends the check with an error naming it.
pub fn ensure_tools(tools: &[&str]) -> Result<(), AppError> {
    for tool in tools {
        let path = which::which(tool).map_err(|_| AppError::MissingDependency(tool.to_string()))?;
        debug!("found {tool} at {}", path.display());
    }
    Ok(())
}

/// Tools from `tools` that are not on the PATH
pub fn missing_tools<'a>(tools: &[&'a str]) -> Vec<&'a str> {
    tools
        .iter()
        .copied()
        .filter(|tool| which::which(tool).is_err())
        .collect()
}
