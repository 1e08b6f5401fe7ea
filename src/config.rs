use std::{env, ffi::OsString, path::PathBuf};

/// Environment variable gh reads its configuration directory from
pub const GH_CONFIG_DIR_ENV: &str = "GH_CONFIG_DIR";

/// gh's directory name under an XDG config root
const GH_DIR_NAME: &str = "gh";

/// The `GH_CONFIG_DIR` the user exported, if any
///
/// Only this is forwarded to gh; without it gh picks its own default.
pub fn gh_config_override() -> Option<PathBuf> {
    non_empty(env::var_os(GH_CONFIG_DIR_ENV)).map(PathBuf::from)
}

/// Gets the directory holding gh's stored credentials for this user
pub fn gh_config_dir() -> Option<PathBuf> {
    resolve_gh_config_dir(
        env::var_os(GH_CONFIG_DIR_ENV),
        env::var_os("XDG_CONFIG_HOME"),
        platform_default_dir(),
    )
}

/// gh's fallback location: `%AppData%\GitHub CLI` on Windows,
/// `~/.config/gh` elsewhere
fn platform_default_dir() -> Option<PathBuf> {
    if cfg!(windows) {
        dirs::config_dir().map(|dir| dir.join("GitHub CLI"))
    } else {
        dirs::home_dir().map(|home| home.join(".config").join(GH_DIR_NAME))
    }
}

fn non_empty(value: Option<OsString>) -> Option<OsString> {
    value.filter(|v| !v.is_empty())
}

/// Resolves gh's config directory from an explicit override, the XDG config
/// root, or the platform default, in that order. Empty values are ignored.
pub fn resolve_gh_config_dir(
    override_dir: Option<OsString>,
    xdg_config_home: Option<OsString>,
    platform_default: Option<PathBuf>,
) -> Option<PathBuf> {
    if let Some(dir) = non_empty(override_dir) {
        return Some(PathBuf::from(dir));
    }
    if let Some(root) = non_empty(xdg_config_home) {
        return Some(PathBuf::from(root).join(GH_DIR_NAME));
    }
    platform_default
}
