use thiserror::Error;

/// Application error types
///
/// Every variant is fatal: the binary prints it and exits with status 1.
#[derive(Error, Debug)]
pub enum AppError {
    /// Error during process I/O (spawning git or gh)
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// Error during UTF-8 conversion.
    #[error("UTF-8 error: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),
    /// Malformed flags or arguments, reported together with the usage line
    #[error("{message}\n\n{usage}")]
    Usage { message: String, usage: String },
    /// Operation needs a git working tree but the current directory is not in one
    #[error("not inside a git working tree; {0} must be run from inside a repository")]
    NotInWorkTree(&'static str),
    /// Required executable is not on the PATH
    #[error("required tool '{0}' is not installed or not on PATH (run gitswitch-setup to install it)")]
    MissingDependency(String),
    /// Requested account is not authenticated against the hostname
    #[error(
        "account '{username}' is not logged in on {hostname}; log in first with: gh auth login --hostname {hostname}"
    )]
    NotLoggedIn { username: String, hostname: String },
    /// The gh account switch itself failed
    #[error("failed to switch gh account to '{username}': {reason}")]
    SwitchFailed { username: String, reason: String },
    /// The `/user` API fetch kept failing
    #[error("failed to fetch user data after {attempts} attempts")]
    FetchFailed { attempts: u32 },
    /// The API answered but without the fields needed for an identity
    #[error("invalid user data from API: {0}")]
    InvalidPayload(String),
    /// Error when executing Git commands
    #[error("git command failed: {0}")]
    GitCommand(String),
    /// Error when executing gh commands
    #[error("gh command failed: {0}")]
    GhCommand(String),
    /// Bootstrap could not install a dependency
    #[error("setup failed: {0}")]
    Setup(String),
}
