/// Hostname used when `--hostname` is omitted
pub const DEFAULT_HOSTNAME: &str = "github.com";

/// Which git configuration layer receives the identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// `git config --global`
    Global,
    /// `git config --local`, only valid inside a working tree
    LocalRepository,
}

impl Scope {
    /// Flag passed to `git config` to select this layer
    pub fn git_flag(self) -> &'static str {
        match self {
            Scope::Global => "--global",
            Scope::LocalRepository => "--local",
        }
    }
}

/// What a single invocation should do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Switch the gh account to `username` and write its identity
    Switch { username: String },
    /// Remove the repository-local identity override
    UnsetLocal,
}

/// Validated configuration for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchRequest {
    pub mode: Mode,
    pub scope: Scope,
    pub hostname: String,
    /// Overrides the computed noreply address when present
    pub email: Option<String>,
}

impl SwitchRequest {
    /// Request that switches globally to `username` on the default host
    pub fn switch(username: &str) -> Self {
        SwitchRequest {
            mode: Mode::Switch {
                username: username.to_string(),
            },
            scope: Scope::Global,
            hostname: DEFAULT_HOSTNAME.to_string(),
            email: None,
        }
    }

    /// Request that removes the local override
    pub fn unset_local() -> Self {
        SwitchRequest {
            mode: Mode::UnsetLocal,
            scope: Scope::LocalRepository,
            hostname: DEFAULT_HOSTNAME.to_string(),
            email: None,
        }
    }

    /// Whether running this request requires a git working tree
    pub fn needs_work_tree(&self) -> bool {
        matches!(self.mode, Mode::UnsetLocal) || self.scope == Scope::LocalRepository
    }
}
