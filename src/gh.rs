//! The gh CLI as a collaborator: account listing, switching and API access

use std::{
    collections::BTreeSet,
    path::PathBuf,
    process::{Command, ExitStatus, Output},
};

use log::{debug, warn};

use crate::{config::GH_CONFIG_DIR_ENV, error::AppError};

/// Operations gitswitch needs from the hosting CLI
pub trait HostingCli {
    /// Accounts gh lists as logged in on `hostname`; empty if gh cannot run
    fn list_authenticated_accounts(&self, hostname: &str) -> BTreeSet<String>;

    /// Makes `username` the active account on `hostname`
    fn switch_account(&self, username: &str, hostname: &str) -> Result<(), AppError>;

    /// Raw JSON body of `GET /user`, cached by gh for `cache_ttl`
    fn fetch_user(&self, hostname: &str, cache_ttl: &str) -> Result<String, AppError>;
}

/// [`HostingCli`] backed by the `gh` executable
#[derive(Debug, Default, Clone)]
pub struct GhCli {
    config_dir: Option<PathBuf>,
}

impl GhCli {
    /// Every call is pinned to `config_dir` when given; otherwise gh uses
    /// its own default location
    pub fn new(config_dir: Option<PathBuf>) -> Self {
        GhCli { config_dir }
    }

    fn run(&self, args: &[&str]) -> Result<Output, AppError> {
        debug!("running: gh {}", args.join(" "));
        let mut command = Command::new("gh");
        command.args(args);
        if let Some(dir) = &self.config_dir {
            command.env(GH_CONFIG_DIR_ENV, dir);
        }
        Ok(command.output()?)
    }

    /// Points git's credential helper at gh (`gh auth setup-git`)
    pub fn setup_git(&self) -> Result<(), AppError> {
        let output = self.run(&["auth", "setup-git"])?;

        if !output.status.success() {
            return Err(AppError::GhCommand(failure_reason(&output)));
        }

        Ok(())
    }
}

fn failure_reason(output: &Output) -> String {
    describe_failure(output.status, &output.stderr)
}

/// gh's stderr, or the exit code when gh printed nothing
fn describe_failure(status: ExitStatus, stderr: &[u8]) -> String {
    let stderr = String::from_utf8_lossy(stderr).trim().to_string();
    if !stderr.is_empty() {
        return stderr;
    }
    match status.code() {
        Some(code) => format!("exited with code {code}"),
        None => format!("terminated by signal ({status})"),
    }
}

impl HostingCli for GhCli {
    fn list_authenticated_accounts(&self, hostname: &str) -> BTreeSet<String> {
        let output = match self.run(&["auth", "status", "--hostname", hostname]) {
            Ok(output) => output,
            Err(e) => {
                warn!("could not query gh auth status: {e}");
                return BTreeSet::new();
            }
        };

        // Depending on the gh version the report lands on stdout or stderr.
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push('\n');
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        let accounts = parse_auth_status(&text, hostname);

        // gh exits non-zero when any account on the host has a bad token,
        // while still listing the healthy ones.
        if !output.status.success() {
            let code = output
                .status
                .code()
                .map_or_else(|| "a signal".to_string(), |c| format!("code {c}"));
            warn!(
                "gh auth status exited with {code}; {} usable account(s) listed",
                accounts.len()
            );
        }

        accounts
    }

    fn switch_account(&self, username: &str, hostname: &str) -> Result<(), AppError> {
        let output = self.run(&["auth", "switch", "--hostname", hostname, "--user", username])?;

        if !output.status.success() {
            return Err(AppError::SwitchFailed {
                username: username.to_string(),
                reason: failure_reason(&output),
            });
        }

        Ok(())
    }

    fn fetch_user(&self, hostname: &str, cache_ttl: &str) -> Result<String, AppError> {
        let output = self.run(&["api", "--hostname", hostname, "--cache", cache_ttl, "/user"])?;

        if !output.status.success() {
            return Err(AppError::GhCommand(failure_reason(&output)));
        }

        Ok(String::from_utf8(output.stdout)?)
    }
}

/// Extracts logged-in account names for `hostname` from `gh auth status` text
///
/// Understands both `Logged in to <host> account <user> (...)` and the older
/// `Logged in to <host> as <user> (...)`.
pub fn parse_auth_status(text: &str, hostname: &str) -> BTreeSet<String> {
    const MARKER: &str = "Logged in to ";

    text.lines()
        .filter_map(|line| {
            let rest = &line[line.find(MARKER)? + MARKER.len()..];
            let mut tokens = rest.split_whitespace();
            let host = tokens.next()?;
            let keyword = tokens.next()?;
            let user = tokens.next()?;
            (host.eq_ignore_ascii_case(hostname) && matches!(keyword, "account" | "as"))
                .then(|| user.to_string())
        })
        .collect()
}

/// Finds `username` among `accounts` ignoring ASCII case, returning the
/// spelling gh knows the account by
pub fn find_account<'a>(accounts: &'a BTreeSet<String>, username: &str) -> Option<&'a str> {
    accounts
        .iter()
        .find(|account| account.eq_ignore_ascii_case(username))
        .map(String::as_str)
}
