use std::process::{Command, Output};

use log::debug;

use crate::{error::AppError, request::Scope};

/// `git config` exit status when the key being read does not exist
const GIT_CONFIG_KEY_MISSING: i32 = 1;
/// `git config --unset-all` exit status when the key does not exist
const GIT_CONFIG_UNSET_MISSING: i32 = 5;

/// Operations gitswitch needs from git
pub trait GitBackend {
    /// Checks if current directory is in a Git working tree
    fn is_inside_work_tree(&self) -> Result<bool, AppError>;

    /// Reads `key` at `scope`, `None` when it is not set
    fn get_config(&self, scope: Scope, key: &str) -> Result<Option<String>, AppError>;

    /// Writes `key = value` at `scope`
    fn set_config(&self, scope: Scope, key: &str, value: &str) -> Result<(), AppError>;

    /// Removes `key` at `scope`; a key that is not set is not an error
    fn unset_config(&self, scope: Scope, key: &str) -> Result<(), AppError>;
}

/// Whether the process runs inside a git working tree
///
/// Computed once up front and handed to the workflows so that
/// precondition checks do not query the current directory themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkTree {
    Inside,
    Outside,
}

impl WorkTree {
    /// Asks git about the current directory
    pub fn detect<G: GitBackend + ?Sized>(git: &G) -> Result<Self, AppError> {
        Ok(if git.is_inside_work_tree()? {
            WorkTree::Inside
        } else {
            WorkTree::Outside
        })
    }

    /// Fails with a precondition error naming `what` when outside a work tree
    pub fn require(self, what: &'static str) -> Result<(), AppError> {
        match self {
            WorkTree::Inside => Ok(()),
            WorkTree::Outside => Err(AppError::NotInWorkTree(what)),
        }
    }
}

/// [`GitBackend`] backed by the `git` executable
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemGit;

impl SystemGit {
    fn run(&self, args: &[&str]) -> Result<Output, AppError> {
        debug!("running: git {}", args.join(" "));
        Ok(Command::new("git").args(args).output()?)
    }
}

fn stderr_message(output: &Output) -> Result<String, AppError> {
    Ok(String::from_utf8(output.stderr.clone())?.trim().to_string())
}

impl GitBackend for SystemGit {
    fn is_inside_work_tree(&self) -> Result<bool, AppError> {
        let git_command_output = self.run(&["rev-parse", "--is-inside-work-tree"])?;

        // Outside a repository git exits non-zero; that simply means "no".
        if !git_command_output.status.success() {
            debug!("not in a work tree: {}", stderr_message(&git_command_output)?);
            return Ok(false);
        }

        let value = String::from_utf8_lossy(&git_command_output.stdout).to_string();
        Ok(value.trim() == "true")
    }

    fn get_config(&self, scope: Scope, key: &str) -> Result<Option<String>, AppError> {
        let git_command_output = self.run(&["config", scope.git_flag(), "--get", key])?;

        if git_command_output.status.code() == Some(GIT_CONFIG_KEY_MISSING) {
            return Ok(None);
        }
        if !git_command_output.status.success() {
            return Err(AppError::GitCommand(stderr_message(&git_command_output)?));
        }

        let value = String::from_utf8(git_command_output.stdout)?;
        Ok(Some(value.trim_end_matches(['\n', '\r']).to_string()))
    }

    fn set_config(&self, scope: Scope, key: &str, value: &str) -> Result<(), AppError> {
        let git_command_output = self.run(&["config", scope.git_flag(), key, value])?;

        if !git_command_output.status.success() {
            return Err(AppError::GitCommand(stderr_message(&git_command_output)?));
        }

        Ok(())
    }

    fn unset_config(&self, scope: Scope, key: &str) -> Result<(), AppError> {
        let git_command_output = self.run(&["config", scope.git_flag(), "--unset-all", key])?;

        if git_command_output.status.code() == Some(GIT_CONFIG_UNSET_MISSING) {
            debug!("{key} was not set at {}", scope.git_flag());
            return Ok(());
        }
        if !git_command_output.status.success() {
            return Err(AppError::GitCommand(stderr_message(&git_command_output)?));
        }

        Ok(())
    }
}
