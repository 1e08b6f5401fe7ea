use colored::Colorize;
use log::{debug, info, warn};

use crate::{
    error::AppError,
    gh::{HostingCli, find_account},
    git::{GitBackend, WorkTree},
    identity::{IdentityResolver, RetryPolicy},
    request::{Mode, Scope, SwitchRequest},
};

const NAME_KEY: &str = "user.name";
const EMAIL_KEY: &str = "user.email";

/// What a finished run did, for reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The local override was removed
    Unset,
    /// The gh account was switched and its identity written
    Switched {
        login: String,
        email: String,
        hostname: String,
        scope: Scope,
    },
}

impl Outcome {
    /// Prints a confirmation for the user
    pub fn report(&self) {
        match self {
            Outcome::Unset => {
                println!(
                    "{}",
                    "removed repository-local user.name and user.email".green()
                );
            }
            Outcome::Switched {
                login,
                email,
                hostname,
                scope,
            } => {
                println!("{} {} on {}", "switched to:".green(), login, hostname);
                match scope {
                    Scope::Global => {
                        println!("{} {} <{}>", "global git identity:".blue(), login, email);
                    }
                    Scope::LocalRepository => {
                        println!(
                            "{} {} <{}>",
                            "local git identity for this repository:".blue(),
                            login,
                            email
                        );
                        println!(
                            "{}",
                            "note: the active gh account is global; only this repository's commit identity was overridden"
                                .yellow()
                        );
                    }
                }
            }
        }
    }
}

/// Runs a [`SwitchRequest`] against git and gh
pub struct Switcher<'a, G: GitBackend + ?Sized, H: HostingCli + ?Sized> {
    git: &'a G,
    gh: &'a H,
    policy: RetryPolicy,
}

impl<'a, G: GitBackend + ?Sized, H: HostingCli + ?Sized> Switcher<'a, G, H> {
    pub fn new(git: &'a G, gh: &'a H, policy: RetryPolicy) -> Self {
        Switcher { git, gh, policy }
    }

    pub fn run(&self, request: &SwitchRequest, work_tree: WorkTree) -> Result<Outcome, AppError> {
        match &request.mode {
            Mode::UnsetLocal => self.unset_local(work_tree),
            Mode::Switch { username } => self.switch(request, username, work_tree),
        }
    }

    /// Removes the repository-local identity; never touches gh
    fn unset_local(&self, work_tree: WorkTree) -> Result<Outcome, AppError> {
        work_tree.require("--unset-single")?;

        self.git.unset_config(Scope::LocalRepository, NAME_KEY)?;
        self.git.unset_config(Scope::LocalRepository, EMAIL_KEY)?;
        Ok(Outcome::Unset)
    }

    fn switch(
        &self,
        request: &SwitchRequest,
        username: &str,
        work_tree: WorkTree,
    ) -> Result<Outcome, AppError> {
        if request.scope == Scope::LocalRepository {
            work_tree.require("--single")?;
        }

        let hostname = request.hostname.as_str();
        let accounts = self.gh.list_authenticated_accounts(hostname);
        debug!("accounts on {hostname}: {accounts:?}");

        let account = find_account(&accounts, username).ok_or_else(|| AppError::NotLoggedIn {
            username: username.to_string(),
            hostname: hostname.to_string(),
        })?;
        self.gh.switch_account(account, hostname)?;

        let identity = IdentityResolver::new(self.gh, self.policy).resolve(hostname)?;
        let email = identity.email(hostname, request.email.as_deref());

        write_identity(self.git, request.scope, &identity.login, &email)?;
        info!("switched to {} on {hostname}", identity.login);

        Ok(Outcome::Switched {
            login: identity.login,
            email,
            hostname: hostname.to_string(),
            scope: request.scope,
        })
    }
}

/// Writes `user.name` then `user.email` at `scope`
///
/// If the email write fails the previous `user.name` is put back so the
/// scope is not left with a half-applied identity.
pub fn write_identity<G: GitBackend + ?Sized>(
    git: &G,
    scope: Scope,
    name: &str,
    email: &str,
) -> Result<(), AppError> {
    let previous_name = git.get_config(scope, NAME_KEY)?;
    git.set_config(scope, NAME_KEY, name)?;

    if let Err(e) = git.set_config(scope, EMAIL_KEY, email) {
        let restored = match &previous_name {
            Some(previous) => git.set_config(scope, NAME_KEY, previous),
            None => git.unset_config(scope, NAME_KEY),
        };
        if let Err(restore_err) = restored {
            warn!("could not restore previous {NAME_KEY}: {restore_err}");
        }
        return Err(e);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{
        cell::RefCell,
        collections::{BTreeMap, BTreeSet},
    };

    use super::*;

    /// In-memory git config keyed by (scope, key)
    #[derive(Default)]
    struct FakeGit {
        values: RefCell<BTreeMap<(String, String), String>>,
        fail_key: Option<&'static str>,
        calls: RefCell<usize>,
    }

    impl FakeGit {
        fn value(&self, scope: Scope, key: &str) -> Option<String> {
            self.values
                .borrow()
                .get(&(scope.git_flag().to_string(), key.to_string()))
                .cloned()
        }

        fn seed(&self, scope: Scope, key: &str, value: &str) {
            self.values
                .borrow_mut()
                .insert((scope.git_flag().to_string(), key.to_string()), value.to_string());
        }
    }

    impl GitBackend for FakeGit {
        fn is_inside_work_tree(&self) -> Result<bool, AppError> {
            Ok(true)
        }
        fn get_config(&self, scope: Scope, key: &str) -> Result<Option<String>, AppError> {
            *self.calls.borrow_mut() += 1;
            Ok(self.value(scope, key))
        }
        fn set_config(&self, scope: Scope, key: &str, value: &str) -> Result<(), AppError> {
            *self.calls.borrow_mut() += 1;
            if self.fail_key == Some(key) {
                return Err(AppError::GitCommand("could not lock config file".to_string()));
            }
            self.seed(scope, key, value);
            Ok(())
        }
        fn unset_config(&self, scope: Scope, key: &str) -> Result<(), AppError> {
            *self.calls.borrow_mut() += 1;
            self.values
                .borrow_mut()
                .remove(&(scope.git_flag().to_string(), key.to_string()));
            Ok(())
        }
    }

    /// gh with a fixed account list that records every call
    struct FakeGh {
        accounts: BTreeSet<String>,
        payload: Result<&'static str, ()>,
        switch_fails: bool,
        calls: RefCell<Vec<String>>,
    }

    impl FakeGh {
        fn with_accounts(accounts: &[&str], payload: &'static str) -> Self {
            FakeGh {
                accounts: accounts.iter().map(|a| a.to_string()).collect(),
                payload: Ok(payload),
                switch_fails: false,
                calls: RefCell::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl HostingCli for FakeGh {
        fn list_authenticated_accounts(&self, hostname: &str) -> BTreeSet<String> {
            self.calls.borrow_mut().push(format!("status {hostname}"));
            self.accounts.clone()
        }
        fn switch_account(&self, username: &str, hostname: &str) -> Result<(), AppError> {
            self.calls
                .borrow_mut()
                .push(format!("switch {username} {hostname}"));
            if self.switch_fails {
                return Err(AppError::SwitchFailed {
                    username: username.to_string(),
                    reason: "keyring locked".to_string(),
                });
            }
            Ok(())
        }
        fn fetch_user(&self, hostname: &str, _: &str) -> Result<String, AppError> {
            self.calls.borrow_mut().push(format!("api {hostname}"));
            self.payload
                .map(str::to_string)
                .map_err(|_| AppError::GhCommand("HTTP 500".to_string()))
        }
    }

    const ALICE: &str = r#"{"login":"alice","id":42}"#;

    fn switcher<'a>(git: &'a FakeGit, gh: &'a FakeGh) -> Switcher<'a, FakeGit, FakeGh> {
        Switcher::new(git, gh, RetryPolicy::immediate(3))
    }

    #[test]
    fn global_switch_writes_noreply_identity() {
        let git = FakeGit::default();
        let gh = FakeGh::with_accounts(&["alice"], ALICE);

        let outcome = switcher(&git, &gh)
            .run(&SwitchRequest::switch("alice"), WorkTree::Outside)
            .unwrap();

        assert_eq!(git.value(Scope::Global, NAME_KEY).as_deref(), Some("alice"));
        assert_eq!(
            git.value(Scope::Global, EMAIL_KEY).as_deref(),
            Some("42+alice@users.noreply.github.com")
        );
        assert!(matches!(outcome, Outcome::Switched { scope: Scope::Global, .. }));
        assert_eq!(
            gh.calls(),
            vec!["status github.com", "switch alice github.com", "api github.com"]
        );
    }

    #[test]
    fn local_switch_with_custom_email() {
        let git = FakeGit::default();
        let gh = FakeGh::with_accounts(&["alice"], ALICE);
        let mut request = SwitchRequest::switch("alice");
        request.scope = Scope::LocalRepository;
        request.email = Some("x@y.com".to_string());

        switcher(&git, &gh).run(&request, WorkTree::Inside).unwrap();

        assert_eq!(git.value(Scope::LocalRepository, NAME_KEY).as_deref(), Some("alice"));
        assert_eq!(git.value(Scope::LocalRepository, EMAIL_KEY).as_deref(), Some("x@y.com"));
        assert_eq!(git.value(Scope::Global, NAME_KEY), None);
    }

    #[test]
    fn local_switch_outside_work_tree_fails_before_gh() {
        let git = FakeGit::default();
        let gh = FakeGh::with_accounts(&["alice"], ALICE);
        let mut request = SwitchRequest::switch("alice");
        request.scope = Scope::LocalRepository;

        let err = switcher(&git, &gh).run(&request, WorkTree::Outside).unwrap_err();

        assert!(matches!(err, AppError::NotInWorkTree(_)));
        assert!(gh.calls().is_empty());
    }

    #[test]
    fn username_matches_case_insensitively() {
        let git = FakeGit::default();
        let gh = FakeGh::with_accounts(&["Alice"], ALICE);

        switcher(&git, &gh)
            .run(&SwitchRequest::switch("alice"), WorkTree::Outside)
            .unwrap();

        assert!(gh.calls().contains(&"switch Alice github.com".to_string()));
    }

    #[test]
    fn unknown_account_never_switches() {
        let git = FakeGit::default();
        let gh = FakeGh::with_accounts(&["bob"], ALICE);

        let err = switcher(&git, &gh)
            .run(&SwitchRequest::switch("alice"), WorkTree::Outside)
            .unwrap_err();

        assert!(matches!(err, AppError::NotLoggedIn { .. }));
        assert!(err.to_string().contains("gh auth login --hostname github.com"));
        assert_eq!(gh.calls(), vec!["status github.com"]);
        assert_eq!(*git.calls.borrow(), 0);
    }

    #[test]
    fn failed_switch_skips_fetch_and_config() {
        let git = FakeGit::default();
        let mut gh = FakeGh::with_accounts(&["alice"], ALICE);
        gh.switch_fails = true;

        let err = switcher(&git, &gh)
            .run(&SwitchRequest::switch("alice"), WorkTree::Outside)
            .unwrap_err();

        assert!(matches!(err, AppError::SwitchFailed { ref username, .. } if username == "alice"));
        assert!(err.to_string().contains("keyring locked"));
        assert_eq!(gh.calls(), vec!["status github.com", "switch alice github.com"]);
        assert_eq!(*git.calls.borrow(), 0);
    }

    #[test]
    fn prefix_is_not_a_match() {
        let git = FakeGit::default();
        let gh = FakeGh::with_accounts(&["alice-work"], ALICE);

        let err = switcher(&git, &gh)
            .run(&SwitchRequest::switch("alice"), WorkTree::Outside)
            .unwrap_err();
        assert!(matches!(err, AppError::NotLoggedIn { .. }));
    }

    #[test]
    fn exhausted_fetch_leaves_config_untouched() {
        let git = FakeGit::default();
        let mut gh = FakeGh::with_accounts(&["alice"], ALICE);
        gh.payload = Err(());

        let err = switcher(&git, &gh)
            .run(&SwitchRequest::switch("alice"), WorkTree::Outside)
            .unwrap_err();

        assert!(matches!(err, AppError::FetchFailed { attempts: 3 }));
        assert_eq!(gh.calls().iter().filter(|c| c.starts_with("api")).count(), 3);
        assert_eq!(*git.calls.borrow(), 0);
    }

    #[test]
    fn unset_outside_work_tree_fails_without_side_effects() {
        let git = FakeGit::default();
        let gh = FakeGh::with_accounts(&["alice"], ALICE);

        let err = switcher(&git, &gh)
            .run(&SwitchRequest::unset_local(), WorkTree::Outside)
            .unwrap_err();

        assert!(matches!(err, AppError::NotInWorkTree("--unset-single")));
        assert!(gh.calls().is_empty());
        assert_eq!(*git.calls.borrow(), 0);
    }

    #[test]
    fn unset_is_idempotent_and_local_only() {
        let git = FakeGit::default();
        git.seed(Scope::Global, NAME_KEY, "global-name");
        git.seed(Scope::LocalRepository, NAME_KEY, "alice");
        let gh = FakeGh::with_accounts(&[], ALICE);

        let s = switcher(&git, &gh);
        assert_eq!(s.run(&SwitchRequest::unset_local(), WorkTree::Inside).unwrap(), Outcome::Unset);
        assert_eq!(s.run(&SwitchRequest::unset_local(), WorkTree::Inside).unwrap(), Outcome::Unset);

        assert_eq!(git.value(Scope::LocalRepository, NAME_KEY), None);
        assert_eq!(git.value(Scope::Global, NAME_KEY).as_deref(), Some("global-name"));
        assert!(gh.calls().is_empty());
    }

    #[test]
    fn failed_email_write_restores_previous_name() {
        let git = FakeGit {
            fail_key: Some(EMAIL_KEY),
            ..FakeGit::default()
        };
        git.seed(Scope::Global, NAME_KEY, "old");

        let err = write_identity(&git, Scope::Global, "alice", "a@b.c").unwrap_err();

        assert!(matches!(err, AppError::GitCommand(_)));
        assert_eq!(git.value(Scope::Global, NAME_KEY).as_deref(), Some("old"));
    }

    #[test]
    fn failed_email_write_removes_name_that_was_not_set() {
        let git = FakeGit {
            fail_key: Some(EMAIL_KEY),
            ..FakeGit::default()
        };

        assert!(write_identity(&git, Scope::LocalRepository, "alice", "a@b.c").is_err());
        assert_eq!(git.value(Scope::LocalRepository, NAME_KEY), None);
    }
}
