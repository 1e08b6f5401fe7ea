//! Resolving the active account's login and id from the GitHub API

use std::{fmt::Display, thread, time::Duration};

use log::{debug, warn};
use serde::Deserialize;

use crate::{error::AppError, gh::HostingCli};

/// How long gh may serve `/user` from its response cache
pub const USER_CACHE_TTL: &str = "5m";

/// Fixed-delay retry: `max_attempts` tries with `delay` between them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Same attempt budget without waiting, for tests
    pub fn immediate(max_attempts: u32) -> Self {
        RetryPolicy {
            max_attempts,
            delay: Duration::ZERO,
        }
    }

    /// Runs `op` until it succeeds or the attempts run out, calling `sleep`
    /// between attempts but never after the last one. Returns the last error.
    pub fn run<T, E, F, S>(&self, mut op: F, mut sleep: S) -> Result<T, E>
    where
        E: Display,
        F: FnMut(u32) -> Result<T, E>,
        S: FnMut(Duration),
    {
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= self.max_attempts => return Err(e),
                Err(e) => {
                    warn!("attempt {attempt}/{} failed: {e}", self.max_attempts);
                    sleep(self.delay);
                    attempt += 1;
                }
            }
        }
    }
}

/// Fields of the `/user` payload gitswitch cares about
#[derive(Deserialize, Debug)]
struct GhUser {
    #[serde(default)]
    login: Option<String>,
    #[serde(default)]
    id: Option<u64>,
}

/// Login and numeric id of the authenticated account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub login: String,
    pub id: u64,
}

impl ResolvedIdentity {
    /// Commit email: `custom` when given, else the noreply address
    pub fn email(&self, hostname: &str, custom: Option<&str>) -> String {
        match custom {
            Some(email) => email.to_string(),
            None => noreply_email(self.id, &self.login, hostname),
        }
    }
}

/// `{id}+{login}@users.noreply.{hostname}`
pub fn noreply_email(id: u64, login: &str, hostname: &str) -> String {
    format!("{id}+{login}@users.noreply.{hostname}")
}

/// Parses a `/user` response, rejecting payloads without a login or id
pub fn parse_user(payload: &str) -> Result<ResolvedIdentity, AppError> {
    let user: GhUser = serde_json::from_str(payload)
        .map_err(|e| AppError::InvalidPayload(format!("response is not valid JSON: {e}")))?;

    let login = user
        .login
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .ok_or_else(|| AppError::InvalidPayload("missing login".to_string()))?;
    let id = user
        .id
        .filter(|id| *id != 0)
        .ok_or_else(|| AppError::InvalidPayload("missing id".to_string()))?;

    Ok(ResolvedIdentity { login, id })
}

/// Fetches the active account's identity through gh with a retry policy
pub struct IdentityResolver<'a, H: HostingCli + ?Sized> {
    gh: &'a H,
    policy: RetryPolicy,
}

impl<'a, H: HostingCli + ?Sized> IdentityResolver<'a, H> {
    pub fn new(gh: &'a H, policy: RetryPolicy) -> Self {
        IdentityResolver { gh, policy }
    }

    pub fn resolve(&self, hostname: &str) -> Result<ResolvedIdentity, AppError> {
        self.resolve_with(hostname, thread::sleep)
    }

    /// Like [`resolve`](Self::resolve) with a caller-provided sleep
    pub fn resolve_with<S>(&self, hostname: &str, sleep: S) -> Result<ResolvedIdentity, AppError>
    where
        S: FnMut(Duration),
    {
        let payload = self
            .policy
            .run(
                |attempt| {
                    debug!("fetching /user from {hostname} (attempt {attempt})");
                    self.gh.fetch_user(hostname, USER_CACHE_TTL)
                },
                sleep,
            )
            .map_err(|e| {
                debug!("last fetch error: {e}");
                AppError::FetchFailed {
                    attempts: self.policy.max_attempts,
                }
            })?;

        parse_user(&payload)
    }
}
