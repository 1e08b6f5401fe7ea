use clap::{CommandFactory, Parser};

use crate::{
    error::AppError,
    request::{DEFAULT_HOSTNAME, Mode, Scope, SwitchRequest},
    validation::{validate_input_email, validate_input_hostname},
};

/// CLI arguments parser using `clap`
#[derive(Parser, Debug)]
#[command(
    name = "gitswitch",
    version,
    about = "Switch the active gh account and set the matching git commit identity",
    override_usage = "gitswitch [--single] [--hostname <HOST>] [--email <EMAIL>] <USERNAME>\n       gitswitch --unset-single\n       gitswitch -h | --help"
)]
pub struct Cli {
    /// gh account to switch to
    #[arg(value_name = "USERNAME")]
    pub usernames: Vec<String>,
    /// Write the identity to this repository only instead of globally
    #[arg(long)]
    pub single: bool,
    /// Remove this repository's user.name and user.email override
    #[arg(long = "unset-single")]
    pub unset_single: bool,
    /// GitHub host the account belongs to
    #[arg(long, value_name = "HOST")]
    pub hostname: Option<String>,
    /// Commit email to use instead of the noreply address
    #[arg(long, value_name = "EMAIL")]
    pub email: Option<String>,
    /// Print every external command that is run
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Checks flag combinations and builds the request for this run
    pub fn into_request(self) -> Result<SwitchRequest, AppError> {
        if self.usernames.len() > 1 {
            return Err(usage_error("only one username can be given"));
        }

        let hostname = match self.hostname {
            Some(hostname) => {
                validate_input_hostname(&hostname).map_err(|e| usage_error(&e))?;
                hostname
            }
            None => DEFAULT_HOSTNAME.to_string(),
        };

        if let Some(email) = &self.email {
            validate_input_email(email).map_err(|e| usage_error(&e))?;
        }

        let username = self.usernames.into_iter().next();

        if self.unset_single {
            if username.is_some() || self.single {
                return Err(usage_error(
                    "--unset-single cannot be combined with a username or --single",
                ));
            }
            return Ok(SwitchRequest {
                mode: Mode::UnsetLocal,
                scope: Scope::LocalRepository,
                hostname,
                email: self.email,
            });
        }

        let Some(username) = username else {
            return Err(usage_error("a username is required"));
        };

        Ok(SwitchRequest {
            mode: Mode::Switch { username },
            scope: if self.single {
                Scope::LocalRepository
            } else {
                Scope::Global
            },
            hostname,
            email: self.email,
        })
    }
}

/// Builds a usage error carrying the rendered usage line
pub fn usage_error(message: &str) -> AppError {
    AppError::Usage {
        message: message.to_string(),
        usage: Cli::command().render_usage().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<SwitchRequest, AppError> {
        let argv = std::iter::once("gitswitch").chain(args.iter().copied());
        Cli::try_parse_from(argv)
            .expect("clap should accept these arguments")
            .into_request()
    }

    #[test]
    fn username_alone_switches_globally_on_default_host() {
        let request = parse(&["alice"]).unwrap();
        assert_eq!(request, SwitchRequest::switch("alice"));
        assert_eq!(request.hostname, "github.com");
    }

    #[test]
    fn single_flag_selects_local_scope() {
        let request = parse(&["--single", "alice"]).unwrap();
        assert_eq!(request.scope, Scope::LocalRepository);
        assert!(request.needs_work_tree());
    }

    #[test]
    fn hostname_and_email_are_carried_through() {
        let request = parse(&[
            "--hostname",
            "ghe.example.com",
            "--email",
            "x@y.com",
            "alice",
        ])
        .unwrap();
        assert_eq!(request.hostname, "ghe.example.com");
        assert_eq!(request.email.as_deref(), Some("x@y.com"));
    }

    #[test]
    fn unset_single_alone_is_accepted() {
        let request = parse(&["--unset-single"]).unwrap();
        assert_eq!(request.mode, Mode::UnsetLocal);
        assert!(request.needs_work_tree());
    }

    #[test]
    fn unset_single_with_username_is_rejected() {
        let err = parse(&["--unset-single", "alice"]).unwrap_err();
        assert!(matches!(err, AppError::Usage { .. }));
        assert!(err.to_string().contains("--unset-single cannot be combined"));
    }

    #[test]
    fn unset_single_with_single_is_rejected() {
        let err = parse(&["--unset-single", "--single"]).unwrap_err();
        assert!(matches!(err, AppError::Usage { .. }));
    }

    #[test]
    fn second_username_is_rejected() {
        let err = parse(&["alice", "bob"]).unwrap_err();
        assert!(err.to_string().contains("only one username"));
    }

    #[test]
    fn missing_username_is_rejected() {
        let err = parse(&[]).unwrap_err();
        assert!(err.to_string().contains("a username is required"));
        let err = parse(&["--single"]).unwrap_err();
        assert!(err.to_string().contains("a username is required"));
    }

    #[test]
    fn empty_hostname_is_rejected() {
        let err = parse(&["--hostname", "", "alice"]).unwrap_err();
        assert!(matches!(err, AppError::Usage { .. }));
    }

    #[test]
    fn empty_or_malformed_email_is_rejected() {
        assert!(parse(&["--email", "", "alice"]).is_err());
        assert!(parse(&["--email", "not-an-email", "alice"]).is_err());
    }

    #[test]
    fn flag_without_value_fails_in_clap() {
        assert!(Cli::try_parse_from(["gitswitch", "alice", "--hostname"]).is_err());
        assert!(Cli::try_parse_from(["gitswitch", "alice", "--email"]).is_err());
    }

    #[test]
    fn usage_error_embeds_usage_line() {
        let err = usage_error("boom");
        let text = err.to_string();
        assert!(text.starts_with("boom"));
        assert!(text.contains("gitswitch --unset-single"));
    }
}
