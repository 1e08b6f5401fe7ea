//! Bootstrap for `gitswitch-setup`: installs missing tools through the
//! platform's package manager and wires git's credential helper to gh.

use std::{env, fmt, process::Command};

use colored::Colorize;
use log::{debug, info};

use crate::{error::AppError, gh::GhCli, probe};

/// Where gh release archives are published
pub const GH_RELEASES_URL: &str = "https://github.com/cli/cli/releases/latest";

/// Placeholder replaced by the package name in install templates
const PKG: &str = "{pkg}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Brew,
    AptGet,
    Dnf,
    Yum,
    Pacman,
    Zypper,
    Apk,
    Winget,
}

/// One row of the install table
struct ManagerSpec {
    manager: PackageManager,
    binary: &'static str,
    oses: &'static [&'static str],
    install: &'static [&'static str],
    needs_root: bool,
}

/// Package managers in order of preference
const MANAGERS: &[ManagerSpec] = &[
    ManagerSpec {
        manager: PackageManager::Brew,
        binary: "brew",
        oses: &["macos", "linux"],
        install: &["install", PKG],
        needs_root: false,
    },
    ManagerSpec {
        manager: PackageManager::AptGet,
        binary: "apt-get",
        oses: &["linux"],
        install: &["install", "-y", PKG],
        needs_root: true,
    },
    ManagerSpec {
        manager: PackageManager::Dnf,
        binary: "dnf",
        oses: &["linux"],
        install: &["install", "-y", PKG],
        needs_root: true,
    },
    ManagerSpec {
        manager: PackageManager::Yum,
        binary: "yum",
        oses: &["linux"],
        install: &["install", "-y", PKG],
        needs_root: true,
    },
    ManagerSpec {
        manager: PackageManager::Pacman,
        binary: "pacman",
        oses: &["linux"],
        install: &["-S", "--noconfirm", PKG],
        needs_root: true,
    },
    ManagerSpec {
        manager: PackageManager::Zypper,
        binary: "zypper",
        oses: &["linux"],
        install: &["--non-interactive", "install", PKG],
        needs_root: true,
    },
    ManagerSpec {
        manager: PackageManager::Apk,
        binary: "apk",
        oses: &["linux"],
        install: &["add", PKG],
        needs_root: true,
    },
    ManagerSpec {
        manager: PackageManager::Winget,
        binary: "winget",
        oses: &["windows"],
        install: &["install", "--id", PKG, "-e"],
        needs_root: false,
    },
];

/// Package names that differ from the tool name
const PACKAGE_NAMES: &[(PackageManager, &str, &str)] = &[
    (PackageManager::Pacman, "gh", "github-cli"),
    (PackageManager::Apk, "gh", "github-cli"),
    (PackageManager::Winget, "gh", "GitHub.cli"),
    (PackageManager::Winget, "git", "Git.Git"),
];

fn spec(manager: PackageManager) -> &'static ManagerSpec {
    MANAGERS
        .iter()
        .find(|s| s.manager == manager)
        .unwrap_or(&MANAGERS[0])
}

impl PackageManager {
    pub fn binary(self) -> &'static str {
        spec(self).binary
    }

    fn package_for(self, tool: &str) -> String {
        PACKAGE_NAMES
            .iter()
            .find(|(manager, t, _)| *manager == self && *t == tool)
            .map(|(_, _, package)| package.to_string())
            .unwrap_or_else(|| tool.to_string())
    }
}

/// Facts about the machine that decide how tools get installed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub os: String,
    pub arch: String,
    pub is_root: bool,
    pub managers: Vec<PackageManager>,
}

impl Environment {
    pub fn detect() -> Self {
        let os = env::consts::OS.to_string();
        let managers = MANAGERS
            .iter()
            .filter(|s| s.oses.contains(&os.as_str()))
            .filter(|s| which::which(s.binary).is_ok())
            .map(|s| s.manager)
            .collect();

        Environment {
            os,
            arch: env::consts::ARCH.to_string(),
            is_root: is_root(),
            managers,
        }
    }

    /// gh release naming for this platform, e.g. `linux_amd64.tar.gz`
    pub fn release_asset_suffix(&self) -> Option<String> {
        let arch = match self.arch.as_str() {
            "x86_64" => "amd64",
            "aarch64" => "arm64",
            _ => return None,
        };
        match self.os.as_str() {
            "linux" => Some(format!("linux_{arch}.tar.gz")),
            "macos" => Some(format!("macOS_{arch}.zip")),
            "windows" => Some(format!("windows_{arch}.zip")),
            _ => None,
        }
    }
}

fn is_root() -> bool {
    if cfg!(windows) {
        return false;
    }
    Command::new("id")
        .arg("-u")
        .output()
        .ok()
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim() == "0")
        .unwrap_or(false)
}

/// A command that installs one tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallStep {
    pub tool: String,
    pub argv: Vec<String>,
}

impl fmt::Display for InstallStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv.join(" "))
    }
}

/// Builds the install commands for `missing` tools on `env`
pub fn plan(env: &Environment, missing: &[&str]) -> Result<Vec<InstallStep>, AppError> {
    let Some(manager) = env.managers.first().copied() else {
        return match missing.first() {
            None => Ok(Vec::new()),
            Some(tool) => Err(AppError::Setup(manual_install_hint(env, tool))),
        };
    };
    let spec = spec(manager);

    Ok(missing
        .iter()
        .map(|tool| {
            let package = manager.package_for(tool);
            let mut argv = Vec::new();
            if spec.needs_root && !env.is_root {
                argv.push("sudo".to_string());
            }
            argv.push(spec.binary.to_string());
            argv.extend(
                spec.install
                    .iter()
                    .map(|arg| if *arg == PKG { package.clone() } else { arg.to_string() }),
            );
            InstallStep {
                tool: tool.to_string(),
                argv,
            }
        })
        .collect())
}

fn manual_install_hint(env: &Environment, tool: &str) -> String {
    match (tool, env.release_asset_suffix()) {
        ("gh", Some(suffix)) => format!(
            "no supported package manager found to install gh; download gh_<version>_{suffix} from {GH_RELEASES_URL} and put gh on your PATH"
        ),
        _ => format!("no supported package manager found to install {tool}; install it manually"),
    }
}

/// Installs missing tools and configures the git credential helper
pub fn run(dry_run: bool) -> Result<(), AppError> {
    let env = Environment::detect();
    info!("setup environment: {env:?}");

    let missing = probe::missing_tools(probe::REQUIRED_TOOLS);
    if missing.is_empty() {
        println!("{}", "git and gh are already installed".green());
    }

    for step in plan(&env, &missing)? {
        println!("{} {}", format!("installing {}:", step.tool).blue(), step);
        if dry_run {
            continue;
        }
        debug!("running: {step}");
        let status = Command::new(&step.argv[0]).args(&step.argv[1..]).status()?;
        if !status.success() {
            return Err(AppError::Setup(format!("'{step}' exited with {status}")));
        }
    }

    if !dry_run {
        probe::ensure_tools(probe::REQUIRED_TOOLS)?;
    }

    println!("{}", "configuring git to use gh as credential helper".blue());
    if dry_run {
        println!("gh auth setup-git");
        return Ok(());
    }
    let gh = GhCli::new(crate::config::gh_config_override());
    if let Err(e) = gh.setup_git() {
        println!(
            "{} {}",
            "could not configure the credential helper yet:".yellow(),
            e
        );
        println!(
            "{}",
            "log in with `gh auth login`, then run `gh auth setup-git`".yellow()
        );
    }

    println!("{}", "setup complete".green());
    Ok(())
}
