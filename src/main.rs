use clap::Parser;
use colored::Colorize;
use log::debug;

use gitswitch::{
    cli::Cli,
    config,
    error::AppError,
    gh::GhCli,
    git::{SystemGit, WorkTree},
    identity::RetryPolicy,
    init_logging, probe,
    switch::Switcher,
};

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version go to stdout and succeed; everything else is a usage error.
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let request = cli.into_request()?;
    debug!("request: {request:?}");

    probe::ensure_tools(probe::REQUIRED_TOOLS)?;

    let git = SystemGit;
    debug!("gh config dir: {:?}", config::gh_config_dir());
    let gh = GhCli::new(config::gh_config_override());
    let work_tree = if request.needs_work_tree() {
        WorkTree::detect(&git)?
    } else {
        WorkTree::Outside
    };

    let outcome = Switcher::new(&git, &gh, RetryPolicy::default()).run(&request, work_tree)?;
    outcome.report();
    Ok(())
}
