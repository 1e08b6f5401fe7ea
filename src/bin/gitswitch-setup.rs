use clap::Parser;
use colored::Colorize;

use gitswitch::{init_logging, setup};

/// Installs git and gh if missing and configures gh as git's credential helper
#[derive(Parser, Debug)]
#[command(name = "gitswitch-setup", version)]
struct SetupCli {
    /// Print what would be done without doing it
    #[arg(long)]
    dry_run: bool,
    /// Print every external command that is run
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = SetupCli::parse();
    init_logging(cli.verbose);

    if let Err(e) = setup::run(cli.dry_run) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
