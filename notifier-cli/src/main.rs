mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use cli::handlers;
use cli::notify::NotifyArgs;

#[derive(Parser)]
#[command(name = "notifier")]
#[command(version)]
#[command(about = "Forward messages to an HTTP endpoint at a steady rate")]
#[command(
    help_template = "{name} - {version}\n{about}\n\n{usage-heading}\n  {usage}\n\n{all-args}{options}\n"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send message(s) to the supplied url at the rate of the supplied interval
    ///
    /// Messages come from the positional arguments, or from standard input
    /// (one message per line) when none are given. Ctrl+C or SIGTERM stops
    /// reading input and exits without waiting for in-flight requests
    /// unless --shutdown-grace is set.
    ///
    /// Examples:
    ///   notifier notify --url http://localhost:8080/hook --interval 5s < messages.txt
    ///   notifier notify -u http://localhost:8080/hook -i 0 "first" "second"
    ///   notifier notify -u http://localhost:8080/hook -i 250ms -m PUT -t 8
    Notify(NotifyArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let result = runtime.block_on(async {
        match cli.command {
            Commands::Notify(args) => handlers::handle_notify(args).await.map(|_| ()),
        }
    });

    // A pending stdin read cannot be cancelled; do not wait for it on exit
    runtime.shutdown_background();

    result
}
