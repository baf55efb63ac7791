//! Sluice CLI - versioned schema updates for CMS modules

use clap::Parser;

mod cli;
mod commands;
mod context;

use cli::{Cli, Commands};
use commands::common::ExitCode;
use commands::{init, plan, run, status};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Init(args) => init::execute(args, &cli.global).await,
        Commands::Status(args) => status::execute(args, &cli.global).await,
        Commands::Plan(args) => plan::execute(args, &cli.global).await,
        Commands::Run(args) => run::execute(args, &cli.global).await,
        Commands::Serve(args) => serve(args, &cli.global).await,
    };

    if let Err(err) = result {
        if let Some(ExitCode(code)) = err.downcast_ref::<ExitCode>() {
            std::process::exit(*code);
        }
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

#[cfg(feature = "serve")]
async fn serve(args: &cli::ServeArgs, global: &cli::GlobalArgs) -> anyhow::Result<()> {
    commands::serve::execute(args, global).await
}

#[cfg(not(feature = "serve"))]
async fn serve(_args: &cli::ServeArgs, _global: &cli::GlobalArgs) -> anyhow::Result<()> {
    anyhow::bail!(
        "The `serve` command requires the `serve` feature.\n\
         Rebuild with: cargo build -p sl-cli --features serve"
    )
}
