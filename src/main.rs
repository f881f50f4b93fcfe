use clap::Parser;
use rqi_eval::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => cli::run::run(args).await,
        Command::Compare(args) => cli::compare::run(args).await,
    }
}
