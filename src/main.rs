mod cli;
mod dataset;
mod download;
mod parquet;
mod plot;
mod series;

use anyhow::{Error, Result};
use clap::Parser;
use cli::{command, Cli, Commands};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let options = &cli.options;

    let result = match &cli.command {
        None | Some(Commands::Plot {}) => command::plot(options).await,
        Some(Commands::Summary {}) => command::summary(options).await,
        Some(Commands::Export { file }) => command::export(options, file).await,
    };

    match result {
        Ok(filename) => println!("File saved to `{}`", filename),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
