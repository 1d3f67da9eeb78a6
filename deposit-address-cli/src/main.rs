mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "deposit-address")]
#[command(about = "Derive 2-of-3 multisig deposit addresses offline", long_about = None)]
struct Cli {
    /// Config file (TOML)
    #[arg(long, env = "CONFIG_PATH", global = true)]
    config: Option<PathBuf>,

    /// Address network: main or test
    #[arg(long, global = true)]
    network: Option<String>,

    /// Cosigner account xpub (repeat 3 times, overrides the config file)
    #[arg(long = "xpub", global = true)]
    xpubs: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the derivation path for a passphrase
    Path { passphrase: String },

    /// Derive the deposit address for a passphrase
    Address {
        passphrase: String,

        /// Print path, script and descriptor as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print each cosigner's child pubkey for a passphrase
    Pubkeys { passphrase: String },

    /// Generate a fresh passphrase and its address
    New {
        #[arg(long)]
        json: bool,
    },

    /// Derive addresses for a file of passphrases (one per line)
    Batch {
        file: PathBuf,

        /// Maximum derivations in flight
        #[arg(short, long)]
        concurrency: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr, stdout carries results
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "deposit_address=info,deposit_address_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    run(Cli::parse()).await
}

async fn run(cli: Cli) -> Result<()> {
    let Cli {
        config: config_path,
        network,
        xpubs,
        command,
    } = cli;
    // Only commands that touch the cosigners need a config
    let load = move || config::load(config_path.as_deref(), config::Overrides { network, xpubs });

    match command {
        Commands::Path { passphrase } => {
            commands::print_path(&passphrase);
            Ok(())
        }
        Commands::Address { passphrase, json } => {
            commands::print_address(&load()?, &passphrase, json)
        }
        Commands::Pubkeys { passphrase } => commands::print_pubkeys(&load()?, &passphrase),
        Commands::New { json } => commands::print_new(&load()?, json),
        Commands::Batch { file, concurrency } => {
            commands::run_batch(&load()?, &file, concurrency).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_global_overrides() {
        let cli = Cli::try_parse_from([
            "deposit-address",
            "address",
            "some-passphrase",
            "--network",
            "test",
            "--xpub",
            "a",
            "--xpub",
            "b",
            "--xpub",
            "c",
            "--json",
        ])
        .unwrap();

        assert_eq!(cli.network.as_deref(), Some("test"));
        assert_eq!(cli.xpubs, vec!["a", "b", "c"]);
        assert!(matches!(
            cli.command,
            Commands::Address { ref passphrase, json: true } if passphrase == "some-passphrase"
        ));
    }

    #[tokio::test]
    async fn test_path_runs_without_config() {
        let cli = Cli::try_parse_from([
            "deposit-address",
            "--config",
            "does-not-exist.toml",
            "path",
            "some-passphrase",
        ])
        .unwrap();

        run(cli).await.unwrap();
    }

    #[tokio::test]
    async fn test_address_needs_config() {
        let cli = Cli::try_parse_from([
            "deposit-address",
            "--config",
            "does-not-exist.toml",
            "address",
            "some-passphrase",
        ])
        .unwrap();

        assert!(run(cli).await.is_err());
    }

    #[test]
    fn test_parse_batch() {
        let cli =
            Cli::try_parse_from(["deposit-address", "batch", "ids.txt", "-c", "16"]).unwrap();

        match cli.command {
            Commands::Batch { file, concurrency } => {
                assert_eq!(file, PathBuf::from("ids.txt"));
                assert_eq!(concurrency, Some(16));
            }
            _ => panic!("expected batch command"),
        }
    }
}
