use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "ethr-did",
    about = "Resolve did:ethr identifiers from a registry change log",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Resolve one or more DIDs to documents
    Resolve(ResolveArgs),
    /// Show the change log behind a DID
    Log(LogArgs),
    /// List known network names
    Networks,
}

/// Where the ledger comes from and how the resolver reads it.
#[derive(Args)]
pub struct LedgerArgs {
    /// JSON ledger fixture to replay into an in-memory registry
    #[arg(long)]
    pub ledger: PathBuf,
    /// Resolver configuration (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct ResolveArgs {
    #[arg(required = true)]
    pub dids: Vec<String>,
    #[command(flatten)]
    pub ledger: LedgerArgs,
    /// Judge expiry at this unix time instead of now
    #[arg(long)]
    pub at: Option<u64>,
    /// Cache documents across the DIDs given
    #[arg(long)]
    pub cache: bool,
}

#[derive(Args)]
pub struct LogArgs {
    pub did: String,
    #[command(flatten)]
    pub ledger: LedgerArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    const DID: &str = "did:ethr:0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf";

    #[test]
    fn parse_resolve() {
        let cli = Cli::try_parse_from(["ethr-did", "resolve", DID, "--ledger", "l.json"]).unwrap();
        if let Command::Resolve(args) = cli.command {
            assert_eq!(args.dids, vec![DID.to_string()]);
            assert_eq!(args.ledger.ledger, PathBuf::from("l.json"));
            assert!(args.ledger.config.is_none());
            assert!(!args.cache);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_resolve_with_options() {
        let cli = Cli::try_parse_from([
            "ethr-did", "resolve", DID, DID, "--ledger", "l.json", "--config", "c.toml", "--at",
            "1700000000", "--cache",
        ])
        .unwrap();
        if let Command::Resolve(args) = cli.command {
            assert_eq!(args.dids.len(), 2);
            assert_eq!(args.ledger.config, Some(PathBuf::from("c.toml")));
            assert_eq!(args.at, Some(1_700_000_000));
            assert!(args.cache);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn resolve_requires_ledger_and_did() {
        assert!(Cli::try_parse_from(["ethr-did", "resolve", DID]).is_err());
        assert!(Cli::try_parse_from(["ethr-did", "resolve", "--ledger", "l.json"]).is_err());
    }

    #[test]
    fn parse_log() {
        let cli = Cli::try_parse_from(["ethr-did", "log", DID, "--ledger", "l.json"]).unwrap();
        assert!(matches!(cli.command, Command::Log(_)));
    }

    #[test]
    fn parse_networks_json() {
        let cli = Cli::try_parse_from(["ethr-did", "--format", "json", "networks"]).unwrap();
        assert!(matches!(cli.command, Command::Networks));
        assert!(matches!(cli.format, OutputFormat::Json));
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::try_parse_from(["ethr-did", "networks", "--verbose"]).unwrap();
        assert!(cli.verbose);
    }
}
