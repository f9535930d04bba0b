use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "dupe-ledger")]
#[command(about = "Find duplicate files against a registry that grows across runs", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan the configured directory and report duplicates (default)
    Scan(ScanArgs),
    /// Print configuration values
    PrintConfig,
    /// Display the number of entries in the fingerprint registry
    CountRegistry,
    /// Delete the persisted fingerprint registry
    ClearRegistry,
}

#[derive(Debug, Default, Args)]
pub struct ScanArgs {
    /// Directory to scan, overriding the configured one
    #[arg(short, long)]
    pub directory: Option<String>,
    /// Number of worker threads (0 = one per CPU)
    #[arg(short, long)]
    pub threads: Option<usize>,
}
