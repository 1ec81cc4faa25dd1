mod fill;
mod order;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

use crate::config::Provider;

#[derive(Parser)]
#[command(name = "sql-seeder")]
#[command(author = "Helge Sverre <helge.sverre@gmail.com>")]
#[command(version)]
#[command(about = "Seed a SQL schema with generated, foreign-key consistent rows", long_about = None)]
pub struct Cli {
    /// Verbose output (debug logging; RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate rows for every table of a schema and write them as INSERT statements
    Fill(FillArgs),

    /// Show the order tables are filled in, with their dependencies
    Order {
        /// File with CREATE TABLE statements
        #[arg(short, long)]
        schema: PathBuf,

        /// Show drop order (dependents first) instead
        #[arg(long)]
        reverse: bool,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug, Clone)]
pub struct FillArgs {
    /// File with CREATE TABLE statements
    #[arg(short, long)]
    pub schema: PathBuf,

    /// INSERT statements loaded before generation, used as examples
    #[arg(short, long)]
    pub example_data: Option<PathBuf>,

    /// YAML config with defaults, oracle settings and per-table row targets
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Target rows per table (default: 5)
    #[arg(short, long)]
    pub rows: Option<u64>,

    /// Row oracle: ollama, openai, or fake
    #[arg(long)]
    pub provider: Option<Provider>,

    /// Base URL of the oracle API
    #[arg(long)]
    pub url: Option<String>,

    /// Model name passed to the oracle API
    #[arg(short, long)]
    pub model: Option<String>,

    /// Sample rows shown to the oracle per table (default: 2)
    #[arg(long)]
    pub examples_per_table: Option<usize>,

    /// Oracle request timeout in seconds (default: 60)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Seed for the fake oracle
    #[arg(long)]
    pub seed: Option<u64>,

    /// DuckDB database file to fill instead of an in-memory database
    #[arg(long)]
    pub database: Option<PathBuf>,

    /// Output SQL file (default: stdout)
    #[arg(short, long, conflicts_with = "output_dir")]
    pub output: Option<PathBuf>,

    /// Write one <table>.sql file per table into this directory
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Give up on a table after this many failed attempts in a row
    #[arg(long)]
    pub max_failures: Option<usize>,

    /// Show progress during generation
    #[arg(short, long)]
    pub progress: bool,
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Fill(args) => fill::run(args),
        Commands::Order { schema, reverse } => order::run(schema, reverse),
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "sql-seeder", &mut io::stdout());
            Ok(())
        }
    }
}
