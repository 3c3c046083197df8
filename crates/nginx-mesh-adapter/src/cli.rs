//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::Parser;

/// NGINX mesh adapter - registers NGINX Service Mesh capabilities with Meshery
#[derive(Parser, Debug)]
#[command(name = "nginx-mesh-adapter")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to the adapter config file (default: ~/.meshery/nginx-adapter.yaml)
    #[arg(short, long)]
    pub config: Option<Utf8PathBuf>,

    /// Port this adapter advertises to Meshery
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Run a single dynamic registration pass and exit
    #[arg(long)]
    pub once: bool,
}
