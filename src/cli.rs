use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_COMMIT"),
    ", built ",
    env!("BUILD_DATE"),
    ")"
);

#[derive(Parser)]
#[command(name = "sieve-engine", version, long_version = LONG_VERSION, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Engine configuration file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse and validate a script
    Check {
        script: PathBuf,
    },

    /// Evaluate a script against a message
    Run {
        script: PathBuf,

        /// RFC 822 message file
        message: PathBuf,

        /// Envelope sender (MAIL FROM); empty for the null sender
        #[arg(long)]
        from: Option<String>,

        /// Envelope recipient seen by the `envelope` test
        #[arg(long)]
        to: Option<String>,

        /// Final recipient(s) for delivery; defaults to --to
        #[arg(long = "recipient")]
        recipients: Vec<String>,

        /// Carry out the actions under this directory
        #[arg(long, value_name = "DIR")]
        deliver: Option<PathBuf>,

        /// Print actions as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the capabilities scripts may require
    Extensions,
}
