use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Log levels as defined in log2 crate
#[derive(Debug, Serialize, Deserialize, Clone, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// Program arguments. Crawl-specific knobs live on the `crawl` subcommand;
/// everything here applies to every subcommand.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    #[command(subcommand)]
    pub command: Command,
    /// Where the link graph and its indexes are persisted
    #[arg(long, default_value = "philopath.json")]
    pub data_file: PathBuf,
    /// Logging level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", value_enum)]
    pub log_level: LogLevel,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Follow first links from random articles down to Philosophy
    Crawl {
        /// Number of random walks to run
        #[arg(short, long, default_value = "10")]
        walks: usize,
        /// Delay between page requests in milliseconds
        #[arg(short, long, default_value = "1050")]
        request_delay: u64,
        /// Base URL of the wiki to crawl
        #[arg(long, default_value = "https://en.wikipedia.org")]
        base_url: String,
    },
    /// Summarize the graph: farthest titles, busiest hubs, nearest neighbors
    Report,
    /// Print the recorded path from a title down to Philosophy
    Path {
        #[arg(short, long)]
        title: String,
    },
    /// Export the link graph as a directed edge list
    Export {
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
        /// Skip titles starting with any of these prefixes
        #[arg(long, default_value = "List of religious leaders")]
        exclude: Vec<String>,
    },
}

impl Config {
    pub fn new() -> Self {
        Self::parse()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if let Command::Crawl { walks, .. } = &self.command {
            if *walks == 0 {
                anyhow::bail!("walks must be greater than 0");
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        write!(f, "{}", s)
    }
}
