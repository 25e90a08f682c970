use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "newsreel", version, about = "Read Usenet articles and overview data")]
pub struct Cli {
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[arg(short, long, default_value_t = 1, help = "Server number from the config file")]
    pub server: u32,

    #[arg(
        short,
        long,
        default_value = "warn",
        help = "Log level (trace, debug, info, warn, error)"
    )]
    pub log_level: String,

    #[arg(long)]
    pub host: Option<String>,

    #[arg(long)]
    pub port: Option<u16>,

    #[arg(short, long)]
    pub user: Option<String>,

    #[arg(short, long)]
    pub password: Option<String>,

    #[arg(long, help = "Connect with TLS")]
    pub tls: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Select a group and show its article count and range
    Group { name: String },
    /// Print a whole article by number or <message-id>
    Article { id: String },
    /// Print the headers of an article
    Head { id: String },
    /// Check that an article exists
    Stat { id: String },
    /// List the server's overview fields
    OverviewFormat,
    /// Print overview rows for a range such as 100-200 or 100-
    Overview {
        range: String,
        #[arg(short, long)]
        group: Option<String>,
        #[arg(long, help = "Request the zlib-compressed XZVER form")]
        compressed: bool,
    },
}
