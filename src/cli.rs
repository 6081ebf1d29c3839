use clap::Parser;
use std::path::PathBuf;

/// `couponwatch` - watches a coupon-listing site and forwards new deals to `WhatsApp`.
#[derive(Parser, Debug, Default)]
#[command(name = "couponwatch")]
#[command(version)]
#[command(about = "Scrape coupon listings and notify about new ones.", long_about = None)]
pub struct Cli {
    /// Config file (default: $COUPONWATCH_CONFIG or ~/.couponwatch/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Run a single scrape-and-notify cycle, then exit
    #[arg(long)]
    pub once: bool,

    /// Log messages instead of sending them; credentials are not required
    #[arg(long)]
    pub dry_run: bool,

    /// Debug-level logging
    #[arg(short, long)]
    pub verbose: bool,
}
