use clap::{Args, Parser, Subcommand};

use crate::statistics::Dimension;

#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    #[command(flatten)]
    pub globals: GlobalArgs,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// The region to send requests to. Falls back to the shared AWS config when omitted
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// A named profile from the shared AWS config/credentials files
    #[arg(long, global = true)]
    pub profile: Option<String>,

    /// Override the service endpoint, e.g. for a local emulator
    #[arg(long, global = true)]
    pub endpoint_url: Option<String>,

    /// Turn on debug logging on stderr
    #[arg(long, global = true)]
    pub debug: bool,
}

/// The command table, grouped by service.
#[derive(Subcommand)]
pub enum Commands {
    /// Amazon CloudWatch
    Cloudwatch {
        #[command(subcommand)]
        command: CloudwatchCommands,
    },
}

#[derive(Subcommand)]
pub enum CloudwatchCommands {
    /// Gets CloudWatch statistics for the specified metric.
    GetMetricStatistics(GetMetricStatisticsArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct GetMetricStatisticsArgs {
    /// The namespace of the metric
    #[arg(long)]
    pub namespace: String,

    /// The name of the metric
    #[arg(long)]
    pub metric_name: String,

    /// The dimensions to filter on, as Name=Value. Can be repeated
    #[arg(long, value_parser = parse_dimension)]
    pub dimensions: Vec<Dimension>,

    /// The start time of the period
    #[arg(long)]
    pub start_time: Option<String>,

    /// The end time of the period
    #[arg(long)]
    pub end_time: Option<String>,

    /// The start time of the period in human readable format, e.g. "3h ago" or "yesterday"
    #[arg(long)]
    pub since: Option<String>,

    /// The end time of the period in human readable format. Defaults to now
    #[arg(long)]
    pub until: Option<String>,

    /// The period in seconds
    #[arg(long)]
    pub period: String,

    /// The statistics to return, comma separated
    #[arg(long)]
    pub statistics: String,

    /// The unit of the metric
    #[arg(long)]
    pub unit: String,
}

pub fn parse_dimension(s: &str) -> Result<Dimension, String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| "dimension must be Name=Value".to_string())?;
    if name.trim().is_empty() {
        return Err("dimension name cannot be empty".into());
    }
    Ok(Dimension {
        name: name.trim().to_string(),
        value: value.trim().to_string(),
    })
}
