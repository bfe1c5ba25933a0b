mod cli;
mod error;
mod logging;
mod session;
mod statistics;
mod time;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, CloudwatchCommands, Commands};
use session::AwsSession;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.globals.debug);

    let session = AwsSession::new(&cli.globals);
    let region = cli.globals.region.as_deref();

    match cli.cmd {
        Commands::Cloudwatch { command } => match command {
            CloudwatchCommands::GetMetricStatistics(args) => {
                statistics::get_metric_statistics(&session, region, args, &mut std::io::stdout())
                    .await?
            }
        },
    }

    Ok(())
}
