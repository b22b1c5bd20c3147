use clap::Parser;
use ekos_cli::{cli::Cli, commands, logging};
use tracing::error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let _guard = logging::init(cli.verbose, &cli.log_file);

    if let Err(err) = commands::dispatch(cli).await {
        let detail = format!("{err:#}");
        error!(target = "ekos", error = %detail, "run failed");
        std::process::exit(1);
    }
}
