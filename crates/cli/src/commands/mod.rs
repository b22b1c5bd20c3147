mod fetch;
mod publish;
mod run;
mod send_mail;

use anyhow::Result;

use crate::cli::{Cli, Commands};
use crate::context::RunContext;

pub async fn dispatch(cli: Cli) -> Result<()> {
    let config = cli.config;
    let headless = cli.headless;

    match cli.command {
        Commands::Run { report } => {
            let ctx = RunContext::load(&config, headless)?;
            run::execute(&ctx, report.as_deref()).await
        }
        Commands::Fetch { report } => {
            let ctx = RunContext::load(&config, headless)?;
            fetch::execute(&ctx, report.as_deref()).await
        }
        Commands::Publish { csv, range, no_clear } => {
            let ctx = RunContext::load(&config, headless)?;
            publish::execute(&ctx, &csv, range.as_deref(), no_clear).await
        }
        Commands::SendMail(args) => send_mail::execute(args).await,
    }
}
