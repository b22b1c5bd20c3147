//! Full delivery run: fetch the report, then publish it.

use anyhow::Result;
use ekos::sheets::{ImportOptions, SheetsPublisher};
use tracing::info;

use crate::commands::fetch;
use crate::context::RunContext;

pub async fn execute(ctx: &RunContext, report: Option<&str>) -> Result<()> {
    let csv_path = fetch::download_report(ctx, report).await?;

    let publisher = SheetsPublisher::connect(
        &ctx.settings.cred_path,
        &ctx.settings.token_path,
        ctx.sheet_target(None),
    )
    .await?;

    publisher.import_csv(&csv_path, &ImportOptions::default()).await?;
    publisher.stamp_last_updated().await?;

    info!(
        target = "ekos",
        spreadsheet = %ctx.settings.spreadsheet_id,
        "delivery run complete"
    );
    Ok(())
}
