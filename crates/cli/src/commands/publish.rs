//! Publish an already-downloaded CSV without touching the browser.

use std::path::Path;

use anyhow::Result;
use ekos::sheets::{ImportOptions, SheetsPublisher};

use crate::context::RunContext;

pub async fn execute(
    ctx: &RunContext,
    csv: &Path,
    range: Option<&str>,
    no_clear: bool,
) -> Result<()> {
    let publisher = SheetsPublisher::connect(
        &ctx.settings.cred_path,
        &ctx.settings.token_path,
        ctx.sheet_target(range),
    )
    .await?;

    let opts = ImportOptions {
        clear: !no_clear,
        ..ImportOptions::default()
    };
    publisher.import_csv(csv, &opts).await?;
    publisher.stamp_last_updated().await?;

    Ok(())
}
