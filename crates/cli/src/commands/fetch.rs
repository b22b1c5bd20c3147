//! Fetch the report from Ekos and resolve the downloaded artifact.

use std::path::{Path, PathBuf};

use anyhow::Result;
use ekos::download::{self, ResolveOptions};
use ekos::navigator::{self, Navigator, ReportRequest};
use ekos::session::Session;
use tracing::info;

use crate::context::RunContext;

pub async fn execute(ctx: &RunContext, report: Option<&str>) -> Result<()> {
    let path = download_report(ctx, report).await?;
    println!("{}", path.display());
    Ok(())
}

/// Opens a browser session, drives the export sequence, and resolves the
/// downloaded file to its stable name. The session is closed exactly once
/// on every path (success, navigation failure, resolver failure) before
/// the outcome is propagated.
pub(crate) async fn download_report(ctx: &RunContext, report: Option<&str>) -> Result<PathBuf> {
    let request = ReportRequest::csv(report.unwrap_or(&ctx.settings.report_name));
    let credentials = ctx.credentials();

    let session = Session::open(&ctx.session_config()?).await?;
    let download_dir = match session.download_dir().map(Path::to_path_buf) {
        Some(dir) => dir,
        None => {
            session.close().await;
            anyhow::bail!("downloads are not tracked; set profile_dir_path in the settings file");
        }
    };

    let mut nav = Navigator::new(session);
    let outcome = async {
        navigator::export_report(&mut nav, &credentials, &request.name).await?;
        download::resolve(
            &download_dir,
            download::DEFAULT_EXPORT_PATTERN,
            &request.target_filename,
            &ResolveOptions::default(),
        )
        .await
    }
    .await;

    nav.into_session().close().await;

    let path = outcome?;
    info!(target = "ekos", report = %request.name, path = %path.display(), "report fetched");
    Ok(path)
}
