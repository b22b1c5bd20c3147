use std::path::Path;

use anyhow::{Context as _, Result};
use ekos::config::Settings;
use ekos::navigator::Credentials;
use ekos::session::{BrowserKind, DownloadDirMode, SessionConfig};
use ekos::sheets::SheetTarget;

/// Settings plus flag overrides, shared by the commands that talk to Ekos
/// or the spreadsheet.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub settings: Settings,
    pub headless: bool,
}

impl RunContext {
    pub fn load(config_path: &Path, headless_flag: bool) -> Result<Self> {
        let settings = Settings::load(config_path)
            .with_context(|| format!("loading settings from {}", config_path.display()))?;
        let headless = headless_flag || settings.headless;
        Ok(Self { settings, headless })
    }

    pub fn session_config(&self) -> Result<SessionConfig> {
        let browser: BrowserKind = self.settings.browser.parse()?;
        Ok(SessionConfig {
            browser,
            driver_path: self.settings.driver_path.clone(),
            download_dir: DownloadDirMode::Fixed(self.settings.profile_dir_path.clone()),
            headless: self.headless,
        })
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.settings.ekos_user.clone(),
            password: self.settings.ekos_pw.clone(),
        }
    }

    pub fn sheet_target(&self, data_range: Option<&str>) -> SheetTarget {
        SheetTarget {
            spreadsheet_id: self.settings.spreadsheet_id.clone(),
            data_range: data_range.unwrap_or(&self.settings.data_range).to_string(),
            info_range: self.settings.info_range.clone(),
        }
    }
}
