//! Browser session lifecycle: WebDriver server launch, Firefox download
//! preferences, and the [`BrowserControl`] implementation the navigator
//! drives.

pub mod control;
mod launcher;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use thirtyfour::error::WebDriverError;
use thirtyfour::prelude::*;
use thirtyfour::common::capabilities::firefox::FirefoxPreferences;
use thirtyfour::{DesiredCapabilities, FirefoxCapabilities, Key};
use tracing::{debug, info, warn};

use crate::error::{EkosError, Result};
use self::control::{BrowserControl, Locator};
use self::launcher::DriverServer;

/// MIME types Firefox saves to disk without prompting.
const DOWNLOAD_MIME_TYPES: &str = "text/csv,application/vnd.ms-excel";

const POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserKind {
    Firefox,
    Chrome,
}

impl fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Firefox => write!(f, "firefox"),
            Self::Chrome => write!(f, "chrome"),
        }
    }
}

impl FromStr for BrowserKind {
    type Err = EkosError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "firefox" => Ok(Self::Firefox),
            "chrome" | "chromium" => Ok(Self::Chrome),
            other => Err(EkosError::Config(format!("unknown browser {other:?}"))),
        }
    }
}

/// Where the browser writes downloaded files.
#[derive(Debug, Clone)]
pub enum DownloadDirMode {
    /// A unique directory under the OS temp dir, created at session open.
    /// Artifacts are left behind for the caller; cleanup is not this
    /// crate's job.
    EphemeralTemp,
    /// A caller-supplied directory that must already exist.
    Fixed(PathBuf),
    /// Whatever the browser profile is configured with. Downloads are not
    /// tracked, so the resolver cannot run against this mode.
    ProfileDefault,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub browser: BrowserKind,
    pub driver_path: PathBuf,
    pub download_dir: DownloadDirMode,
    pub headless: bool,
}

impl SessionConfig {
    /// Validates the download-directory invariant and returns the concrete
    /// directory downloads will land in, if tracked.
    fn resolve_download_dir(&self) -> Result<Option<PathBuf>> {
        match &self.download_dir {
            DownloadDirMode::Fixed(path) => {
                if !path.is_dir() {
                    return Err(EkosError::SessionInit(format!(
                        "download directory {} does not exist",
                        path.display()
                    )));
                }
                Ok(Some(path.clone()))
            }
            DownloadDirMode::EphemeralTemp => {
                let dir = std::env::temp_dir().join(format!("ekos-export-{}", std::process::id()));
                std::fs::create_dir_all(&dir).map_err(|e| {
                    EkosError::SessionInit(format!(
                        "cannot create download directory {}: {e}",
                        dir.display()
                    ))
                })?;
                Ok(Some(dir))
            }
            DownloadDirMode::ProfileDefault => Ok(None),
        }
    }
}

/// One running automated-browser instance bound to one [`SessionConfig`].
///
/// Opened once per run, exclusively owned by the navigator for the run's
/// duration, and destroyed exactly once via [`Session::close`]; consuming
/// `self` makes a second close unrepresentable.
pub struct Session {
    driver: WebDriver,
    server: DriverServer,
    download_dir: Option<PathBuf>,
}

impl Session {
    /// Launches the WebDriver server and opens a browser configured for
    /// unattended CSV download.
    pub async fn open(config: &SessionConfig) -> Result<Self> {
        if config.browser != BrowserKind::Firefox {
            return Err(EkosError::SessionInit(format!(
                "{} automation is not implemented; use firefox",
                config.browser
            )));
        }

        let download_dir = config.resolve_download_dir()?;
        let caps = firefox_caps(config, download_dir.as_deref())?;

        let mut server = launcher::spawn_geckodriver(&config.driver_path).await?;
        let url = server.url();
        let driver = match WebDriver::new(&url, caps).await {
            Ok(driver) => driver,
            Err(err) => {
                server.shutdown();
                return Err(EkosError::SessionInit(format!(
                    "webdriver session failed: {err}"
                )));
            }
        };

        info!(target = "ekos", port = server.port, headless = config.headless, "browser session created");
        Ok(Self { driver, server, download_dir })
    }

    /// The directory downloads are routed to, when tracked by this session.
    pub fn download_dir(&self) -> Option<&Path> {
        self.download_dir.as_deref()
    }

    /// Quits the browser and terminates the WebDriver server. Never fails:
    /// teardown problems are logged and swallowed so that no error can
    /// shadow the outcome of the run itself.
    pub async fn close(self) {
        let Self { driver, mut server, .. } = self;
        if let Err(err) = driver.quit().await {
            warn!(target = "ekos", error = %err, "browser quit failed");
        }
        server.shutdown();
        info!(target = "ekos", "browser session closed");
    }

    async fn find(&self, target: &Locator) -> Result<WebElement> {
        self.driver.find(by_of(target)).await.map_err(|err| match err {
            WebDriverError::NoSuchElement(_) => EkosError::ElementNotFound {
                selector: target.to_string(),
            },
            other => other.into(),
        })
    }

    async fn await_element(&self, target: &Locator, timeout: Duration) -> Result<WebElement> {
        self.driver
            .query(by_of(target))
            .wait(timeout, POLL_INTERVAL)
            .first()
            .await
            .map_err(|_| EkosError::Timeout {
                ms: timeout.as_millis() as u64,
                condition: target.to_string(),
            })
    }
}

fn firefox_caps(config: &SessionConfig, download_dir: Option<&Path>) -> Result<FirefoxCapabilities> {
    let mut caps = DesiredCapabilities::firefox();
    if config.headless {
        caps.set_headless()?;
    }

    let mut prefs = FirefoxPreferences::new();
    let folder_list = match config.download_dir {
        DownloadDirMode::ProfileDefault => 1,
        _ => 2,
    };
    prefs.set("browser.download.folderList", folder_list)?;
    if let Some(dir) = download_dir {
        prefs.set("browser.download.dir", dir.to_string_lossy().as_ref())?;
    }
    prefs.set("browser.helperApps.neverAsk.saveToDisk", DOWNLOAD_MIME_TYPES)?;
    prefs.set("browser.helperApps.neverAsk.openFile", DOWNLOAD_MIME_TYPES)?;
    caps.set_preferences(prefs)?;

    Ok(caps)
}

fn by_of(target: &Locator) -> By {
    match target {
        Locator::Id(v) => By::Id(v.as_str()),
        Locator::Css(v) => By::Css(v.as_str()),
        Locator::XPath(v) => By::XPath(v.as_str()),
        Locator::LinkText(v) => By::LinkText(v.as_str()),
        Locator::ClassName(v) => By::ClassName(v.as_str()),
    }
}

#[async_trait]
impl BrowserControl for Session {
    async fn goto(&self, url: &str) -> Result<()> {
        self.driver.goto(url).await.map_err(Into::into)
    }

    async fn title(&self) -> Result<String> {
        self.driver.title().await.map_err(Into::into)
    }

    async fn type_into(&self, target: &Locator, text: &str) -> Result<()> {
        let elem = self.find(target).await?;
        elem.send_keys(text).await.map_err(Into::into)
    }

    async fn submit(&self, target: &Locator) -> Result<()> {
        let elem = self.find(target).await?;
        elem.send_keys(Key::Enter).await.map_err(Into::into)
    }

    async fn click_when_ready(&self, target: &Locator, timeout: Duration) -> Result<()> {
        let elem = self.await_element(target, timeout).await?;
        elem.wait_until()
            .wait(timeout, POLL_INTERVAL)
            .clickable()
            .await
            .map_err(|_| EkosError::Timeout {
                ms: timeout.as_millis() as u64,
                condition: format!("{target} clickable"),
            })?;

        match elem.click().await {
            Err(WebDriverError::ElementClickIntercepted(_)) => {
                // Obscured by an overlay or still animating; fire the click
                // against the located element instead of the pointer.
                debug!(target = "ekos", locator = %target, "pointer click intercepted, clicking via script");
                self.driver
                    .execute("arguments[0].click();", vec![elem.to_json()?])
                    .await?;
                Ok(())
            }
            other => other.map_err(Into::into),
        }
    }

    async fn enter_frame(&self, name: &str, timeout: Duration) -> Result<()> {
        let locator = Locator::css(format!("iframe[name='{name}']"));
        let elem = self
            .await_element(&locator, timeout)
            .await
            .map_err(|_| EkosError::FrameNotFound {
                name: name.to_string(),
                ms: timeout.as_millis() as u64,
            })?;
        elem.enter_frame().await.map_err(Into::into)
    }

    async fn leave_frames(&self) -> Result<()> {
        self.driver.enter_default_frame().await.map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(download_dir: DownloadDirMode) -> SessionConfig {
        SessionConfig {
            browser: BrowserKind::Firefox,
            driver_path: PathBuf::from("/usr/local/bin/geckodriver"),
            download_dir,
            headless: true,
        }
    }

    #[test]
    fn fixed_download_dir_must_exist() {
        let cfg = config(DownloadDirMode::Fixed(PathBuf::from("/nonexistent/downloads")));
        let err = cfg.resolve_download_dir().unwrap_err();
        assert!(matches!(err, EkosError::SessionInit(_)));
    }

    #[test]
    fn fixed_download_dir_resolves_when_present() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = config(DownloadDirMode::Fixed(tmp.path().to_path_buf()));
        let resolved = cfg.resolve_download_dir().unwrap();
        assert_eq!(resolved.as_deref(), Some(tmp.path()));
    }

    #[test]
    fn ephemeral_download_dir_is_created() {
        let cfg = config(DownloadDirMode::EphemeralTemp);
        let resolved = cfg.resolve_download_dir().unwrap().unwrap();
        assert!(resolved.is_dir());
    }

    #[test]
    fn profile_default_is_untracked() {
        let cfg = config(DownloadDirMode::ProfileDefault);
        assert!(cfg.resolve_download_dir().unwrap().is_none());
    }

    #[test]
    fn browser_kind_parses_common_names() {
        assert_eq!("Firefox".parse::<BrowserKind>().unwrap(), BrowserKind::Firefox);
        assert_eq!("chromium".parse::<BrowserKind>().unwrap(), BrowserKind::Chrome);
        assert!("safari".parse::<BrowserKind>().is_err());
    }
}
