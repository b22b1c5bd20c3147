//! Drives the Ekos UI through login, menu navigation, and CSV export.
//!
//! The navigation sequence is a fixed path through a fragile UI: nested
//! documents, elements that render before they accept clicks, and a
//! download that happens as a browser side effect. Each step here is a
//! state transition with an explicit entry condition, so a step invoked
//! out of order fails immediately instead of interacting with the wrong
//! page.

use std::fmt;
use std::time::Duration;

use tracing::info;

use crate::error::{EkosError, Result};
use crate::session::control::{BrowserControl, Locator};

pub const LOGIN_URL: &str = "https://login.goekos.com/";
pub const LOGIN_TITLE: &str = "Ekos";

const USERNAME_FIELD: &str = "txtUsername";
const PASSWORD_FIELD: &str = "txtPassword";
const REPORTS_MENU: &str = "//div[@class='nav-options']/button[4]";
const REPORT_CATEGORY: &str = "//div[@class='nav-option--group']/a[1]";
const EXPORT_OPTIONS: &str = "buttonGroupInner";
const CSV_EXPORT: &str = "csv_export";
const FORM_CLOSE: &str = "formClose";

/// Name of the nested document holding the report listing.
pub const REPORT_FRAME: &str = "classicContainer";
/// Name of the further-nested document holding the export form.
pub const FORM_FRAME: &str = "formFrame_0";

pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(10);

/// Ekos account credentials. `Debug` redacts the password so credentials
/// can appear in error context without leaking.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// A report to export: the exact UI-facing display name and the filename
/// the downloaded artifact is renamed to.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub name: String,
    pub target_filename: String,
}

impl ReportRequest {
    /// A request whose artifact is renamed to `<name>.csv`.
    pub fn csv(name: impl Into<String>) -> Self {
        let name = name.into();
        let target_filename = format!("{name}.csv");
        Self { name, target_filename }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavState {
    Unauthenticated,
    Authenticated,
    OnReportsMenu,
    OnReportCategory,
    ReportFormOpen,
    ExportTriggered,
    Done,
    /// Absorbing state: any failed step lands here and every further step
    /// is refused.
    Failed,
}

/// Owns one browser session for the duration of a run and walks it through
/// the export sequence.
pub struct Navigator<B> {
    browser: B,
    state: NavState,
    frame_depth: u8,
    timeout: Duration,
}

impl<B: BrowserControl> Navigator<B> {
    pub fn new(browser: B) -> Self {
        Self {
            browser,
            state: NavState::Unauthenticated,
            frame_depth: 0,
            timeout: DEFAULT_STEP_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    /// Releases the owned session so the caller can tear it down. Valid in
    /// any state, including `Failed`: teardown must always be possible.
    pub fn into_session(self) -> B {
        self.browser
    }

    /// Navigates to the login page, checks it presents the expected
    /// application, fills in credentials, and submits.
    ///
    /// Login success is *not* verified: a wrong password is not detected
    /// here and will instead surface as a bounded-wait failure on the next
    /// step. Callers that need a hard guarantee must assert it themselves,
    /// e.g. by probing for a post-login landmark element.
    pub async fn authenticate(&mut self, username: &str, password: &str) -> Result<()> {
        self.expect(NavState::Unauthenticated, "authenticate")?;
        info!(target = "ekos", username, "logging in to Ekos");
        let result = self.try_authenticate(username, password).await;
        self.complete(NavState::Authenticated, result)
    }

    async fn try_authenticate(&self, username: &str, password: &str) -> Result<()> {
        self.browser.goto(LOGIN_URL).await?;
        let title = self.browser.title().await?;
        if !title.contains(LOGIN_TITLE) {
            return Err(EkosError::AuthPageMismatch {
                expected: LOGIN_TITLE.to_string(),
                actual: title,
            });
        }
        self.browser.type_into(&Locator::id(USERNAME_FIELD), username).await?;
        self.browser.type_into(&Locator::id(PASSWORD_FIELD), password).await?;
        self.browser.submit(&Locator::id(PASSWORD_FIELD)).await
    }

    /// Opens the top-level reports menu once its button accepts clicks.
    pub async fn open_reports_menu(&mut self) -> Result<()> {
        self.expect(NavState::Authenticated, "open_reports_menu")?;
        info!(target = "ekos", "opening reports menu");
        let result = self
            .browser
            .click_when_ready(&Locator::xpath(REPORTS_MENU), self.timeout)
            .await;
        self.complete(NavState::OnReportsMenu, result)
    }

    /// Selects the report category entry under the open menu.
    pub async fn open_report_category(&mut self) -> Result<()> {
        self.expect(NavState::OnReportsMenu, "open_report_category")?;
        info!(target = "ekos", "opening report category");
        let result = self
            .browser
            .click_when_ready(&Locator::xpath(REPORT_CATEGORY), self.timeout)
            .await;
        self.complete(NavState::OnReportCategory, result)
    }

    /// Switches into the nested document that holds the report listing.
    pub async fn enter_report_frame(&mut self) -> Result<()> {
        self.expect(NavState::OnReportCategory, "enter_report_frame")?;
        self.require_depth(0, "enter_report_frame")?;
        info!(target = "ekos", frame = REPORT_FRAME, "switching into report listing frame");
        match self.browser.enter_frame(REPORT_FRAME, self.timeout).await {
            Ok(()) => {
                self.frame_depth = 1;
                Ok(())
            }
            Err(err) => self.fail(err),
        }
    }

    /// Opens the report whose link text equals `report_name` exactly
    /// (case and whitespace sensitive).
    pub async fn open_report(&mut self, report_name: &str) -> Result<()> {
        self.expect(NavState::OnReportCategory, "open_report")?;
        self.require_depth(1, "open_report")?;
        info!(target = "ekos", report = report_name, "opening report");
        let result = self
            .browser
            .click_when_ready(&Locator::link_text(report_name), self.timeout)
            .await
            .map_err(|err| match err {
                EkosError::Timeout { .. } | EkosError::ElementNotFound { .. } => {
                    EkosError::ReportNotFound { name: report_name.to_string() }
                }
                other => other,
            });
        self.complete(NavState::ReportFormOpen, result)
    }

    /// Switches into the report form's own nested document, reachable only
    /// after the report is open.
    pub async fn enter_form_frame(&mut self) -> Result<()> {
        self.expect(NavState::ReportFormOpen, "enter_form_frame")?;
        self.require_depth(1, "enter_form_frame")?;
        info!(target = "ekos", frame = FORM_FRAME, "switching into export form frame");
        match self.browser.enter_frame(FORM_FRAME, self.timeout).await {
            Ok(()) => {
                self.frame_depth = 2;
                Ok(())
            }
            Err(err) => self.fail(err),
        }
    }

    /// Opens the export options and activates the CSV export control.
    ///
    /// The browser starts writing the file asynchronously; completion is
    /// not observable from here and is left to the download resolver.
    pub async fn trigger_export(&mut self) -> Result<()> {
        self.expect(NavState::ReportFormOpen, "trigger_export")?;
        self.require_depth(2, "trigger_export")?;
        info!(target = "ekos", "triggering csv export");
        let result = async {
            self.browser
                .click_when_ready(&Locator::class_name(EXPORT_OPTIONS), self.timeout)
                .await?;
            self.browser
                .click_when_ready(&Locator::id(CSV_EXPORT), self.timeout)
                .await
        }
        .await;
        self.complete(NavState::ExportTriggered, result)
    }

    /// Dismisses the report form and restores the outer document context,
    /// leaving the UI navigable for a further report in the same session.
    pub async fn close_form(&mut self) -> Result<()> {
        self.expect(NavState::ExportTriggered, "close_form")?;
        info!(target = "ekos", "closing report form");
        let result = async {
            self.browser.leave_frames().await?;
            self.browser.enter_frame(REPORT_FRAME, self.timeout).await?;
            self.browser
                .click_when_ready(&Locator::class_name(FORM_CLOSE), self.timeout)
                .await?;
            self.browser.leave_frames().await
        }
        .await;
        match result {
            Ok(()) => {
                self.frame_depth = 0;
                self.state = NavState::Done;
                Ok(())
            }
            Err(err) => self.fail(err),
        }
    }

    fn expect(&self, state: NavState, op: &str) -> Result<()> {
        if self.state == state {
            Ok(())
        } else {
            Err(EkosError::InvalidTransition(format!(
                "{op} requires {state:?}, navigator is {:?}",
                self.state
            )))
        }
    }

    fn require_depth(&self, depth: u8, op: &str) -> Result<()> {
        if self.frame_depth == depth {
            Ok(())
        } else {
            Err(EkosError::InvalidTransition(format!(
                "{op} requires frame depth {depth}, navigator is at {}",
                self.frame_depth
            )))
        }
    }

    fn complete(&mut self, next: NavState, result: Result<()>) -> Result<()> {
        match result {
            Ok(()) => {
                self.state = next;
                Ok(())
            }
            Err(err) => self.fail(err),
        }
    }

    fn fail(&mut self, err: EkosError) -> Result<()> {
        self.state = NavState::Failed;
        Err(err)
    }
}

/// Runs the full export sequence for one report: authenticate, walk the
/// menus, open the report inside its nested document, and trigger the CSV
/// export. Fails fast on the first broken step; the caller owns teardown.
pub async fn export_report<B: BrowserControl>(
    nav: &mut Navigator<B>,
    credentials: &Credentials,
    report_name: &str,
) -> Result<()> {
    nav.authenticate(&credentials.username, &credentials.password).await?;
    nav.open_reports_menu().await?;
    nav.open_report_category().await?;
    nav.enter_report_frame().await?;
    nav.open_report(report_name).await?;
    nav.enter_form_frame().await?;
    nav.trigger_export().await?;
    nav.close_form().await?;
    Ok(())
}
