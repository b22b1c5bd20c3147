//! Error types shared across the export pipeline.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, EkosError>;

#[derive(Debug, thiserror::Error)]
pub enum EkosError {
    /// The browser engine could not be located or started, or the session
    /// configuration is unusable (missing download directory, unsupported
    /// browser).
    #[error("failed to start browser session: {0}")]
    SessionInit(String),

    /// The login address served a page that does not look like the expected
    /// application.
    #[error("login page mismatch: expected title containing {expected:?}, got {actual:?}")]
    AuthPageMismatch { expected: String, actual: String },

    /// A bounded UI wait expired before its condition became true.
    #[error("timed out after {ms}ms waiting for {condition}")]
    Timeout { ms: u64, condition: String },

    /// An expected nested document never became available.
    #[error("frame {name:?} not found within {ms}ms")]
    FrameNotFound { name: String, ms: u64 },

    /// An expected page element is absent.
    #[error("element not found: {selector}")]
    ElementNotFound { selector: String },

    /// No report link with the exact requested display text appeared.
    #[error("report {name:?} not found in report listing")]
    ReportNotFound { name: String },

    /// No downloaded file matched the expected naming pattern.
    #[error("no file matching {pattern:?} in {}", .dir.display())]
    ArtifactNotFound { pattern: String, dir: PathBuf },

    /// A navigator operation was invoked from the wrong state.
    #[error("navigation step out of order: {0}")]
    InvalidTransition(String),

    /// The spreadsheet API rejected a request.
    #[error("spreadsheet API request failed: {0}")]
    Spreadsheet(String),

    /// Mail could not be built or submitted.
    #[error("failed to send mail: {0}")]
    Mail(String),

    /// The settings file is missing, unreadable, or incomplete.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The artifact name pattern is not a valid regular expression.
    #[error("invalid artifact pattern: {0}")]
    Pattern(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    WebDriver(#[from] thirtyfour::error::WebDriverError),
}
