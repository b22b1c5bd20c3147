//! Capability surface the navigator drives the browser through.
//!
//! Keeping the navigator polymorphic over this trait lets the navigation
//! sequence run against an in-memory fake in tests, with the WebDriver
//! wiring confined to [`Session`](super::Session).

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// The selector kinds the Ekos UI is addressed by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Id(String),
    Css(String),
    XPath(String),
    LinkText(String),
    ClassName(String),
}

impl Locator {
    pub fn id(value: impl Into<String>) -> Self {
        Self::Id(value.into())
    }

    pub fn css(value: impl Into<String>) -> Self {
        Self::Css(value.into())
    }

    pub fn xpath(value: impl Into<String>) -> Self {
        Self::XPath(value.into())
    }

    pub fn link_text(value: impl Into<String>) -> Self {
        Self::LinkText(value.into())
    }

    pub fn class_name(value: impl Into<String>) -> Self {
        Self::ClassName(value.into())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(v) => write!(f, "id={v}"),
            Self::Css(v) => write!(f, "css={v}"),
            Self::XPath(v) => write!(f, "xpath={v}"),
            Self::LinkText(v) => write!(f, "link={v}"),
            Self::ClassName(v) => write!(f, "class={v}"),
        }
    }
}

/// Minimal browser capabilities the navigation sequence needs: navigate,
/// read page identity, type, click with a bounded readiness wait, and switch
/// nested document contexts.
#[async_trait]
pub trait BrowserControl: Send {
    /// Navigates the session to `url`.
    async fn goto(&self, url: &str) -> Result<()>;

    /// Returns the current page title.
    async fn title(&self) -> Result<String>;

    /// Types `text` into the element at `target`.
    async fn type_into(&self, target: &Locator, text: &str) -> Result<()>;

    /// Sends Enter to the element at `target`, submitting its form.
    async fn submit(&self, target: &Locator) -> Result<()>;

    /// Waits up to `timeout` for the element at `target` to become
    /// clickable, then clicks it.
    async fn click_when_ready(&self, target: &Locator, timeout: Duration) -> Result<()>;

    /// Switches the addressing context into the nested document named
    /// `name`, waiting up to `timeout` for it to appear.
    async fn enter_frame(&self, name: &str, timeout: Duration) -> Result<()>;

    /// Restores the addressing context to the outermost document.
    async fn leave_frames(&self) -> Result<()>;
}
