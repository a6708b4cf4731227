//! Page controller collaborator.
//!
//! The harvester drives an interactive browser session through this trait
//! but never owns the driver itself. Implementations wrap whatever
//! automation backend the host provides; [`ControllerLauncher`] hands out
//! one session per harvest.

use std::fmt;
use std::time::Duration;

/// How to find an element on the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Css(String),
    /// Element whose `aria-label` equals the value.
    AriaLabel(String),
    /// Element whose `title` attribute equals the value.
    Title(String),
    /// Link whose visible text contains the value.
    LinkTextContains(String),
    /// Link whose visible text equals the value.
    LinkTextEquals(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(selector) => write!(f, "css `{selector}`"),
            Locator::AriaLabel(label) => write!(f, "aria-label `{label}`"),
            Locator::Title(title) => write!(f, "title `{title}`"),
            Locator::LinkTextContains(text) => write!(f, "link text containing `{text}`"),
            Locator::LinkTextEquals(text) => write!(f, "link text `{text}`"),
        }
    }
}

/// Handle to an element in the live page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    /// Backend-specific element reference.
    pub handle: String,
    /// Visible text at the time the control was found.
    pub text: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControllerError {
    #[error("element not found: {0}")]
    NotFound(String),
    #[error("navigation failed: {0}")]
    Navigation(String),
    #[error("controller action timed out after {0:?}")]
    Timeout(Duration),
    #[error("session error: {0}")]
    Session(String),
}

/// One live browser tab. Operations are serial; the session is exclusively
/// owned by a single harvest.
#[async_trait::async_trait]
pub trait PageController: Send {
    async fn navigate(&mut self, url: &str) -> Result<(), ControllerError>;

    async fn current_url(&mut self) -> Result<String, ControllerError>;

    async fn current_html(&mut self) -> Result<String, ControllerError>;

    async fn find_control(&mut self, locator: &Locator) -> Result<Option<Control>, ControllerError>;

    async fn find_controls(&mut self, locator: &Locator) -> Result<Vec<Control>, ControllerError>;

    async fn scroll_into_view(&mut self, control: &Control) -> Result<(), ControllerError>;

    async fn activate(&mut self, control: &Control) -> Result<(), ControllerError>;

    async fn scroll_to_bottom(&mut self) -> Result<(), ControllerError>;

    async fn close(&mut self) -> Result<(), ControllerError>;
}

#[async_trait::async_trait]
pub trait ControllerLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn PageController>, ControllerError>;
}
