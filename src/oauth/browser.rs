use std::io::ErrorKind;

#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    #[error("no browser opener is available")]
    NoOpener,

    #[error("failed to open the browser: {0}")]
    Failed(String),
}

/// Opens a URL in the user's default handler.
pub trait BrowserOpener: Send + Sync {
    fn open(&self, url: &str) -> Result<(), BrowserError>;
}

/// System browser via the `webbrowser` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

impl BrowserOpener for SystemBrowser {
    fn open(&self, url: &str) -> Result<(), BrowserError> {
        webbrowser::open(url).map_err(|e| match e.kind() {
            ErrorKind::NotFound | ErrorKind::Unsupported => BrowserError::NoOpener,
            _ => BrowserError::Failed(e.to_string()),
        })
    }
}

/// Never opens anything. Used when no interactive session is expected.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBrowser;

impl BrowserOpener for NoBrowser {
    fn open(&self, _url: &str) -> Result<(), BrowserError> {
        Err(BrowserError::NoOpener)
    }
}

/// Log the outcome of a browser open attempt. Never fails.
pub(crate) fn report_open_result(result: Result<(), BrowserError>, url: &str) {
    match result {
        Ok(()) => tracing::debug!(url, "opened the verification page"),
        Err(BrowserError::NoOpener) => {
            tracing::debug!("no browser opener available, skipping");
        }
        Err(e) => tracing::warn!(error = %e, "failed to open the browser"),
    }
}
