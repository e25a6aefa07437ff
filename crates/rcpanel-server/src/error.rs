//! Handler error type and the single error-fragment renderer.

use crate::views::escape_html;
use rcpanel_core::RcError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PanelError {
    #[error(transparent)]
    Rc(#[from] RcError),

    #[error("bad request: {0}")]
    BadRequest(String),

    /// A page handler asked for the update channel.
    #[error("this route does not stream updates")]
    NoUpdateChannel,

    /// The browser went away while the handler was still emitting.
    #[error("update channel closed by peer")]
    ChannelClosed,
}

impl PanelError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        PanelError::BadRequest(message.into())
    }

    /// Whether an error fragment can still be delivered for this error.
    pub fn is_reportable(&self) -> bool {
        !matches!(self, PanelError::ChannelClosed)
    }
}

/// Render an error as an inline fragment.
pub fn error_fragment(message: &str) -> String {
    format!(r#"<div class="error">{}</div>"#, escape_html(message))
}
