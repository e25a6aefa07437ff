//! Reactive update channel: an ordered server-to-browser event stream.
//!
//! Events are framed as server-sent events in the Datastar v1 format so the
//! stock Datastar client applies them:
//!
//! ```text
//! event: datastar-patch-elements
//! data: selector #jobs-list
//! data: elements <ul id="jobs-list">...</ul>
//!
//! ```
//!
//! Script execution and navigation have no event type of their own; like the
//! Datastar SDKs, they append a self-removing `<script>` to `body`.
//!
//! Delivery is fire-and-forget. The handler side holds an [`UpdateChannel`],
//! the response body drains the matching [`UpdateStream`]. When the browser
//! disconnects, axum drops the stream, the channel reports closed, and every
//! later emission fails fast with [`PanelError::ChannelClosed`].

use crate::config::ServerConfig;
use crate::error::{error_fragment, PanelError};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{self, Stream};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::mpsc;
use tracing::debug;

pub const PATCH_ELEMENTS: &str = "datastar-patch-elements";
pub const PATCH_SIGNALS: &str = "datastar-patch-signals";

/// How patched content is merged into the target element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PatchMode {
    /// Morph the target (matched by selector or by the fragment's own id).
    #[default]
    Replace,
    /// Replace the target's children, keeping the target itself.
    Inner,
    Append,
    Prepend,
}

impl PatchMode {
    /// Wire name, or `None` for the protocol default.
    fn wire_name(self) -> Option<&'static str> {
        match self {
            PatchMode::Replace => None,
            PatchMode::Inner => Some("inner"),
            PatchMode::Append => Some("append"),
            PatchMode::Prepend => Some("prepend"),
        }
    }
}

/// One event on the update channel.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateEvent {
    PatchElements {
        selector: Option<String>,
        mode: PatchMode,
        elements: String,
    },
    RemoveElements {
        selector: String,
    },
    /// Compact JSON object merged into the client's signals.
    PatchSignals {
        signals: String,
    },
    ExecuteScript {
        script: String,
    },
    Navigate {
        url: String,
    },
}

/// `"#id"` for a bare id; selectors that already start with `#` pass through.
pub fn id_selector(id: &str) -> String {
    if id.starts_with('#') {
        id.to_string()
    } else {
        format!("#{}", id)
    }
}

/// One `key` line per line of `text`. A lone `\r` also ends a line, since SSE
/// treats it as a terminator and axum refuses it inside a field.
fn prefixed_lines(out: &mut Vec<String>, key: &str, text: &str) {
    for line in text.lines().flat_map(|l| l.split('\r')) {
        out.push(format!("{} {}", key, line));
    }
}

impl UpdateEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            UpdateEvent::PatchSignals { .. } => PATCH_SIGNALS,
            _ => PATCH_ELEMENTS,
        }
    }

    /// The `data:` payload lines, without the `data: ` prefix.
    pub fn data_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        match self {
            UpdateEvent::PatchElements {
                selector,
                mode,
                elements,
            } => {
                if let Some(selector) = selector {
                    lines.push(format!("selector {}", selector));
                }
                if let Some(mode) = mode.wire_name() {
                    lines.push(format!("mode {}", mode));
                }
                prefixed_lines(&mut lines, "elements", elements);
            }
            UpdateEvent::RemoveElements { selector } => {
                lines.push(format!("selector {}", selector));
                lines.push("mode remove".to_string());
            }
            UpdateEvent::PatchSignals { signals } => {
                prefixed_lines(&mut lines, "signals", signals);
            }
            UpdateEvent::ExecuteScript { script } => {
                lines.push("selector body".to_string());
                lines.push("mode append".to_string());
                let tag = format!(r#"<script data-effect="el.remove()">{}</script>"#, script);
                prefixed_lines(&mut lines, "elements", &tag);
            }
            UpdateEvent::Navigate { url } => {
                return UpdateEvent::ExecuteScript {
                    script: navigate_script(url),
                }
                .data_lines();
            }
        }
        lines
    }

    /// Full SSE frame, terminated by a blank line.
    pub fn encode(&self) -> String {
        let mut frame = format!("event: {}\n", self.event_type());
        for line in self.data_lines() {
            frame.push_str("data: ");
            frame.push_str(&line);
            frame.push('\n');
        }
        frame.push('\n');
        frame
    }

    pub fn to_sse(&self) -> Event {
        Event::default()
            .event(self.event_type())
            .data(self.data_lines().join("\n"))
    }
}

fn navigate_script(url: &str) -> String {
    // JSON string quoting doubles as JS string quoting.
    let quoted = serde_json::to_string(url).unwrap_or_else(|_| "\"/\"".to_string());
    format!("setTimeout(() => window.location.href = {})", quoted)
}

/// Sending half of an update channel, held by the handler.
#[derive(Debug, Clone)]
pub struct UpdateChannel {
    tx: mpsc::Sender<UpdateEvent>,
    error_region: Arc<RwLock<String>>,
}

/// Receiving half, drained into the HTTP response.
#[derive(Debug)]
pub struct UpdateStream {
    rx: mpsc::Receiver<UpdateEvent>,
}

impl UpdateChannel {
    pub fn open(capacity: usize) -> (Self, UpdateStream) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let channel = Self {
            tx,
            error_region: Arc::new(RwLock::new(ServerConfig::DEFAULT_ERROR_REGION.to_string())),
        };
        (channel, UpdateStream { rx })
    }

    /// True once the peer is gone. Checked before every emission.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub async fn send(&self, event: UpdateEvent) -> Result<(), PanelError> {
        if self.is_closed() {
            return Err(PanelError::ChannelClosed);
        }
        self.tx.send(event).await.map_err(|_| PanelError::ChannelClosed)
    }

    /// Patch a fragment that carries its own target id.
    pub async fn patch_elements(&self, html: impl Into<String>) -> Result<(), PanelError> {
        self.send(UpdateEvent::PatchElements {
            selector: None,
            mode: PatchMode::Replace,
            elements: html.into(),
        })
        .await
    }

    pub async fn patch_by_id(&self, id: &str, html: impl Into<String>) -> Result<(), PanelError> {
        self.patch_by_id_with(id, html, PatchMode::Replace).await
    }

    pub async fn patch_by_id_with(
        &self,
        id: &str,
        html: impl Into<String>,
        mode: PatchMode,
    ) -> Result<(), PanelError> {
        self.send(UpdateEvent::PatchElements {
            selector: Some(id_selector(id)),
            mode,
            elements: html.into(),
        })
        .await
    }

    pub async fn append_by_id(&self, id: &str, html: impl Into<String>) -> Result<(), PanelError> {
        self.patch_by_id_with(id, html, PatchMode::Append).await
    }

    pub async fn prepend_by_id(&self, id: &str, html: impl Into<String>) -> Result<(), PanelError> {
        self.patch_by_id_with(id, html, PatchMode::Prepend).await
    }

    pub async fn remove_by_id(&self, id: &str) -> Result<(), PanelError> {
        self.send(UpdateEvent::RemoveElements {
            selector: id_selector(id),
        })
        .await
    }

    pub async fn patch_signals<T: Serialize>(&self, signals: &T) -> Result<(), PanelError> {
        let signals = serde_json::to_string(signals)
            .map_err(|e| PanelError::bad_request(format!("signals not serializable: {}", e)))?;
        self.send(UpdateEvent::PatchSignals { signals }).await
    }

    pub async fn execute_script(&self, script: impl Into<String>) -> Result<(), PanelError> {
        self.send(UpdateEvent::ExecuteScript {
            script: script.into(),
        })
        .await
    }

    /// Send the browser elsewhere; the streaming stand-in for a redirect.
    pub async fn navigate(&self, url: impl Into<String>) -> Result<(), PanelError> {
        self.send(UpdateEvent::Navigate { url: url.into() }).await
    }

    /// Element id that receives the error fragment if the handler fails.
    pub fn set_error_region(&self, id: &str) {
        *self
            .error_region
            .write()
            .unwrap_or_else(PoisonError::into_inner) = id.to_string();
    }

    pub fn error_region(&self) -> String {
        self.error_region
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Patch an error fragment into the current error region.
    pub async fn report_error(&self, err: &PanelError) {
        if !err.is_reportable() || self.is_closed() {
            return;
        }
        let region = self.error_region();
        if let Err(e) = self
            .patch_by_id_with(&region, error_fragment(&err.to_string()), PatchMode::Inner)
            .await
        {
            debug!("could not report error to {}: {}", region, e);
        }
    }
}

impl UpdateStream {
    pub async fn next(&mut self) -> Option<UpdateEvent> {
        self.rx.recv().await
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<Event, Infallible>> {
        stream::unfold(self.rx, |mut rx| async move {
            let event = rx.recv().await?;
            Some((Ok(event.to_sse()), rx))
        })
    }

    /// SSE response body; ends once every channel handle is dropped.
    pub fn into_response(self) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
        Sse::new(self.into_stream()).keep_alive(KeepAlive::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_events_arrive_in_emission_order() {
        let (channel, mut stream) = UpdateChannel::open(4);
        channel.patch_by_id("list", "<ul id=\"list\"></ul>").await.unwrap();
        channel.remove_by_id("row-3").await.unwrap();
        drop(channel);

        let first = stream.next().await.unwrap();
        let second = stream.next().await.unwrap();
        assert!(stream.next().await.is_none());

        assert_eq!(
            first,
            UpdateEvent::PatchElements {
                selector: Some("#list".into()),
                mode: PatchMode::Replace,
                elements: "<ul id=\"list\"></ul>".into(),
            }
        );
        assert_eq!(
            second,
            UpdateEvent::RemoveElements {
                selector: "#row-3".into()
            }
        );
    }

    #[tokio::test]
    async fn test_send_after_peer_disconnect_fails_fast() {
        let (channel, stream) = UpdateChannel::open(1);
        assert!(!channel.is_closed());
        drop(stream);
        assert!(channel.is_closed());

        let err = channel.patch_elements("<div></div>").await.unwrap_err();
        assert!(matches!(err, PanelError::ChannelClosed));
    }

    #[test]
    fn test_patch_encoding() {
        let event = UpdateEvent::PatchElements {
            selector: Some("#list".into()),
            mode: PatchMode::Append,
            elements: "<li>a</li>\n<li>b</li>".into(),
        };
        assert_eq!(
            event.encode(),
            "event: datastar-patch-elements\n\
             data: selector #list\n\
             data: mode append\n\
             data: elements <li>a</li>\n\
             data: elements <li>b</li>\n\n"
        );
    }

    #[test]
    fn test_default_mode_is_omitted() {
        let event = UpdateEvent::PatchElements {
            selector: None,
            mode: PatchMode::Replace,
            elements: "<div id=\"a\"></div>".into(),
        };
        assert_eq!(event.data_lines(), vec!["elements <div id=\"a\"></div>"]);
    }

    #[test]
    fn test_remove_encoding() {
        let event = UpdateEvent::RemoveElements {
            selector: id_selector("row-3"),
        };
        assert_eq!(event.data_lines(), vec!["selector #row-3", "mode remove"]);
    }

    #[tokio::test]
    async fn test_signals_encoding() {
        let (channel, mut stream) = UpdateChannel::open(1);
        channel
            .patch_signals(&json!({"stats": {"transfers": 2}}))
            .await
            .unwrap();
        let event = stream.next().await.unwrap();
        assert_eq!(event.event_type(), PATCH_SIGNALS);
        assert_eq!(event.data_lines(), vec![r#"signals {"stats":{"transfers":2}}"#]);
    }

    #[test]
    fn test_script_and_navigate_encoding() {
        let script = UpdateEvent::ExecuteScript {
            script: "alert('hi')".into(),
        };
        assert_eq!(
            script.data_lines(),
            vec![
                "selector body",
                "mode append",
                r#"elements <script data-effect="el.remove()">alert('hi')</script>"#,
            ]
        );

        let navigate = UpdateEvent::Navigate { url: "/jobs".into() };
        assert_eq!(navigate.event_type(), PATCH_ELEMENTS);
        assert!(navigate.data_lines()[2]
            .contains(r#"setTimeout(() => window.location.href = "/jobs")"#));
    }

    #[tokio::test]
    async fn test_report_error_targets_region() {
        let (channel, mut stream) = UpdateChannel::open(2);
        channel.set_error_region("jobs-list");
        channel
            .report_error(&PanelError::bad_request("no such job"))
            .await;
        drop(channel);

        match stream.next().await.unwrap() {
            UpdateEvent::PatchElements {
                selector,
                mode,
                elements,
            } => {
                assert_eq!(selector.as_deref(), Some("#jobs-list"));
                assert_eq!(mode, PatchMode::Inner);
                assert!(elements.contains("bad request: no such job"));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_carriage_returns_split_into_lines() {
        let event = UpdateEvent::PatchElements {
            selector: Some("#file-browser".into()),
            mode: PatchMode::Replace,
            elements: "<li>evil\rname</li>\r\n<li>b</li>".into(),
        };
        let lines = event.data_lines();
        assert_eq!(
            lines,
            vec![
                "selector #file-browser",
                "elements <li>evil",
                "elements name</li>",
                "elements <li>b</li>",
            ]
        );
        assert!(lines.iter().all(|l| !l.contains('\r') && !l.contains('\n')));

        // Would panic inside axum if a bare carriage return got through.
        let _ = event.to_sse();
    }

    #[test]
    fn test_id_selector() {
        assert_eq!(id_selector("a"), "#a");
        assert_eq!(id_selector("#a"), "#a");
    }
}
