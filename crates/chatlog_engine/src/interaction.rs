use std::sync::mpsc;

use async_trait::async_trait;
use chatlog_core::{PendingServer, ServerIdForm, ServerIdMapping};
use engine_logging::engine_warn;
use tokio::sync::oneshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Yes,
    No,
}

/// Modal round trips with the user.
#[async_trait]
pub trait Interaction: Send + Sync {
    async fn confirm(&self, title: &str, message: &str) -> Decision;
    /// Shows a message and waits until the user dismisses it.
    async fn notify(&self, title: &str, message: &str);
    /// `None` when the user cancels the prompt.
    async fn ask_for_server_ids(&self, servers: Vec<PendingServer>) -> Option<ServerIdMapping>;
}

/// A request the UI-bound context must answer through `reply`.
#[derive(Debug)]
pub enum UiRequest {
    Confirm {
        title: String,
        message: String,
        reply: oneshot::Sender<Decision>,
    },
    Notify {
        title: String,
        message: String,
        reply: oneshot::Sender<()>,
    },
    AskForServerIds {
        form: ServerIdForm,
        reply: oneshot::Sender<Option<ServerIdMapping>>,
    },
}

/// Background side of the UI hand-off. Each call posts a [`UiRequest`] and
/// suspends the calling unit until the UI context replies.
#[derive(Clone)]
pub struct UiBridge {
    tx: mpsc::Sender<UiRequest>,
}

/// UI side of the hand-off, drained by the UI loop.
pub struct UiInbox {
    rx: mpsc::Receiver<UiRequest>,
}

pub fn ui_bridge() -> (UiBridge, UiInbox) {
    let (tx, rx) = mpsc::channel();
    (UiBridge { tx }, UiInbox { rx })
}

impl UiInbox {
    pub fn try_recv(&self) -> Option<UiRequest> {
        self.rx.try_recv().ok()
    }

    /// Blocks until a request arrives; `None` once every bridge is gone.
    pub fn recv(&self) -> Option<UiRequest> {
        self.rx.recv().ok()
    }
}

impl UiBridge {
    async fn call<R>(&self, request: UiRequest, answer: oneshot::Receiver<R>, fallback: R) -> R {
        if self.tx.send(request).is_err() {
            engine_warn!("UI context is gone; using fallback answer");
            return fallback;
        }
        answer.await.unwrap_or(fallback)
    }
}

#[async_trait]
impl Interaction for UiBridge {
    async fn confirm(&self, title: &str, message: &str) -> Decision {
        let (reply, answer) = oneshot::channel();
        let request = UiRequest::Confirm {
            title: title.to_string(),
            message: message.to_string(),
            reply,
        };
        self.call(request, answer, Decision::No).await
    }

    async fn notify(&self, title: &str, message: &str) {
        let (reply, answer) = oneshot::channel();
        let request = UiRequest::Notify {
            title: title.to_string(),
            message: message.to_string(),
            reply,
        };
        self.call(request, answer, ()).await
    }

    async fn ask_for_server_ids(&self, servers: Vec<PendingServer>) -> Option<ServerIdMapping> {
        let (reply, answer) = oneshot::channel();
        let request = UiRequest::AskForServerIds {
            form: ServerIdForm::new(servers),
            reply,
        };
        self.call(request, answer, None).await
    }
}
