use tangle_shared::User;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Transient toast/banner feedback for a mutating operation.
#[derive(Debug, Clone)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

/// Typed cross-tree signals. The composition root owns the receiving end;
/// stores (and presentation, for `OpenComments`) hold cloned senders.
#[derive(Debug, Clone)]
pub enum UiEvent {
    Notice(Notice),
    LoginSucceeded { user: User },
    OpenComments { post_id: String },
    CommentsClosed,
}

#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<UiEvent>,
}

impl Notifier {
    pub fn channel() -> (Notifier, mpsc::UnboundedReceiver<UiEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Notifier { tx }, rx)
    }

    pub fn emit(&self, event: UiEvent) {
        // A dropped receiver just means nobody is rendering toasts.
        let _ = self.tx.send(event);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.emit(UiEvent::Notice(Notice {
            kind: NoticeKind::Success,
            message: message.into(),
        }));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(UiEvent::Notice(Notice {
            kind: NoticeKind::Error,
            message: message.into(),
        }));
    }
}
