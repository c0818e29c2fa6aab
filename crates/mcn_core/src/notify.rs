use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub posted_at: DateTime<Utc>,
}

/// Single-slot, user-facing message channel.
///
/// Posting replaces whatever is showing. Every message clears itself after its
/// TTL unless something newer has replaced it in the meantime.
#[derive(Clone)]
pub struct Notifier {
    inner: Arc<NotifierInner>,
}

struct NotifierInner {
    current: watch::Sender<Option<Notification>>,
    sequence: AtomicU64,
    dismiss: Mutex<Option<JoinHandle<()>>>,
}

impl Notifier {
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self {
            inner: Arc::new(NotifierInner {
                current,
                sequence: AtomicU64::new(0),
                dismiss: Mutex::new(None),
            }),
        }
    }

    /// Show `message` for `ttl`. Must be called from inside a tokio runtime.
    pub fn notify(&self, message: impl Into<String>, ttl: Duration) -> u64 {
        let id = self.inner.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let message = message.into();
        tracing::debug!("🔔 {}", message);
        self.inner.current.send_replace(Some(Notification {
            id,
            message,
            posted_at: Utc::now(),
        }));

        let inner = self.inner.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            inner.current.send_if_modified(|current| {
                if current.as_ref().map(|n| n.id) == Some(id) {
                    *current = None;
                    true
                } else {
                    false
                }
            });
        });

        if let Some(previous) = self.dismiss_slot().replace(handle) {
            previous.abort();
        }
        id
    }

    pub fn clear(&self) {
        self.inner.current.send_replace(None);
        if let Some(pending) = self.dismiss_slot().take() {
            pending.abort();
        }
    }

    pub fn current(&self) -> Option<Notification> {
        self.inner.current.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Notification>> {
        self.inner.current.subscribe()
    }

    /// Cancel the pending auto-dismiss timer. The current message stays as is.
    pub fn shutdown(&self) {
        if let Some(pending) = self.dismiss_slot().take() {
            pending.abort();
        }
    }

    fn dismiss_slot(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.inner.dismiss.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("current", &self.current())
            .finish()
    }
}
