//! Progress reporting from registration drivers.

use tokio::sync::mpsc;

/// Sends human-readable phase strings from a driver to whoever records them.
///
/// Cheap to clone. Delivery is best-effort: a dropped receiver or a disabled
/// reporter silently discards messages, so drivers never block or fail on
/// progress.
#[derive(Debug, Clone)]
pub struct Progress {
    tx: Option<mpsc::UnboundedSender<String>>,
}

impl Progress {
    /// Creates a reporter and the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A reporter that discards everything.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Reports one phase string.
    pub fn report(&self, step: impl Into<String>) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(step.into());
        }
    }
}
