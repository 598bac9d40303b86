//! User-visible notifications emitted by the session core

use std::time::Instant;

use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub struct Notice {
    pub message: String,
    pub level: NoticeLevel,
    pub timestamp: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

impl Notice {
    pub fn new(message: String, level: NoticeLevel) -> Self {
        Self {
            message,
            level,
            timestamp: Instant::now(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message.into(), NoticeLevel::Info)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message.into(), NoticeLevel::Warning)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message.into(), NoticeLevel::Error)
    }
}

/// Sending half of the notice channel.
///
/// A silent notifier drops everything after logging it; sending never fails
/// the caller, even when the presentation layer has gone away.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    tx: Option<mpsc::UnboundedSender<Notice>>,
}

impl Notifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    pub fn silent() -> Self {
        Self { tx: None }
    }

    pub fn send(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => tracing::debug!("notice: {}", notice.message),
            NoticeLevel::Warning => tracing::info!("notice: {}", notice.message),
            NoticeLevel::Error => tracing::warn!("notice: {}", notice.message),
        }
        if let Some(tx) = &self.tx {
            let _ = tx.send(notice);
        }
    }
}
