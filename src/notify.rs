//! Transient user-facing notices.
//!
//! Each `show` creates an independent notice that expires after a fixed
//! lifetime. Notices never block the engine and may overlap. Expiry is lazy:
//! reads filter by time and `show` prunes what has already lapsed.

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, warn};

pub const DEFAULT_NOTICE_LIFETIME: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: u64,
    pub message: String,
    pub kind: NoticeKind,
    pub expires_at: Instant,
}

impl Notice {
    pub fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

#[derive(Debug)]
pub struct NotificationChannel {
    lifetime: Duration,
    next_id: u64,
    notices: Vec<Notice>,
}

impl Default for NotificationChannel {
    fn default() -> Self {
        Self::new(DEFAULT_NOTICE_LIFETIME)
    }
}

impl NotificationChannel {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            lifetime,
            next_id: 0,
            notices: Vec::new(),
        }
    }

    pub fn show(&mut self, message: impl Into<String>, kind: NoticeKind) -> u64 {
        self.show_at(message, kind, Instant::now())
    }

    pub fn show_at(&mut self, message: impl Into<String>, kind: NoticeKind, now: Instant) -> u64 {
        let message = message.into();
        match kind {
            NoticeKind::Info => info!("Notice: {}", message),
            NoticeKind::Error => warn!("Error notice: {}", message),
        }

        self.prune(now);
        self.next_id += 1;
        self.notices.push(Notice {
            id: self.next_id,
            message,
            kind,
            expires_at: now + self.lifetime,
        });
        self.next_id
    }

    /// Notices still visible at `now`, oldest first.
    pub fn active_at(&self, now: Instant) -> impl Iterator<Item = &Notice> {
        self.notices.iter().filter(move |n| n.is_live(now))
    }

    pub fn active(&self) -> Vec<&Notice> {
        self.active_at(Instant::now()).collect()
    }

    /// Most recent notice regardless of expiry.
    pub fn latest(&self) -> Option<&Notice> {
        self.notices.last()
    }

    pub fn prune(&mut self, now: Instant) {
        self.notices.retain(|n| n.is_live(now));
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }
}
