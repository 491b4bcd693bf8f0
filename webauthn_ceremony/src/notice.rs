//! User-visible outcome notices.
//!
//! The ceremony client only appends; the presentation layer lists and
//! dismisses. Dismissal goes by id so a notice appended by a ceremony that
//! finished in the meantime is never removed by mistake.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::errors::FailureReason;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub id: Uuid,
    pub kind: NoticeKind,
    pub message: String,
    pub reason: Option<FailureReason>,
    pub created_at: DateTime<Utc>,
}

/// Shared, ordered list of notices. Clones refer to the same list.
#[derive(Debug, Clone, Default)]
pub struct NoticeBoard {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn success(&self, message: &str) -> Notice {
        self.push(NoticeKind::Success, message, None).await
    }

    pub(crate) async fn failure(&self, message: &str, reason: FailureReason) -> Notice {
        self.push(NoticeKind::Danger, message, Some(reason)).await
    }

    async fn push(&self, kind: NoticeKind, message: &str, reason: Option<FailureReason>) -> Notice {
        let notice = Notice {
            id: Uuid::new_v4(),
            kind,
            message: message.to_string(),
            reason,
            created_at: Utc::now(),
        };
        self.notices.lock().await.push(notice.clone());
        notice
    }

    /// Snapshot of the current notices, oldest first
    pub async fn list(&self) -> Vec<Notice> {
        self.notices.lock().await.clone()
    }

    /// Remove one notice. Returns `false` if it was already gone.
    pub async fn dismiss(&self, id: Uuid) -> bool {
        let mut notices = self.notices.lock().await;
        let before = notices.len();
        notices.retain(|n| n.id != id);
        notices.len() != before
    }

    pub async fn clear(&self) {
        self.notices.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.notices.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.notices.lock().await.is_empty()
    }
}
