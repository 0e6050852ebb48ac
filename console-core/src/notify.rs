//! Transient notifications raised by controllers and drained by the UI

use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub id: Uuid,
    pub level: NoticeLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NoticeQueue {
    pending: Vec<Notice>,
}

impl NoticeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, level: NoticeLevel, message: impl Into<String>) -> Uuid {
        let notice = Notice {
            id: Uuid::new_v4(),
            level,
            message: message.into(),
            created_at: Utc::now(),
        };
        let id = notice.id;
        self.pending.push(notice);
        id
    }

    pub fn success(&mut self, message: impl Into<String>) -> Uuid {
        self.push(NoticeLevel::Success, message)
    }

    pub fn info(&mut self, message: impl Into<String>) -> Uuid {
        self.push(NoticeLevel::Info, message)
    }

    pub fn error(&mut self, message: impl Into<String>) -> Uuid {
        self.push(NoticeLevel::Error, message)
    }

    /// Oldest first.
    pub fn take(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.pending)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
