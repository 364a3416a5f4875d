//! # Flash Messages
//!
//! One-shot notices queued by a successful action and shown on the next
//! page the user views. Each user has a FIFO queue; reading drains it.
//! Visitors without an account have nowhere to keep notices, so theirs
//! are dropped.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracker_core::UserId;
use utoipa::ToSchema;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

/// A single flash message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Notice {
    pub level: Level,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            text: text.into(),
        }
    }
}

/// Per-user notice queues.
#[derive(Debug, Clone, Default)]
pub struct MessageQueue {
    queues: Arc<Mutex<HashMap<UserId, VecDeque<Notice>>>>,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a notice for `user`. Returns `false` when the notice was
    /// dropped because there is no user.
    pub fn push(&self, user: Option<UserId>, notice: Notice) -> bool {
        match user {
            Some(user) => {
                self.queues.lock().entry(user).or_default().push_back(notice);
                true
            }
            None => {
                tracing::debug!(text = %notice.text, "dropping notice for anonymous visitor");
                false
            }
        }
    }

    /// Take every pending notice for `user`, oldest first.
    pub fn drain(&self, user: Option<UserId>) -> Vec<Notice> {
        match user {
            Some(user) => self
                .queues
                .lock()
                .remove(&user)
                .map(Vec::from)
                .unwrap_or_default(),
            None => Vec::new(),
        }
    }

    /// Number of pending notices for `user`, without draining.
    pub fn pending(&self, user: UserId) -> usize {
        self.queues.lock().get(&user).map_or(0, VecDeque::len)
    }
}
