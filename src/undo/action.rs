//! Undo data structures
//!
//! Supports undo for:
//! - Archive and trash
//! - Label add and label remove
//! - Move (apply labels and leave the inbox)
//! - Mark read and mark unread

use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::UndoError;
use crate::mail::types::MessageId;

/// Kind of mutating operation that was performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionType {
    Archive,
    Trash,
    LabelAdd,
    LabelRemove,
    Move,
    MarkRead,
    MarkUnread,
}

impl ActionType {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionType::Archive => "archive",
            ActionType::Trash => "trash",
            ActionType::LabelAdd => "label add",
            ActionType::LabelRemove => "label remove",
            ActionType::Move => "move",
            ActionType::MarkRead => "mark read",
            ActionType::MarkUnread => "mark unread",
        }
    }

    /// Whether the action takes messages out of the inbox
    pub fn leaves_inbox(self) -> bool {
        matches!(
            self,
            ActionType::Archive | ActionType::Trash | ActionType::Move
        )
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an action needs to be compensated and patched locally
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionExtra {
    /// Archive, trash and read-state changes carry nothing beyond their type
    None,
    /// Labels that were added (LabelAdd) or removed (LabelRemove)
    Labels { labels: Vec<String> },
    /// Labels applied by a move and labels the message lost (normally INBOX)
    Move {
        applied_labels: Vec<String>,
        removed_labels: Vec<String>,
    },
}

impl ActionExtra {
    fn fits(&self, action_type: ActionType) -> bool {
        match self {
            ActionExtra::None => matches!(
                action_type,
                ActionType::Archive
                    | ActionType::Trash
                    | ActionType::MarkRead
                    | ActionType::MarkUnread
            ),
            ActionExtra::Labels { labels } => {
                !labels.is_empty()
                    && matches!(action_type, ActionType::LabelAdd | ActionType::LabelRemove)
            }
            ActionExtra::Move { applied_labels, .. } => {
                !applied_labels.is_empty() && action_type == ActionType::Move
            }
        }
    }
}

/// The compensable record of one completed remote operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoableAction {
    action_type: ActionType,
    message_ids: Vec<MessageId>,
    extra: ActionExtra,
    description: String,
    recorded_at: DateTime<Utc>,
}

impl UndoableAction {
    /// Build an action. Message IDs keep their order; repeats are dropped.
    pub fn new(
        action_type: ActionType,
        message_ids: Vec<MessageId>,
        extra: ActionExtra,
        description: impl Into<String>,
    ) -> Result<Self, UndoError> {
        let mut unique: Vec<MessageId> = Vec::with_capacity(message_ids.len());
        for id in message_ids {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        if unique.is_empty() {
            return Err(UndoError::EmptyBatch);
        }
        if !extra.fits(action_type) {
            return Err(UndoError::ExtraMismatch(action_type));
        }
        Ok(Self {
            action_type,
            message_ids: unique,
            extra,
            description: description.into(),
            recorded_at: Utc::now(),
        })
    }

    pub fn action_type(&self) -> ActionType {
        self.action_type
    }

    pub fn message_ids(&self) -> &[MessageId] {
        &self.message_ids
    }

    pub fn extra(&self) -> &ActionExtra {
        &self.extra
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }
}

/// Outcome of one undo attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoResult {
    /// True only if every per-message compensation succeeded
    pub success: bool,
    pub action_type: ActionType,
    pub description: String,
    pub message_ids: Vec<MessageId>,
    /// Per-message failures in recorded order
    pub errors: Vec<String>,
    /// Messages whose compensation fully succeeded, in recorded order
    pub succeeded: Vec<MessageId>,
    pub extra: ActionExtra,
}

impl UndoResult {
    pub fn is_total_failure(&self) -> bool {
        self.succeeded.is_empty()
    }

    pub fn failed_count(&self) -> usize {
        self.message_ids.len() - self.succeeded.len()
    }
}
