use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Remote message identifier.
pub type MessageId = String;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct MessageFlags: u32 {
        const UNREAD = 0b00000001;
        const STARRED = 0b00000010;
        const IMPORTANT = 0b00000100;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelKind {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: String,
    pub name: String,
    pub kind: LabelKind,
}

impl Label {
    pub fn system(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            kind: LabelKind::System,
        }
    }

    pub fn user(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind: LabelKind::User,
        }
    }
}

/// Message row as held by the list caches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageMeta {
    pub id: MessageId,
    pub thread_id: String,
    pub subject: String,
    pub from_addr: String,
    pub from_name: Option<String>,
    pub date: i64,
    pub flags: MessageFlags,
    /// Label IDs currently applied (read state lives in `flags`)
    pub label_ids: BTreeSet<String>,
    /// Display names for `label_ids`, filled from the label directory
    pub label_names: Vec<String>,
}

impl MessageMeta {
    pub fn new(id: &str, subject: &str, from_addr: &str, date: i64) -> Self {
        Self {
            id: id.to_string(),
            thread_id: id.to_string(),
            subject: subject.to_string(),
            from_addr: from_addr.to_string(),
            from_name: None,
            date,
            flags: MessageFlags::empty(),
            label_ids: BTreeSet::new(),
            label_names: Vec::new(),
        }
    }

    pub fn with_labels(mut self, labels: &[&str]) -> Self {
        self.label_ids = labels.iter().map(|l| l.to_string()).collect();
        self
    }

    pub fn with_flags(mut self, flags: MessageFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn is_unread(&self) -> bool {
        self.flags.contains(MessageFlags::UNREAD)
    }

    pub fn set_unread(&mut self, unread: bool) {
        self.flags.set(MessageFlags::UNREAD, unread);
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.label_ids.contains(label)
    }

    pub fn display_from(&self) -> &str {
        self.from_name.as_deref().unwrap_or(&self.from_addr)
    }

    /// Case-insensitive match against subject and sender, used by search and filters
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.subject.to_lowercase().contains(&query)
            || self.from_addr.to_lowercase().contains(&query)
            || self
                .from_name
                .as_deref()
                .is_some_and(|n| n.to_lowercase().contains(&query))
    }
}
