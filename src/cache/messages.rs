//! Ordered message list and metadata map shown by the message list view.

use std::collections::HashMap;

use crate::mail::types::{MessageId, MessageMeta};

/// The list caches owned by the UI: the visible ID ordering plus the
/// metadata of every listed message.
#[derive(Debug, Clone, Default)]
pub struct MessageCache {
    ids: Vec<MessageId>,
    meta: HashMap<MessageId, MessageMeta>,
}

impl MessageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a list already in display order
    pub fn from_messages(messages: Vec<MessageMeta>) -> Self {
        let mut cache = Self::new();
        cache.replace_all(messages);
        cache
    }

    /// Replace the whole list (full reload)
    pub fn replace_all(&mut self, messages: Vec<MessageMeta>) {
        self.ids.clear();
        self.meta.clear();
        for meta in messages {
            if self.meta.contains_key(&meta.id) {
                continue;
            }
            self.ids.push(meta.id.clone());
            self.meta.insert(meta.id.clone(), meta);
        }
    }

    pub fn ids(&self) -> &[MessageId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.meta.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&MessageMeta> {
        self.meta.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut MessageMeta> {
        self.meta.get_mut(id)
    }

    /// Messages in display order
    pub fn iter(&self) -> impl Iterator<Item = &MessageMeta> {
        self.ids.iter().filter_map(|id| self.meta.get(id))
    }

    /// Insert at the head of the list. Returns false (and changes nothing)
    /// if the message is already listed.
    pub fn insert_at_head(&mut self, meta: MessageMeta) -> bool {
        if self.meta.contains_key(&meta.id) {
            return false;
        }
        self.ids.insert(0, meta.id.clone());
        self.meta.insert(meta.id.clone(), meta);
        true
    }

    pub fn remove(&mut self, id: &str) -> Option<MessageMeta> {
        let meta = self.meta.remove(id)?;
        self.ids.retain(|i| i != id);
        Some(meta)
    }

    /// Keep only messages matching `keep`, preserving order (local filter)
    pub fn retain(&mut self, mut keep: impl FnMut(&MessageMeta) -> bool) {
        let meta = &mut self.meta;
        self.ids.retain(|id| {
            let kept = meta.get(id).is_some_and(|m| keep(m));
            if !kept {
                meta.remove(id);
            }
            kept
        });
    }

    pub fn unread_count(&self) -> usize {
        self.meta.values().filter(|m| m.is_unread()).count()
    }
}
