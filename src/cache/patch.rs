//! Local cache patches.
//!
//! A patch is computed off the UI thread (it may need remote metadata) and
//! applied on it. Applying the same patch twice leaves the cache unchanged
//! the second time.

use std::collections::HashMap;

use crate::mail::types::{MessageId, MessageMeta};

use super::MessageCache;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachePatch {
    /// Re-insert messages at the head of the list; the first entry ends up on top
    InsertAtHead(Vec<MessageMeta>),
    /// Drop messages from the list
    Remove(Vec<MessageId>),
    /// Change the label sets of cached messages
    Labels {
        ids: Vec<MessageId>,
        add: Vec<String>,
        remove: Vec<String>,
        /// Display names for the touched label IDs; `None` leaves names alone
        names: Option<HashMap<String, String>>,
    },
    /// Set the unread flag of cached messages
    ReadState { ids: Vec<MessageId>, unread: bool },
}

/// What a patch actually changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchEffect {
    pub inserted: usize,
    pub removed: usize,
    pub patched: usize,
    /// Messages whose cached entry changed in any way
    pub touched: Vec<MessageId>,
}

impl PatchEffect {
    pub fn merge(&mut self, other: PatchEffect) {
        self.inserted += other.inserted;
        self.removed += other.removed;
        self.patched += other.patched;
        for id in other.touched {
            if !self.touched.contains(&id) {
                self.touched.push(id);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inserted == 0 && self.removed == 0 && self.patched == 0
    }
}

impl CachePatch {
    pub fn apply(&self, cache: &mut MessageCache) -> PatchEffect {
        let mut effect = PatchEffect::default();
        match self {
            CachePatch::InsertAtHead(messages) => {
                for meta in messages.iter().rev() {
                    if cache.insert_at_head(meta.clone()) {
                        effect.inserted += 1;
                        effect.touched.push(meta.id.clone());
                    }
                }
            }
            CachePatch::Remove(ids) => {
                for id in ids {
                    if cache.remove(id).is_some() {
                        effect.removed += 1;
                        effect.touched.push(id.clone());
                    }
                }
            }
            CachePatch::Labels {
                ids,
                add,
                remove,
                names,
            } => {
                for id in ids {
                    let Some(meta) = cache.get_mut(id) else {
                        continue;
                    };
                    if patch_labels(meta, add, remove, names.as_ref()) {
                        effect.patched += 1;
                        effect.touched.push(id.clone());
                    }
                }
            }
            CachePatch::ReadState { ids, unread } => {
                for id in ids {
                    let Some(meta) = cache.get_mut(id) else {
                        continue;
                    };
                    if meta.is_unread() != *unread {
                        meta.set_unread(*unread);
                        effect.patched += 1;
                        effect.touched.push(id.clone());
                    }
                }
            }
        }
        effect
    }
}

fn patch_labels(
    meta: &mut MessageMeta,
    add: &[String],
    remove: &[String],
    names: Option<&HashMap<String, String>>,
) -> bool {
    let mut changed = false;
    for label in remove {
        if meta.label_ids.remove(label) {
            changed = true;
            if let Some(name) = names.and_then(|n| n.get(label)) {
                meta.label_names.retain(|n| n != name);
            }
        }
    }
    for label in add {
        if meta.label_ids.insert(label.clone()) {
            changed = true;
            if let Some(name) = names.and_then(|n| n.get(label))
                && !meta.label_names.contains(name)
            {
                meta.label_names.push(name.clone());
            }
        }
    }
    changed
}
