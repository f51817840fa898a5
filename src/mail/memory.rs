//! In-process label-based mailbox.
//!
//! Behaves like a label-based remote (inbox membership and trash are labels,
//! read state is a flag). Every call is logged so callers can assert on the
//! exact remote traffic, and individual messages can be made to fail.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::constants::{INBOX_LABEL, STARRED_LABEL, TRASH_LABEL};
use crate::error::{MailError, MailResult};

use super::service::MailService;
use super::types::{Label, MessageFlags, MessageId, MessageMeta};

/// One remote call as observed by the mailbox
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailCall {
    ApplyLabel { id: MessageId, label: String },
    RemoveLabel { id: MessageId, label: String },
    Archive(MessageId),
    Unarchive(MessageId),
    Trash(MessageId),
    Untrash(MessageId),
    SetReadState { id: MessageId, read: bool },
    GetMessage(MessageId),
    ListMessages(Option<String>),
    ListLabels,
}

#[derive(Debug, Default)]
struct MailboxState {
    messages: BTreeMap<MessageId, MessageMeta>,
    labels: Vec<Label>,
    /// Messages whose mutating calls are rejected
    failing: HashSet<MessageId>,
    labels_unavailable: bool,
    calls: Vec<MailCall>,
}

impl MailboxState {
    fn message_mut(&mut self, id: &str) -> MailResult<&mut MessageMeta> {
        if self.failing.contains(id) {
            return Err(MailError::Remote(format!("request for {} rejected", id)));
        }
        self.messages
            .get_mut(id)
            .ok_or_else(|| MailError::NotFound(id.to_string()))
    }

    fn ensure_label(&self, label: &str) -> MailResult<()> {
        if self.labels.iter().any(|l| l.id == label) {
            Ok(())
        } else {
            Err(MailError::UnknownLabel(label.to_string()))
        }
    }

    fn with_names(&self, mut meta: MessageMeta) -> MessageMeta {
        meta.label_names = meta
            .label_ids
            .iter()
            .map(|id| {
                self.labels
                    .iter()
                    .find(|l| &l.id == id)
                    .map(|l| l.name.clone())
                    .unwrap_or_else(|| id.clone())
            })
            .collect();
        meta
    }

    fn sorted_newest_first(&self, mut list: Vec<MessageMeta>) -> Vec<MessageMeta> {
        list.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
        list.into_iter().map(|m| self.with_names(m)).collect()
    }
}

#[derive(Debug)]
pub struct InMemoryMailbox {
    state: Mutex<MailboxState>,
}

impl Default for InMemoryMailbox {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMailbox {
    /// Empty mailbox knowing only the system labels
    pub fn new() -> Self {
        let labels = vec![
            Label::system(INBOX_LABEL),
            Label::system(TRASH_LABEL),
            Label::system(STARRED_LABEL),
        ];
        Self {
            state: Mutex::new(MailboxState {
                labels,
                ..Default::default()
            }),
        }
    }

    /// Mailbox with a handful of messages and user labels, used by the console
    pub fn with_sample_data() -> Self {
        let mailbox = Self::new();
        mailbox.add_label(Label::user("Label_1", "Work"));
        mailbox.add_label(Label::user("Label_2", "Receipts"));
        mailbox.add_label(Label::user("Label_3", "Travel"));

        let samples = [
            ("m1", "Quarterly planning", "dana@example.com", 1_700_000_500),
            ("m2", "Your order has shipped", "orders@shop.example", 1_700_000_400),
            ("m3", "Flight confirmation", "noreply@air.example", 1_700_000_300),
            ("m4", "Lunch on Friday?", "sam@example.com", 1_700_000_200),
            ("m5", "Weekly digest", "digest@news.example", 1_700_000_100),
        ];
        for (i, (id, subject, from, date)) in samples.into_iter().enumerate() {
            let flags = if i % 2 == 0 {
                MessageFlags::UNREAD
            } else {
                MessageFlags::empty()
            };
            mailbox.insert(
                MessageMeta::new(id, subject, from, date)
                    .with_labels(&[INBOX_LABEL])
                    .with_flags(flags),
            );
        }
        mailbox
    }

    fn lock(&self) -> MutexGuard<'_, MailboxState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_label(&self, label: Label) {
        let mut state = self.lock();
        state.labels.retain(|l| l.id != label.id);
        state.labels.push(label);
    }

    pub fn insert(&self, meta: MessageMeta) {
        self.lock().messages.insert(meta.id.clone(), meta);
    }

    /// Current remote view of a message (no call is logged)
    pub fn message(&self, id: &str) -> Option<MessageMeta> {
        let state = self.lock();
        state.messages.get(id).cloned().map(|m| state.with_names(m))
    }

    /// Reject every subsequent call that touches `id`
    pub fn fail_message(&self, id: &str) {
        self.lock().failing.insert(id.to_string());
    }

    pub fn recover_message(&self, id: &str) {
        self.lock().failing.remove(id);
    }

    /// Make `list_labels` fail until switched back
    pub fn set_labels_unavailable(&self, unavailable: bool) {
        self.lock().labels_unavailable = unavailable;
    }

    pub fn calls(&self) -> Vec<MailCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Count calls that would force a list reload
    pub fn list_reloads(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, MailCall::ListMessages(_)))
            .count()
    }

    fn record(&self, call: MailCall) -> MutexGuard<'_, MailboxState> {
        let mut state = self.lock();
        state.calls.push(call);
        state
    }
}

impl MailService for InMemoryMailbox {
    async fn apply_label(&self, id: &str, label: &str) -> MailResult<()> {
        let mut state = self.record(MailCall::ApplyLabel {
            id: id.to_string(),
            label: label.to_string(),
        });
        state.ensure_label(label)?;
        state.message_mut(id)?.label_ids.insert(label.to_string());
        Ok(())
    }

    async fn remove_label(&self, id: &str, label: &str) -> MailResult<()> {
        let mut state = self.record(MailCall::RemoveLabel {
            id: id.to_string(),
            label: label.to_string(),
        });
        state.ensure_label(label)?;
        state.message_mut(id)?.label_ids.remove(label);
        Ok(())
    }

    async fn archive(&self, id: &str) -> MailResult<()> {
        let mut state = self.record(MailCall::Archive(id.to_string()));
        state.message_mut(id)?.label_ids.remove(INBOX_LABEL);
        Ok(())
    }

    async fn unarchive(&self, id: &str) -> MailResult<()> {
        let mut state = self.record(MailCall::Unarchive(id.to_string()));
        state
            .message_mut(id)?
            .label_ids
            .insert(INBOX_LABEL.to_string());
        Ok(())
    }

    async fn trash(&self, id: &str) -> MailResult<()> {
        let mut state = self.record(MailCall::Trash(id.to_string()));
        state
            .message_mut(id)?
            .label_ids
            .insert(TRASH_LABEL.to_string());
        Ok(())
    }

    async fn untrash(&self, id: &str) -> MailResult<()> {
        let mut state = self.record(MailCall::Untrash(id.to_string()));
        state.message_mut(id)?.label_ids.remove(TRASH_LABEL);
        Ok(())
    }

    async fn set_read_state(&self, id: &str, read: bool) -> MailResult<()> {
        let mut state = self.record(MailCall::SetReadState {
            id: id.to_string(),
            read,
        });
        state.message_mut(id)?.set_unread(!read);
        Ok(())
    }

    async fn get_message(&self, id: &str) -> MailResult<MessageMeta> {
        let state = self.record(MailCall::GetMessage(id.to_string()));
        if state.failing.contains(id) {
            return Err(MailError::Unavailable);
        }
        let meta = state
            .messages
            .get(id)
            .cloned()
            .ok_or_else(|| MailError::NotFound(id.to_string()))?;
        Ok(state.with_names(meta))
    }

    async fn list_messages(&self, query: Option<&str>) -> MailResult<Vec<MessageMeta>> {
        let state = self.record(MailCall::ListMessages(query.map(str::to_string)));
        let list: Vec<MessageMeta> = state
            .messages
            .values()
            .filter(|m| !m.has_label(TRASH_LABEL))
            .filter(|m| match query {
                None => m.has_label(INBOX_LABEL),
                Some(q) => m.matches(q),
            })
            .cloned()
            .collect();
        Ok(state.sorted_newest_first(list))
    }

    async fn list_labels(&self) -> MailResult<Vec<Label>> {
        let state = self.record(MailCall::ListLabels);
        if state.labels_unavailable {
            return Err(MailError::Unavailable);
        }
        Ok(state.labels.clone())
    }
}
