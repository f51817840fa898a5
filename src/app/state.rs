//! Application state types
//!
//! All view state lives here and is owned by the event loop. Background work
//! never touches it directly; it queues closures through `UiQueue` instead.

use crate::cache::{CachePatch, MessageCache, PatchEffect};
use crate::constants::ERROR_TTL_SECS;
use crate::mail::types::MessageId;

/// What the message list currently reflects
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ViewContext {
    /// The unfiltered inbox
    #[default]
    Inbox,
    /// Result of a remote search
    Search { query: String },
    /// Local filter over a snapshot of the previous list
    LocalFilter { filter: String },
}

impl ViewContext {
    pub fn is_inbox(&self) -> bool {
        matches!(self, ViewContext::Inbox)
    }

    pub fn title(&self) -> String {
        match self {
            ViewContext::Inbox => "Inbox".to_string(),
            ViewContext::Search { query } => format!("Search: {}", query),
            ViewContext::LocalFilter { filter } => format!("Filter: {}", filter),
        }
    }
}

/// Status line state; errors expire after `ERROR_TTL_SECS`
#[derive(Debug, Clone, Default)]
pub struct StatusState {
    pub loading: bool,
    pub error: Option<String>,
    pub error_time: Option<std::time::Instant>,
    pub message: String,
}

impl StatusState {
    pub fn set_error(&mut self, error: impl ToString) {
        self.error = Some(error.to_string());
        self.error_time = Some(std::time::Instant::now());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
        self.error_time = None;
    }

    /// Clear error if TTL expired. Returns true if error was cleared.
    pub fn clear_error_if_expired(&mut self) -> bool {
        if let Some(time) = self.error_time
            && time.elapsed().as_secs() >= ERROR_TTL_SECS
        {
            self.clear_error();
            true
        } else {
            false
        }
    }

    pub fn set_message(&mut self, msg: impl ToString) {
        self.message = msg.to_string();
    }
}

/// Label side panel for one message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelPanel {
    pub message_id: MessageId,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub view: ViewContext,
    pub messages: MessageCache,
    pub status: StatusState,
    pub label_panel: Option<LabelPanel>,
    /// Dirty flag: when true, the list needs re-render
    pub dirty: bool,
}

impl ViewState {
    pub fn set_status(&mut self, msg: impl ToString) {
        self.status.set_message(msg);
        self.dirty = true;
    }

    pub fn set_error(&mut self, error: impl ToString) {
        self.status.set_error(error);
        self.dirty = true;
    }

    /// Show a fresh list for `view` (full reload result)
    pub fn show_list(&mut self, view: ViewContext, messages: MessageCache) {
        self.view = view;
        self.messages = messages;
        if let Some(panel) = &self.label_panel
            && !self.messages.contains(&panel.message_id)
        {
            self.label_panel = None;
        }
        self.dirty = true;
    }

    pub fn open_label_panel(&mut self, id: &str) -> bool {
        let Some(meta) = self.messages.get(id) else {
            return false;
        };
        self.label_panel = Some(LabelPanel {
            message_id: id.to_string(),
            labels: meta.label_names.clone(),
        });
        self.dirty = true;
        true
    }

    pub fn close_label_panel(&mut self) {
        if self.label_panel.take().is_some() {
            self.dirty = true;
        }
    }

    /// Apply local patches, refresh the label panel when its message changed,
    /// and request a re-render if anything changed.
    pub fn apply_patches(&mut self, patches: &[CachePatch]) -> PatchEffect {
        let mut effect = PatchEffect::default();
        for patch in patches {
            effect.merge(patch.apply(&mut self.messages));
        }

        if let Some(panel) = self.label_panel.as_mut()
            && effect.touched.contains(&panel.message_id)
        {
            match self.messages.get(&panel.message_id) {
                Some(meta) => panel.labels = meta.label_names.clone(),
                None => self.label_panel = None,
            }
        }

        if !effect.is_empty() {
            self.dirty = true;
        }
        effect
    }
}
