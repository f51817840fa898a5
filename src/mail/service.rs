//! Remote mail service seam.
//!
//! The undo subsystem only ever talks to the mailbox through this trait, so the
//! remote client stays swappable (Gmail API, IMAP with label extensions, or the
//! in-memory mailbox used by the console and the tests).

use std::future::Future;

use crate::error::MailResult;

use super::types::{Label, MessageMeta};

pub trait MailService: Send + Sync + 'static {
    fn apply_label(&self, id: &str, label: &str) -> impl Future<Output = MailResult<()>> + Send;

    fn remove_label(&self, id: &str, label: &str)
    -> impl Future<Output = MailResult<()>> + Send;

    /// Remove the message from the inbox
    fn archive(&self, id: &str) -> impl Future<Output = MailResult<()>> + Send;

    /// Put an archived message back into the inbox
    fn unarchive(&self, id: &str) -> impl Future<Output = MailResult<()>> + Send;

    fn trash(&self, id: &str) -> impl Future<Output = MailResult<()>> + Send;

    fn untrash(&self, id: &str) -> impl Future<Output = MailResult<()>> + Send;

    fn set_read_state(&self, id: &str, read: bool) -> impl Future<Output = MailResult<()>> + Send;

    /// Fetch a single message's list metadata
    fn get_message(&self, id: &str) -> impl Future<Output = MailResult<MessageMeta>> + Send;

    /// List messages newest first; `None` lists the inbox, `Some` runs a remote search
    fn list_messages(
        &self,
        query: Option<&str>,
    ) -> impl Future<Output = MailResult<Vec<MessageMeta>>> + Send;

    fn list_labels(&self) -> impl Future<Output = MailResult<Vec<Label>>> + Send;
}
