//! Background worker for remote mailbox work
//!
//! The event loop never awaits the mail service. It sends commands here and
//! the worker runs them one at a time, so an undo always sees the ledger
//! left behind by every action issued before it. Results reach the view
//! through the UI queue.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::mail::MailService;
use crate::mail::types::MessageId;
use crate::undo::UndoController;

use super::actions::MailActions;
use super::state::ViewContext;

/// Commands sent from the event loop to the worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailCommand {
    Archive {
        ids: Vec<MessageId>,
        view: ViewContext,
    },
    Trash {
        ids: Vec<MessageId>,
        view: ViewContext,
    },
    AddLabel {
        ids: Vec<MessageId>,
        label: String,
        view: ViewContext,
    },
    RemoveLabel {
        ids: Vec<MessageId>,
        label: String,
        view: ViewContext,
    },
    Move {
        ids: Vec<MessageId>,
        label: String,
        view: ViewContext,
    },
    MarkRead {
        ids: Vec<MessageId>,
        view: ViewContext,
    },
    MarkUnread {
        ids: Vec<MessageId>,
        view: ViewContext,
    },
    /// Full list reload for a view
    Reload { view: ViewContext },
    /// Undo the most recent action; the view is the one active when requested
    Undo { view: ViewContext },
    Shutdown,
}

pub struct MailWorkerHandle {
    pub cmd_tx: mpsc::Sender<MailCommand>,
}

impl MailWorkerHandle {
    /// Queue a command. Returns false if the worker has stopped.
    pub async fn send(&self, cmd: MailCommand) -> bool {
        if self.cmd_tx.send(cmd).await.is_err() {
            tracing::warn!("Mail worker is gone, dropping command");
            return false;
        }
        true
    }
}

pub fn spawn_mail_worker<S: MailService>(
    actions: MailActions<S>,
    undo: Arc<UndoController<S>>,
) -> MailWorkerHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    tokio::spawn(mail_worker(actions, undo, cmd_rx));
    MailWorkerHandle { cmd_tx }
}

async fn mail_worker<S: MailService>(
    actions: MailActions<S>,
    undo: Arc<UndoController<S>>,
    mut cmd_rx: mpsc::Receiver<MailCommand>,
) {
    while let Some(cmd) = cmd_rx.recv().await {
        match cmd {
            MailCommand::Archive { ids, view } => {
                actions.archive(ids, view).await;
            }
            MailCommand::Trash { ids, view } => {
                actions.trash(ids, view).await;
            }
            MailCommand::AddLabel { ids, label, view } => {
                actions.add_label(ids, &label, view).await;
            }
            MailCommand::RemoveLabel { ids, label, view } => {
                actions.remove_label(ids, &label, view).await;
            }
            MailCommand::Move { ids, label, view } => {
                actions.move_to(ids, &label, view).await;
            }
            MailCommand::MarkRead { ids, view } => {
                actions.mark_read(ids, view).await;
            }
            MailCommand::MarkUnread { ids, view } => {
                actions.mark_unread(ids, view).await;
            }
            MailCommand::Reload { view } => {
                // Failure already reported on the status line
                let _ = actions.reload(view).await;
            }
            MailCommand::Undo { view } => {
                let outcome = undo.perform_undo(view).await;
                tracing::debug!("Undo finished: {}", outcome.message());
            }
            MailCommand::Shutdown => {
                tracing::info!("Mail worker shutting down");
                break;
            }
        }
    }
}
