//! Application core - owns view state and wires the undo subsystem together

pub mod actions;
mod event_loop;
pub mod queue;
pub mod render;
pub mod state;
pub mod worker;

use std::sync::Arc;

use crate::cache::LabelDirectory;
use crate::command::{ParsedCommand, available_commands};
use crate::config::Config;
use crate::mail::MailService;
use crate::undo::{ActionLedger, CacheReconciler, CompensationExecutor, UndoController};

use actions::MailActions;
use queue::{UiReceiver, ui_queue};
use state::{ViewContext, ViewState};
use worker::{MailCommand, MailWorkerHandle, spawn_mail_worker};

pub struct App<S: MailService> {
    pub(crate) config: Config,
    pub(crate) state: ViewState,
    pub(crate) undo: Arc<UndoController<S>>,
    pub(crate) worker: MailWorkerHandle,
    pub(crate) ui_rx: UiReceiver,
}

impl<S: MailService> App<S> {
    pub fn new(config: Config, service: Arc<S>) -> Self {
        let ledger = Arc::new(ActionLedger::new());
        let labels = Arc::new(LabelDirectory::new(config.undo.label_cache_ttl()));
        let (ui, ui_rx) = ui_queue();

        let undo = Arc::new(UndoController::new(
            Arc::clone(&ledger),
            CompensationExecutor::new(Arc::clone(&service)),
            CacheReconciler::new(
                Arc::clone(&service),
                Arc::clone(&labels),
                config.mailbox.inbox_label.clone(),
                config.undo.show_refresh_hint,
            ),
            ui.clone(),
        ));
        let actions = MailActions::new(
            service,
            ledger,
            labels,
            ui,
            config.mailbox.inbox_label.clone(),
        );
        let worker = spawn_mail_worker(actions, Arc::clone(&undo));

        Self {
            config,
            state: ViewState::default(),
            undo,
            worker,
            ui_rx,
        }
    }

    /// Handle one parsed command. Returns false when the app should exit.
    pub(crate) async fn handle_command(&mut self, cmd: ParsedCommand) -> bool {
        let view = self.state.view.clone();
        let request = match cmd {
            ParsedCommand::Quit => return false,
            ParsedCommand::List => {
                self.state.dirty = true;
                None
            }
            ParsedCommand::Help => {
                for help in available_commands() {
                    println!("  {:<26} {}", help.name, help.description);
                }
                None
            }
            ParsedCommand::Filter(filter) => {
                self.apply_local_filter(filter);
                None
            }
            ParsedCommand::ShowLabels(id) => {
                if !self.state.open_label_panel(&id) {
                    self.state.set_error(format!("No message {} in this list", id));
                }
                None
            }
            ParsedCommand::CloseLabels => {
                self.state.close_label_panel();
                None
            }
            ParsedCommand::Inbox => Some(MailCommand::Reload {
                view: ViewContext::Inbox,
            }),
            ParsedCommand::Search(query) => Some(MailCommand::Reload {
                view: ViewContext::Search { query },
            }),
            ParsedCommand::Refresh => Some(MailCommand::Reload { view }),
            ParsedCommand::Archive(ids) => Some(MailCommand::Archive { ids, view }),
            ParsedCommand::Trash(ids) => Some(MailCommand::Trash { ids, view }),
            ParsedCommand::Label { label, ids } => Some(MailCommand::AddLabel { ids, label, view }),
            ParsedCommand::Unlabel { label, ids } => {
                Some(MailCommand::RemoveLabel { ids, label, view })
            }
            ParsedCommand::Move { label, ids } => Some(MailCommand::Move { ids, label, view }),
            ParsedCommand::Read(ids) => Some(MailCommand::MarkRead { ids, view }),
            ParsedCommand::Unread(ids) => Some(MailCommand::MarkUnread { ids, view }),
            // Emptiness is checked atomically by the worker; an action still
            // queued ahead of this undo must land in the ledger first
            ParsedCommand::Undo => Some(MailCommand::Undo { view }),
        };

        if let Some(request) = request {
            if matches!(request, MailCommand::Reload { .. }) {
                self.state.status.loading = true;
            }
            if !self.worker.send(request).await {
                self.state.set_error("Mail worker stopped");
            }
        }
        true
    }

    /// Narrow the current list locally without asking the server
    fn apply_local_filter(&mut self, filter: String) {
        let mut kept = self.state.messages.clone();
        kept.retain(|m| m.matches(&filter));
        tracing::debug!("Local filter '{}' kept {} messages", filter, kept.len());
        self.state.show_list(ViewContext::LocalFilter { filter }, kept);
    }
}
