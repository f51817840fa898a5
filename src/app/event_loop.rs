//! Main event loop: console input and queued UI tasks

use anyhow::Result;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::command::parse_command;
use crate::mail::MailService;

use super::App;
use super::render::render;
use super::state::ViewContext;
use super::worker::MailCommand;

impl<S: MailService> App<S> {
    pub async fn run(&mut self) -> Result<()> {
        tracing::info!(
            "Starting console (inbox label {}, refresh hint {})",
            self.config.mailbox.inbox_label,
            self.config.undo.show_refresh_hint
        );
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        self.state.status.loading = true;
        self.worker
            .send(MailCommand::Reload {
                view: ViewContext::Inbox,
            })
            .await;

        let mut prompt = true;
        loop {
            self.state.status.clear_error_if_expired();

            // Render only when dirty
            if self.state.dirty {
                let pending = self.undo.pending_description();
                print!("{}", render(&self.state, pending.as_deref()));
                self.state.dirty = false;
                prompt = true;
            }
            if prompt {
                print!("> ");
                std::io::stdout().flush()?;
                prompt = false;
            }

            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        break;
                    };
                    prompt = true;
                    if line.trim().is_empty() {
                        continue;
                    }
                    match parse_command(&line) {
                        Some(cmd) => {
                            if !self.handle_command(cmd).await {
                                break;
                            }
                        }
                        None => self
                            .state
                            .set_error(format!("Unknown command: {} (try help)", line.trim())),
                    }
                }
                task = self.ui_rx.recv() => {
                    let Some(task) = task else {
                        break;
                    };
                    task(&mut self.state);
                    self.ui_rx.drain(&mut self.state);
                }
            }
        }

        self.worker.send(MailCommand::Shutdown).await;
        Ok(())
    }
}
