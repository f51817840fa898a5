//! Thread-safe "run on the UI thread" queue.
//!
//! The event loop is the only writer of `ViewState`. Background tasks (undo,
//! mutating actions, list reloads) send closures here and the loop runs them
//! in arrival order between input events.

use tokio::sync::mpsc;

use super::state::ViewState;

/// A unit of work that mutates view state on the UI side.
pub type UiTask = Box<dyn FnOnce(&mut ViewState) + Send + 'static>;

/// Cloneable sending half, handed to background work
#[derive(Clone)]
pub struct UiQueue {
    tx: mpsc::UnboundedSender<UiTask>,
}

/// Receiving half, owned by the event loop
pub struct UiReceiver {
    rx: mpsc::UnboundedReceiver<UiTask>,
}

pub fn ui_queue() -> (UiQueue, UiReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (UiQueue { tx }, UiReceiver { rx })
}

impl UiQueue {
    /// Queue `task` for the UI side. Returns false if the event loop is gone.
    pub fn run(&self, task: impl FnOnce(&mut ViewState) + Send + 'static) -> bool {
        if self.tx.send(Box::new(task)).is_err() {
            tracing::debug!("UI queue closed, dropping task");
            return false;
        }
        true
    }
}

impl UiReceiver {
    pub async fn recv(&mut self) -> Option<UiTask> {
        self.rx.recv().await
    }

    /// Run every queued task without waiting. Returns how many ran.
    pub fn drain(&mut self, state: &mut ViewState) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.rx.try_recv() {
            task(state);
            ran += 1;
        }
        ran
    }
}
