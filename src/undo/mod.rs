//! Single-level undo for remote mailbox mutations.
//!
//! This module is split into:
//! - `action.rs` - Action taxonomy, payloads and undo results
//! - `ledger.rs` - Single-slot store for the most recent action
//! - `executor.rs` - Compensating remote calls with per-message error capture
//! - `reconcile.rs` - Local cache patches after an undo
//! - `controller.rs` - Entry point used by the UI

mod action;
mod controller;
mod executor;
mod ledger;
mod reconcile;

pub use action::{ActionExtra, ActionType, UndoResult, UndoableAction};
pub use controller::{UndoController, UndoOutcome};
pub use executor::CompensationExecutor;
pub use ledger::ActionLedger;
pub use reconcile::{CacheReconciler, ReconcilePlan, ReconcileReport};
