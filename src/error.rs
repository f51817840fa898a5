//! Error types shared by the mail service seam and the undo subsystem.

use thiserror::Error;

use crate::mail::types::MessageId;
use crate::undo::ActionType;

/// Errors returned by a remote mail service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MailError {
    /// The message does not exist on the remote side.
    #[error("message not found: {0}")]
    NotFound(MessageId),

    /// The label ID is not known to the remote side.
    #[error("unknown label: {0}")]
    UnknownLabel(String),

    /// The remote call was rejected.
    #[error("remote error: {0}")]
    Remote(String),

    /// The service could not be reached.
    #[error("mail service unavailable")]
    Unavailable,
}

/// Convenience alias for results of remote mail calls.
pub type MailResult<T> = std::result::Result<T, MailError>;

/// Errors raised while building an undoable action.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UndoError {
    /// An undoable action must cover at least one message.
    #[error("undoable action must cover at least one message")]
    EmptyBatch,

    /// The payload shape does not belong to the action type.
    #[error("payload does not fit a {0} action")]
    ExtraMismatch(ActionType),
}
