pub mod memory;
pub mod service;
pub mod types;

pub use memory::{InMemoryMailbox, MailCall};
pub use service::MailService;
pub use types::{Label, MessageFlags, MessageId, MessageMeta};
