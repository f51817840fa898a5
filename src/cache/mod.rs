//! In-memory view caches.
//!
//! This module is split into:
//! - `messages.rs` - Ordered message-ID list plus per-message metadata
//! - `labels.rs` - Label-ID to display-name directory (moka hot cache)
//! - `patch.rs` - Local patches applied to the message cache

mod labels;
mod messages;
mod patch;

pub use labels::LabelDirectory;
pub use messages::MessageCache;
pub use patch::{CachePatch, PatchEffect};
