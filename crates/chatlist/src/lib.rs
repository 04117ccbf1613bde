//! Virtualized, bottom-anchored chat message list.
//!
//! [`chatlist_layout`] turns one message into a layout plan,
//! [`chatlist_window`] keeps an ordered window of a conversation in sync with
//! its store, and this crate ties the two together: a [`MessageViewport`]
//! that measures only what is on screen and keeps the bottom anchored, and a
//! [`ChatSessionHandle`] that drives both from a single task.

pub mod config;
pub mod error;
pub mod grouping;
pub mod record;
pub mod session;
pub mod state;
pub mod viewport;

pub use chatlist_layout as layout;
pub use chatlist_window as window;

pub use config::ChatListConfig;
pub use error::{Error, Result};
pub use record::{ChatItem, MessageRecord};
pub use session::{ChatSessionHandle, Frame};
pub use state::{ScrollPhase, ScrollState, ScrollTarget};
pub use viewport::{MessageViewport, RowTransition, UpdateOutcome, ViewportConfig, ViewportIntent, VisibleRow};
