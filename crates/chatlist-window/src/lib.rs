//! Windowed access to a conversation's messages.
//!
//! A [`MessageWindow`] holds an ordered, de-duplicated slice of one
//! conversation, grows through cursor-based pagination against a
//! [`MessageStore`] and absorbs live [`ChangeEvent`]s, reporting every
//! mutation as a [`ChangeSet`].

mod change_set;
mod error;
mod feed;
mod store;
mod types;
mod window;

pub use change_set::ChangeSet;
pub use error::StoreError;
pub use feed::{ChangeEvent, ChangeFeed, ChangeKind, ChangeSubscription, DEFAULT_FEED_CAPACITY};
pub use store::{FetchQuery, InMemoryStore, MessageStore};
pub use types::{
    ConversationId, Direction, LocalId, OrderingKey, SortOrder, StableId, WindowItem,
};
pub use window::{MessageWindow, PageRequest, WindowConfig};
