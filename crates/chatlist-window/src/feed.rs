//! Live change feed.
//!
//! Delivery is at-least-once and unordered relative to store reads. A
//! subscriber that falls behind the broadcast buffer loses events, so the
//! subscription turns the gap into a [`ChangeKind::Reload`].

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::types::{ConversationId, LocalId, WindowItem};

pub const DEFAULT_FEED_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum ChangeKind<P> {
    Add(Vec<WindowItem<P>>),
    Update(WindowItem<P>),
    Delete(Vec<LocalId>),
    Reload,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent<P> {
    pub conversation: ConversationId,
    pub kind: ChangeKind<P>,
}

impl<P> ChangeEvent<P> {
    pub fn reload(conversation: ConversationId) -> Self {
        Self {
            conversation,
            kind: ChangeKind::Reload,
        }
    }
}

/// Publisher handle. Clones publish into the same feed.
#[derive(Debug, Clone)]
pub struct ChangeFeed<P> {
    tx: broadcast::Sender<ChangeEvent<P>>,
}

impl<P: Clone> Default for ChangeFeed<P> {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}

impl<P: Clone> ChangeFeed<P> {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Events for `conversation` only.
    pub fn subscribe(&self, conversation: ConversationId) -> ChangeSubscription<P> {
        ChangeSubscription {
            conversation,
            rx: self.tx.subscribe(),
        }
    }

    /// Returns the number of subscribers that will see the event.
    pub fn publish(&self, event: ChangeEvent<P>) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    pub fn messages_added(&self, conversation: ConversationId, items: Vec<WindowItem<P>>) -> usize {
        self.publish(ChangeEvent {
            conversation,
            kind: ChangeKind::Add(items),
        })
    }

    pub fn message_updated(&self, conversation: ConversationId, item: WindowItem<P>) -> usize {
        self.publish(ChangeEvent {
            conversation,
            kind: ChangeKind::Update(item),
        })
    }

    pub fn messages_deleted(&self, conversation: ConversationId, local_ids: Vec<LocalId>) -> usize {
        self.publish(ChangeEvent {
            conversation,
            kind: ChangeKind::Delete(local_ids),
        })
    }

    pub fn reload(&self, conversation: ConversationId) -> usize {
        self.publish(ChangeEvent::reload(conversation))
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

pub struct ChangeSubscription<P> {
    conversation: ConversationId,
    rx: broadcast::Receiver<ChangeEvent<P>>,
}

impl<P: Clone> ChangeSubscription<P> {
    pub fn conversation(&self) -> ConversationId {
        self.conversation
    }

    /// Next event for this conversation. `None` once every publisher is gone.
    pub async fn recv(&mut self) -> Option<ChangeEvent<P>> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.conversation == self.conversation => return Some(event),
                Ok(_) => {}
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(
                        target: "chatlist::window",
                        conversation = %self.conversation,
                        missed,
                        "Change feed lagged, forcing reload"
                    );
                    return Some(ChangeEvent::reload(self.conversation));
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
