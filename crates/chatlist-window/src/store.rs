use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::types::{ConversationId, Direction, LocalId, OrderingKey, WindowItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchQuery {
    /// The newest `limit` items.
    Latest { limit: usize },
    /// Up to `limit` items strictly beyond `cursor`, nearest first.
    Page {
        cursor: OrderingKey,
        direction: Direction,
        limit: usize,
    },
    /// Items with `min <= key <= max`, keeping the newest `limit`.
    Range {
        min: OrderingKey,
        max: OrderingKey,
        limit: usize,
    },
}

/// Read side of the backing store.
///
/// Results are sorted by ascending ordering key. Callers re-sort into their
/// own order and must not rely on the store for de-duplication.
#[async_trait]
pub trait MessageStore<P>: Send + Sync
where
    P: Send + 'static,
{
    async fn fetch_ordered(
        &self,
        conversation: ConversationId,
        query: FetchQuery,
    ) -> Result<Vec<WindowItem<P>>, StoreError>;
}

/// Store backed by sorted vectors. Used in tests and by hosts that keep their
/// history in memory.
pub struct InMemoryStore<P> {
    conversations: RwLock<HashMap<ConversationId, Vec<WindowItem<P>>>>,
}

impl<P> Default for InMemoryStore<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> InMemoryStore<P> {
    pub fn new() -> Self {
        Self {
            conversations: RwLock::new(HashMap::new()),
        }
    }
}

impl<P: Clone> InMemoryStore<P> {
    /// Insert or replace by stable id.
    pub fn upsert(&self, item: WindowItem<P>) -> Result<(), StoreError> {
        let mut conversations = self
            .conversations
            .write()
            .map_err(|_| StoreError::lock_poisoned("conversations"))?;
        let items = conversations.entry(item.conversation).or_default();
        items.retain(|existing| existing.stable_id != item.stable_id);
        let at = items.partition_point(|existing| {
            (existing.ordering, existing.stable_id) < (item.ordering, item.stable_id)
        });
        items.insert(at, item);
        Ok(())
    }

    pub fn extend(&self, items: impl IntoIterator<Item = WindowItem<P>>) -> Result<(), StoreError> {
        for item in items {
            self.upsert(item)?;
        }
        Ok(())
    }

    /// Remove by local id, returning the removed items.
    pub fn remove(
        &self,
        conversation: ConversationId,
        local_ids: &[LocalId],
    ) -> Result<Vec<WindowItem<P>>, StoreError> {
        let mut conversations = self
            .conversations
            .write()
            .map_err(|_| StoreError::lock_poisoned("conversations"))?;
        let Some(items) = conversations.get_mut(&conversation) else {
            return Ok(Vec::new());
        };
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(items)
            .into_iter()
            .partition(|item| local_ids.contains(&item.local_id));
        *items = kept;
        Ok(removed)
    }

    pub fn len(&self, conversation: ConversationId) -> Result<usize, StoreError> {
        let conversations = self
            .conversations
            .read()
            .map_err(|_| StoreError::lock_poisoned("conversations"))?;
        Ok(conversations.get(&conversation).map_or(0, Vec::len))
    }
}

fn newest<P: Clone>(items: &[&WindowItem<P>], limit: usize) -> Vec<WindowItem<P>> {
    let skip = items.len().saturating_sub(limit);
    items[skip..].iter().map(|item| (*item).clone()).collect()
}

#[async_trait]
impl<P> MessageStore<P> for InMemoryStore<P>
where
    P: Clone + Send + Sync + 'static,
{
    async fn fetch_ordered(
        &self,
        conversation: ConversationId,
        query: FetchQuery,
    ) -> Result<Vec<WindowItem<P>>, StoreError> {
        let conversations = self
            .conversations
            .read()
            .map_err(|_| StoreError::lock_poisoned("conversations"))?;
        let Some(items) = conversations.get(&conversation) else {
            return Ok(Vec::new());
        };

        let result = match query {
            FetchQuery::Latest { limit } => newest(&items.iter().collect::<Vec<_>>(), limit),
            FetchQuery::Page {
                cursor,
                direction: Direction::Older,
                limit,
            } => {
                let older: Vec<_> = items.iter().filter(|i| i.ordering < cursor).collect();
                newest(&older, limit)
            }
            FetchQuery::Page {
                cursor,
                direction: Direction::Newer,
                limit,
            } => items
                .iter()
                .filter(|i| i.ordering > cursor)
                .take(limit)
                .cloned()
                .collect(),
            FetchQuery::Range { min, max, limit } => {
                let in_range: Vec<_> = items
                    .iter()
                    .filter(|i| i.ordering >= min && i.ordering <= max)
                    .collect();
                newest(&in_range, limit)
            }
        };
        Ok(result)
    }
}
