//! MessageWindow - the materialized slice of one conversation.
//!
//! Items stay sorted by `(ordering key, stable id)` in the configured order and
//! hold at most one entry per stable id. Every mutation reports itself as a
//! [`ChangeSet`] in window positions.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::change_set::ChangeSet;
use crate::error::StoreError;
use crate::feed::{ChangeEvent, ChangeKind};
use crate::store::{FetchQuery, MessageStore};
use crate::types::{
    ConversationId, Direction, LocalId, OrderingKey, SortOrder, StableId, WindowItem,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub initial_limit: usize,
    pub order: SortOrder,
    pub page_limit: usize,
    pub medium_page_limit: usize,
    pub large_page_limit: usize,
    /// Window sizes above which the larger page limits kick in.
    pub medium_threshold: usize,
    pub large_threshold: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            initial_limit: 80,
            order: SortOrder::Ascending,
            page_limit: 100,
            medium_page_limit: 300,
            large_page_limit: 400,
            medium_threshold: 200,
            large_threshold: 300,
        }
    }
}

impl WindowConfig {
    /// Page size for a window currently holding `len` items.
    pub fn page_limit_for(&self, len: usize) -> usize {
        if len > self.large_threshold {
            self.large_page_limit
        } else if len > self.medium_threshold {
            self.medium_page_limit
        } else {
            self.page_limit
        }
    }
}

/// A pagination fetch prepared by the window and executed elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub conversation: ConversationId,
    pub generation: u64,
    pub direction: Direction,
    pub cursor: OrderingKey,
    pub limit: usize,
}

impl PageRequest {
    pub fn query(&self) -> FetchQuery {
        FetchQuery::Page {
            cursor: self.cursor,
            direction: self.direction,
            limit: self.limit,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MessageWindow<P> {
    conversation: ConversationId,
    config: WindowConfig,
    items: Vec<WindowItem<P>>,
    ids: HashSet<StableId>,
    at_bottom: bool,
    /// Bumped whenever contents are replaced wholesale.
    generation: u64,
}

impl<P> MessageWindow<P>
where
    P: Clone + Send + Sync + 'static,
{
    pub fn new(conversation: ConversationId, config: WindowConfig) -> Self {
        Self {
            conversation,
            config,
            items: Vec::new(),
            ids: HashSet::new(),
            at_bottom: true,
            generation: 0,
        }
    }

    pub fn conversation(&self) -> ConversationId {
        self.conversation
    }

    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    pub fn order(&self) -> SortOrder {
        self.config.order
    }

    pub fn items(&self) -> &[WindowItem<P>] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_at_bottom(&self) -> bool {
        self.at_bottom
    }

    /// Hint from the viewport: governs how a reload is served.
    pub fn set_at_bottom(&mut self, at_bottom: bool) {
        if self.at_bottom != at_bottom {
            tracing::trace!(
                target: "chatlist::window",
                conversation = %self.conversation,
                at_bottom,
                "At-bottom hint changed"
            );
        }
        self.at_bottom = at_bottom;
    }

    pub fn min_cursor(&self) -> Option<OrderingKey> {
        let (oldest, _) = self.extremes()?;
        Some(oldest.ordering)
    }

    pub fn max_cursor(&self) -> Option<OrderingKey> {
        let (_, newest) = self.extremes()?;
        Some(newest.ordering)
    }

    fn extremes(&self) -> Option<(&WindowItem<P>, &WindowItem<P>)> {
        let first = self.items.first()?;
        let last = self.items.last()?;
        Some(match self.config.order {
            SortOrder::Ascending => (first, last),
            SortOrder::Descending => (last, first),
        })
    }

    pub fn position_of(&self, stable_id: StableId) -> Option<usize> {
        if !self.ids.contains(&stable_id) {
            return None;
        }
        self.items.iter().position(|item| item.stable_id == stable_id)
    }

    pub fn contains(&self, stable_id: StableId) -> bool {
        self.ids.contains(&stable_id)
    }

    /// Replace the contents with the newest `limit` items.
    pub async fn load(&mut self, store: &dyn MessageStore<P>, limit: usize) -> ChangeSet<P> {
        match store
            .fetch_ordered(self.conversation, FetchQuery::Latest { limit })
            .await
        {
            Ok(items) => {
                self.replace(items);
                tracing::debug!(
                    target: "chatlist::window",
                    conversation = %self.conversation,
                    len = self.items.len(),
                    generation = self.generation,
                    "Loaded latest items"
                );
                ChangeSet::Reload
            }
            Err(e) => {
                tracing::warn!(
                    target: "chatlist::window",
                    conversation = %self.conversation,
                    error = %e,
                    "Failed to load window"
                );
                ChangeSet::Unchanged
            }
        }
    }

    /// Fetch and merge items beyond `cursor` in `direction`.
    pub async fn paginate(
        &mut self,
        store: &dyn MessageStore<P>,
        direction: Direction,
        cursor: OrderingKey,
        limit: usize,
    ) -> ChangeSet<P> {
        let request = PageRequest {
            conversation: self.conversation,
            generation: self.generation,
            direction,
            cursor,
            limit,
        };
        let result = store.fetch_ordered(self.conversation, request.query()).await;
        self.merge_page(&request, result)
    }

    /// The next page towards `direction`, sized for the current window.
    /// `None` while the window is empty.
    pub fn page_request(&self, direction: Direction) -> Option<PageRequest> {
        let cursor = match direction {
            Direction::Older => self.min_cursor()?,
            Direction::Newer => self.max_cursor()?,
        };
        Some(PageRequest {
            conversation: self.conversation,
            generation: self.generation,
            direction,
            cursor,
            limit: self.config.page_limit_for(self.items.len()),
        })
    }

    /// Merge the result of a page fetch. Results for another conversation or
    /// an older generation are dropped.
    pub fn merge_page(
        &mut self,
        request: &PageRequest,
        result: Result<Vec<WindowItem<P>>, StoreError>,
    ) -> ChangeSet<P> {
        if request.conversation != self.conversation || request.generation != self.generation {
            tracing::debug!(
                target: "chatlist::window",
                conversation = %self.conversation,
                request_generation = request.generation,
                generation = self.generation,
                "Dropping stale page"
            );
            return ChangeSet::Unchanged;
        }

        match result {
            Ok(items) => {
                let fetched = items.len();
                let change = self.insert(items);
                tracing::debug!(
                    target: "chatlist::window",
                    conversation = %self.conversation,
                    direction = ?request.direction,
                    cursor = %request.cursor,
                    fetched,
                    merged = change.len(),
                    "Merged page"
                );
                change
            }
            Err(e) => {
                tracing::warn!(
                    target: "chatlist::window",
                    conversation = %self.conversation,
                    error = %e,
                    "Failed to fetch page"
                );
                ChangeSet::Unchanged
            }
        }
    }

    /// Apply a feed event. `None` when the event is for another conversation
    /// or changes nothing, including a reload whose read failed.
    pub async fn apply(
        &mut self,
        store: &dyn MessageStore<P>,
        event: ChangeEvent<P>,
    ) -> Option<ChangeSet<P>> {
        if event.conversation != self.conversation {
            return None;
        }
        let change = match event.kind {
            ChangeKind::Reload => self.reload(store).await,
            kind => return self.apply_local(kind),
        };
        (!change.is_empty()).then_some(change)
    }

    /// Apply an add, update or delete. Reloads need the store and are
    /// ignored here.
    pub fn apply_local(&mut self, kind: ChangeKind<P>) -> Option<ChangeSet<P>> {
        let change = match kind {
            ChangeKind::Add(items) => self.insert(items),
            ChangeKind::Update(item) => self.update(item)?,
            ChangeKind::Delete(local_ids) => self.delete(&local_ids),
            ChangeKind::Reload => {
                tracing::warn!(target: "chatlist::window", "Reload passed to apply_local, ignoring");
                return None;
            }
        };
        (!change.is_empty()).then_some(change)
    }

    /// At the bottom: collapse to the newest items. Elsewhere: refetch the
    /// current key range. Items inserted between the window's extremes on
    /// another device may fall outside the refetched count.
    pub async fn reload(&mut self, store: &dyn MessageStore<P>) -> ChangeSet<P> {
        let range = self.min_cursor().zip(self.max_cursor());
        let (Some((min, max)), false) = (range, self.at_bottom) else {
            return self.load(store, self.config.initial_limit).await;
        };

        let limit = self.items.len().max(self.config.initial_limit);
        match store
            .fetch_ordered(self.conversation, FetchQuery::Range { min, max, limit })
            .await
        {
            Ok(items) => {
                self.replace(items);
                tracing::debug!(
                    target: "chatlist::window",
                    conversation = %self.conversation,
                    min = %min,
                    max = %max,
                    len = self.items.len(),
                    "Reloaded key range"
                );
                ChangeSet::Reload
            }
            Err(e) => {
                tracing::warn!(
                    target: "chatlist::window",
                    conversation = %self.conversation,
                    error = %e,
                    "Failed to reload window"
                );
                ChangeSet::Unchanged
            }
        }
    }

    fn replace(&mut self, items: Vec<WindowItem<P>>) {
        self.items.clear();
        self.ids.clear();
        self.generation += 1;
        for item in items {
            if item.conversation != self.conversation || !self.ids.insert(item.stable_id) {
                continue;
            }
            self.items.push(item);
        }
        let order = self.config.order;
        self.items.sort_by(|a, b| order.compare(a, b));
    }

    fn insert(&mut self, items: Vec<WindowItem<P>>) -> ChangeSet<P> {
        let order = self.config.order;
        let mut inserted = HashSet::new();
        for item in items {
            if item.conversation != self.conversation {
                tracing::warn!(
                    target: "chatlist::window",
                    conversation = %self.conversation,
                    item_conversation = %item.conversation,
                    "Dropping item for another conversation"
                );
                continue;
            }
            if !self.ids.insert(item.stable_id) {
                continue;
            }
            inserted.insert(item.stable_id);
            let at = self
                .items
                .partition_point(|existing| order.compare(existing, &item).is_lt());
            self.items.insert(at, item);
        }

        if inserted.is_empty() {
            return ChangeSet::Unchanged;
        }
        let (positions, items) = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| inserted.contains(&item.stable_id))
            .map(|(position, item)| (position, item.clone()))
            .unzip();
        ChangeSet::Added { items, positions }
    }

    fn update(&mut self, item: WindowItem<P>) -> Option<ChangeSet<P>> {
        let position = self.position_of(item.stable_id)?;
        let current = &mut self.items[position];
        if current.ordering == item.ordering {
            *current = item.clone();
            return Some(ChangeSet::Updated {
                items: vec![item],
                positions: vec![position],
            });
        }

        // A moved key cannot be expressed as an in-place update.
        self.items.remove(position);
        let order = self.config.order;
        let at = self
            .items
            .partition_point(|existing| order.compare(existing, &item).is_lt());
        self.items.insert(at, item);
        tracing::debug!(
            target: "chatlist::window",
            conversation = %self.conversation,
            from = position,
            to = at,
            "Update moved item, emitting reload"
        );
        Some(ChangeSet::Reload)
    }

    fn delete(&mut self, local_ids: &[LocalId]) -> ChangeSet<P> {
        let positions: Vec<usize> = self
            .items
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, item)| local_ids.contains(&item.local_id))
            .map(|(position, _)| position)
            .collect();

        let mut ids = Vec::with_capacity(positions.len());
        for &position in &positions {
            let removed = self.items.remove(position);
            self.ids.remove(&removed.stable_id);
            ids.push(removed.stable_id);
        }
        ChangeSet::Deleted { ids, positions }
    }
}
