//! MessageViewport - virtualized, bottom-anchored geometry for one window.
//!
//! Rows mirror the window in visual order (oldest at the top). Each row keeps
//! the height it was last measured at; only rows inside the visible range plus
//! a buffer are re-measured when the width changes, and everything else is
//! re-measured lazily as it scrolls into view. Extent-changing mutations
//! preserve the distance from the bottom of the content.

use std::ops::Range;
use std::sync::Arc;

use chatlist_layout::{LayoutEngine, LayoutFlags, LayoutPlan, MessageContent};
use chatlist_window::{ChangeSet, ConversationId, Direction, SortOrder, StableId};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::grouping::{layout_flags, time_label};
use crate::record::{ChatItem, MessageRecord};
use crate::state::{ScrollPhase, ScrollState, ScrollTarget};

/// Lazy measurement can change extents and therefore the visible range;
/// a few passes settle it.
const MAX_LAYOUT_PASSES: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub width_epsilon: f64,
    /// Rows measured above and below the visible range.
    pub relayout_buffer: usize,
    pub at_bottom_threshold: f64,
    pub absolute_bottom_threshold: f64,
    pub placeholder_row_height: f64,
    pub group_gap_secs: i64,
    /// Inserts and removes hold the update phase until the host reports the
    /// animation finished.
    pub animate_changes: bool,
    pub time_format: String,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width_epsilon: 0.5,
            relayout_buffer: 3,
            at_bottom_threshold: 5.0,
            absolute_bottom_threshold: 0.1,
            placeholder_row_height: 28.0,
            group_gap_secs: 300,
            animate_changes: true,
            time_format: "%H:%M".to_string(),
        }
    }
}

/// Requests flowing from the viewport to whoever owns the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportIntent {
    Paginate(Direction),
    AtBottomChanged(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowTransition {
    FadeIn,
}

#[derive(Debug, Clone)]
pub struct VisibleRow {
    pub index: usize,
    pub stable_id: StableId,
    /// Top edge in content coordinates.
    pub top: f64,
    pub height: f64,
    pub plan: Option<Arc<LayoutPlan>>,
    pub transition: Option<RowTransition>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateOutcome {
    pub animated: bool,
    /// Visual indices of inserted rows, ascending.
    pub inserted: Vec<usize>,
    pub removed: Vec<StableId>,
    /// Visual indices of re-measured rows.
    pub updated: Vec<usize>,
    pub scrolled_to_bottom: bool,
}

/// What stays put on screen while lazily measured rows change extents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    Bottom,
    Center(usize),
    FirstVisible,
}

#[derive(Debug, Clone)]
struct Row {
    item: ChatItem,
    flags: LayoutFlags,
    height: f64,
    /// Width the current height belongs to; `None` when never measured or
    /// when the content changed since.
    measured_width: Option<f64>,
    plan: Option<Arc<LayoutPlan>>,
    single_line: bool,
    transition: Option<RowTransition>,
}

impl Row {
    fn new(item: ChatItem, estimated_height: f64) -> Self {
        Self {
            item,
            flags: LayoutFlags::default(),
            height: estimated_height,
            measured_width: None,
            plan: None,
            single_line: false,
            transition: None,
        }
    }

    fn is_measured_at(&self, width: f64) -> bool {
        self.measured_width
            .is_some_and(|measured| (measured - width).abs() <= f64::EPSILON)
    }
}

pub struct MessageViewport {
    engine: Arc<LayoutEngine>,
    config: ViewportConfig,
    order: SortOrder,
    direct_chat: bool,
    rows: Vec<Row>,
    row_tops: Vec<f64>,
    state: ScrollState,
    width: f64,
    pagination_in_flight: bool,
    pagination_queued: bool,
    /// Distance from the bottom before the first resize that arrived during
    /// an update; restored once the update completes.
    deferred_distance: Option<f64>,
    /// Container width received during an update.
    deferred_width: Option<f64>,
    reported_at_bottom: bool,
    intents: mpsc::UnboundedSender<ViewportIntent>,
}

impl std::fmt::Debug for MessageViewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageViewport")
            .field("rows", &self.rows.len())
            .field("width", &self.width)
            .field("state", &self.state)
            .field("pagination_in_flight", &self.pagination_in_flight)
            .finish_non_exhaustive()
    }
}

impl MessageViewport {
    pub fn new(
        engine: Arc<LayoutEngine>,
        config: ViewportConfig,
        conversation: ConversationId,
        order: SortOrder,
        intents: mpsc::UnboundedSender<ViewportIntent>,
    ) -> Self {
        Self {
            engine,
            config,
            order,
            direct_chat: conversation.is_direct(),
            rows: Vec::new(),
            row_tops: Vec::new(),
            state: ScrollState::new(),
            width: 0.0,
            pagination_in_flight: false,
            pagination_queued: false,
            deferred_distance: None,
            deferred_width: None,
            reported_at_bottom: true,
            intents,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn offset(&self) -> f64 {
        self.state.offset
    }

    pub fn viewport_height(&self) -> f64 {
        self.state.viewport_height
    }

    pub fn content_height(&self) -> f64 {
        self.state.content_height
    }

    pub fn phase(&self) -> ScrollPhase {
        self.state.phase()
    }

    pub fn distance_from_bottom(&self) -> f64 {
        self.state.distance_from_bottom()
    }

    pub fn is_at_bottom(&self) -> bool {
        self.state.is_within_bottom(self.config.at_bottom_threshold)
    }

    pub fn is_at_absolute_bottom(&self) -> bool {
        self.state
            .is_within_bottom(self.config.absolute_bottom_threshold)
    }

    pub fn pagination_in_flight(&self) -> bool {
        self.pagination_in_flight
    }

    pub fn pagination_queued(&self) -> bool {
        self.pagination_queued
    }

    pub fn stable_id_at(&self, index: usize) -> Option<StableId> {
        self.rows.get(index).map(|row| row.item.stable_id)
    }

    pub fn row_top(&self, index: usize) -> Option<f64> {
        self.row_tops.get(index).copied()
    }

    /// Height of the row at `index` as currently known. Rows not yet
    /// measured at the current width report their last known or estimated
    /// height.
    pub fn height_for_row(&self, index: usize) -> f64 {
        self.rows
            .get(index)
            .map_or(self.config.placeholder_row_height, |row| row.height)
    }

    pub fn set_size(&mut self, width: f64, viewport_height: f64) {
        self.set_viewport_height(viewport_height);
        self.notify_width_changed(width);
    }

    /// Keeps the distance from the bottom. While an update is being performed
    /// the offset is only clamped and the distance is restored by
    /// `complete_update`.
    pub fn set_viewport_height(&mut self, height: f64) {
        let height = if height.is_finite() { height.max(0.0) } else { 0.0 };
        if (height - self.state.viewport_height).abs() <= f64::EPSILON {
            return;
        }
        let distance = self.state.distance_from_bottom();
        self.state.viewport_height = height;
        if self.state.performing_update {
            self.deferred_distance.get_or_insert(distance);
            self.state.clamp();
        } else {
            self.state.restore_distance_from_bottom(distance);
        }
        self.report_at_bottom();
    }

    /// Re-measure rows near the viewport for a new container width. Returns
    /// whether a relayout happened. During an update the width is kept and
    /// the relayout runs when the update completes.
    pub fn notify_width_changed(&mut self, width: f64) -> bool {
        if !width.is_finite() {
            return false;
        }
        if self.state.performing_update {
            tracing::trace!(target: "chatlist::viewport", width, "Width change deferred during update");
            self.deferred_width = Some(width);
            return false;
        }
        if (width - self.width).abs() <= self.config.width_epsilon {
            return false;
        }

        let previous = self.width;
        self.width = width.max(0.0);
        if self.rows.is_empty() {
            return true;
        }

        let distance = self.state.distance_from_bottom();
        let available = self.engine.available_width(self.width);
        let range = self.buffered_range();
        let mut measured = 0usize;
        let mut skipped = 0usize;
        for index in range {
            let row = &self.rows[index];
            if row.single_line && row.item.payload.is_plain_text() {
                let content = self.content_for(index);
                if self.engine.fits_single_line(&content, available) {
                    self.rows[index].measured_width = Some(self.width);
                    skipped += 1;
                    continue;
                }
            }
            self.measure_row(index);
            measured += 1;
        }

        self.rebuild_index();
        self.state.restore_distance_from_bottom(distance);
        self.report_at_bottom();
        tracing::debug!(
            target: "chatlist::viewport",
            from = previous,
            to = self.width,
            measured,
            skipped,
            "Width relayout"
        );
        true
    }

    pub fn notify_user_scroll_begin(&mut self) {
        self.state.user_scrolling = true;
        self.check_approaching_top();
    }

    pub fn notify_user_scroll_end(&mut self) {
        self.state.user_scrolling = false;
    }

    pub fn scroll_to(&mut self, offset: f64) -> bool {
        let moved = self.state.scroll_to(offset);
        if moved {
            // An explicit scroll replaces any position held over from a resize.
            self.deferred_distance = None;
            self.report_at_bottom();
            self.check_approaching_top();
        }
        moved
    }

    pub fn scroll_by(&mut self, delta: f64) -> bool {
        self.scroll_to(self.state.offset + delta)
    }

    /// Resolved at the next layout pass, when extents are known.
    pub fn scroll_to_bottom(&mut self) {
        self.state.set_scroll_target(ScrollTarget::Bottom);
    }

    pub fn scroll_to_row(&mut self, index: usize) {
        self.state.set_scroll_target(ScrollTarget::Row(index));
    }

    /// Ask for older history. Single-flight: at most one request is
    /// outstanding, and requests made during an update are deferred.
    pub fn notify_approaching_top(&mut self) -> bool {
        if self.rows.is_empty() || self.pagination_in_flight {
            return false;
        }
        if self.state.performing_update {
            self.pagination_queued = true;
            return false;
        }
        self.pagination_queued = false;
        if self
            .intents
            .send(ViewportIntent::Paginate(Direction::Older))
            .is_err()
        {
            tracing::debug!(target: "chatlist::viewport", "Intent receiver closed, not paginating");
            return false;
        }
        self.pagination_in_flight = true;
        tracing::debug!(target: "chatlist::viewport", rows = self.rows.len(), "Requesting older page");
        true
    }

    /// The owner could not serve the pagination request.
    pub fn finish_pagination(&mut self) {
        self.pagination_in_flight = false;
    }

    /// The host finished animating the last insert or remove.
    pub fn complete_update(&mut self) {
        if !self.state.performing_update {
            return;
        }
        self.state.performing_update = false;
        for row in &mut self.rows {
            row.transition = None;
        }
        if let Some(distance) = self.deferred_distance.take() {
            self.state.restore_distance_from_bottom(distance);
        }
        if let Some(width) = self.deferred_width.take() {
            self.notify_width_changed(width);
        }
        self.report_at_bottom();
        if self.pagination_queued {
            self.pagination_queued = false;
            self.notify_approaching_top();
        }
    }

    /// Apply a change-set produced by the window. `window` is the window's
    /// contents after the change.
    pub fn apply_change_set(
        &mut self,
        change: &ChangeSet<MessageRecord>,
        window: &[ChatItem],
    ) -> UpdateOutcome {
        if change.is_empty() {
            return UpdateOutcome::default();
        }

        let should_scroll = self.is_at_absolute_bottom() && !self.state.user_scrolling;
        let distance = self.state.distance_from_bottom();

        let mut outcome = match self.apply_rows(change, window, true) {
            Some(outcome) => outcome,
            None => self.resync(window),
        };

        self.rebuild_index();
        if should_scroll {
            self.state.stick_to_bottom();
            outcome.scrolled_to_bottom = true;
        } else {
            self.state.restore_distance_from_bottom(distance);
        }
        if matches!(change, ChangeSet::Reload) {
            self.settle_visible_rows(if should_scroll {
                Anchor::Bottom
            } else {
                Anchor::FirstVisible
            });
        }

        if outcome.animated {
            self.state.performing_update = true;
        }
        self.report_at_bottom();
        tracing::debug!(
            target: "chatlist::viewport",
            kind = change.kind(),
            changed = change.len(),
            rows = self.rows.len(),
            scrolled_to_bottom = outcome.scrolled_to_bottom,
            "Applied change set"
        );
        outcome
    }

    /// Apply the result of a pagination request. Pages are not animated, and
    /// their rows start from estimated heights until they scroll into view.
    pub fn apply_page(
        &mut self,
        change: &ChangeSet<MessageRecord>,
        window: &[ChatItem],
    ) -> UpdateOutcome {
        self.pagination_in_flight = false;
        if change.is_empty() {
            return UpdateOutcome::default();
        }

        let distance = self.state.distance_from_bottom();
        let outcome = match self.apply_rows(change, window, false) {
            Some(outcome) => outcome,
            None => self.resync(window),
        };
        self.rebuild_index();
        self.state.restore_distance_from_bottom(distance);
        self.report_at_bottom();
        tracing::debug!(
            target: "chatlist::viewport",
            inserted = outcome.inserted.len(),
            rows = self.rows.len(),
            "Applied page"
        );
        outcome
    }

    /// Resolve scroll targets, measure stale rows near the viewport and
    /// return the rows to draw.
    pub fn layout(&mut self) -> Vec<VisibleRow> {
        let anchor = match self.state.take_scroll_target() {
            Some(ScrollTarget::Bottom) => Anchor::Bottom,
            Some(ScrollTarget::Row(index)) if index < self.rows.len() => Anchor::Center(index),
            _ if self.is_at_absolute_bottom() && !self.state.user_scrolling => Anchor::Bottom,
            _ => Anchor::FirstVisible,
        };
        self.settle_visible_rows(anchor);
        self.report_at_bottom();

        self.buffered_range()
            .map(|index| {
                let row = &self.rows[index];
                VisibleRow {
                    index,
                    stable_id: row.item.stable_id,
                    top: self.row_tops[index],
                    height: row.height,
                    plan: row.plan.clone(),
                    transition: row.transition,
                }
            })
            .collect()
    }

    /// Visible rows without the measurement buffer.
    pub fn visible_range(&self) -> Range<usize> {
        if self.rows.is_empty() {
            return 0..0;
        }
        let top = self.state.offset;
        let bottom = top + self.state.viewport_height;
        let first = self
            .row_tops
            .partition_point(|row_top| *row_top <= top)
            .saturating_sub(1);
        let last = self
            .row_tops
            .partition_point(|row_top| *row_top < bottom)
            .saturating_sub(1)
            .max(first);
        first..(last + 1).min(self.rows.len())
    }

    fn buffered_range(&self) -> Range<usize> {
        let visible = self.visible_range();
        let start = visible.start.saturating_sub(self.config.relayout_buffer);
        let end = (visible.end + self.config.relayout_buffer).min(self.rows.len());
        start..end
    }

    fn center_row(&mut self, index: usize) {
        if let Some(&top) = self.row_tops.get(index) {
            let height = self.height_for_row(index);
            self.state.offset = top + height / 2.0 - self.state.viewport_height / 2.0;
            self.state.clamp();
        }
    }

    fn apply_anchor(&mut self, anchor: Anchor) {
        match anchor {
            Anchor::Bottom => self.state.stick_to_bottom(),
            Anchor::Center(index) => self.center_row(index),
            Anchor::FirstVisible => {}
        }
    }

    /// Measure stale rows in the buffered range until extents settle, keeping
    /// `anchor` in place after every pass.
    fn settle_visible_rows(&mut self, anchor: Anchor) {
        self.apply_anchor(anchor);
        if self.width <= 0.0 {
            return;
        }
        for _ in 0..MAX_LAYOUT_PASSES {
            let stale: Vec<usize> = self
                .buffered_range()
                .filter(|index| !self.rows[*index].is_measured_at(self.width))
                .collect();
            if stale.is_empty() {
                break;
            }

            let first = self.visible_range().start;
            let first_delta = self.state.offset - self.row_tops.get(first).copied().unwrap_or(0.0);
            for index in stale {
                self.measure_row(index);
            }
            self.rebuild_index();
            if anchor == Anchor::FirstVisible {
                self.state.offset = self.row_tops.get(first).copied().unwrap_or(0.0) + first_delta;
                self.state.clamp();
            } else {
                self.apply_anchor(anchor);
            }
        }
    }

    /// Structural update of `rows`. `None` when the change does not line up
    /// with the window, in which case the caller resyncs.
    fn apply_rows(
        &mut self,
        change: &ChangeSet<MessageRecord>,
        window: &[ChatItem],
        live: bool,
    ) -> Option<UpdateOutcome> {
        match change {
            ChangeSet::Added { items, positions } => {
                let len_after = self.rows.len() + items.len();
                if positions.len() != items.len() || window.len() != len_after {
                    tracing::warn!(
                        target: "chatlist::viewport",
                        rows = self.rows.len(),
                        window = window.len(),
                        added = items.len(),
                        "Added change set does not match window, resyncing"
                    );
                    return None;
                }
                let mut inserts: Vec<(usize, &ChatItem)> = positions
                    .iter()
                    .zip(items)
                    .map(|(position, item)| (self.visual_index(*position, len_after), item))
                    .collect();
                inserts.sort_by_key(|(index, _)| *index);

                let animated = live && self.config.animate_changes;
                let mut inserted = Vec::with_capacity(inserts.len());
                for (index, item) in inserts {
                    if index > self.rows.len() {
                        tracing::warn!(target: "chatlist::viewport", index, rows = self.rows.len(), "Insert position out of range");
                        return None;
                    }
                    let mut row = Row::new(item.clone(), self.estimated_height(item.stable_id));
                    if animated {
                        row.transition = Some(RowTransition::FadeIn);
                    }
                    self.rows.insert(index, row);
                    inserted.push(index);
                }

                let mut touched = self.refresh_flags_around(&inserted);
                if live {
                    touched.extend(inserted.iter().copied());
                    touched.sort_unstable();
                    touched.dedup();
                    for index in &touched {
                        self.measure_row(*index);
                    }
                }
                Some(UpdateOutcome {
                    animated,
                    inserted,
                    updated: touched,
                    ..UpdateOutcome::default()
                })
            }
            ChangeSet::Deleted { ids, positions } => {
                let len_before = self.rows.len();
                if window.len() + positions.len() != len_before {
                    tracing::warn!(
                        target: "chatlist::viewport",
                        rows = len_before,
                        window = window.len(),
                        deleted = positions.len(),
                        "Deleted change set does not match window, resyncing"
                    );
                    return None;
                }
                let mut indices: Vec<usize> = positions
                    .iter()
                    .map(|position| self.visual_index(*position, len_before))
                    .collect();
                indices.sort_unstable_by(|a, b| b.cmp(a));

                let mut removed = Vec::with_capacity(indices.len());
                for index in &indices {
                    if *index >= self.rows.len() {
                        tracing::warn!(target: "chatlist::viewport", index, rows = self.rows.len(), "Delete position out of range");
                        return None;
                    }
                    let row = self.rows.remove(*index);
                    self.engine.cache().forget_row(row.item.stable_id.0);
                    removed.push(row.item.stable_id);
                }
                if removed.len() != ids.len() || removed.iter().any(|id| !ids.contains(id)) {
                    tracing::warn!(target: "chatlist::viewport", "Deleted ids do not match rows, resyncing");
                    return None;
                }

                // The successor of the k-th largest gap moved up by the number
                // of smaller gaps.
                let count = indices.len();
                let neighbours: Vec<usize> = indices
                    .iter()
                    .enumerate()
                    .map(|(k, gap)| gap.saturating_sub(count - 1 - k))
                    .collect();
                let touched = self.refresh_flags_around(&neighbours);
                for index in &touched {
                    self.measure_row(*index);
                }
                Some(UpdateOutcome {
                    animated: live && self.config.animate_changes,
                    removed,
                    updated: touched,
                    ..UpdateOutcome::default()
                })
            }
            ChangeSet::Updated { items, positions } => {
                if positions.len() != items.len() || window.len() != self.rows.len() {
                    return None;
                }
                let mut updated = Vec::with_capacity(items.len());
                for (position, item) in positions.iter().zip(items) {
                    let index = self.visual_index(*position, self.rows.len());
                    let row = self.rows.get_mut(index)?;
                    if row.item.stable_id != item.stable_id {
                        tracing::warn!(
                            target: "chatlist::viewport",
                            index,
                            expected = %item.stable_id,
                            found = %row.item.stable_id,
                            "Updated row mismatch, resyncing"
                        );
                        return None;
                    }
                    row.item = item.clone();
                    row.measured_width = None;
                    updated.push(index);
                }
                let mut touched = self.refresh_flags_around(&updated);
                touched.extend(updated.iter().copied());
                touched.sort_unstable();
                touched.dedup();
                for index in &touched {
                    self.measure_row(*index);
                }
                Some(UpdateOutcome {
                    updated: touched,
                    ..UpdateOutcome::default()
                })
            }
            ChangeSet::Reload => None,
            ChangeSet::Unchanged => Some(UpdateOutcome::default()),
        }
    }

    /// Rebuild every row from the window. Known heights are reused as
    /// estimates; the visible range is measured by the caller.
    fn resync(&mut self, window: &[ChatItem]) -> UpdateOutcome {
        let mut rows: Vec<Row> = window
            .iter()
            .map(|item| Row::new(item.clone(), self.estimated_height(item.stable_id)))
            .collect();
        if self.order == SortOrder::Descending {
            rows.reverse();
        }
        self.rows = rows;
        let all: Vec<usize> = (0..self.rows.len()).collect();
        self.refresh_flags(&all);
        UpdateOutcome::default()
    }

    fn visual_index(&self, position: usize, len: usize) -> usize {
        match self.order {
            SortOrder::Ascending => position,
            SortOrder::Descending => len.saturating_sub(1).saturating_sub(position),
        }
    }

    fn estimated_height(&self, stable_id: StableId) -> f64 {
        self.engine
            .cache()
            .row_height(stable_id.0)
            .unwrap_or(self.config.placeholder_row_height)
    }

    fn content_for(&self, index: usize) -> MessageContent {
        let row = &self.rows[index];
        row.item.payload.to_content(
            row.item.stable_id,
            row.flags,
            time_label(row.item.ordering, &self.config.time_format),
        )
    }

    fn measure_row(&mut self, index: usize) {
        if self.width <= 0.0 || index >= self.rows.len() {
            return;
        }
        let content = self.content_for(index);
        let plan = self
            .engine
            .compute_layout(&content, self.engine.available_width(self.width));
        let height = if plan.degraded {
            plan.total_height().max(self.config.placeholder_row_height)
        } else {
            plan.total_height()
        };
        tracing::trace!(target: "chatlist::viewport", index, height, "Measured row");

        let row = &mut self.rows[index];
        row.height = height;
        row.single_line = plan.single_line;
        row.plan = Some(plan);
        row.measured_width = Some(self.width);
    }

    /// Recompute grouping flags for `indices` and their neighbours. Returns
    /// the indices whose flags changed, which are now stale.
    fn refresh_flags_around(&mut self, indices: &[usize]) -> Vec<usize> {
        let mut candidates: Vec<usize> = indices
            .iter()
            .flat_map(|index| [index.saturating_sub(1), *index, index + 1])
            .filter(|index| *index < self.rows.len())
            .collect();
        candidates.sort_unstable();
        candidates.dedup();
        self.refresh_flags(&candidates)
    }

    fn refresh_flags(&mut self, indices: &[usize]) -> Vec<usize> {
        let last = self.rows.len().saturating_sub(1);
        let mut changed = Vec::new();
        for &index in indices {
            let previous = index.checked_sub(1).map(|i| &self.rows[i].item);
            let flags = layout_flags(
                previous,
                &self.rows[index].item,
                index == last,
                self.direct_chat,
                self.config.group_gap_secs,
            );
            let row = &mut self.rows[index];
            if row.flags != flags || row.measured_width.is_none() {
                row.flags = flags;
                row.measured_width = None;
                changed.push(index);
            }
        }
        changed
    }

    fn rebuild_index(&mut self) {
        self.row_tops.clear();
        self.row_tops.reserve(self.rows.len());
        let mut y = 0.0;
        for row in &self.rows {
            self.row_tops.push(y);
            y += row.height;
        }
        self.state.content_height = y;
    }

    fn check_approaching_top(&mut self) {
        if self.state.user_scrolling && self.state.offset < self.state.viewport_height {
            self.notify_approaching_top();
        }
    }

    fn report_at_bottom(&mut self) {
        let at_bottom = self.is_at_bottom();
        if at_bottom != self.reported_at_bottom {
            self.reported_at_bottom = at_bottom;
            let _ = self.intents.send(ViewportIntent::AtBottomChanged(at_bottom));
        }
    }
}
