//! LayoutEngine - turns a [`MessageContent`] and a width into a [`LayoutPlan`].
//!
//! Plans are deterministic for a given `(content, floored width)` pair, so the
//! engine memoizes them in a [`LayoutCache`] that the viewport shares.

use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::{Arc, OnceLock};

use crate::cache::{LayoutCache, PlanKey, TextKey, floor_width};
use crate::content::{MediaDescriptor, MediaKind, MessageContent, RichText, TextEntity, TimeBadge};
use crate::geometry::{LayoutNode, Size, Spacing};
use crate::measure::{CellMeasurer, TextMeasurer, TextStyle};
use crate::metrics::LayoutMetrics;
use crate::plan::{ContentPart, LayoutPlan, TimePlacement};
use crate::reactions::layout_reactions;

/// Reference glyph and width used to probe the single-line height.
const REFERENCE_GLYPH: &str = "I";
const REFERENCE_WIDTH: f64 = 1000.0;
/// Used when the measurer cannot even measure the reference glyph.
const FALLBACK_LINE_HEIGHT: f64 = 17.0;
/// Heights within this distance of the reference count as one line.
const SINGLE_LINE_TOLERANCE: f64 = 0.5;

pub struct LayoutEngine {
    metrics: LayoutMetrics,
    measurer: Arc<dyn TextMeasurer>,
    cache: LayoutCache,
    single_line_height: OnceLock<f64>,
}

impl std::fmt::Debug for LayoutEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutEngine")
            .field("metrics", &self.metrics)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(
            LayoutMetrics::default(),
            Arc::new(CellMeasurer::default()),
            LayoutCache::default(),
        )
    }
}

struct Measured {
    size: Size,
    degraded: bool,
}

impl LayoutEngine {
    pub fn new(metrics: LayoutMetrics, measurer: Arc<dyn TextMeasurer>, cache: LayoutCache) -> Self {
        Self {
            metrics,
            measurer,
            cache,
            single_line_height: OnceLock::new(),
        }
    }

    pub fn metrics(&self) -> &LayoutMetrics {
        &self.metrics
    }

    pub fn cache(&self) -> &LayoutCache {
        &self.cache
    }

    pub fn invalidate(&self) {
        self.cache.invalidate();
    }

    /// Bubble width available inside a row of `container_width`.
    pub fn available_width(&self, container_width: f64) -> f64 {
        self.metrics.available_width(container_width)
    }

    pub fn single_line_height(&self) -> f64 {
        *self.single_line_height.get_or_init(|| {
            match self
                .measurer
                .measure(REFERENCE_GLYPH, TextStyle::Body, &[], REFERENCE_WIDTH)
            {
                Ok(size) if size.height > 0.0 => size.height,
                Ok(_) => FALLBACK_LINE_HEIGHT,
                Err(e) => {
                    tracing::warn!(target: "chatlist::layout", error = %e, "Reference line measurement failed");
                    FALLBACK_LINE_HEIGHT
                }
            }
        })
    }

    /// Compute (or fetch) the plan for `content` at `available_width`.
    ///
    /// Never fails. Measurement errors produce a degraded single-line plan
    /// that is returned but not cached.
    pub fn compute_layout(&self, content: &MessageContent, available_width: f64) -> Arc<LayoutPlan> {
        let width = f64::from(floor_width(available_width));
        let key = PlanKey::new(content.stable_id, width, content.digest());
        if let Some(plan) = self.cache.plan(&key) {
            return plan;
        }

        let plan = Arc::new(self.build(content, width));
        if plan.degraded {
            tracing::debug!(
                target: "chatlist::layout",
                stable_id = content.stable_id,
                "Degraded plan not cached"
            );
        } else {
            self.cache.insert_plan(key, plan.clone());
            self.cache
                .record_row_height(content.stable_id, plan.total_height());
        }
        tracing::trace!(
            target: "chatlist::layout",
            stable_id = content.stable_id,
            width,
            height = plan.total_height(),
            single_line = plan.single_line,
            "Computed layout"
        );
        plan
    }

    /// Whether `content` is already known to render on one line, time
    /// included, at `available_width`. Only consults caches; `false` means
    /// "unknown or no".
    pub fn fits_single_line(&self, content: &MessageContent, available_width: f64) -> bool {
        if content.media.is_some() {
            return false;
        }
        let Some(text) = &content.text else {
            return false;
        };
        let width = f64::from(floor_width(available_width));
        let text_width = self.text_available_width(width, None);
        let Some(min_width) = self.cache.single_line_width(effective_text(text)) else {
            return false;
        };
        let time_width = content
            .time
            .as_ref()
            .map_or(0.0, |time| self.metrics.inline_time_gap + self.time_width(time));
        min_width + time_width <= text_width
    }

    fn text_available_width(&self, width: f64, photo_width: Option<f64>) -> f64 {
        let parent = photo_width.map_or(width, |w| width.min(w));
        (parent - self.metrics.bubble_inset * 2.0).max(0.0)
    }

    fn build(&self, content: &MessageContent, width: f64) -> LayoutPlan {
        let m = &self.metrics;
        let single_line_height = self.single_line_height();
        let content_width = (width - m.bubble_inset * 2.0).max(0.0);

        let media_size = content.media.as_ref().map(|media| match media.kind {
            MediaKind::Photo => self.photo_size(media, width),
            MediaKind::Document => Size::new(
                m.document_width.min(content_width).floor(),
                m.document_height,
            ),
        });
        let photo_width = match content.media {
            Some(MediaDescriptor {
                kind: MediaKind::Photo,
                ..
            }) => media_size.map(|s| s.width),
            _ => None,
        };
        let text_width = self.text_available_width(width, photo_width);

        let mut degraded = false;

        // Text is always present unless media stands on its own.
        let placeholder;
        let text = match (&content.text, &content.media) {
            (Some(text), _) => Some(text),
            (None, Some(_)) => None,
            (None, None) => {
                placeholder = RichText::plain(" ");
                Some(&placeholder)
            }
        };
        let text_size = text.map(|text| {
            let measured = self.measure_text(text, text_width, content.media.is_some());
            degraded |= measured.degraded;
            measured.size
        });

        let mut single_line = text_size
            .is_some_and(|size| (size.height - single_line_height).abs() < SINGLE_LINE_TOLERANCE);

        let time_size = content
            .time
            .as_ref()
            .map(|time| Size::new(self.time_width(time), m.time_height));

        // Second pass: inline time must fit on the text line.
        let time_placement = match (text_size, time_size) {
            (Some(text), Some(time))
                if single_line && text.width + m.inline_time_gap + time.width <= text_width =>
            {
                TimePlacement::Inline
            }
            (_, Some(_)) => {
                single_line = false;
                TimePlacement::Trailing
            }
            _ => TimePlacement::Trailing,
        };

        let mut parts: Vec<(ContentPart, Size, f64)> = Vec::new();

        if let Some(reply) = &content.reply {
            let name = self.measure_cached(&reply.sender_name, TextStyle::Caption, &[], f64::INFINITY);
            let snippet = self.measure_cached(&reply.snippet, TextStyle::Caption, &[], f64::INFINITY);
            degraded |= name.degraded || snippet.degraded;
            let reply_width =
                (name.size.width.max(snippet.size.width) + m.bubble_inset).min(content_width);
            parts.push((
                ContentPart::Reply,
                Size::new(reply_width, m.reply_height),
                m.bubble_inset,
            ));
        }

        if let (Some(media), Some(size)) = (&content.media, media_size) {
            match media.kind {
                MediaKind::Photo => parts.push((ContentPart::Media, size, 0.0)),
                MediaKind::Document => parts.push((ContentPart::Document, size, m.bubble_inset)),
            }
        }

        let mut text_node_width = 0.0;
        if let Some(size) = text_size {
            text_node_width = size.width;
            if time_placement == TimePlacement::Inline
                && let Some(time) = time_size
            {
                text_node_width += m.inline_time_gap + time.width;
            }
            parts.push((
                ContentPart::Text,
                Size::new(text_node_width, size.height),
                m.bubble_inset,
            ));
        }

        if time_placement == TimePlacement::Trailing
            && let Some(size) = time_size
        {
            parts.push((ContentPart::Time, size, m.bubble_inset));
        }

        let (reactions_size, reaction_items) = if content.reactions.is_empty() {
            (None, Vec::new())
        } else {
            let (size, items) = layout_reactions(
                &content.reactions,
                content_width,
                m,
                self.measurer.as_ref(),
            );
            (Some(size), items)
        };
        if let Some(size) = reactions_size {
            parts.push((ContentPart::Reactions, size, m.bubble_inset));
        }

        let nodes = self.stack_parts(&parts);

        let mut plan = LayoutPlan {
            wrapper: LayoutNode::default(),
            avatar: None,
            name: None,
            bubble: LayoutNode::default(),
            reply: None,
            media: None,
            document: None,
            text: None,
            time: None,
            reactions: None,
            reaction_items,
            parts: nodes.iter().map(|(part, _)| *part).collect(),
            single_line,
            time_placement,
            degraded,
        };

        let mut bubble_width = photo_width.unwrap_or(0.0);
        let mut bubble_height = 0.0;
        for (part, node) in &nodes {
            bubble_width = bubble_width.max(node.outer_width());
            bubble_height += node.outer_height();
            let slot = match part {
                ContentPart::Reply => &mut plan.reply,
                ContentPart::Media => &mut plan.media,
                ContentPart::Document => &mut plan.document,
                ContentPart::Text => &mut plan.text,
                ContentPart::Time => &mut plan.time,
                ContentPart::Reactions => &mut plan.reactions,
            };
            *slot = Some(*node);
        }

        // Inline time sits on the last text line, outside the vertical stack.
        if time_placement == TimePlacement::Inline
            && let (Some(time), Some(text), Some(text_node)) = (time_size, text_size, plan.text)
        {
            let text_top = plan.content_top(ContentPart::Text).unwrap_or(0.0);
            plan.time = Some(LayoutNode::new(
                time,
                Spacing::new(
                    text_top + text_node.size.height - time.height,
                    0.0,
                    0.0,
                    m.bubble_inset + text.width + m.inline_time_gap,
                ),
            ));
        }

        plan.bubble = LayoutNode::new(Size::new(bubble_width, bubble_height), Spacing::ZERO);
        self.wrap(content, &mut plan);
        plan
    }

    /// Assign vertical spacing to the bubble's parts, top to bottom.
    fn stack_parts(&self, parts: &[(ContentPart, Size, f64)]) -> Vec<(ContentPart, LayoutNode)> {
        let m = &self.metrics;
        let last = parts.len().saturating_sub(1);
        parts
            .iter()
            .enumerate()
            .map(|(idx, (part, size, horizontal))| {
                let flush = *part == ContentPart::Media;
                let top = if idx == 0 {
                    if flush { 0.0 } else { m.vertical_inset }
                } else {
                    match (parts[idx - 1].0, part) {
                        (ContentPart::Media, _) => m.media_text_spacing,
                        (_, ContentPart::Reactions) => m.reactions_top_spacing,
                        _ => m.content_spacing,
                    }
                };
                let bottom = if idx == last && !flush {
                    m.vertical_inset
                } else {
                    0.0
                };
                (
                    *part,
                    LayoutNode::new(*size, Spacing::new(top, *horizontal, bottom, *horizontal)),
                )
            })
            .collect()
    }

    /// Avatar, name and wrapper spacing around a finished bubble.
    fn wrap(&self, content: &MessageContent, plan: &mut LayoutPlan) {
        let m = &self.metrics;
        let flags = content.flags;
        let group_chat_incoming = !flags.direct_chat && !content.outgoing;

        if group_chat_incoming && flags.first_in_group {
            plan.avatar = Some(LayoutNode::new(
                Size::new(m.avatar_size, m.avatar_size),
                Spacing::new(0.0, m.avatar_spacing, 0.0, 0.0),
            ));
            if let Some(name) = &content.sender_name {
                let measured = self.measure_cached(name, TextStyle::Name, &[], f64::INFINITY);
                plan.degraded |= measured.degraded;
                let max = (plan.bubble.size.width.max(m.max_bubble_width) - m.bubble_inset).max(0.0);
                plan.name = Some(LayoutNode::new(
                    Size::new(measured.size.width.min(max), m.name_height),
                    Spacing::new(0.0, 0.0, 0.0, m.bubble_inset),
                ));
            }
        }

        let avatar_column = if group_chat_incoming {
            m.avatar_size + m.avatar_spacing
        } else {
            0.0
        };
        let name_width = plan.name.map_or(0.0, |n| n.outer_width());
        let name_height = plan.name.map_or(0.0, |n| n.outer_height());
        let stack_height = plan.bubble.outer_height() + name_height;
        let avatar_height = plan.avatar.map_or(0.0, |a| a.outer_height());

        let mut top = m.outer_vertical_padding;
        if flags.first_in_group {
            top += m.group_spacing;
        }
        if flags.first_in_window {
            top += m.list_top_inset;
        }
        let mut bottom = m.outer_vertical_padding;
        if flags.last_in_window {
            bottom += m.list_bottom_inset;
        }

        plan.wrapper = LayoutNode::new(
            Size::new(
                avatar_column + plan.bubble.outer_width().max(name_width),
                stack_height.max(avatar_height),
            ),
            Spacing::new(top, m.side_padding, bottom, m.side_padding),
        );
    }

    fn photo_size(&self, media: &MediaDescriptor, width: f64) -> Size {
        let m = &self.metrics;
        let max_width = m.media_max_width.min(width);
        let max_height = m.media_max_height;
        let min_width = m.media_min_width.min(max_width);
        let min_height = m.media_min_height.min(max_height);

        let Some((w, h)) = media.intrinsic_size() else {
            return Size::new(min_width.floor(), min_height.floor());
        };
        let (w, h) = (f64::from(w), f64::from(h));
        let scale = (max_width / w).min(max_height / h);
        Size::new(
            (w * scale).clamp(min_width, max_width).floor(),
            (h * scale).clamp(min_height, max_height).floor(),
        )
    }

    fn time_width(&self, time: &TimeBadge) -> f64 {
        let label = self.measure_cached(&time.label, TextStyle::Caption, &[], f64::INFINITY);
        let status = if time.status.is_some() {
            self.metrics.status_icon_width
        } else {
            0.0
        };
        label.size.width + status
    }

    fn measure_text(&self, text: &RichText, max_width: f64, has_media: bool) -> Measured {
        let raw = effective_text(text);

        if !has_media && let Some(min_width) = self.cache.single_line_width(raw) {
            if max_width >= min_width {
                return Measured {
                    size: Size::new(min_width, self.single_line_height()),
                    degraded: false,
                };
            }
            self.cache.evict_single_line_width(raw);
        }

        let measured = self.measure_cached(raw, TextStyle::Body, &text.entities, max_width);
        if !measured.degraded
            && (measured.size.height - self.single_line_height()).abs() < SINGLE_LINE_TOLERANCE
        {
            self.cache.record_single_line_width(raw, measured.size.width);
        }
        measured
    }

    fn measure_cached(
        &self,
        text: &str,
        style: TextStyle,
        entities: &[TextEntity],
        max_width: f64,
    ) -> Measured {
        let key = TextKey {
            digest: text_digest(text, style, entities),
            width: if max_width.is_infinite() {
                u32::MAX
            } else {
                floor_width(max_width)
            },
        };
        if let Some(size) = self.cache.text_size(&key) {
            return Measured {
                size,
                degraded: false,
            };
        }

        match self.measurer.measure(text, style, entities, max_width) {
            Ok(size) => {
                self.cache.insert_text_size(key, size);
                Measured {
                    size,
                    degraded: false,
                }
            }
            Err(e) => {
                tracing::warn!(
                    target: "chatlist::layout",
                    error = %e,
                    ?style,
                    "Text measurement failed, using single-line placeholder"
                );
                let width = if max_width.is_finite() { max_width.max(0.0) } else { 0.0 };
                Measured {
                    size: Size::new(width, self.single_line_height()),
                    degraded: true,
                }
            }
        }
    }
}

fn effective_text(text: &RichText) -> &str {
    if text.text.is_empty() { " " } else { &text.text }
}

fn text_digest(text: &str, style: TextStyle, entities: &[TextEntity]) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    style.hash(&mut hasher);
    entities.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{DeliveryStatus, LayoutFlags, ReactionSummary, ReplyPreview};
    use crate::measure::MeasureError;
    use rstest::rstest;

    fn engine() -> LayoutEngine {
        LayoutEngine::default()
    }

    fn with_time(mut content: MessageContent) -> MessageContent {
        content.time = Some(TimeBadge {
            label: "12:30".to_string(),
            status: None,
        });
        content
    }

    #[test]
    fn short_text_is_single_line_at_wide_width() {
        let plan = engine().compute_layout(&MessageContent::text(1, "hi"), 1000.0);
        assert!(plan.single_line);
        assert!((plan.text.unwrap().size.height - 17.0).abs() < f64::EPSILON);
    }

    #[test]
    fn short_text_wraps_at_tiny_width() {
        let plan = engine().compute_layout(&MessageContent::text(1, "hi"), 5.0);
        assert!(!plan.single_line);
        // Zero text width still wraps one glyph per line.
        assert!((plan.text.unwrap().size.height - 34.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_text_has_non_zero_height() {
        let plan = engine().compute_layout(&MessageContent::text(1, ""), 300.0);
        assert!(plan.text.unwrap().size.height > 0.0);
        assert!(plan.total_height() > 0.0);
    }

    #[test]
    fn inline_time_keeps_single_line() {
        let plan = engine().compute_layout(&with_time(MessageContent::text(1, "hi")), 300.0);
        assert!(plan.single_line);
        assert_eq!(plan.time_placement, TimePlacement::Inline);
        assert!(!plan.parts.contains(&ContentPart::Time));
    }

    #[test]
    fn time_that_does_not_fit_moves_to_trailing_line() {
        // 30 cells of body text fill 225 of the 258 text units; time needs 36 more.
        let content = with_time(MessageContent::text(1, "a".repeat(30)));
        let plan = engine().compute_layout(&content, 280.0);
        assert!(!plan.single_line);
        assert_eq!(plan.time_placement, TimePlacement::Trailing);
        assert_eq!(plan.parts.last(), Some(&ContentPart::Time));
    }

    #[test]
    fn outgoing_status_reserves_icon_width() {
        let engine = engine();
        let mut content = with_time(MessageContent::text(1, "hi"));
        let plain = engine.compute_layout(&content, 300.0);
        content.time.as_mut().unwrap().status = Some(DeliveryStatus::Read);
        let with_status = engine.compute_layout(&content, 300.0);
        let delta = with_status.time.unwrap().size.width - plain.time.unwrap().size.width;
        assert!((delta - 14.0).abs() < f64::EPSILON);
    }

    #[rstest]
    #[case(1600, 900, 320.0, 180.0)]
    #[case(900, 1600, 180.0, 310.0)]
    #[case(100, 100, 310.0, 310.0)]
    #[case(4000, 100, 320.0, 20.0)]
    fn photo_is_aspect_fit_and_clamped(
        #[case] w: u32,
        #[case] h: u32,
        #[case] expected_w: f64,
        #[case] expected_h: f64,
    ) {
        let mut content = MessageContent::text(1, "caption");
        content.media = Some(MediaDescriptor::photo(w, h));
        let plan = engine().compute_layout(&content, 420.0);
        let media = plan.media.unwrap();
        assert!((media.size.width - expected_w).abs() < f64::EPSILON, "{media:?}");
        assert!((media.size.height - expected_h).abs() < f64::EPSILON, "{media:?}");
    }

    #[test]
    fn photo_without_size_uses_minimum() {
        let mut content = MessageContent::text(1, "x");
        content.text = None;
        content.media = Some(MediaDescriptor {
            kind: MediaKind::Photo,
            width: None,
            height: None,
        });
        let plan = engine().compute_layout(&content, 420.0);
        let media = plan.media.unwrap();
        assert!((media.size.width - 180.0).abs() < f64::EPSILON);
        assert!((media.size.height - 20.0).abs() < f64::EPSILON);
        assert!(plan.text.is_none());
    }

    #[test]
    fn photo_constrains_caption_width() {
        let long = "word ".repeat(40);
        let mut content = MessageContent::text(1, long.clone());
        content.media = Some(MediaDescriptor::photo(900, 1600));
        let with_photo = engine().compute_layout(&content, 420.0);
        let text_only = engine().compute_layout(&MessageContent::text(1, long), 420.0);

        assert!(with_photo.text.unwrap().size.width <= 180.0 - 22.0);
        assert!(with_photo.text.unwrap().size.height > text_only.text.unwrap().size.height);
    }

    #[test]
    fn document_card_is_capped_at_available_width() {
        let mut content = MessageContent::text(1, "report.pdf");
        content.media = Some(MediaDescriptor::document());
        let plan = engine().compute_layout(&content, 150.0);
        let document = plan.document.unwrap();
        assert!((document.size.width - 128.0).abs() < f64::EPSILON);
        assert!(plan.media.is_none());
    }

    #[test]
    fn bubble_height_is_sum_of_parts() {
        let mut content = with_time(MessageContent::text(1, "hello there"));
        content.reply = Some(ReplyPreview {
            sender_name: "Ana".to_string(),
            snippet: "earlier".to_string(),
        });
        content.reactions = vec![ReactionSummary {
            emoji: "👍".to_string(),
            count: 2,
            mine: true,
        }];
        let plan = engine().compute_layout(&content, 300.0);
        let sum: f64 = plan
            .parts
            .iter()
            .map(|part| plan.node(*part).unwrap().outer_height())
            .sum();
        assert!((plan.bubble.size.height - sum).abs() < f64::EPSILON);
        assert_eq!(
            plan.parts,
            vec![ContentPart::Reply, ContentPart::Text, ContentPart::Reactions]
        );
        assert_eq!(plan.reaction_items.len(), 1);
    }

    #[test]
    fn first_in_group_adds_name_and_group_spacing() {
        let engine = engine();
        let mut content = MessageContent::text(1, "hi");
        content.sender_name = Some("Ana".to_string());
        let plain = engine.compute_layout(&content, 300.0);

        content.flags = LayoutFlags {
            first_in_group: true,
            ..LayoutFlags::default()
        };
        let grouped = engine.compute_layout(&content, 300.0);

        assert!(grouped.name.is_some());
        assert!(grouped.avatar.is_some());
        assert!((grouped.total_height() - plain.total_height() - 16.0 - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn direct_chats_have_no_avatar_or_name() {
        let mut content = MessageContent::text(1, "hi");
        content.sender_name = Some("Ana".to_string());
        content.flags = LayoutFlags {
            first_in_group: true,
            direct_chat: true,
            ..LayoutFlags::default()
        };
        let plan = engine().compute_layout(&content, 300.0);
        assert!(plan.avatar.is_none());
        assert!(plan.name.is_none());
    }

    #[test]
    fn window_edges_add_list_insets() {
        let engine = engine();
        let mut content = MessageContent::text(1, "hi");
        let plain = engine.compute_layout(&content, 300.0);
        content.flags.first_in_window = true;
        content.flags.last_in_window = true;
        let edged = engine.compute_layout(&content, 300.0);
        assert!((edged.total_height() - plain.total_height() - 24.0).abs() < f64::EPSILON);
    }

    #[test]
    fn plans_are_cached_per_floored_width() {
        let engine = engine();
        let content = MessageContent::text(1, "hello");
        let a = engine.compute_layout(&content, 300.2);
        let b = engine.compute_layout(&content, 300.9);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(engine.cache().stats().plans, 1);
        assert_eq!(engine.cache().row_height(1), Some(a.total_height()));
    }

    #[test]
    fn single_line_width_is_evicted_when_too_wide() {
        let engine = engine();
        let content = MessageContent::text(1, "hello world");
        engine.compute_layout(&content, 400.0);
        assert!(engine.cache().single_line_width("hello world").is_some());

        let narrow = engine.compute_layout(&content, 60.0);
        assert!(!narrow.single_line);
        assert!(engine.cache().single_line_width("hello world").is_none());
    }

    #[test]
    fn fits_single_line_uses_recorded_width() {
        let engine = engine();
        let content = with_time(MessageContent::text(1, "hello"));
        assert!(!engine.fits_single_line(&content, 400.0));
        engine.compute_layout(&content, 400.0);
        assert!(engine.fits_single_line(&content, 300.0));
        assert!(!engine.fits_single_line(&content, 40.0));
    }

    struct FailingMeasurer;

    impl TextMeasurer for FailingMeasurer {
        fn measure(
            &self,
            text: &str,
            _style: TextStyle,
            _entities: &[TextEntity],
            _max_width: f64,
        ) -> Result<Size, MeasureError> {
            if text == REFERENCE_GLYPH {
                return Ok(Size::new(7.0, 20.0));
            }
            Err(MeasureError::unavailable("font missing"))
        }
    }

    #[test]
    fn measurement_failure_degrades_to_placeholder() {
        let engine = LayoutEngine::new(
            LayoutMetrics::default(),
            Arc::new(FailingMeasurer),
            LayoutCache::default(),
        );
        let plan = engine.compute_layout(&MessageContent::text(1, "hello"), 300.0);
        assert!(plan.degraded);
        assert!((plan.text.unwrap().size.height - 20.0).abs() < f64::EPSILON);
        assert_eq!(engine.cache().stats().plans, 0);
    }
}
