use crate::content::ReactionSummary;
use crate::geometry::Size;
use crate::measure::{TextMeasurer, TextStyle};
use crate::metrics::LayoutMetrics;
use crate::plan::ReactionItemPlan;

/// Flow reaction chips left to right, wrapping at `max_width`.
pub(crate) fn layout_reactions(
    reactions: &[ReactionSummary],
    max_width: f64,
    metrics: &LayoutMetrics,
    measurer: &dyn TextMeasurer,
) -> (Size, Vec<ReactionItemPlan>) {
    let chip_height = metrics.reaction_chip_height;
    let spacing = metrics.reaction_spacing;

    let mut items = Vec::with_capacity(reactions.len());
    let mut x = 0.0_f64;
    let mut y = 0.0_f64;
    let mut widest = 0.0_f64;

    for reaction in reactions {
        let label = format!("{} {}", reaction.emoji, reaction.count);
        let label_width = match measurer.measure(&label, TextStyle::Caption, &[], f64::INFINITY) {
            Ok(size) => size.width,
            Err(e) => {
                tracing::warn!(target: "chatlist::layout", error = %e, "Reaction label measurement failed");
                chip_height
            }
        };
        let width = label_width + metrics.reaction_chip_padding * 2.0;

        if x > 0.0 && x + width > max_width {
            x = 0.0;
            y += chip_height + spacing;
        }

        items.push(ReactionItemPlan {
            emoji: reaction.emoji.clone(),
            count: reaction.count,
            origin_x: x,
            origin_y: y,
            size: Size::new(width, chip_height),
        });
        widest = widest.max(x + width);
        x += width + spacing;
    }

    let height = if items.is_empty() { 0.0 } else { y + chip_height };
    (Size::new(widest, height), items)
}
