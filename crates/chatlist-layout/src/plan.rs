use serde::{Deserialize, Serialize};

use crate::geometry::{LayoutNode, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimePlacement {
    /// Shares the last text line.
    Inline,
    /// Gets its own line below the content.
    Trailing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionItemPlan {
    pub emoji: String,
    pub count: u32,
    /// Offset inside the reactions node.
    pub origin_x: f64,
    pub origin_y: f64,
    pub size: Size,
}

/// Bubble elements in top-to-bottom order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentPart {
    Reply,
    Media,
    Document,
    Text,
    Time,
    Reactions,
}

/// Geometry for one message row. Produced by [`crate::LayoutEngine`], never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutPlan {
    pub wrapper: LayoutNode,
    pub avatar: Option<LayoutNode>,
    pub name: Option<LayoutNode>,
    pub bubble: LayoutNode,
    pub reply: Option<LayoutNode>,
    pub media: Option<LayoutNode>,
    pub document: Option<LayoutNode>,
    pub text: Option<LayoutNode>,
    pub time: Option<LayoutNode>,
    pub reactions: Option<LayoutNode>,
    pub reaction_items: Vec<ReactionItemPlan>,
    pub parts: Vec<ContentPart>,
    pub single_line: bool,
    pub time_placement: TimePlacement,
    /// The engine could not measure the text and substituted a placeholder.
    pub degraded: bool,
}

impl LayoutPlan {
    /// Height the row occupies in the list.
    pub fn total_height(&self) -> f64 {
        self.wrapper.outer_height()
    }

    pub fn node(&self, part: ContentPart) -> Option<&LayoutNode> {
        match part {
            ContentPart::Reply => self.reply.as_ref(),
            ContentPart::Media => self.media.as_ref(),
            ContentPart::Document => self.document.as_ref(),
            ContentPart::Text => self.text.as_ref(),
            ContentPart::Time => self.time.as_ref(),
            ContentPart::Reactions => self.reactions.as_ref(),
        }
    }

    /// Y offset of `part`'s top edge inside the bubble.
    pub fn content_top(&self, part: ContentPart) -> Option<f64> {
        let mut y = 0.0;
        for candidate in &self.parts {
            let node = self.node(*candidate)?;
            if *candidate == part {
                return Some(y + node.spacing.top);
            }
            y += node.outer_height();
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Spacing;

    fn node(height: f64, top: f64, bottom: f64) -> LayoutNode {
        LayoutNode::new(Size::new(10.0, height), Spacing::vertical(top, bottom))
    }

    #[test]
    fn content_top_accumulates_previous_parts() {
        let plan = LayoutPlan {
            wrapper: LayoutNode::default(),
            avatar: None,
            name: None,
            bubble: LayoutNode::default(),
            reply: Some(node(40.0, 6.0, 4.0)),
            media: None,
            document: None,
            text: Some(node(17.0, 4.0, 0.0)),
            time: Some(node(13.0, 0.0, 6.0)),
            reactions: None,
            reaction_items: Vec::new(),
            parts: vec![ContentPart::Reply, ContentPart::Text, ContentPart::Time],
            single_line: false,
            time_placement: TimePlacement::Trailing,
            degraded: false,
        };
        assert_eq!(plan.content_top(ContentPart::Reply), Some(6.0));
        assert_eq!(plan.content_top(ContentPart::Text), Some(54.0));
        assert_eq!(plan.content_top(ContentPart::Time), Some(71.0));
        assert_eq!(plan.content_top(ContentPart::Media), None);
    }
}
