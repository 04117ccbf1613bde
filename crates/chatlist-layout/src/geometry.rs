use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };

    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Outer spacing around a node. Contributes to the parent's extent but never
/// to the node's own size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Spacing {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Spacing {
    pub const ZERO: Spacing = Spacing {
        top: 0.0,
        right: 0.0,
        bottom: 0.0,
        left: 0.0,
    };

    pub fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub fn vertical(top: f64, bottom: f64) -> Self {
        Self::new(top, 0.0, bottom, 0.0)
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical_sum(&self) -> f64 {
        self.top + self.bottom
    }
}

/// A single measured element of a row: its own size plus the spacing it
/// claims from its parent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutNode {
    pub size: Size,
    pub spacing: Spacing,
}

impl LayoutNode {
    pub fn new(size: Size, spacing: Spacing) -> Self {
        Self { size, spacing }
    }

    pub fn outer_width(&self) -> f64 {
        self.size.width + self.spacing.horizontal()
    }

    pub fn outer_height(&self) -> f64 {
        self.size.height + self.spacing.vertical_sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outer_extent_adds_spacing() {
        let node = LayoutNode::new(Size::new(100.0, 20.0), Spacing::new(6.0, 11.0, 4.0, 11.0));
        assert!((node.outer_width() - 122.0).abs() < f64::EPSILON);
        assert!((node.outer_height() - 30.0).abs() < f64::EPSILON);
    }
}
