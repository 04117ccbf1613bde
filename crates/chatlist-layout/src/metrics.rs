use serde::{Deserialize, Serialize};

/// Every constant the layout engine uses, in logical units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutMetrics {
    pub max_bubble_width: f64,
    pub side_padding: f64,
    pub avatar_size: f64,
    pub avatar_spacing: f64,
    pub safe_area: f64,

    pub name_height: f64,
    pub group_spacing: f64,
    pub outer_vertical_padding: f64,
    pub list_top_inset: f64,
    pub list_bottom_inset: f64,

    pub bubble_inset: f64,
    pub vertical_inset: f64,
    pub content_spacing: f64,
    pub media_text_spacing: f64,

    pub time_height: f64,
    pub inline_time_gap: f64,
    pub status_icon_width: f64,

    pub reply_height: f64,
    pub document_width: f64,
    pub document_height: f64,

    pub media_min_width: f64,
    pub media_min_height: f64,
    pub media_max_width: f64,
    pub media_max_height: f64,

    pub reaction_chip_height: f64,
    pub reaction_chip_padding: f64,
    pub reaction_spacing: f64,
    pub reactions_top_spacing: f64,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            max_bubble_width: 420.0,
            side_padding: 16.0,
            avatar_size: 28.0,
            avatar_spacing: 8.0,
            safe_area: 50.0,

            name_height: 16.0,
            group_spacing: 8.0,
            outer_vertical_padding: 1.0,
            list_top_inset: 14.0,
            list_bottom_inset: 10.0,

            bubble_inset: 11.0,
            vertical_inset: 6.0,
            content_spacing: 8.0,
            media_text_spacing: 10.0,

            time_height: 13.0,
            inline_time_gap: 6.0,
            status_icon_width: 14.0,

            reply_height: 40.0,
            document_width: 200.0,
            document_height: 36.0,

            media_min_width: 180.0,
            media_min_height: 20.0,
            media_max_width: 320.0,
            media_max_height: 310.0,

            reaction_chip_height: 24.0,
            reaction_chip_padding: 8.0,
            reaction_spacing: 4.0,
            reactions_top_spacing: 6.0,
        }
    }
}

impl LayoutMetrics {
    /// Width left for a bubble inside a row of `container_width`.
    ///
    /// The container width is ceiled first so that sub-pixel jitter from the
    /// host does not produce distinct cache keys.
    pub fn available_width(&self, container_width: f64) -> f64 {
        if !container_width.is_finite() {
            return 0.0;
        }
        let reserved = self.avatar_spacing
            + self.side_padding * 2.0
            + self.avatar_size
            + self.safe_area;
        (container_width.ceil() - reserved).clamp(0.0, self.max_bubble_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn available_width_is_clamped() {
        let metrics = LayoutMetrics::default();
        assert!((metrics.available_width(10.0)).abs() < f64::EPSILON);
        assert!((metrics.available_width(2000.0) - 420.0).abs() < f64::EPSILON);
        // 400 - (8 + 32 + 28 + 50)
        assert!((metrics.available_width(399.2) - 282.0).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let metrics: LayoutMetrics = toml::from_str("max_bubble_width = 300.0").unwrap();
        assert!((metrics.max_bubble_width - 300.0).abs() < f64::EPSILON);
        assert!((metrics.time_height - 13.0).abs() < f64::EPSILON);
    }
}
