//! Row layout for chat message lists.
//!
//! [`LayoutEngine::compute_layout`] maps a [`MessageContent`] and an available
//! width to a [`LayoutPlan`]: a small tree of sized nodes the renderer can
//! place without measuring anything itself.

mod cache;
mod content;
mod engine;
mod geometry;
mod measure;
mod metrics;
mod plan;
mod reactions;

pub use cache::{CacheConfig, CacheStats, LayoutCache, PlanKey};
pub use content::{
    DeliveryStatus, EntityKind, LayoutFlags, MediaDescriptor, MediaKind, MessageContent,
    ReactionSummary, ReplyPreview, RichText, TextEntity, TimeBadge,
};
pub use engine::LayoutEngine;
pub use geometry::{LayoutNode, Size, Spacing};
pub use measure::{CellMeasurer, CellMetrics, CellStyle, MeasureError, TextMeasurer, TextStyle};
pub use metrics::LayoutMetrics;
pub use plan::{ContentPart, LayoutPlan, ReactionItemPlan, TimePlacement};
