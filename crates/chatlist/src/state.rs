//! Scroll state and interaction phases for the message viewport

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollPhase {
    Idle,
    UserScrolling,
    /// An animated insert or remove is on screen. Resize relayout and
    /// pagination are deferred until it completes.
    PerformingUpdate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollTarget {
    Bottom,
    /// Center the row at this visual index.
    Row(usize),
}

/// Offsets are measured from the top of the content, in logical units.
#[derive(Debug, Clone, Default)]
pub struct ScrollState {
    pub offset: f64,
    pub viewport_height: f64,
    pub content_height: f64,
    pub user_scrolling: bool,
    pub performing_update: bool,
    scroll_target: Option<ScrollTarget>,
}

impl ScrollState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Performing an update wins over user scrolling; the user phase resumes
    /// once the update completes.
    pub fn phase(&self) -> ScrollPhase {
        if self.performing_update {
            ScrollPhase::PerformingUpdate
        } else if self.user_scrolling {
            ScrollPhase::UserScrolling
        } else {
            ScrollPhase::Idle
        }
    }

    pub fn max_offset(&self) -> f64 {
        (self.content_height - self.viewport_height).max(0.0)
    }

    pub fn distance_from_bottom(&self) -> f64 {
        self.content_height - (self.offset + self.viewport_height)
    }

    pub fn is_within_bottom(&self, threshold: f64) -> bool {
        self.distance_from_bottom() <= threshold
    }

    pub fn clamp(&mut self) {
        self.offset = self.offset.clamp(0.0, self.max_offset());
    }

    /// Returns whether the offset moved.
    pub fn scroll_to(&mut self, offset: f64) -> bool {
        self.scroll_target = None;
        let previous = self.offset;
        self.offset = if offset.is_finite() { offset } else { previous };
        self.clamp();
        (self.offset - previous).abs() > f64::EPSILON
    }

    pub fn scroll_by(&mut self, delta: f64) -> bool {
        self.scroll_to(self.offset + delta)
    }

    /// Set the offset so that `distance_from_bottom` equals `distance`.
    pub fn restore_distance_from_bottom(&mut self, distance: f64) {
        self.offset = self.content_height - (distance + self.viewport_height);
        self.clamp();
    }

    pub fn stick_to_bottom(&mut self) {
        self.offset = self.max_offset();
    }

    pub fn set_scroll_target(&mut self, target: ScrollTarget) {
        self.scroll_target = Some(target);
    }

    pub fn take_scroll_target(&mut self) -> Option<ScrollTarget> {
        self.scroll_target.take()
    }
}
