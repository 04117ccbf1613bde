//! Text measurement seam.
//!
//! The engine never shapes text itself; it asks a [`TextMeasurer`] and caches
//! the answer. [`CellMeasurer`] is the built-in implementation for fixed-cell
//! surfaces (terminals, tests, monospace renderers).

use serde::{Deserialize, Serialize};
use textwrap::{Options, WrapAlgorithm};
use thiserror::Error;
use unicode_width::UnicodeWidthStr;

use crate::content::TextEntity;
use crate::geometry::Size;

/// Upper bound on columns handed to the wrapper. Widths beyond this are
/// treated as unbounded.
const MAX_COLUMNS: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextStyle {
    Body,
    Name,
    Caption,
}

#[derive(Debug, Error)]
pub enum MeasureError {
    #[error("Invalid measurement width: {width}")]
    InvalidWidth { width: f64 },

    #[error("Text measurement unavailable: {message}")]
    Unavailable { message: String },
}

impl MeasureError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

pub trait TextMeasurer: Send + Sync {
    /// Size of `text` laid out in `style`, wrapped at `max_width`.
    fn measure(
        &self,
        text: &str,
        style: TextStyle,
        entities: &[TextEntity],
        max_width: f64,
    ) -> Result<Size, MeasureError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellStyle {
    pub cell_width: f64,
    pub line_height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellMetrics {
    pub body: CellStyle,
    pub name: CellStyle,
    pub caption: CellStyle,
}

impl Default for CellMetrics {
    fn default() -> Self {
        Self {
            body: CellStyle {
                cell_width: 7.5,
                line_height: 17.0,
            },
            name: CellStyle {
                cell_width: 7.0,
                line_height: 16.0,
            },
            caption: CellStyle {
                cell_width: 6.0,
                line_height: 13.0,
            },
        }
    }
}

impl CellMetrics {
    fn style(&self, style: TextStyle) -> CellStyle {
        match style {
            TextStyle::Body => self.body,
            TextStyle::Name => self.name,
            TextStyle::Caption => self.caption,
        }
    }
}

/// Wraps text on display-width cells. Entities do not change cell widths.
#[derive(Debug, Clone, Default)]
pub struct CellMeasurer {
    metrics: CellMetrics,
}

impl CellMeasurer {
    pub fn new(metrics: CellMetrics) -> Self {
        Self { metrics }
    }

    pub fn metrics(&self) -> &CellMetrics {
        &self.metrics
    }
}

impl TextMeasurer for CellMeasurer {
    fn measure(
        &self,
        text: &str,
        style: TextStyle,
        _entities: &[TextEntity],
        max_width: f64,
    ) -> Result<Size, MeasureError> {
        if max_width.is_nan() || max_width < 0.0 {
            return Err(MeasureError::InvalidWidth { width: max_width });
        }
        let cell = self.metrics.style(style);
        if cell.cell_width <= 0.0 || cell.line_height <= 0.0 {
            return Err(MeasureError::unavailable(format!(
                "non-positive cell metrics for {style:?}"
            )));
        }

        let columns = if max_width.is_infinite() {
            MAX_COLUMNS
        } else {
            ((max_width / cell.cell_width).floor() as usize).clamp(1, MAX_COLUMNS)
        };
        let options = Options::new(columns)
            .wrap_algorithm(WrapAlgorithm::FirstFit)
            .break_words(true);

        let mut lines = 0usize;
        let mut widest = 0usize;
        for paragraph in text.split('\n') {
            // Blank lines keep their height but never widen the block.
            if paragraph.trim().is_empty() {
                lines += 1;
                continue;
            }
            for line in textwrap::wrap(paragraph, &options) {
                lines += 1;
                widest = widest.max(line.width());
            }
        }
        let lines = lines.max(1);

        Ok(Size::new(
            widest as f64 * cell.cell_width,
            lines as f64 * cell.line_height,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measure(text: &str, width: f64) -> Size {
        CellMeasurer::default()
            .measure(text, TextStyle::Body, &[], width)
            .unwrap()
    }

    #[test]
    fn short_text_is_one_line() {
        let size = measure("hi", 1000.0);
        assert!((size.height - 17.0).abs() < f64::EPSILON);
        assert!((size.width - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_width_still_terminates() {
        let size = measure("hi", 0.0);
        assert!((size.height - 34.0).abs() < f64::EPSILON);
    }

    #[test]
    fn explicit_newlines_count_as_lines() {
        let size = measure("a\n\nb", 1000.0);
        assert!((size.height - 51.0).abs() < f64::EPSILON);
    }

    #[test]
    fn wide_glyphs_use_display_width() {
        let size = measure("日本", 1000.0);
        assert!((size.width - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn negative_width_is_rejected() {
        let result = CellMeasurer::default().measure("hi", TextStyle::Body, &[], -1.0);
        assert!(matches!(result, Err(MeasureError::InvalidWidth { .. })));
    }

    #[test]
    fn unbounded_width_is_supported() {
        let size = measure("hello world", f64::INFINITY);
        assert!((size.height - 17.0).abs() < f64::EPSILON);
    }
}
