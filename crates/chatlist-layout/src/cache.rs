//! Layout caches shared between the engine and the viewport.
//!
//! All entries are advisory. Losing one only costs a recomputation.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lru::LruCache;
use serde::{Deserialize, Serialize};

use crate::geometry::Size;
use crate::plan::LayoutPlan;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub plan_capacity: usize,
    pub text_capacity: usize,
    pub single_line_capacity: usize,
    pub row_height_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            plan_capacity: 5000,
            text_capacity: 5000,
            single_line_capacity: 5000,
            row_height_capacity: 1000,
        }
    }
}

/// Composite plan key. Width is floored so sub-unit jitter shares an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlanKey {
    pub stable_id: i64,
    pub width: u32,
    pub digest: u64,
}

impl PlanKey {
    pub fn new(stable_id: i64, width: f64, digest: u64) -> Self {
        Self {
            stable_id,
            width: floor_width(width),
            digest,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct TextKey {
    pub digest: u64,
    pub width: u32,
}

pub(crate) fn floor_width(width: f64) -> u32 {
    if width.is_nan() || width <= 0.0 {
        0
    } else {
        width.floor().min(f64::from(u32::MAX)) as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub plans: usize,
    pub text_sizes: usize,
    pub single_line_widths: usize,
    pub row_heights: usize,
}

struct CacheInner {
    plans: LruCache<PlanKey, Arc<LayoutPlan>>,
    text_sizes: LruCache<TextKey, Size>,
    /// Raw text to the minimal width at which it fits on one line.
    single_line_widths: LruCache<String, f64>,
    /// Last measured height per stable id, at whatever width it was measured.
    row_heights: LruCache<i64, f64>,
}

/// Cheap to clone; clones share storage.
#[derive(Clone)]
pub struct LayoutCache {
    inner: Arc<Mutex<CacheInner>>,
}

impl std::fmt::Debug for LayoutCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutCache")
            .field("stats", &self.stats())
            .finish()
    }
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

fn capacity(value: usize) -> NonZeroUsize {
    NonZeroUsize::new(value).unwrap_or(NonZeroUsize::MIN)
}

impl LayoutCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CacheInner {
                plans: LruCache::new(capacity(config.plan_capacity)),
                text_sizes: LruCache::new(capacity(config.text_capacity)),
                single_line_widths: LruCache::new(capacity(config.single_line_capacity)),
                row_heights: LruCache::new(capacity(config.row_height_capacity)),
            })),
        }
    }

    // Entries are plain values, so a panic mid-write cannot leave them torn.
    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn plan(&self, key: &PlanKey) -> Option<Arc<LayoutPlan>> {
        self.lock().plans.get(key).cloned()
    }

    pub fn insert_plan(&self, key: PlanKey, plan: Arc<LayoutPlan>) {
        self.lock().plans.put(key, plan);
    }

    pub(crate) fn text_size(&self, key: &TextKey) -> Option<Size> {
        self.lock().text_sizes.get(key).copied()
    }

    pub(crate) fn insert_text_size(&self, key: TextKey, size: Size) {
        self.lock().text_sizes.put(key, size);
    }

    pub fn single_line_width(&self, text: &str) -> Option<f64> {
        self.lock().single_line_widths.get(text).copied()
    }

    pub(crate) fn record_single_line_width(&self, text: &str, width: f64) {
        self.lock().single_line_widths.put(text.to_string(), width);
    }

    pub(crate) fn evict_single_line_width(&self, text: &str) {
        self.lock().single_line_widths.pop(text);
    }

    pub fn row_height(&self, stable_id: i64) -> Option<f64> {
        self.lock().row_heights.get(&stable_id).copied()
    }

    pub fn record_row_height(&self, stable_id: i64, height: f64) {
        self.lock().row_heights.put(stable_id, height);
    }

    pub fn forget_row(&self, stable_id: i64) {
        self.lock().row_heights.pop(&stable_id);
    }

    /// Drop every entry. Used when fonts or metrics change.
    pub fn invalidate(&self) {
        let mut inner = self.lock();
        inner.plans.clear();
        inner.text_sizes.clear();
        inner.single_line_widths.clear();
        inner.row_heights.clear();
        tracing::debug!(target: "chatlist::layout", "Layout caches invalidated");
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            plans: inner.plans.len(),
            text_sizes: inner.text_sizes.len(),
            single_line_widths: inner.single_line_widths.len(),
            row_heights: inner.row_heights.len(),
        }
    }
}
