//! Masonry Layout Core
//!
//! Greedy shortest-column-first packing over estimated (or measured) card
//! heights. Pure math; the grid component feeds it widths and heights and
//! renders the positions it returns.

use std::collections::HashMap;

use crate::models::{MediaItem, MediaKind};

/// Horizontal and vertical gap between cards, px.
pub const GUTTER: f64 = 12.0;
/// Fallback height for media whose intrinsic dimensions are unknown, px.
pub const DEFAULT_MEDIA_HEIGHT: f64 = 240.0;
/// Vertical padding + chrome of one card, px.
const CARD_PADDING: f64 = 24.0;
/// Caption estimate: characters per line at typical column widths.
const CAPTION_CHARS_PER_LINE: f64 = 34.0;
/// Caption estimate: line height, px.
const CAPTION_LINE_HEIGHT: f64 = 20.0;
/// Captions are clamped in CSS, so the estimate is capped too.
const CAPTION_MAX_HEIGHT: f64 = 120.0;

/// Computed rectangle of one card inside the grid container.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutPosition {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
    pub column: usize,
}

/// A full layout pass: positions in item order, keyed by item identity.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub positions: Vec<(String, LayoutPosition)>,
    pub total_height: f64,
}

impl Layout {
    pub fn get(&self, key: &str) -> Option<&LayoutPosition> {
        self.positions.iter().find(|(k, _)| k == key).map(|(_, p)| p)
    }
}

/// Column count as a step function of available width.
///
/// The breakpoints are part of the layout contract; changing them changes
/// which measured-height generation cards land in.
pub fn column_count_for_width(width: f64) -> usize {
    if width < 500.0 {
        1
    } else if width < 700.0 {
        2
    } else if width < 1100.0 {
        3
    } else if width < 1500.0 {
        4
    } else {
        5
    }
}

/// Width of one column given the container width and column count.
pub fn column_width(container_width: f64, columns: usize) -> f64 {
    let columns = columns.max(1) as f64;
    ((container_width - GUTTER * (columns - 1.0)) / columns).max(0.0)
}

/// Estimated card height at a given column width.
///
/// A heuristic, not a promise: it only drives column balance until the real
/// height is measured. Deterministic, and monotonic in caption length.
pub fn estimate_height(item: &MediaItem, column_width: f64) -> f64 {
    let media = match (item.width, item.height) {
        (Some(w), Some(h)) if w > 0.0 => h / w * column_width,
        _ if item.kind != MediaKind::Text => DEFAULT_MEDIA_HEIGHT,
        _ => 0.0,
    };
    let caption = match &item.content {
        Some(text) => {
            let lines = (text.chars().count() as f64 / CAPTION_CHARS_PER_LINE).ceil();
            (lines * CAPTION_LINE_HEIGHT).min(CAPTION_MAX_HEIGHT)
        }
        None => 0.0,
    };
    media + caption + CARD_PADDING
}

/// Assign every item to the currently-shortest column.
///
/// `measured` overrides the estimate for items whose real height is already
/// known at this column width. Ties go to the lowest column index, so a
/// fresh layout fills columns left to right.
pub fn compute_layout(
    items: &[MediaItem],
    columns: usize,
    col_width: f64,
    measured: &HashMap<String, f64>,
) -> Layout {
    let columns = columns.max(1);
    let mut heights = vec![0.0_f64; columns];
    let mut positions = Vec::with_capacity(items.len());

    for item in items {
        let key = item.key();
        let height = measured
            .get(&key)
            .copied()
            .unwrap_or_else(|| estimate_height(item, col_width));

        let mut target = 0;
        for (i, h) in heights.iter().enumerate().skip(1) {
            if *h < heights[target] {
                target = i;
            }
        }

        let top = heights[target];
        positions.push((
            key,
            LayoutPosition {
                top,
                left: target as f64 * (col_width + GUTTER),
                width: col_width,
                height,
                column: target,
            },
        ));
        heights[target] = top + height + GUTTER;
    }

    let total_height = heights.iter().cloned().fold(0.0, f64::max);
    Layout { positions, total_height }
}

/// Tracks layout invalidation across list changes.
///
/// The generation is part of the measured-height cache key: it bumps when
/// the list shrinks (deletion, feed switch) and when the caller's layout key
/// changes (new feed/query under possibly the same length), so positions
/// and measurements from the old list can never be reused for the new one.
#[derive(Debug, Default)]
pub struct LayoutGeneration {
    generation: u64,
    last_len: usize,
    last_key: String,
}

impl LayoutGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the incoming list shape; returns the generation to key caches by.
    pub fn observe(&mut self, len: usize, layout_key: &str) -> u64 {
        if layout_key != self.last_key {
            self.generation += 1;
            self.last_key = layout_key.to_string();
        } else if len < self.last_len {
            self.generation += 1;
        }
        self.last_len = len;
        self.generation
    }

    pub fn current(&self) -> u64 {
        self.generation
    }
}

/// Real card heights reported back from the DOM, keyed by layout
/// generation + item identity.
///
/// The generation in the key is what makes shrink invalidation work: after
/// a deletion or feed switch bumps the generation, lookups for the new list
/// miss and fall back to estimates until the cards are re-measured.
#[derive(Debug, Default)]
pub struct HeightCache {
    heights: HashMap<(u64, String), f64>,
}

impl HeightCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a measured height; returns true when the value changed enough
    /// to warrant a re-layout.
    pub fn record(&mut self, generation: u64, key: &str, height: f64) -> bool {
        match self.heights.get(&(generation, key.to_string())) {
            Some(existing) if (existing - height).abs() < 0.5 => false,
            _ => {
                self.heights.insert((generation, key.to_string()), height);
                true
            }
        }
    }

    /// All measurements belonging to one generation, shaped for
    /// [`compute_layout`].
    pub fn for_generation(&self, generation: u64) -> HashMap<String, f64> {
        self.heights
            .iter()
            .filter(|((g, _), _)| *g == generation)
            .map(|((_, k), h)| (k.clone(), *h))
            .collect()
    }

    pub fn contains(&self, generation: u64, key: &str) -> bool {
        self.heights.contains_key(&(generation, key.to_string()))
    }

    /// Drop measurements from superseded generations.
    pub fn retain_generation(&mut self, generation: u64) {
        self.heights.retain(|(g, _), _| *g == generation);
    }

    /// Forget everything (column count changed; heights are stale at the
    /// new column width).
    pub fn clear(&mut self) {
        self.heights.clear();
    }
}
