//! Virtualization Window
//!
//! Decides which laid-out cards are near enough to the viewport to mount.
//! Pure; the grid component feeds it live scroll metrics.

use crate::layout::Layout;

/// Extra margin rendered beyond the visible area, px, to hide pop-in
/// during fast scrolls.
pub const OVERSCAN_PX: f64 = 600.0;
/// No scroll events for this long means scrolling has settled.
pub const SCROLL_IDLE_MS: u32 = 140;
/// After a column-count change, every card stays mounted this long so its
/// real height can be measured once at the new column width.
pub const MEASURE_SETTLE_MS: u32 = 500;
/// Window height assumed when the scroll container is not yet measurable.
const FALLBACK_VIEWPORT_HEIGHT: f64 = 900.0;

/// Live metrics of the scroll container.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub scroll_top: f64,
    pub height: f64,
}

/// Indices (into `layout.positions`) of the cards to mount.
///
/// While `measuring` is set the entire list is returned regardless of the
/// scroll position, so every card gets one real-height measurement at the
/// new column width. Missing metrics degrade to a window anchored at the
/// top rather than rendering nothing.
pub fn visible_indices(layout: &Layout, viewport: Option<Viewport>, measuring: bool) -> Vec<usize> {
    if measuring {
        return (0..layout.positions.len()).collect();
    }

    let (min, max) = match viewport {
        Some(vp) => (vp.scroll_top - OVERSCAN_PX, vp.scroll_top + vp.height + OVERSCAN_PX),
        None => (0.0, FALLBACK_VIEWPORT_HEIGHT + OVERSCAN_PX),
    };

    layout
        .positions
        .iter()
        .enumerate()
        .filter(|(_, (_, pos))| pos.top + pos.height >= min && pos.top <= max)
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Layout, LayoutPosition};

    fn make_layout(count: usize, item_height: f64) -> Layout {
        // One column of equal cards stacked with no gap, heights controlled.
        let positions = (0..count)
            .map(|i| {
                (
                    i.to_string(),
                    LayoutPosition {
                        top: i as f64 * item_height,
                        left: 0.0,
                        width: 300.0,
                        height: item_height,
                        column: 0,
                    },
                )
            })
            .collect();
        Layout { positions, total_height: count as f64 * item_height }
    }

    #[test]
    fn test_window_includes_only_near_viewport() {
        let layout = make_layout(100, 200.0);
        let vp = Viewport { scroll_top: 4000.0, height: 800.0 };
        let visible = visible_indices(&layout, Some(vp), false);
        // Range is [3400, 5400] with the 600px overscan.
        assert!(!visible.is_empty());
        assert!(visible.len() < 100);
        for i in &visible {
            let pos = &layout.positions[*i].1;
            assert!(pos.top + pos.height >= 3400.0);
            assert!(pos.top <= 5400.0);
        }
        // Neighbors just outside the window stay unmounted.
        let first = visible[0];
        let last = *visible.last().unwrap();
        if first > 0 {
            assert!(layout.positions[first - 1].1.top + 200.0 < 3400.0);
        }
        assert!(layout.positions[last + 1].1.top > 5400.0);
    }

    #[test]
    fn test_measuring_phase_mounts_everything() {
        let layout = make_layout(100, 200.0);
        let vp = Viewport { scroll_top: 12_000.0, height: 800.0 };
        let visible = visible_indices(&layout, Some(vp), true);
        assert_eq!(visible, (0..100).collect::<Vec<_>>());
        // After the settle window the normal overscan window resumes.
        let settled = visible_indices(&layout, Some(vp), false);
        assert!(settled.len() < 100);
    }

    #[test]
    fn test_missing_metrics_fall_back_to_top_window() {
        let layout = make_layout(100, 200.0);
        let visible = visible_indices(&layout, None, false);
        assert!(!visible.is_empty());
        assert_eq!(visible[0], 0);
    }

    #[test]
    fn test_empty_layout() {
        let layout = Layout::default();
        assert!(visible_indices(&layout, None, false).is_empty());
        assert!(visible_indices(&layout, None, true).is_empty());
    }
}
