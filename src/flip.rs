//! FLIP Animation
//!
//! After each layout commit, cards that moved are animated from their old
//! geometry to the new one with composited transforms instead of snapping.
//! The planning half is pure and probe-driven so it can be tested with
//! canned geometry; the driver half talks to the Web Animations API.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::Serialize;
use wasm_bindgen::JsCast;
use web_sys::{Animation, Element, KeyframeAnimationOptions};

/// Transition duration, ms.
pub const FLIP_DURATION_MS: f64 = 260.0;
/// Ease-out curve for re-layout transitions.
pub const FLIP_EASING: &str = "cubic-bezier(0.2, 0.0, 0.0, 1.0)";

/// Position offsets closer than this are treated as unchanged, px.
const POSITION_EPSILON: f64 = 0.5;
/// Relative size deltas below this are treated as unchanged.
const SCALE_EPSILON: f64 = 0.005;

/// Container-relative geometry of one card.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self { top, left, width, height }
    }

    /// True when two rects differ by less than the animation epsilons.
    pub fn approx_eq(&self, other: &Rect) -> bool {
        let pos_ok = (self.top - other.top).abs() < POSITION_EPSILON
            && (self.left - other.left).abs() < POSITION_EPSILON;
        let rel = |a: f64, b: f64| {
            if b.abs() < f64::EPSILON {
                a.abs() < f64::EPSILON
            } else {
                ((a - b) / b).abs() < SCALE_EPSILON
            }
        };
        pos_ok && rel(self.width, other.width) && rel(self.height, other.height)
    }
}

/// Reads real card geometry. The DOM implementation lives in the grid;
/// tests inject canned rects.
pub trait GeometryProbe {
    /// Committed (untransformed) geometry of a mounted card.
    fn target_rect(&self, key: &str) -> Option<Rect>;
    /// On-screen geometry right now, including any in-flight transform.
    fn live_rect(&self, key: &str) -> Option<Rect>;
    /// Whether an animation for this card is still running.
    fn is_animating(&self, key: &str) -> bool;
}

/// One card queued for this commit's diff pass.
#[derive(Debug, Clone)]
pub struct FlipCandidate {
    pub key: String,
    /// Set while a pending resize leaves this card's column height
    /// unsettled; the diff for it is postponed to the next commit.
    pub defer: bool,
}

/// What the driver should do for one card after a commit.
#[derive(Debug, Clone, PartialEq)]
pub enum FlipAction {
    /// Play a transform animation from `from` to `to`.
    Animate { key: String, from: Rect, to: Rect },
    /// Cancel any in-flight animation and leave the card at rest.
    Settle { key: String },
}

/// Per-key snapshot store plus the diff decision logic.
#[derive(Debug, Default)]
pub struct FlipBook {
    snapshots: HashMap<String, Rect>,
}

impl FlipBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything. Called when the layout key changes: the new item
    /// set must not be diffed against the old feed's geometry.
    pub fn reset(&mut self) {
        self.snapshots.clear();
    }

    /// Drop snapshots for cards that left the mounted set.
    pub fn retain_mounted(&mut self, mounted: &[String]) {
        self.snapshots.retain(|k, _| mounted.iter().any(|m| m == k));
    }

    /// Diff every mounted card's previous geometry against its newly
    /// committed one and decide what to animate.
    ///
    /// - First appearance: record the rect, no animation.
    /// - Unreadable geometry: skip this cycle, keep the old snapshot.
    /// - Deferred (resize not settled): skip, keep the old snapshot so the
    ///   move is animated once heights have stabilized.
    /// - Already animating: the new animation starts from the live rect,
    ///   not the stale snapshot, so a retarget never snaps.
    pub fn plan(&mut self, candidates: &[FlipCandidate], probe: &dyn GeometryProbe) -> Vec<FlipAction> {
        let mut actions = Vec::new();

        for candidate in candidates {
            let key = &candidate.key;
            if candidate.defer {
                continue;
            }
            let Some(to) = probe.target_rect(key) else {
                continue;
            };

            match self.snapshots.get(key).copied() {
                None => {
                    self.snapshots.insert(key.clone(), to);
                }
                Some(prev) => {
                    let animating = probe.is_animating(key);
                    let from = if animating {
                        probe.live_rect(key).unwrap_or(prev)
                    } else {
                        prev
                    };
                    self.snapshots.insert(key.clone(), to);
                    if from.approx_eq(&to) {
                        if animating {
                            actions.push(FlipAction::Settle { key: key.clone() });
                        }
                    } else {
                        actions.push(FlipAction::Animate { key: key.clone(), from, to });
                    }
                }
            }
        }

        actions
    }

    #[cfg(test)]
    fn snapshot(&self, key: &str) -> Option<Rect> {
        self.snapshots.get(key).copied()
    }
}

#[derive(Serialize)]
struct TransformKeyframe {
    transform: String,
    #[serde(rename = "transformOrigin")]
    transform_origin: &'static str,
}

/// Owns the Web Animations handles for in-flight card transitions.
///
/// One animation per card at most: a retarget cancels the previous one
/// before starting its successor. Animations never touch inline styles, so
/// there is nothing to clean up after they finish or get canceled.
#[derive(Clone, Default)]
pub struct FlipDriver {
    animations: Rc<RefCell<HashMap<String, Animation>>>,
}

impl FlipDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a previously started animation for this card is still running.
    pub fn is_animating(&self, key: &str) -> bool {
        self.animations
            .borrow()
            .get(key)
            .map(|a| a.play_state() == web_sys::AnimationPlayState::Running)
            .unwrap_or(false)
    }

    /// Cancel and forget every animation (layout key change).
    pub fn cancel_all(&self) {
        for (_, animation) in self.animations.borrow_mut().drain() {
            animation.cancel();
        }
    }

    /// Drop finished or unmounted entries.
    pub fn retain_mounted(&self, mounted: &[String]) {
        self.animations.borrow_mut().retain(|k, animation| {
            if mounted.iter().any(|m| m == k) {
                true
            } else {
                animation.cancel();
                false
            }
        });
    }

    /// Execute one commit's worth of planned actions.
    pub fn apply(&self, actions: &[FlipAction], element_for: impl Fn(&str) -> Option<Element>) {
        for action in actions {
            match action {
                FlipAction::Settle { key } => {
                    if let Some(animation) = self.animations.borrow_mut().remove(key) {
                        animation.cancel();
                    }
                }
                FlipAction::Animate { key, from, to } => {
                    let Some(element) = element_for(key) else { continue };
                    if let Some(prev) = self.animations.borrow_mut().remove(key) {
                        prev.cancel();
                    }
                    if let Some(animation) = animate_move(&element, from, to) {
                        self.animations.borrow_mut().insert(key.clone(), animation);
                    }
                }
            }
        }
    }
}

/// Start a composited move: the card visually begins at `from` and eases
/// into `to`, which is where layout already put it.
fn animate_move(element: &Element, from: &Rect, to: &Rect) -> Option<Animation> {
    if to.width <= 0.0 || to.height <= 0.0 {
        return None;
    }
    let dx = from.left - to.left;
    let dy = from.top - to.top;
    let sx = (from.width / to.width).max(0.01);
    let sy = (from.height / to.height).max(0.01);

    let keyframes = [
        TransformKeyframe {
            transform: format!("translate({dx:.2}px, {dy:.2}px) scale({sx:.4}, {sy:.4})"),
            transform_origin: "top left",
        },
        TransformKeyframe {
            transform: "none".to_string(),
            transform_origin: "top left",
        },
    ];
    let keyframes = serde_wasm_bindgen::to_value(&keyframes).ok()?;

    let options = KeyframeAnimationOptions::new();
    options.set_duration(FLIP_DURATION_MS.into());
    options.set_easing(FLIP_EASING);

    let animation = element.animate_with_keyframe_animation_options(
        Some(keyframes.unchecked_ref()),
        &options,
    );
    Some(animation)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Canned geometry for planner tests, no DOM involved.
    #[derive(Default)]
    struct MockProbe {
        targets: HashMap<String, Rect>,
        live: HashMap<String, Rect>,
        animating: Vec<String>,
    }

    impl MockProbe {
        fn with_target(mut self, key: &str, rect: Rect) -> Self {
            self.targets.insert(key.to_string(), rect);
            self
        }

        fn with_live(mut self, key: &str, rect: Rect) -> Self {
            self.live.insert(key.to_string(), rect);
            self.animating.push(key.to_string());
            self
        }
    }

    impl GeometryProbe for MockProbe {
        fn target_rect(&self, key: &str) -> Option<Rect> {
            self.targets.get(key).copied()
        }

        fn live_rect(&self, key: &str) -> Option<Rect> {
            self.live.get(key).copied()
        }

        fn is_animating(&self, key: &str) -> bool {
            self.animating.iter().any(|k| k == key)
        }
    }

    fn candidates(keys: &[&str]) -> Vec<FlipCandidate> {
        keys.iter().map(|k| FlipCandidate { key: k.to_string(), defer: false }).collect()
    }

    #[test]
    fn test_first_appearance_records_without_animating() {
        let mut book = FlipBook::new();
        let probe = MockProbe::default().with_target("a", Rect::new(0.0, 0.0, 300.0, 200.0));
        let actions = book.plan(&candidates(&["a"]), &probe);
        assert!(actions.is_empty());
        assert_eq!(book.snapshot("a"), Some(Rect::new(0.0, 0.0, 300.0, 200.0)));
    }

    #[test]
    fn test_moved_card_animates_from_snapshot() {
        let mut book = FlipBook::new();
        let before = MockProbe::default().with_target("a", Rect::new(0.0, 0.0, 300.0, 200.0));
        book.plan(&candidates(&["a"]), &before);

        let after = MockProbe::default().with_target("a", Rect::new(400.0, 312.0, 300.0, 200.0));
        let actions = book.plan(&candidates(&["a"]), &after);
        assert_eq!(
            actions,
            vec![FlipAction::Animate {
                key: "a".to_string(),
                from: Rect::new(0.0, 0.0, 300.0, 200.0),
                to: Rect::new(400.0, 312.0, 300.0, 200.0),
            }]
        );
    }

    #[test]
    fn test_unmoved_card_does_nothing() {
        let mut book = FlipBook::new();
        let probe = MockProbe::default().with_target("a", Rect::new(100.0, 0.0, 300.0, 200.0));
        book.plan(&candidates(&["a"]), &probe);
        // Sub-epsilon jitter is not a move.
        let probe = MockProbe::default().with_target("a", Rect::new(100.3, 0.2, 300.5, 200.0));
        let actions = book.plan(&candidates(&["a"]), &probe);
        assert!(actions.is_empty());
    }

    #[test]
    fn test_retarget_starts_from_live_rect() {
        let mut book = FlipBook::new();
        let probe = MockProbe::default().with_target("a", Rect::new(0.0, 0.0, 300.0, 200.0));
        book.plan(&candidates(&["a"]), &probe);

        // First move commits; animation starts toward (400, 312).
        let probe = MockProbe::default().with_target("a", Rect::new(400.0, 312.0, 300.0, 200.0));
        book.plan(&candidates(&["a"]), &probe);

        // Second move commits mid-flight. The card is visually at (180, 140)
        // right now; the new animation must start there, not at (0, 0) and
        // not at (400, 312).
        let live = Rect::new(180.0, 140.0, 300.0, 200.0);
        let probe = MockProbe::default()
            .with_target("a", Rect::new(800.0, 0.0, 300.0, 200.0))
            .with_live("a", live);
        let actions = book.plan(&candidates(&["a"]), &probe);
        assert_eq!(
            actions,
            vec![FlipAction::Animate {
                key: "a".to_string(),
                from: live,
                to: Rect::new(800.0, 0.0, 300.0, 200.0),
            }]
        );
    }

    #[test]
    fn test_retarget_back_to_rest_settles() {
        let mut book = FlipBook::new();
        let probe = MockProbe::default().with_target("a", Rect::new(0.0, 0.0, 300.0, 200.0));
        book.plan(&candidates(&["a"]), &probe);
        let probe = MockProbe::default().with_target("a", Rect::new(400.0, 0.0, 300.0, 200.0));
        book.plan(&candidates(&["a"]), &probe);

        // Mid-flight the layout reverts and the card is already visually at
        // its (unchanged) target: cancel rather than animate a no-op.
        let probe = MockProbe::default()
            .with_target("a", Rect::new(400.0, 0.0, 300.0, 200.0))
            .with_live("a", Rect::new(400.0, 0.0, 300.0, 200.0));
        let actions = book.plan(&candidates(&["a"]), &probe);
        assert_eq!(actions, vec![FlipAction::Settle { key: "a".to_string() }]);
    }

    #[test]
    fn test_unreadable_geometry_skips_cycle() {
        let mut book = FlipBook::new();
        let probe = MockProbe::default().with_target("a", Rect::new(0.0, 0.0, 300.0, 200.0));
        book.plan(&candidates(&["a"]), &probe);

        // Node unmounted mid-measurement: no target rect this cycle.
        let probe = MockProbe::default();
        let actions = book.plan(&candidates(&["a"]), &probe);
        assert!(actions.is_empty());
        // Snapshot survives for the next cycle.
        assert!(book.snapshot("a").is_some());
    }

    #[test]
    fn test_deferred_card_keeps_old_snapshot() {
        let mut book = FlipBook::new();
        let probe = MockProbe::default().with_target("a", Rect::new(0.0, 0.0, 300.0, 200.0));
        book.plan(&candidates(&["a"]), &probe);

        // Resize pending: diff postponed, snapshot untouched.
        let deferred = vec![FlipCandidate { key: "a".to_string(), defer: true }];
        let probe = MockProbe::default().with_target("a", Rect::new(0.0, 0.0, 220.0, 370.0));
        assert!(book.plan(&deferred, &probe).is_empty());

        // Once settled, the move is animated from the pre-resize geometry.
        let probe = MockProbe::default().with_target("a", Rect::new(50.0, 0.0, 220.0, 360.0));
        let actions = book.plan(&candidates(&["a"]), &probe);
        assert_eq!(
            actions,
            vec![FlipAction::Animate {
                key: "a".to_string(),
                from: Rect::new(0.0, 0.0, 300.0, 200.0),
                to: Rect::new(50.0, 0.0, 220.0, 360.0),
            }]
        );
    }

    #[test]
    fn test_reset_and_retain() {
        let mut book = FlipBook::new();
        let probe = MockProbe::default()
            .with_target("a", Rect::new(0.0, 0.0, 300.0, 200.0))
            .with_target("b", Rect::new(220.0, 0.0, 300.0, 90.0));
        book.plan(&candidates(&["a", "b"]), &probe);

        book.retain_mounted(&["b".to_string()]);
        assert!(book.snapshot("a").is_none());
        assert!(book.snapshot("b").is_some());

        book.reset();
        assert!(book.snapshot("b").is_none());
    }
}
