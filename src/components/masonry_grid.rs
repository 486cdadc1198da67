//! Masonry Grid Component
//!
//! The grid orchestrator: groups albums, assigns columns, virtualizes the
//! render window, and FLIP-animates cards between layouts. Recomputes on
//! data arrival, viewport resize, deletion and feed switches.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use gloo_timers::future::TimeoutFuture;
use leptos::ev;
use leptos::html::Div;
use leptos::prelude::*;
use leptos::task::spawn_local;
use wasm_bindgen::prelude::Closure;
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlElement};

use crate::components::{MediaCard, ScrollSentinel};
use crate::context::AppContext;
use crate::flip::{FlipBook, FlipCandidate, FlipDriver, GeometryProbe, Rect};
use crate::grouping::group_albums;
use crate::layout::{
    column_count_for_width, column_width, compute_layout, HeightCache, Layout, LayoutGeneration,
};
use crate::models::MediaItem;
use crate::virtualize::{visible_indices, Viewport, MEASURE_SETTLE_MS, SCROLL_IDLE_MS};

/// Fixed width of the side drawer when open, px. Subtracted from the
/// window width whenever the scroll container cannot be measured directly.
const SIDE_DRAWER_WIDTH: f64 = 280.0;

#[component]
pub fn MasonryGrid(
    /// Validated items in feed order, before album grouping.
    #[prop(into)] items: Signal<Vec<MediaItem>>,
    /// Changes whenever the semantic item set changes (feed, query);
    /// resets the layout and animation caches without a remount.
    #[prop(into)] layout_key: Signal<String>,
    #[prop(into)] loading: Signal<bool>,
    #[prop(into)] has_more: Signal<bool>,
    #[prop(into)] on_load_more: Callback<()>,
    #[prop(into)] on_item_click: Callback<(MediaItem, usize)>,
    #[prop(into)] on_item_delete: Callback<i64>,
) -> impl IntoView {
    let ctx = use_context::<AppContext>();

    let scroll_ref = NodeRef::<Div>::new();
    let grid_ref = NodeRef::<Div>::new();

    let (container_width, set_container_width) = signal(0.0_f64);
    let (columns, set_columns) = signal(0usize);
    let (measuring, set_measuring) = signal(true);
    let (viewport, set_viewport) = signal::<Option<Viewport>>(None);
    let (scrolling, set_scrolling) = signal(false);
    let (layout, set_layout) = signal(Layout::default());
    let (visible, set_visible) = signal(Vec::<usize>::new());
    // Bumped when a fresh DOM measurement should trigger a re-layout.
    let (measure_tick, set_measure_tick) = signal(0u32);

    let generation = Arc::new(Mutex::new(LayoutGeneration::new()));
    let heights = Arc::new(Mutex::new(HeightCache::new()));
    let flip_book = Arc::new(Mutex::new(FlipBook::new()));
    let flip_driver = FlipDriver::new();

    let display_items = Memo::new(move |_| group_albums(&items.get()));

    // Container width: live client width of the scroll container, falling
    // back to window width minus the drawer before first mount.
    let read_width = move || {
        let measured = scroll_ref
            .get_untracked()
            .map(|el| el.client_width() as f64)
            .filter(|w| *w > 0.0);
        measured.unwrap_or_else(|| {
            let window_width = web_sys::window()
                .and_then(|w| w.inner_width().ok())
                .and_then(|w| w.as_f64())
                .unwrap_or(0.0);
            let drawer = match &ctx {
                Some(ctx) if ctx.drawer_open.get_untracked() => SIDE_DRAWER_WIDTH,
                _ => 0.0,
            };
            (window_width - drawer).max(0.0)
        })
    };

    Effect::new(move |_| {
        // Re-read on mount and whenever the drawer changes the page shape.
        let _ = scroll_ref.get();
        if let Some(ctx) = &ctx {
            let _ = ctx.drawer_open.get();
        }
        set_container_width.set(read_width());
        if let Some(el) = scroll_ref.get_untracked() {
            set_viewport.set(Some(Viewport {
                scroll_top: el.scroll_top() as f64,
                height: el.client_height() as f64,
            }));
        }
    });

    let resize_handle = window_event_listener(ev::resize, move |_| {
        set_container_width.set(read_width());
        if let Some(el) = scroll_ref.get_untracked() {
            set_viewport.set(Some(Viewport {
                scroll_top: el.scroll_top() as f64,
                height: el.client_height() as f64,
            }));
        }
    });
    on_cleanup(move || resize_handle.remove());

    // Column count is a step function of width. Crossing a breakpoint
    // invalidates every measured height and opens a measuring window in
    // which the whole list mounts once at the new column width.
    {
        let heights = heights.clone();
        let measure_serial = Arc::new(AtomicU64::new(0));
        Effect::new(move |prev: Option<usize>| {
            let width = container_width.get();
            if width <= 0.0 {
                return prev.unwrap_or(0);
            }
            let cols = column_count_for_width(width);
            if prev != Some(cols) {
                set_columns.set(cols);
                if let Ok(mut heights) = heights.lock() {
                    heights.clear();
                }
                set_measuring.set(true);
                let serial = measure_serial.fetch_add(1, Ordering::Relaxed) + 1;
                let measure_serial = measure_serial.clone();
                spawn_local(async move {
                    TimeoutFuture::new(MEASURE_SETTLE_MS).await;
                    if measure_serial.load(Ordering::Relaxed) == serial {
                        set_measuring.set(false);
                    }
                });
            }
            cols
        });
    }

    // Layout pass: runs on every data, width, viewport or measurement
    // change. Positions are replaced wholesale, never mutated.
    {
        let generation = generation.clone();
        let heights = heights.clone();
        let flip_book = flip_book.clone();
        let flip_driver = flip_driver.clone();
        Effect::new(move |prev_key: Option<String>| {
            let _ = measure_tick.get();
            let display = display_items.get();
            let key = layout_key.get();
            let cols = columns.get();
            let width = container_width.get();
            let vp = viewport.get();
            let measuring_now = measuring.get();
            if cols == 0 || width <= 0.0 {
                return key;
            }

            if prev_key.as_deref().is_some_and(|prev| prev != key) {
                // New semantic item set: never diff against the old feed.
                if let Ok(mut book) = flip_book.lock() {
                    book.reset();
                }
                flip_driver.cancel_all();
            }

            let gen = match generation.lock() {
                Ok(mut generation) => {
                    let prev_gen = generation.current();
                    let gen = generation.observe(display.len(), &key);
                    if gen != prev_gen {
                        if let Ok(mut heights) = heights.lock() {
                            heights.retain_generation(gen);
                        }
                    }
                    gen
                }
                Err(_) => return key,
            };

            let measured = match heights.lock() {
                Ok(heights) => heights.for_generation(gen),
                Err(_) => HashMap::new(),
            };
            let col_w = column_width(width, cols);
            let new_layout = compute_layout(&display, cols, col_w, &measured);
            let vis = visible_indices(&new_layout, vp, measuring_now);
            set_layout.set(new_layout);
            set_visible.set(vis);
            key
        });
    }

    // Post-commit pass: measure real card heights and plan FLIP moves.
    // Runs after the layout signals have re-rendered the tree.
    {
        let generation = generation.clone();
        let heights = heights.clone();
        let flip_book = flip_book.clone();
        let flip_driver = flip_driver.clone();
        Effect::new(move |_| {
            let current_layout = layout.get();
            let _ = visible.get();
            let _ = scrolling.get();
            let measuring_now = measuring.get_untracked();
            let Some(grid) = grid_ref.get_untracked() else {
                return;
            };
            let grid: &Element = grid.as_ref();

            let mut elements: HashMap<String, Element> = HashMap::new();
            let children = grid.children();
            for i in 0..children.length() {
                if let Some(el) = children.item(i) {
                    if let Some(key) = el.get_attribute("data-key") {
                        elements.insert(key, el);
                    }
                }
            }

            let gen = match generation.lock() {
                Ok(generation) => generation.current(),
                Err(_) => return,
            };

            // Height collection is paused mid-scroll; estimates are close
            // enough until the scroll settles.
            let mut changed = false;
            if !scrolling.get_untracked() || measuring_now {
                if let Ok(mut heights) = heights.lock() {
                    for (key, el) in &elements {
                        if let Some(html) = el.dyn_ref::<HtmlElement>() {
                            let measured = html.offset_height() as f64;
                            if measured > 0.0 {
                                changed |= heights.record(gen, key, measured);
                            }
                        }
                    }
                }
            }

            let mounted: Vec<String> = elements.keys().cloned().collect();
            let candidates: Vec<FlipCandidate> = match heights.lock() {
                Ok(heights) => mounted
                    .iter()
                    .map(|key| FlipCandidate {
                        key: key.clone(),
                        // Until this card is re-measured at the new column
                        // width its committed height is transient; diffing
                        // now would animate from a wrong intermediate.
                        defer: measuring_now && !heights.contains(gen, key),
                    })
                    .collect(),
                Err(_) => return,
            };

            let probe = DomProbe {
                layout: &current_layout,
                elements: &elements,
                grid,
                driver: &flip_driver,
            };
            if let Ok(mut book) = flip_book.lock() {
                let actions = book.plan(&candidates, &probe);
                flip_driver.apply(&actions, |key| elements.get(key).cloned());
                book.retain_mounted(&mounted);
            }
            flip_driver.retain_mounted(&mounted);

            if changed {
                set_measure_tick.update(|t| *t += 1);
            }
        });
    }

    // Scroll metrics: read at most once per frame, with an idle debounce
    // marking the scroll as settled.
    let raf_pending = Arc::new(AtomicBool::new(false));
    let scroll_serial = Arc::new(AtomicU64::new(0));
    let on_scroll = move |_: web_sys::Event| {
        if !raf_pending.swap(true, Ordering::Relaxed) {
            let raf_pending = raf_pending.clone();
            request_frame(move || {
                raf_pending.store(false, Ordering::Relaxed);
                if let Some(el) = scroll_ref.get_untracked() {
                    set_viewport.set(Some(Viewport {
                        scroll_top: el.scroll_top() as f64,
                        height: el.client_height() as f64,
                    }));
                }
            });
        }
        set_scrolling.set(true);
        let serial = scroll_serial.fetch_add(1, Ordering::Relaxed) + 1;
        let scroll_serial = scroll_serial.clone();
        spawn_local(async move {
            TimeoutFuture::new(SCROLL_IDLE_MS).await;
            if scroll_serial.load(Ordering::Relaxed) == serial {
                set_scrolling.set(false);
            }
        });
    };

    let mounted_cards = Memo::new(move |_| {
        let display = display_items.get();
        visible
            .get()
            .into_iter()
            .filter_map(|i| display.get(i).cloned())
            .collect::<Vec<MediaItem>>()
    });

    view! {
        <div class="masonry-scroll" node_ref=scroll_ref on:scroll=on_scroll>
            <div
                class="masonry-grid"
                node_ref=grid_ref
                style:height=move || format!("{}px", layout.get().total_height)
            >
                <For
                    each=move || mounted_cards.get()
                    key=|item| (item.key(), item.members.len(), item.content.clone())
                    children=move |item| {
                        let key = item.key();
                        let style_key = key.clone();
                        let cell_style = move || {
                            match layout.get().get(&style_key) {
                                Some(pos) => format!(
                                    "top: {:.2}px; left: {:.2}px; width: {:.2}px;",
                                    pos.top, pos.left, pos.width
                                ),
                                None => "display: none;".to_string(),
                            }
                        };
                        view! {
                            <div class="masonry-cell" data-key=key style=cell_style>
                                <MediaCard
                                    item=item
                                    on_click=on_item_click
                                    on_delete=on_item_delete
                                />
                            </div>
                        }
                    }
                />
            </div>
            <Show when=move || loading.get()>
                <div class="loading">"Loading..."</div>
            </Show>
            <ScrollSentinel
                loading=loading
                has_more=has_more
                scroll_root=scroll_ref
                on_load_more=on_load_more
            />
        </div>
    }
}

/// Reads committed and live card geometry from the mounted grid.
struct DomProbe<'a> {
    layout: &'a Layout,
    elements: &'a HashMap<String, Element>,
    grid: &'a Element,
    driver: &'a FlipDriver,
}

impl GeometryProbe for DomProbe<'_> {
    fn target_rect(&self, key: &str) -> Option<Rect> {
        // Offset metrics ignore active transforms, so this is the
        // committed layout geometry even mid-animation.
        let element = self.elements.get(key)?;
        let html = element.dyn_ref::<HtmlElement>()?;
        let width = html.offset_width() as f64;
        let height = html.offset_height() as f64;
        if width <= 0.0 || height <= 0.0 {
            // Fall back to the computed position when the node has not
            // produced stable box metrics yet.
            return self.layout.get(key).map(|p| Rect::new(p.top, p.left, p.width, p.height));
        }
        Some(Rect::new(html.offset_top() as f64, html.offset_left() as f64, width, height))
    }

    fn live_rect(&self, key: &str) -> Option<Rect> {
        let element = self.elements.get(key)?;
        let rect = element.get_bounding_client_rect();
        if rect.width() <= 0.0 {
            return None;
        }
        let origin = self.grid.get_bounding_client_rect();
        Some(Rect::new(
            rect.top() - origin.top(),
            rect.left() - origin.left(),
            rect.width(),
            rect.height(),
        ))
    }

    fn is_animating(&self, key: &str) -> bool {
        self.driver.is_animating(key)
    }
}

/// Schedule a one-shot callback for the next animation frame.
fn request_frame(f: impl FnOnce() + 'static) {
    if let Some(window) = web_sys::window() {
        let closure = Closure::once_into_js(f);
        let _ = window.request_animation_frame(closure.unchecked_ref());
    }
}
