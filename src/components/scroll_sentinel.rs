//! Infinite-Scroll Sentinel
//!
//! An IntersectionObserver on an invisible element below the grid triggers
//! the next page fetch before the user reaches the literal bottom.

use leptos::html::Div;
use leptos::prelude::*;
use wasm_bindgen::prelude::Closure;
use wasm_bindgen::JsCast;
use web_sys::{IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit};

/// How far below the viewport the sentinel starts counting as visible, px.
const LOAD_AHEAD_PX: i32 = 800;

type ObserverCallback = Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>;

/// Sentinel element that requests the next page when scrolled near.
///
/// While `loading` is true or `has_more` is false the observer callback
/// stays silent; the caller resets `loading` on success, failure and
/// cancellation alike so the trigger can never wedge shut.
#[component]
pub fn ScrollSentinel(
    loading: Signal<bool>,
    has_more: Signal<bool>,
    /// Scroll container the observer uses as its root.
    scroll_root: NodeRef<Div>,
    #[prop(into)] on_load_more: Callback<()>,
) -> impl IntoView {
    let sentinel_ref = NodeRef::<Div>::new();
    // Owns the observer and its callback for the component's lifetime.
    let observer_slot = StoredValue::new_local(None::<(IntersectionObserver, ObserverCallback)>);

    Effect::new(move |_| {
        let Some(sentinel) = sentinel_ref.get() else { return };
        let Some(root) = scroll_root.get() else { return };

        // Node refs changed (remount): the old observer watches a dead node.
        observer_slot.update_value(|slot| {
            if let Some((observer, _)) = slot.take() {
                observer.disconnect();
            }
        });

        let callback: ObserverCallback = Closure::new(
            move |entries: js_sys::Array, _observer: IntersectionObserver| {
                for entry in entries.iter() {
                    let entry: IntersectionObserverEntry = entry.unchecked_into();
                    if !entry.is_intersecting() {
                        continue;
                    }
                    if loading.get_untracked() || !has_more.get_untracked() {
                        continue;
                    }
                    on_load_more.run(());
                }
            },
        );

        let options = IntersectionObserverInit::new();
        options.set_root(Some(root.as_ref()));
        options.set_root_margin(&format!("0px 0px {}px 0px", LOAD_AHEAD_PX));

        match IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &options) {
            Ok(observer) => {
                observer.observe(&sentinel);
                observer_slot.set_value(Some((observer, callback)));
            }
            Err(e) => {
                web_sys::console::error_1(
                    &format!("[Sentinel] observer setup failed: {:?}", e).into(),
                );
            }
        }
    });

    on_cleanup(move || {
        observer_slot.update_value(|slot| {
            if let Some((observer, _)) = slot.take() {
                observer.disconnect();
            }
        });
    });

    view! {
        <div class="scroll-sentinel" node_ref=sentinel_ref></div>
    }
}
