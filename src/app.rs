//! Media Wall App
//!
//! Page composition and feed control: issues page/search fetches with
//! cancellation and sequence guards, and feeds the grid.

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api::{self, Cancellation, RequestSeq};
use crate::components::{FeedTabs, MasonryGrid};
use crate::context::{AppContext, DetailRequest};
use crate::image_cache::ImageCache;
use crate::models::{ingest, FeedMode, MediaItem, MediaKind};
use crate::store::{
    layout_key, store_append_items, store_remove_item, store_replace_items, FeedState,
    FeedStateStoreFields, FeedStore,
};
use reactive_stores::Store;

/// Items requested per timeline/random page.
const PAGE_SIZE: u32 = 20;

#[component]
pub fn App() -> impl IntoView {
    // Detail view + drawer context
    let (detail, set_detail) = signal(None::<DetailRequest>);
    let (drawer_open, set_drawer_open) = signal(false);
    let ctx = AppContext::new((detail, set_detail), (drawer_open, set_drawer_open));
    provide_context(ctx);

    let store: FeedStore = Store::new(FeedState::new());
    provide_context(store);
    provide_context(ImageCache::new());

    // One logical resource (the visible feed), one ticket sequence. A
    // feed switch or new search supersedes whatever is still in flight.
    let feed_seq = RequestSeq::new();
    let active_fetch = StoredValue::new_local(None::<Cancellation>);

    let load_page = move |reset: bool| {
        if !reset && store.loading().get_untracked() {
            return;
        }
        let ticket = feed_seq.issue();
        active_fetch.update_value(|slot| {
            if let Some(prev) = slot.take() {
                prev.abort();
            }
        });
        store.loading().set(true);

        let mode = store.mode().get_untracked();
        let query = store.query().get_untracked();
        let cursor = if reset { None } else { store.cursor().get_untracked() };

        let cancellation = Cancellation::new().ok();
        let abort_signal = cancellation.as_ref().map(|c| c.signal());
        active_fetch.set_value(cancellation);

        let feed_seq = feed_seq.clone();
        spawn_local(async move {
            let result = if query.is_empty() {
                api::fetch_page(cursor, mode, PAGE_SIZE, abort_signal.as_ref())
                    .await
                    .map(|page| (page.items, page.next_cursor))
            } else {
                api::search(&query, abort_signal.as_ref())
                    .await
                    .map(|res| (res.items, None))
            };

            if !feed_seq.is_current(ticket) {
                // A newer request owns the feed now; this response is stale.
                web_sys::console::log_1(
                    &format!("[Feed] dropping superseded response (ticket {})", ticket).into(),
                );
                return;
            }

            match result {
                Ok((raw, next_cursor)) => {
                    let ingested = ingest(raw);
                    if ingested.rejected > 0 {
                        web_sys::console::warn_1(
                            &format!("[Feed] rejected {} malformed rows", ingested.rejected).into(),
                        );
                    }
                    if reset {
                        let has_more = query.is_empty()
                            && (next_cursor.is_some() || mode == FeedMode::Random);
                        store_replace_items(&store, ingested.items, next_cursor, has_more);
                    } else {
                        store_append_items(&store, ingested.items, next_cursor);
                    }
                }
                Err(e) => {
                    web_sys::console::error_1(&format!("[Feed] load failed: {}", e).into());
                }
            }
            store.loading().set(false);
        });
    };

    // Initial page
    {
        let load_page = load_page.clone();
        Effect::new(move |_| {
            load_page(true);
        });
    }

    let on_load_more = {
        let load_page = load_page.clone();
        Callback::new(move |_| load_page(false))
    };

    let on_select_mode = {
        let load_page = load_page.clone();
        Callback::new(move |mode: FeedMode| {
            store.mode().set(mode);
            store.query().set(String::new());
            store.items().set(Vec::new());
            store.cursor().set(None);
            store.has_more().set(true);
            load_page(true);
        })
    };

    let on_search = {
        let load_page = load_page.clone();
        Callback::new(move |query: String| {
            if query.is_empty() {
                store.mode().set(FeedMode::Timeline);
            }
            store.query().set(query);
            store.items().set(Vec::new());
            load_page(true);
        })
    };

    let on_item_click = Callback::new(move |(item, active_member): (MediaItem, usize)| {
        ctx.open_detail(item, active_member);
    });

    let on_item_delete = Callback::new(move |id: i64| {
        spawn_local(async move {
            match api::delete_item(id).await {
                Ok(()) => {
                    web_sys::console::log_1(&format!("[Feed] deleted item {}", id).into());
                    store_remove_item(&store, id);
                }
                Err(e) => {
                    web_sys::console::error_1(
                        &format!("[Feed] delete of {} failed: {}", id, e).into(),
                    );
                }
            }
        });
    });

    view! {
        <div class="app-layout">
            <Show when=move || drawer_open.get()>
                <aside class="side-drawer">
                    <h2>"Archive"</h2>
                    <p class="drawer-hint">"Timeline, random shuffle and search over everything the bot has collected."</p>
                </aside>
            </Show>

            <main class="main-content">
                <header class="top-bar">
                    <button class="drawer-toggle" on:click=move |_| ctx.toggle_drawer()>"☰"</button>
                    <h1>"Media Wall"</h1>
                    <FeedTabs
                        mode=Signal::derive(move || store.mode().get())
                        query=Signal::derive(move || store.query().get())
                        on_select_mode=on_select_mode
                        on_search=on_search
                    />
                </header>

                <MasonryGrid
                    items=Signal::derive(move || store.items().get())
                    layout_key=Signal::derive(move || layout_key(store.mode().get(), &store.query().get()))
                    loading=Signal::derive(move || store.loading().get())
                    has_more=Signal::derive(move || store.has_more().get())
                    on_load_more=on_load_more
                    on_item_click=on_item_click
                    on_item_delete=on_item_delete
                />

                <p class="item-count">
                    {move || format!("{} items loaded", store.items().get().len())}
                </p>
            </main>

            <DetailOverlay />
        </div>
    }
}

/// Thin stand-in for the detail view collaborator: shows the clicked
/// member full-size with its backend link.
#[component]
fn DetailOverlay() -> impl IntoView {
    let ctx = expect_context::<AppContext>();
    let detail = ctx.detail;
    let (tg_link, set_tg_link) = signal(None::<String>);

    Effect::new(move |_| {
        let Some(req) = detail.get() else {
            set_tg_link.set(None);
            return;
        };
        set_tg_link.set(None);
        // Fetch the member on screen, not the album representative.
        let shown_id = req.item.member_at(req.active_member).id;
        spawn_local(async move {
            match api::get_item(shown_id).await {
                Ok(d) => set_tg_link.set(d.tg_link),
                Err(e) => {
                    web_sys::console::error_1(&format!("[Detail] fetch failed: {}", e).into());
                }
            }
        });
    });

    view! {
        <Show when=move || detail.get().is_some()>
            <div class="detail-overlay" on:click=move |_| ctx.close_detail()>
                {move || {
                    detail.get().map(|req| {
                        let shown = req.item.member_at(req.active_member).clone();
                        view! {
                            <div class="detail-card" on:click=|ev| ev.stop_propagation()>
                                {media_detail_view(&shown)}
                                {shown.content.clone().map(|text| view! { <p class="detail-caption">{text}</p> })}
                                {move || {
                                    tg_link.get().map(|link| view! {
                                        <a class="detail-link" href=link target="_blank">"Open in Telegram"</a>
                                    })
                                }}
                            </div>
                        }
                    })
                }}
            </div>
        </Show>
    }
}

fn media_detail_view(item: &MediaItem) -> AnyView {
    let url = item.url.clone().unwrap_or_default();
    match item.kind {
        MediaKind::Text => ().into_any(),
        MediaKind::Image => view! { <img class="detail-media" src=url /> }.into_any(),
        MediaKind::Video => {
            view! { <video class="detail-media" src=url controls=true></video> }.into_any()
        }
    }
}
