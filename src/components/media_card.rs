//! Media Card Component
//!
//! Renders one display item: plain text, image, video, or an album with
//! prev/next navigation over its members. Clicks bubble up with the
//! active member index so the detail view opens on the right photo.

use leptos::prelude::*;

use crate::components::DeleteConfirmButton;
use crate::image_cache::ImageCache;
use crate::models::{MediaItem, MediaKind};

#[component]
pub fn MediaCard(
    item: MediaItem,
    #[prop(into)] on_click: Callback<(MediaItem, usize)>,
    #[prop(into)] on_delete: Callback<i64>,
) -> impl IntoView {
    let cache = expect_context::<ImageCache>();
    let (active_idx, set_active_idx) = signal(0usize);

    let member_count = item.members.len().max(1);
    let is_album = item.is_album();
    let caption = item.content.clone();
    let item_id = item.id;

    // The member currently shown (the item itself when not an album).
    let members = if item.members.is_empty() {
        vec![item.clone()]
    } else {
        item.members.clone()
    };

    // Warm the next album image so paging forward never shows a placeholder.
    {
        let cache = cache.clone();
        let members = members.clone();
        Effect::new(move |_| {
            let idx = active_idx.get();
            if let Some(next) = members.get(idx + 1) {
                if let Some(url) = &next.url {
                    if next.kind == MediaKind::Image {
                        cache.preload(url);
                    }
                }
            }
        });
    }

    let click_item = item.clone();
    let handle_click = move |_| {
        on_click.run((click_item.clone(), active_idx.get_untracked()));
    };

    let prev_member = move |ev: web_sys::MouseEvent| {
        ev.stop_propagation();
        set_active_idx.update(|i| *i = if *i == 0 { member_count - 1 } else { *i - 1 });
    };
    let next_member = move |ev: web_sys::MouseEvent| {
        ev.stop_propagation();
        set_active_idx.update(|i| *i = (*i + 1) % member_count);
    };

    let render_members = members.clone();
    view! {
        <div class="media-card" on:click=handle_click>
            {move || {
                let idx = active_idx.get().min(render_members.len() - 1);
                media_view(&render_members[idx], &cache)
            }}
            {caption.map(|text| view! { <div class="card-caption">{text}</div> })}
            <Show when=move || is_album>
                <div class="album-nav">
                    <button class="album-prev" on:click=prev_member>"‹"</button>
                    <span class="album-counter">
                        {move || format!("{} / {}", active_idx.get() + 1, member_count)}
                    </span>
                    <button class="album-next" on:click=next_member>"›"</button>
                </div>
            </Show>
            <DeleteConfirmButton on_confirm=move |_| on_delete.run(item_id) />
        </div>
    }
}

/// The media portion of a card for one member.
fn media_view(member: &MediaItem, cache: &ImageCache) -> AnyView {
    match member.kind {
        // Text cards are all caption; the caption block below renders it.
        MediaKind::Text => ().into_any(),
        MediaKind::Image => {
            let url = member.url.clone().unwrap_or_default();
            let warm = cache.is_loaded(&url);
            let (loaded, set_loaded) = signal(warm);
            let cache = cache.clone();
            let mark_url = url.clone();
            view! {
                <img
                    class="card-media"
                    class:loading=move || !loaded.get()
                    src=url
                    loading="lazy"
                    on:load=move |_| {
                        cache.mark_loaded(&mark_url);
                        set_loaded.set(true);
                    }
                />
            }
            .into_any()
        }
        MediaKind::Video => {
            let url = member.url.clone().unwrap_or_default();
            let poster = member.thumbnail_url.clone().unwrap_or_default();
            view! {
                <video
                    class="card-media"
                    src=url
                    poster=poster
                    muted=true
                    playsinline=true
                    preload="metadata"
                ></video>
            }
            .into_any()
        }
    }
}
