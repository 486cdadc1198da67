//! Feed Tab Bar Component
//!
//! Timeline/random switch plus the search box. Enter submits; an empty
//! query falls back to the plain feed.

use leptos::prelude::*;

use crate::models::FeedMode;

#[component]
pub fn FeedTabs(
    mode: Signal<FeedMode>,
    query: Signal<String>,
    #[prop(into)] on_select_mode: Callback<FeedMode>,
    #[prop(into)] on_search: Callback<String>,
) -> impl IntoView {
    let (input_value, set_input_value) = signal(String::new());

    let submit = move || {
        on_search.run(input_value.get_untracked().trim().to_string());
    };

    let select_timeline = move |_| {
        set_input_value.set(String::new());
        on_select_mode.run(FeedMode::Timeline);
    };
    let select_random = move |_| {
        set_input_value.set(String::new());
        on_select_mode.run(FeedMode::Random);
    };

    view! {
        <div class="feed-tabs">
            <button
                class="feed-tab"
                class:active=move || query.get().is_empty() && mode.get() == FeedMode::Timeline
                on:click=select_timeline
            >
                "Timeline"
            </button>
            <button
                class="feed-tab"
                class:active=move || query.get().is_empty() && mode.get() == FeedMode::Random
                on:click=select_random
            >
                "Random"
            </button>
            <input
                class="feed-search"
                type="text"
                placeholder="Search the archive..."
                prop:value=input_value
                on:input=move |ev| set_input_value.set(event_target_value(&ev))
                on:keydown=move |ev: web_sys::KeyboardEvent| {
                    if ev.key() == "Enter" {
                        submit();
                    }
                }
            />
        </div>
    }
}
