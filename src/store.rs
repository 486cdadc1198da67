//! Global Feed State Store
//!
//! Uses Leptos reactive_stores for fine-grained reactivity over the
//! currently loaded feed.

use leptos::prelude::*;
use reactive_stores::Store;

use crate::models::{FeedMode, MediaItem};

/// Everything the page knows about the feed being browsed.
#[derive(Clone, Debug, Default, Store)]
pub struct FeedState {
    /// Validated items in display order, before album grouping.
    pub items: Vec<MediaItem>,
    /// Which listing the items came from.
    pub mode: FeedMode,
    /// Active search query; empty means the plain feed.
    pub query: String,
    /// Cursor for the next timeline page.
    pub cursor: Option<i64>,
    /// A fetch is in flight; gates the infinite-scroll trigger.
    pub loading: bool,
    /// More pages exist behind `cursor`.
    pub has_more: bool,
    /// Count of pages appended to this feed; random-mode client keys are
    /// derived from it because server ids may repeat across pages.
    pub pages_loaded: u32,
}

impl FeedState {
    pub fn new() -> Self {
        Self {
            has_more: true,
            ..Default::default()
        }
    }
}

/// Layout key for the current semantic item set. Changing feed or query
/// changes the key, which resets layout and animation caches downstream.
pub fn layout_key(mode: FeedMode, query: &str) -> String {
    if query.is_empty() {
        format!("feed:{}", mode.as_query())
    } else {
        format!("search:{}", query)
    }
}

/// Type alias for the store
pub type FeedStore = Store<FeedState>;

// ========================
// Store Helper Functions
// ========================

/// Append a page of items to the feed.
pub fn store_append_items(store: &FeedStore, mut new_items: Vec<MediaItem>, next_cursor: Option<i64>) {
    let page = store.pages_loaded().get_untracked();
    if store.mode().get_untracked() == FeedMode::Random {
        // Random pages may repeat server ids; give every entry a key that
        // is unique within this render list.
        for (i, item) in new_items.iter_mut().enumerate() {
            item.client_key = Some(format!("r{}-{}-{}", page, i, item.id));
        }
    }
    store.items().write().extend(new_items);
    store.cursor().set(next_cursor);
    store
        .has_more()
        .set(next_cursor.is_some() || store.mode().get_untracked() == FeedMode::Random);
    store.pages_loaded().update(|p| *p += 1);
}

/// Replace the feed wholesale (feed switch, new search).
pub fn store_replace_items(store: &FeedStore, items: Vec<MediaItem>, next_cursor: Option<i64>, has_more: bool) {
    store.items().set(items);
    store.cursor().set(next_cursor);
    store.has_more().set(has_more);
    store.pages_loaded().set(1);
}

/// Remove an item from the feed by server id (after a successful delete).
pub fn store_remove_item(store: &FeedStore, item_id: i64) {
    store.items().write().retain(|item| item.id != item_id);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_key_distinguishes_feeds() {
        let timeline = layout_key(FeedMode::Timeline, "");
        let random = layout_key(FeedMode::Random, "");
        let search = layout_key(FeedMode::Timeline, "cats");
        assert_ne!(timeline, random);
        assert_ne!(timeline, search);
        assert_eq!(timeline, layout_key(FeedMode::Timeline, ""));
    }
}
