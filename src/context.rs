//! Application Context
//!
//! Shared state provided via Leptos Context API.

use leptos::prelude::*;

use crate::models::MediaItem;

/// A card click forwarded to the detail view: the clicked item plus, for
/// album representatives, which member was visually active.
#[derive(Clone, Debug, PartialEq)]
pub struct DetailRequest {
    pub item: MediaItem,
    pub active_member: usize,
}

/// App-wide signals provided via context
#[derive(Clone, Copy)]
pub struct AppContext {
    /// Item the detail view should show (None = closed) - read
    pub detail: ReadSignal<Option<DetailRequest>>,
    set_detail: WriteSignal<Option<DetailRequest>>,
    /// Whether the side drawer is open - read
    pub drawer_open: ReadSignal<bool>,
    set_drawer_open: WriteSignal<bool>,
}

impl AppContext {
    pub fn new(
        detail: (ReadSignal<Option<DetailRequest>>, WriteSignal<Option<DetailRequest>>),
        drawer_open: (ReadSignal<bool>, WriteSignal<bool>),
    ) -> Self {
        Self {
            detail: detail.0,
            set_detail: detail.1,
            drawer_open: drawer_open.0,
            set_drawer_open: drawer_open.1,
        }
    }

    /// Ask the detail view to open on `item`, at `active_member` for albums.
    pub fn open_detail(&self, item: MediaItem, active_member: usize) {
        self.set_detail.set(Some(DetailRequest { item, active_member }));
    }

    pub fn close_detail(&self) {
        self.set_detail.set(None);
    }

    pub fn toggle_drawer(&self) {
        self.set_drawer_open.update(|open| *open = !*open);
    }
}
