//! Loaded-Image Registry
//!
//! Session-wide record of image URLs the browser has already fetched, so
//! cards and preview panes can skip their loading placeholder for images
//! seen earlier. Explicitly injected (Leptos context in the app, a plain
//! instance in tests) rather than an ambient global.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use wasm_bindgen::{prelude::Closure, JsCast};

/// Append-only set of fully-loaded image URLs plus the set currently being
/// warmed. Entries live for the session, never evicted.
#[derive(Clone, Default)]
pub struct ImageCache {
    loaded: Arc<Mutex<HashSet<String>>>,
    pending: Arc<Mutex<HashSet<String>>>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self, url: &str) -> bool {
        self.loaded.lock().map(|set| set.contains(url)).unwrap_or(false)
    }

    /// Record a URL as fully fetched.
    pub fn mark_loaded(&self, url: &str) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.remove(url);
        }
        if let Ok(mut loaded) = self.loaded.lock() {
            loaded.insert(url.to_string());
        }
    }

    /// Start a background fetch for `url` unless it is already loaded or
    /// already being warmed. Used by album cards to warm the next member's
    /// image before the user pages to it.
    pub fn preload(&self, url: &str) {
        if self.is_loaded(url) {
            return;
        }
        match self.pending.lock() {
            Ok(mut pending) => {
                if !pending.insert(url.to_string()) {
                    return;
                }
            }
            _ => return,
        }
        let Ok(img) = web_sys::HtmlImageElement::new() else {
            if let Ok(mut pending) = self.pending.lock() {
                pending.remove(url);
            }
            return;
        };
        let cache = self.clone();
        let url_owned = url.to_string();
        let onload = Closure::once_into_js(move || {
            cache.mark_loaded(&url_owned);
        });
        img.set_onload(Some(onload.unchecked_ref()));
        img.set_src(url);
    }

    #[cfg(test)]
    fn loaded_count(&self) -> usize {
        self.loaded.lock().map(|set| set.len()).unwrap_or(0)
    }
}
