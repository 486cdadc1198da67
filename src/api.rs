//! Archive API Client
//!
//! Fetch bindings to the archive backend, with abortable requests and a
//! per-resource sequence guard so a superseded response can never clobber
//! newer state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{AbortController, AbortSignal, Request, RequestInit, Response};

use crate::models::{FeedMode, ItemDetail, Page, SearchResult};

const API_BASE: &str = "/api/v1";

/// Wraps an `AbortController` for one logical in-flight request.
#[derive(Clone)]
pub struct Cancellation {
    controller: AbortController,
}

impl Cancellation {
    pub fn new() -> Result<Self, String> {
        let controller = AbortController::new().map_err(js_err)?;
        Ok(Self { controller })
    }

    pub fn signal(&self) -> AbortSignal {
        self.controller.signal()
    }

    /// Abort the request this cancellation was attached to.
    pub fn abort(&self) {
        self.controller.abort();
    }
}

/// Monotone ticket dispenser for one logical resource (the feed, the
/// search box). A response is applied only while its ticket is still the
/// latest issued; anything older was superseded and must be dropped.
#[derive(Clone, Default)]
pub struct RequestSeq {
    latest: Arc<AtomicU64>,
}

impl RequestSeq {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next ticket, superseding all earlier ones.
    pub fn issue(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        self.latest.load(Ordering::Relaxed) == ticket
    }
}

/// One page of the items feed.
pub async fn fetch_page(
    cursor: Option<i64>,
    mode: FeedMode,
    limit: u32,
    signal: Option<&AbortSignal>,
) -> Result<Page, String> {
    let mut url = format!("{}/items?limit={}&mode={}", API_BASE, limit, mode.as_query());
    if let Some(cursor) = cursor {
        url.push_str(&format!("&cursor={}", cursor));
    }
    let json = fetch_json(&url, "GET", signal).await?;
    serde_wasm_bindgen::from_value(json).map_err(|e| e.to_string())
}

/// One-shot hybrid search.
pub async fn search(query: &str, signal: Option<&AbortSignal>) -> Result<SearchResult, String> {
    let encoded = utf8_percent_encode(query, NON_ALPHANUMERIC);
    let url = format!("{}/search?q={}", API_BASE, encoded);
    let json = fetch_json(&url, "GET", signal).await?;
    serde_wasm_bindgen::from_value(json).map_err(|e| e.to_string())
}

/// Full detail for one item (detail view collaborator).
pub async fn get_item(id: i64) -> Result<ItemDetail, String> {
    let url = format!("{}/items/{}", API_BASE, id);
    let json = fetch_json(&url, "GET", None).await?;
    serde_wasm_bindgen::from_value(json).map_err(|e| e.to_string())
}

/// Delete an item. The caller filters it out of the visible list on success.
pub async fn delete_item(id: i64) -> Result<(), String> {
    let url = format!("{}/items/{}", API_BASE, id);
    let _ = fetch_json(&url, "DELETE", None).await?;
    Ok(())
}

async fn fetch_json(url: &str, method: &str, signal: Option<&AbortSignal>) -> Result<JsValue, String> {
    let opts = RequestInit::new();
    opts.set_method(method);
    if let Some(signal) = signal {
        opts.set_signal(Some(signal));
    }
    let request = Request::new_with_str_and_init(url, &opts).map_err(js_err)?;

    let window = web_sys::window().ok_or_else(|| "no window".to_string())?;
    let response = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(js_err)?;
    let response: Response = response.dyn_into().map_err(|_| "not a Response".to_string())?;
    if !response.ok() {
        return Err(format!("HTTP {} for {}", response.status(), url));
    }
    JsFuture::from(response.json().map_err(js_err)?)
        .await
        .map_err(js_err)
}

fn js_err(value: JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tickets_are_monotone() {
        let seq = RequestSeq::new();
        let a = seq.issue();
        let b = seq.issue();
        assert!(b > a);
        assert!(!seq.is_current(a));
        assert!(seq.is_current(b));
    }

    #[test]
    fn test_stale_response_is_rejected() {
        // Fetch A is issued, then superseded by fetch B before resolving.
        // B resolves first; A arrives late. Only B's payload may land.
        let seq = RequestSeq::new();
        let mut applied: Vec<&str> = Vec::new();

        let ticket_a = seq.issue();
        let ticket_b = seq.issue();

        // B resolves.
        if seq.is_current(ticket_b) {
            applied = vec!["b1", "b2"];
        }
        // A resolves afterwards, out of order.
        if seq.is_current(ticket_a) {
            applied = vec!["a1"];
        }

        assert_eq!(applied, vec!["b1", "b2"]);
    }

    #[test]
    fn test_clones_share_the_counter() {
        let seq = RequestSeq::new();
        let handle = seq.clone();
        let ticket = seq.issue();
        assert!(handle.is_current(ticket));
        handle.issue();
        assert!(!seq.is_current(ticket));
    }
}
