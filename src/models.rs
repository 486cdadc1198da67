//! Frontend Models
//!
//! Data structures matching the archive backend, plus ingestion validation
//! that turns loosely-shaped API rows into typed media items.

use serde::{Deserialize, Serialize};

/// One row of a `/api/v1/items` page, as the backend serializes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawItem {
    pub id: i64,
    #[serde(rename = "type")]
    pub item_type: String,
    pub content: Option<String>,
    pub s3_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub group_id: Option<String>,
}

/// Which ordering the items listing serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedMode {
    /// Cursor-paginated, newest first.
    #[default]
    Timeline,
    /// Random sample per page; server ids may repeat across pages.
    Random,
}

impl FeedMode {
    pub fn as_query(&self) -> &'static str {
        match self {
            FeedMode::Timeline => "timeline",
            FeedMode::Random => "random",
        }
    }
}

/// One page of the items listing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Page {
    pub items: Vec<RawItem>,
    pub next_cursor: Option<i64>,
}

/// Search response (non-paginated).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchResult {
    pub items: Vec<RawItem>,
}

/// Single-item detail, consumed by the detail view.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ItemDetail {
    pub id: i64,
    #[serde(rename = "type")]
    pub item_type: String,
    pub content_text: Option<String>,
    pub searchable_text: Option<String>,
    pub s3_url: Option<String>,
    pub tg_link: Option<String>,
    pub created_at: Option<String>,
    #[serde(default)]
    pub tags: Vec<i32>,
}

/// Validated media variant. Decided once at ingestion so rendering and
/// layout never re-check item shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Text,
    Image,
    Video,
}

/// A validated, displayable content unit.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaItem {
    pub id: i64,
    pub kind: MediaKind,
    /// Caption text. For album members this is the group's resolved caption.
    pub content: Option<String>,
    pub url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub created_at: Option<String>,
    /// Intrinsic media dimensions, when the backend knows them.
    pub width: Option<f64>,
    pub height: Option<f64>,
    /// Album identifier; items sharing one render as a single card.
    pub group_id: Option<String>,
    /// Client-generated key for feeds where server ids may repeat
    /// (random mode appends possibly-duplicate items across pages).
    pub client_key: Option<String>,
    /// Album members, populated only on the group representative,
    /// in first-seen order.
    pub members: Vec<MediaItem>,
}

impl MediaItem {
    /// The identity used for layout positions, FLIP snapshots and render keys.
    pub fn key(&self) -> String {
        match &self.client_key {
            Some(k) => k.clone(),
            None => self.id.to_string(),
        }
    }

    /// True when this item stands in for a multi-item album.
    pub fn is_album(&self) -> bool {
        self.members.len() > 1
    }

    /// Album member at `idx`, or the item itself when it has no members
    /// or the index is stale.
    pub fn member_at(&self, idx: usize) -> &MediaItem {
        self.members.get(idx).unwrap_or(self)
    }
}

/// Result of validating one page of raw rows.
pub struct Ingested {
    pub items: Vec<MediaItem>,
    pub rejected: usize,
}

/// Validate raw API rows into typed media items.
///
/// Unknown `type` strings and image/video rows without a URL are dropped
/// here (counted, reported by the caller) so downstream code can assume
/// every item is renderable. Rows with a missing caption simply carry
/// `content = None`.
pub fn ingest(raw: Vec<RawItem>) -> Ingested {
    let mut items = Vec::with_capacity(raw.len());
    let mut rejected = 0;

    for row in raw {
        let kind = match row.item_type.as_str() {
            "text" => MediaKind::Text,
            "image" => MediaKind::Image,
            "video" => MediaKind::Video,
            _ => {
                rejected += 1;
                continue;
            }
        };
        if matches!(kind, MediaKind::Image | MediaKind::Video) && row.s3_url.is_none() {
            rejected += 1;
            continue;
        }
        // Whitespace-only captions count as absent for grouping purposes.
        let content = row.content.filter(|c| !c.trim().is_empty());
        items.push(MediaItem {
            id: row.id,
            kind,
            content,
            url: row.s3_url,
            thumbnail_url: row.thumbnail_url,
            created_at: row.created_at,
            width: row.width.filter(|w| *w > 0.0),
            height: row.height.filter(|h| *h > 0.0),
            group_id: row.group_id.filter(|g| !g.is_empty()),
            client_key: None,
            members: Vec::new(),
        });
    }

    Ingested { items, rejected }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_raw(id: i64, item_type: &str, s3_url: Option<&str>) -> RawItem {
        RawItem {
            id,
            item_type: item_type.to_string(),
            content: None,
            s3_url: s3_url.map(|s| s.to_string()),
            thumbnail_url: None,
            created_at: None,
            width: None,
            height: None,
            group_id: None,
        }
    }

    #[test]
    fn test_ingest_accepts_known_kinds() {
        let raw = vec![
            make_raw(1, "text", None),
            make_raw(2, "image", Some("http://s3/a.jpg")),
            make_raw(3, "video", Some("http://s3/b.mp4")),
        ];
        let out = ingest(raw);
        assert_eq!(out.rejected, 0);
        assert_eq!(out.items.len(), 3);
        assert_eq!(out.items[0].kind, MediaKind::Text);
        assert_eq!(out.items[1].kind, MediaKind::Image);
        assert_eq!(out.items[2].kind, MediaKind::Video);
    }

    #[test]
    fn test_ingest_rejects_malformed_rows() {
        let raw = vec![
            make_raw(1, "sticker", None),
            make_raw(2, "image", None), // media without a URL
            make_raw(3, "text", None),
        ];
        let out = ingest(raw);
        assert_eq!(out.rejected, 2);
        assert_eq!(out.items.len(), 1);
        assert_eq!(out.items[0].id, 3);
    }

    #[test]
    fn test_ingest_normalizes_blank_fields() {
        let mut row = make_raw(1, "text", None);
        row.content = Some("   ".to_string());
        row.group_id = Some("".to_string());
        row.width = Some(0.0);
        let out = ingest(vec![row]);
        let item = &out.items[0];
        assert_eq!(item.content, None);
        assert_eq!(item.group_id, None);
        assert_eq!(item.width, None);
    }

    #[test]
    fn test_member_at_picks_the_active_member() {
        let mut rep = ingest(vec![make_raw(1, "image", Some("http://s3/1.jpg"))]).items.remove(0);
        let second = ingest(vec![make_raw(2, "image", Some("http://s3/2.jpg"))]).items.remove(0);
        rep.members = vec![rep.clone(), second];
        // The active member is addressed by id, not the representative.
        assert_eq!(rep.member_at(0).id, 1);
        assert_eq!(rep.member_at(1).id, 2);
        // Stale or out-of-range index falls back to the item itself.
        assert_eq!(rep.member_at(9).id, 1);
        let solo = ingest(vec![make_raw(3, "text", None)]).items.remove(0);
        assert_eq!(solo.member_at(0).id, 3);
    }

    #[test]
    fn test_key_prefers_client_key() {
        let mut item = ingest(vec![make_raw(7, "text", None)]).items.remove(0);
        assert_eq!(item.key(), "7");
        item.client_key = Some("r0-7".to_string());
        assert_eq!(item.key(), "r0-7");
    }
}
