//! Album Grouping
//!
//! Collapses items sharing a group id into one representative card that
//! carries all members. Pure; re-run from scratch on every list change.

use std::collections::HashMap;

use crate::models::MediaItem;

/// Merge album members into their first-seen representative.
///
/// - Items without a group id pass through unchanged.
/// - The first item of each group becomes the representative, at the
///   position of that first appearance.
/// - Later members are appended to the representative's `members` list,
///   skipping ids already collected (duplicate input is idempotent).
/// - The group caption is the first non-empty caption seen among members;
///   once resolved it is applied retroactively to every member already
///   collected and to the representative itself.
pub fn group_albums(items: &[MediaItem]) -> Vec<MediaItem> {
    let mut out: Vec<MediaItem> = Vec::with_capacity(items.len());
    // group id -> index of its representative in `out`
    let mut seen: HashMap<String, usize> = HashMap::new();

    for item in items {
        let Some(group_id) = item.group_id.clone() else {
            out.push(item.clone());
            continue;
        };

        match seen.get(&group_id).copied() {
            None => {
                let mut rep = item.clone();
                rep.members = vec![item.clone()];
                seen.insert(group_id, out.len());
                out.push(rep);
            }
            Some(idx) => {
                let rep = &mut out[idx];
                if rep.members.iter().any(|m| m.id == item.id) {
                    continue;
                }
                let mut member = item.clone();
                if rep.content.is_some() {
                    // Caption already resolved; members inherit it.
                    member.content = rep.content.clone();
                    rep.members.push(member);
                } else if member.content.is_some() {
                    // First caption in the group: propagate backwards.
                    let caption = member.content.clone();
                    rep.content = caption.clone();
                    for m in rep.members.iter_mut() {
                        m.content = caption.clone();
                    }
                    rep.members.push(member);
                } else {
                    rep.members.push(member);
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MediaItem, MediaKind};

    fn make_item(id: i64, group_id: Option<&str>, content: Option<&str>) -> MediaItem {
        MediaItem {
            id,
            kind: MediaKind::Image,
            content: content.map(|c| c.to_string()),
            url: Some(format!("http://s3/{}.jpg", id)),
            thumbnail_url: None,
            created_at: None,
            width: None,
            height: None,
            group_id: group_id.map(|g| g.to_string()),
            client_key: None,
            members: Vec::new(),
        }
    }

    #[test]
    fn test_ungrouped_items_pass_through() {
        let items = vec![make_item(1, None, None), make_item(2, None, Some("b"))];
        let out = group_albums(&items);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].id, 1);
        assert_eq!(out[1].id, 2);
        assert_eq!(out[1].content.as_deref(), Some("b"));
    }

    #[test]
    fn test_group_collapses_to_first_occurrence() {
        let items = vec![
            make_item(1, None, None),
            make_item(2, Some("g"), None),
            make_item(3, None, None),
            make_item(4, Some("g"), None),
            make_item(5, Some("g"), None),
        ];
        let out = group_albums(&items);
        // Representative sits where member 2 first appeared.
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].id, 1);
        assert_eq!(out[1].id, 2);
        assert_eq!(out[2].id, 3);
        assert_eq!(out[1].members.iter().map(|m| m.id).collect::<Vec<_>>(), vec![2, 4, 5]);
        assert!(out[1].is_album());
    }

    #[test]
    fn test_caption_propagates_to_all_members() {
        let items = vec![
            make_item(1, Some("g"), None),
            make_item(2, Some("g"), Some("caption")),
            make_item(3, Some("g"), None),
        ];
        let out = group_albums(&items);
        assert_eq!(out.len(), 1);
        let rep = &out[0];
        assert_eq!(rep.members.len(), 3);
        assert_eq!(rep.content.as_deref(), Some("caption"));
        for m in &rep.members {
            assert_eq!(m.content.as_deref(), Some("caption"));
        }
    }

    #[test]
    fn test_first_caption_wins() {
        let items = vec![
            make_item(1, Some("g"), Some("first")),
            make_item(2, Some("g"), Some("second")),
        ];
        let out = group_albums(&items);
        assert_eq!(out[0].content.as_deref(), Some("first"));
        assert_eq!(out[0].members[1].content.as_deref(), Some("first"));
    }

    #[test]
    fn test_duplicate_member_ids_deduped() {
        let items = vec![
            make_item(1, Some("g"), None),
            make_item(2, Some("g"), None),
            make_item(2, Some("g"), None),
        ];
        let out = group_albums(&items);
        assert_eq!(out[0].members.len(), 2);
    }

    #[test]
    fn test_idempotent_on_grouped_output() {
        let items = vec![
            make_item(1, Some("g"), Some("cap")),
            make_item(2, Some("g"), None),
            make_item(3, None, None),
        ];
        let once = group_albums(&items);
        // Representatives are atomic on a second pass: their group is fully
        // collected, so regrouping the output must change nothing.
        let twice = group_albums(
            &once
                .iter()
                .map(|rep| {
                    let mut r = rep.clone();
                    r.group_id = None;
                    r
                })
                .collect::<Vec<_>>(),
        );
        assert_eq!(once.len(), twice.len());
        for (a, b) in once.iter().zip(twice.iter()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.content, b.content);
            assert_eq!(
                a.members.iter().map(|m| m.id).collect::<Vec<_>>(),
                b.members.iter().map(|m| m.id).collect::<Vec<_>>()
            );
        }
    }

    #[test]
    fn test_relative_order_of_groups_preserved() {
        let items = vec![
            make_item(1, Some("a"), None),
            make_item(2, Some("b"), None),
            make_item(3, Some("a"), None),
            make_item(4, None, None),
            make_item(5, Some("b"), None),
        ];
        let out = group_albums(&items);
        assert_eq!(out.iter().map(|i| i.id).collect::<Vec<_>>(), vec![1, 2, 4]);
    }
}
