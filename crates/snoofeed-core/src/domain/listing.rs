//! Traversal of Reddit listing envelopes.
//!
//! A listing arrives as `{"kind": "Listing", "data": {"children": [...],
//! "after": ..., "before": ...}}`; the comments endpoint wraps two of them in
//! a top-level array. Helpers here tolerate every missing layer and skip
//! malformed children instead of failing the whole page.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::models::{Comment, Post};

/// Opaque pagination cursors passed through from the listing envelope.
/// Their content is never interpreted by this layer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageCursors {
    pub after: Option<String>,
    pub before: Option<String>,
}

impl PageCursors {
    pub fn from_listing(payload: &Value) -> Self {
        let data = payload.get("data");
        Self {
            after: data
                .and_then(|d| d.get("after"))
                .and_then(Value::as_str)
                .map(str::to_string),
            before: data
                .and_then(|d| d.get("before"))
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }
}

/// The `data.children` array of a listing, or empty when any layer is absent.
pub fn listing_children(payload: &Value) -> &[Value] {
    payload
        .get("data")
        .and_then(|data| data.get("children"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Posts (`kind == "t3"`) from a listing; children that fail to parse are
/// skipped.
pub fn posts_from_listing(payload: &Value) -> Vec<Post> {
    listing_children(payload)
        .iter()
        .filter(|child| child.get("kind").and_then(Value::as_str) == Some("t3"))
        .filter_map(|child| child.get("data").and_then(Value::as_object))
        .filter_map(|data| Post::from_raw(data).ok())
        .collect()
}

/// Top-level comments (`kind == "t1"`) from a listing, without replies.
pub fn comments_from_listing(payload: &Value) -> Vec<Comment> {
    comments_at_depth(payload, 0)
}

/// Comments from the two-element `[post-listing, comment-listing]` payload
/// returned by the comments endpoint, with replies parsed down to `depth`.
pub fn comment_tree(payload: &Value, depth: u32) -> Vec<Comment> {
    let comment_listing = match payload.as_array() {
        Some(parts) if parts.len() >= 2 => &parts[1],
        Some(parts) if parts.len() == 1 => &parts[0],
        _ => payload,
    };
    comments_at_depth(comment_listing, depth)
}

fn comments_at_depth(payload: &Value, depth: u32) -> Vec<Comment> {
    listing_children(payload)
        .iter()
        .filter(|child| child.get("kind").and_then(Value::as_str) == Some("t1"))
        .filter_map(|child| child.get("data").and_then(Value::as_object))
        .filter_map(|data| Comment::from_raw(data, depth).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn post_listing() -> Value {
        json!({
            "kind": "Listing",
            "data": {
                "after": "t3_next",
                "before": null,
                "children": [
                    {"kind": "t3", "data": {"name": "t3_a", "title": "first"}},
                    {"kind": "t3", "data": {"title": "missing id, skipped"}},
                    {"kind": "t1", "data": {"name": "t1_not_a_post"}},
                    {"kind": "t3", "data": {"name": "t3_b", "title": "second"}},
                ]
            }
        })
    }

    #[test]
    fn posts_keep_order_and_skip_bad_children() {
        let posts = posts_from_listing(&post_listing());
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].id, "t3_a");
        assert_eq!(posts[1].id, "t3_b");
    }

    #[test]
    fn cursors_pass_through_opaquely() {
        let cursors = PageCursors::from_listing(&post_listing());
        assert_eq!(cursors.after.as_deref(), Some("t3_next"));
        assert_eq!(cursors.before, None);
    }

    #[test]
    fn missing_layers_mean_empty_results() {
        assert!(listing_children(&json!({})).is_empty());
        assert!(listing_children(&json!({"data": {}})).is_empty());
        assert!(listing_children(&json!({"data": {"children": null}})).is_empty());
        assert!(posts_from_listing(&json!("not even an object")).is_empty());
        assert_eq!(PageCursors::from_listing(&json!({})), PageCursors::default());
    }

    #[test]
    fn comment_tree_reads_the_second_array_element() {
        let payload = json!([
            {"kind": "Listing", "data": {"children": [
                {"kind": "t3", "data": {"name": "t3_post"}}
            ]}},
            {"kind": "Listing", "data": {"children": [
                {"kind": "t1", "data": {"name": "t1_a", "body": "hi"}},
                {"kind": "more", "data": {}}
            ]}}
        ]);

        let comments = comment_tree(&payload, 2);
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].id, "t1_a");
    }

    #[test]
    fn comment_tree_tolerates_a_bare_listing() {
        let payload = json!({"kind": "Listing", "data": {"children": [
            {"kind": "t1", "data": {"name": "t1_only"}}
        ]}});

        let comments = comment_tree(&payload, 0);
        assert_eq!(comments.len(), 1);
    }
}
