//! Image URL resolution for CMS items
//!
//! Items carry their image in one of several places depending on how the
//! content type was set up: an ACF `image` field (URL or media ID), an
//! embedded featured media object, or a bare `featured_media` ID. The first
//! usable source wins.

use reqwest::Url;
use serde_json::Value;

/// Hosts whose uploads the site serves through its own `/wp-content/` proxy
pub const PROXIED_HOSTS: &[&str] = &["cavundur.online", "rscn.local"];

/// Media endpoint URL for a media ID
pub fn media_endpoint_url(api_base: &str, id: u64) -> String {
    format!("{}/media/{}", api_base.trim_end_matches('/'), id)
}

/// Rewrites a CMS upload URL to the site-relative path the proxy serves
///
/// Only `/wp-content/` URLs on [`PROXIED_HOSTS`] are rewritten; anything
/// else, including strings that do not parse as URLs, is returned as is.
pub fn proxy_url(url: &str) -> String {
    if url.is_empty() {
        return String::new();
    }
    match Url::parse(url) {
        Ok(parsed) => {
            let proxied = parsed
                .host_str()
                .is_some_and(|host| PROXIED_HOSTS.contains(&host));
            if proxied && parsed.path().starts_with("/wp-content/") {
                parsed.path().to_string()
            } else {
                url.to_string()
            }
        }
        Err(err) => {
            tracing::debug!(url, error = %err, "not a URL, leaving unproxied");
            url.to_string()
        }
    }
}

/// Resolves the best image URL for `post`
///
/// Order of preference:
/// 1. `acf.image` holding an absolute URL
/// 2. `acf.image` holding a media ID
/// 3. `featured_media` ID when nothing is embedded
/// 4. embedded featured media, at `size` if available, else its original
/// 5. `featured_media` ID as a last resort
pub fn featured_media_url(post: &Value, size: &str, api_base: &str) -> Option<String> {
    if post.is_null() {
        return None;
    }

    match post.pointer("/acf/image") {
        Some(Value::String(url)) if url.starts_with("http") => return Some(url.clone()),
        Some(Value::Number(id)) => {
            if let Some(id) = id.as_u64().filter(|id| *id > 0) {
                return Some(media_endpoint_url(api_base, id));
            }
        }
        _ => {}
    }

    let featured_id = post
        .get("featured_media")
        .and_then(Value::as_u64)
        .filter(|id| *id > 0);
    let embedded = post.pointer("/_embedded/wp:featuredmedia");

    if let (Some(id), None) = (featured_id, embedded) {
        return Some(media_endpoint_url(api_base, id));
    }

    if let Some(media) = embedded.and_then(|list| list.get(0)) {
        let sized = media
            .get("media_details")
            .and_then(|details| details.get("sizes"))
            .and_then(|sizes| sizes.get(size))
            .and_then(|sized| sized.get("source_url"))
            .and_then(Value::as_str);
        if let Some(url) = sized {
            return Some(url.to_string());
        }
        if let Some(url) = media.get("source_url").and_then(Value::as_str) {
            return Some(url.to_string());
        }
    }

    featured_id.map(|id| media_endpoint_url(api_base, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const API: &str = "https://cms.example/wp-json/wp/v2";

    #[test]
    fn test_acf_image_url_wins() {
        let post = json!({
            "acf": { "image": "https://cdn.example/a.jpg" },
            "featured_media": 12,
            "_embedded": { "wp:featuredmedia": [{ "source_url": "https://cdn.example/b.jpg" }] }
        });

        assert_eq!(
            featured_media_url(&post, "large", API).as_deref(),
            Some("https://cdn.example/a.jpg")
        );
    }

    #[test]
    fn test_acf_image_id_builds_media_url() {
        let post = json!({ "acf": { "image": 77 } });
        assert_eq!(
            featured_media_url(&post, "large", API).as_deref(),
            Some("https://cms.example/wp-json/wp/v2/media/77")
        );
    }

    #[test]
    fn test_acf_image_relative_string_is_skipped() {
        let post = json!({
            "acf": { "image": "/uploads/a.jpg" },
            "_embedded": { "wp:featuredmedia": [{ "source_url": "https://cdn.example/b.jpg" }] }
        });
        assert_eq!(
            featured_media_url(&post, "large", API).as_deref(),
            Some("https://cdn.example/b.jpg")
        );
    }

    #[test]
    fn test_acf_image_zero_falls_through_to_embed() {
        let post = json!({
            "acf": { "image": 0 },
            "_embedded": { "wp:featuredmedia": [{ "source_url": "https://cdn.example/x.jpg" }] }
        });
        assert_eq!(
            featured_media_url(&post, "large", API).as_deref(),
            Some("https://cdn.example/x.jpg")
        );
    }

    #[test]
    fn test_featured_id_without_embed() {
        let post = json!({ "featured_media": 5 });
        assert_eq!(
            featured_media_url(&post, "large", API).as_deref(),
            Some("https://cms.example/wp-json/wp/v2/media/5")
        );
    }

    #[test]
    fn test_embedded_sized_image_preferred_over_original() {
        let post = json!({
            "featured_media": 9,
            "_embedded": { "wp:featuredmedia": [{
                "source_url": "https://cdn.example/full.jpg",
                "media_details": { "sizes": {
                    "large": { "source_url": "https://cdn.example/large.jpg" },
                    "thumbnail": { "source_url": "https://cdn.example/thumb.jpg" }
                }}
            }]}
        });

        assert_eq!(
            featured_media_url(&post, "thumbnail", API).as_deref(),
            Some("https://cdn.example/thumb.jpg")
        );
        assert_eq!(
            featured_media_url(&post, "medium", API).as_deref(),
            Some("https://cdn.example/full.jpg")
        );
    }

    #[test]
    fn test_empty_embed_falls_back_to_featured_id() {
        let post = json!({ "featured_media": 3, "_embedded": { "wp:featuredmedia": [] } });
        assert_eq!(
            featured_media_url(&post, "large", API).as_deref(),
            Some("https://cms.example/wp-json/wp/v2/media/3")
        );
    }

    #[test]
    fn test_no_image_anywhere() {
        assert!(featured_media_url(&json!({ "featured_media": 0 }), "large", API).is_none());
        assert!(featured_media_url(&json!({}), "large", API).is_none());
        assert!(featured_media_url(&Value::Null, "large", API).is_none());
    }

    #[test]
    fn test_media_endpoint_url_trims_trailing_slash() {
        assert_eq!(
            media_endpoint_url("https://cms.example/wp-json/wp/v2/", 1),
            "https://cms.example/wp-json/wp/v2/media/1"
        );
    }

    #[test]
    fn test_proxy_url_rewrites_uploads_on_cms_hosts() {
        assert_eq!(
            proxy_url("https://cavundur.online/wp-content/uploads/2024/05/a.jpg"),
            "/wp-content/uploads/2024/05/a.jpg"
        );
        assert_eq!(
            proxy_url("http://rscn.local/wp-content/uploads/b.png"),
            "/wp-content/uploads/b.png"
        );
    }

    #[test]
    fn test_proxy_url_leaves_other_urls_alone() {
        assert_eq!(
            proxy_url("https://cdn.example/wp-content/a.jpg"),
            "https://cdn.example/wp-content/a.jpg"
        );
        assert_eq!(
            proxy_url("https://cavundur.online/wp-json/wp/v2/media/3"),
            "https://cavundur.online/wp-json/wp/v2/media/3"
        );
        assert_eq!(proxy_url("/uploads/relative.jpg"), "/uploads/relative.jpg");
        assert_eq!(proxy_url(""), "");
    }
}
