//! Typed access to the site's CMS content
//!
//! [`SiteContent`] knows which endpoints and parameters each page of the site
//! needs. Every read goes through the [`ContentGateway`], and every accessor
//! degrades to an empty value when the gateway cannot produce one, so a
//! page can always render something.

pub mod media;
pub mod text;

pub use media::{featured_media_url, proxy_url};
pub use text::{clean_content, format_date};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::batch::fetch_all;
use crate::data::{ContentSource, Params};
use crate::gateway::{ContentGateway, GatewayError};

/// Items per page for paginated listings
pub const PER_PAGE: u32 = 10;

/// Relations embedded in post-like listings
const EMBED_RELATIONS: &str = "wp:featuredmedia,wp:attachment,author";

/// Fields kept in single post and event responses
const DETAIL_FIELDS: &str =
    "id,title,content,excerpt,slug,date,featured_media,acf,_embedded,_links";

/// Fields kept in the services listing
const SERVICE_FIELDS: &str = "id,title,content,excerpt,slug,featured_media,acf,_embedded";

/// One page of a paginated listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paged {
    pub items: Vec<Value>,
    /// Estimated from the page size, since cached bodies carry no headers
    pub total_pages: u32,
    pub current_page: u32,
}

impl Paged {
    fn empty(page: u32) -> Self {
        Self {
            items: Vec::new(),
            total_pages: 0,
            current_page: page,
        }
    }
}

/// Estimates the page count of a listing from one page of it
///
/// A full page suggests there is at least one more.
pub fn estimate_total_pages(len: usize, page: u32, per_page: u32) -> u32 {
    let per_page = per_page.max(1) as usize;
    let mut total = (len.div_ceil(per_page) as u32).max(1);
    if len == per_page {
        total = total.max(page.saturating_add(1));
    }
    total
}

/// A reference site shown on the map page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceSite {
    pub id: u64,
    pub slug: String,
    pub title: String,
    /// Three-letter ISO country code
    pub country: String,
    pub stars: u32,
    pub link: Option<String>,
}

impl ReferenceSite {
    /// Normalizes a raw `reference-sites` item
    pub fn from_item(item: &Value) -> Self {
        let text = |pointer: &str| {
            item.pointer(pointer)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        let stars = match item.pointer("/acf/stars_awarded") {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|n| n.is_finite() && *n > 0.0)
        .map(|n| n as u32)
        .unwrap_or(0);

        let link = item
            .pointer("/acf/external_link")
            .and_then(Value::as_str)
            .filter(|link| !link.is_empty())
            .map(String::from);

        Self {
            id: item.get("id").and_then(Value::as_u64).unwrap_or(0),
            slug: text("/slug"),
            title: text("/title/rendered"),
            country: text("/acf/country"),
            stars,
            link,
        }
    }
}

/// Site-level content accessors over a cached gateway
pub struct SiteContent<S> {
    gateway: ContentGateway<S>,
    api_base: String,
}

impl<S: ContentSource> SiteContent<S> {
    /// `api_base` is used to build media URLs for items that only carry an ID
    pub fn new(gateway: ContentGateway<S>, api_base: impl Into<String>) -> Self {
        Self {
            gateway,
            api_base: api_base.into(),
        }
    }

    /// The underlying gateway, for raw endpoint reads
    pub fn gateway(&self) -> &ContentGateway<S> {
        &self.gateway
    }

    /// All pages with embedded relations
    pub async fn pages(&self) -> Vec<Value> {
        let params = Params::new().with("per_page", 100).with("_embed", true);
        self.list("pages", "/pages", &params).await
    }

    /// The page with `slug`; an empty slug never reaches upstream
    pub async fn page_by_slug(&self, slug: &str) -> Option<Value> {
        if slug.is_empty() {
            return None;
        }
        let params = Params::new().with("slug", slug).with("_embed", true);
        self.first("page_by_slug", "/pages", &params).await
    }

    /// The About page, with ACF fields in standard format
    pub async fn about(&self) -> Option<Value> {
        let params = Params::new()
            .with("slug", "about")
            .with("_embed", true)
            .with("acf_format", "standard");
        self.first("about", "/pages", &params).await
    }

    /// A page of posts of `post_type`, optionally restricted to a category
    pub async fn posts(&self, page: u32, category: Option<u64>, post_type: &str) -> Paged {
        let mut params = Params::new()
            .with("per_page", PER_PAGE)
            .with("page", page)
            .with("_embed", EMBED_RELATIONS)
            .with("status", "publish")
            .with("acf_format", "standard")
            .with("acf", true);
        if let Some(category) = category {
            params.insert("categories", category.to_string());
        }
        self.paged("posts", &format!("/{}", post_type), &params, page).await
    }

    /// A single post of `post_type` by slug
    pub async fn post_by_slug(&self, slug: &str, post_type: &str) -> Option<Value> {
        if slug.is_empty() {
            return None;
        }
        let params = detail_params(slug).with("_fields", DETAIL_FIELDS);
        self.first("post_by_slug", &format!("/{}", post_type), &params)
            .await
    }

    /// A page of projects
    pub async fn projects(&self, page: u32) -> Paged {
        let params = Params::new()
            .with("per_page", PER_PAGE)
            .with("page", page)
            .with("_embed", true);
        self.paged("projects", "/projects", &params, page).await
    }

    /// A single project by slug, with every field the CMS returns
    pub async fn project_by_slug(&self, slug: &str) -> Option<Value> {
        if slug.is_empty() {
            tracing::debug!("project_by_slug called with empty slug");
            return None;
        }
        self.first("project_by_slug", "/projects", &detail_params(slug))
            .await
    }

    /// A page of events
    pub async fn events(&self, page: u32) -> Paged {
        let params = Params::new()
            .with("per_page", PER_PAGE)
            .with("page", page)
            .with("_embed", true);
        self.paged("events", "/events", &params, page).await
    }

    /// A single event by slug
    pub async fn event_by_slug(&self, slug: &str) -> Option<Value> {
        if slug.is_empty() {
            return None;
        }
        let params = detail_params(slug).with("_fields", DETAIL_FIELDS);
        self.first("event_by_slug", "/events", &params).await
    }

    /// All post categories
    pub async fn categories(&self) -> Vec<Value> {
        let params = Params::new().with("per_page", 100);
        self.list("categories", "/categories", &params).await
    }

    /// The category with `slug`, e.g. to resolve a category filter
    pub async fn category_by_slug(&self, slug: &str) -> Option<Value> {
        let params = Params::new().with("slug", slug);
        self.first("category_by_slug", "/categories", &params).await
    }

    /// Published services with their featured media
    pub async fn services(&self) -> Vec<Value> {
        let params = Params::new()
            .with("per_page", 100)
            .with("_embed", "wp:featuredmedia")
            .with("status", "publish")
            .with("acf_format", "standard")
            .with("acf", true)
            .with("_fields", SERVICE_FIELDS);
        self.list("services", "/services", &params).await
    }

    /// Full-text search across content of `kind` (e.g. "post")
    pub async fn search(&self, query: &str, kind: &str) -> Vec<Value> {
        let params = Params::new()
            .with("search", query)
            .with("type", kind)
            .with("per_page", PER_PAGE);
        self.list("search", "/search", &params).await
    }

    /// Reference sites, normalized for the map
    pub async fn reference_sites(&self) -> Vec<ReferenceSite> {
        let params = Params::new()
            .with("per_page", 100)
            .with("_embed", true)
            .with("_fields", "id,title,slug,acf");
        self.list("reference_sites", "/reference-sites", &params)
            .await
            .iter()
            .map(ReferenceSite::from_item)
            .collect()
    }

    /// A media item by ID; `0` means "no media"
    pub async fn media_by_id(&self, id: u64) -> Option<Value> {
        if id == 0 {
            return None;
        }
        match self.fetch_media(id).await {
            Ok(media) => Some(media),
            Err(err) => {
                tracing::warn!(id, error = %err, "media lookup failed");
                None
            }
        }
    }

    /// Resolves media IDs to their source URLs, concurrently
    ///
    /// The result lines up with `ids`; unknown or failing IDs yield `None`.
    pub async fn media_urls(&self, ids: &[u64]) -> Vec<Option<String>> {
        let lookups = ids.iter().map(|&id| async move {
            if id == 0 {
                return Ok(None);
            }
            self.fetch_media(id).await.map(|media| {
                media
                    .get("source_url")
                    .and_then(Value::as_str)
                    .map(String::from)
            })
        });

        fetch_all(lookups)
            .await
            .into_iter()
            .map(Option::flatten)
            .collect()
    }

    /// Best image URL for a post-like item
    pub fn featured_media_url(&self, post: &Value, size: &str) -> Option<String> {
        featured_media_url(post, size, &self.api_base)
    }

    async fn fetch_media(&self, id: u64) -> Result<Value, GatewayError> {
        let endpoint = format!("/media/{}", id);
        let media = self.gateway.get(&endpoint, &Params::new()).await?;
        Ok(Value::clone(&media))
    }

    async fn list(&self, what: &str, endpoint: &str, params: &Params) -> Vec<Value> {
        match self.gateway.get(endpoint, params).await {
            Ok(body) => body.as_array().cloned().unwrap_or_default(),
            Err(err) => {
                tracing::error!(what, error = %err, "content request failed");
                Vec::new()
            }
        }
    }

    async fn first(&self, what: &str, endpoint: &str, params: &Params) -> Option<Value> {
        match self.gateway.get(endpoint, params).await {
            Ok(body) => {
                let found = body.as_array().and_then(|items| items.first()).cloned();
                if found.is_none() {
                    tracing::debug!(what, endpoint, "no matching item");
                }
                found
            }
            Err(err) => {
                tracing::error!(what, error = %err, "content request failed");
                None
            }
        }
    }

    async fn paged(&self, what: &str, endpoint: &str, params: &Params, page: u32) -> Paged {
        match self.gateway.get(endpoint, params).await {
            Ok(body) => {
                let items = body.as_array().cloned().unwrap_or_default();
                Paged {
                    total_pages: estimate_total_pages(items.len(), page, PER_PAGE),
                    current_page: page,
                    items,
                }
            }
            Err(err) => {
                tracing::error!(what, error = %err, "content request failed");
                Paged::empty(page)
            }
        }
    }
}

/// Parameters for a single post-like item looked up by slug
fn detail_params(slug: &str) -> Params {
    Params::new()
        .with("slug", slug)
        .with("_embed", EMBED_RELATIONS)
        .with("_render", true)
        .with("acf_format", "standard")
        .with("acf", true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_estimate_total_pages() {
        assert_eq!(estimate_total_pages(0, 1, 10), 1);
        assert_eq!(estimate_total_pages(4, 1, 10), 1);
        assert_eq!(estimate_total_pages(10, 1, 10), 2);
        assert_eq!(estimate_total_pages(10, 3, 10), 4);
        assert_eq!(estimate_total_pages(7, 3, 10), 1);
    }

    #[test]
    fn test_reference_site_from_full_item() {
        let item = json!({
            "id": 12,
            "slug": "ankara-city",
            "title": { "rendered": "Ankara City Hospital" },
            "acf": {
                "country": "TUR",
                "stars_awarded": "3",
                "external_link": "https://example.org"
            }
        });

        let site = ReferenceSite::from_item(&item);

        assert_eq!(
            site,
            ReferenceSite {
                id: 12,
                slug: "ankara-city".to_string(),
                title: "Ankara City Hospital".to_string(),
                country: "TUR".to_string(),
                stars: 3,
                link: Some("https://example.org".to_string()),
            }
        );
    }

    #[test]
    fn test_reference_site_defaults() {
        let item = json!({
            "id": 4,
            "slug": "x",
            "acf": { "stars_awarded": "many", "external_link": "" }
        });

        let site = ReferenceSite::from_item(&item);

        assert_eq!(site.title, "");
        assert_eq!(site.country, "");
        assert_eq!(site.stars, 0);
        assert!(site.link.is_none());
    }

    #[test]
    fn test_reference_site_numeric_stars() {
        let item = json!({ "id": 1, "acf": { "stars_awarded": 4 } });
        assert_eq!(ReferenceSite::from_item(&item).stars, 4);
    }

    #[test]
    fn test_detail_params_carry_slug_and_acf() {
        let params = detail_params("annual-meeting");
        assert_eq!(
            params.get("slug"),
            Some(&crate::data::ParamValue::Str("annual-meeting".to_string()))
        );
        assert_eq!(params.get("acf"), Some(&crate::data::ParamValue::Bool(true)));
        assert!(params.get("_fields").is_none());
    }
}
