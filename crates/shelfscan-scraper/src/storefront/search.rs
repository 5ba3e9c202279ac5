//! Product references on a storefront search results page.
//!
//! Three sources, merged and deduplicated by item id in this order:
//!
//! 1. `/ip/<slug>/<id>` links
//! 2. bare `"usItemId":"<id>"` occurrences
//! 3. JSON objects carrying `itemId`/`usItemId` inside `<script>` tags,
//!    which also supply name, price, image, and availability

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use shelfscan_core::SearchHit;

use super::text::non_blank;

static PRODUCT_HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"href=["'](/ip/[^"'?]+/(\d+))[^"']*["']"#).expect("valid regex")
});
static US_ITEM_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"["']usItemId["']\s*:\s*["']?(\d+)"#).expect("valid regex")
});
static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script[^>]*>(.*?)</script>").expect("valid regex"));
/// A flat object, or one level of nesting, that names an item id.
static ITEM_OBJECT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)\{(?:[^{}]|\{[^{}]*\})*["'](?:itemId|usItemId)["'][^}]*\}"#)
        .expect("valid regex")
});

/// Extracts every distinct product on a search page.
///
/// `base_url` resolves relative product links; `store_id` is recorded on
/// hits decoded from embedded JSON that do not name a store.
#[must_use]
pub fn parse_search_page(html: &str, base_url: &str, store_id: u32) -> Vec<SearchHit> {
    let base = base_url.trim_end_matches('/');
    let mut seen = HashSet::new();
    let mut hits = Vec::new();

    for cap in PRODUCT_HREF_RE.captures_iter(html) {
        let (Some(path), Some(id)) = (cap.get(1), cap.get(2)) else {
            continue;
        };
        if seen.insert(id.as_str().to_owned()) {
            hits.push(SearchHit {
                item_id: id.as_str().to_owned(),
                product_url: format!("{base}{}", path.as_str()),
                ..SearchHit::default()
            });
        }
    }

    for cap in US_ITEM_ID_RE.captures_iter(html) {
        let Some(id) = cap.get(1) else {
            continue;
        };
        if seen.insert(id.as_str().to_owned()) {
            hits.push(SearchHit {
                item_id: id.as_str().to_owned(),
                product_url: format!("{base}/ip/{}", id.as_str()),
                ..SearchHit::default()
            });
        }
    }

    for script in SCRIPT_RE.captures_iter(html).filter_map(|c| c.get(1)) {
        let content = script.as_str();
        if !content.contains("itemId") && !content.contains("usItemId") {
            continue;
        }
        for m in ITEM_OBJECT_RE.find_iter(content) {
            let Ok(object) = serde_json::from_str::<Value>(m.as_str()) else {
                continue;
            };
            let Some(hit) = hit_from_object(&object, base, store_id) else {
                continue;
            };
            if seen.insert(hit.item_id.clone()) {
                hits.push(hit);
            }
        }
    }

    tracing::debug!(count = hits.len(), "parsed search page");
    hits
}

/// First non-blank value among `keys` of `object`.
fn first_of(object: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| object.get(*k).and_then(non_blank))
}

fn hit_from_object(object: &Value, base: &str, store_id: u32) -> Option<SearchHit> {
    let item_id = first_of(object, &["itemId", "usItemId"])?;
    let product_url = first_of(object, &["productUrl", "url", "canonicalUrl"]).map_or_else(
        || format!("{base}/ip/{item_id}"),
        |url| {
            if url.starts_with("http") {
                url
            } else {
                format!("{base}/{}", url.trim_start_matches('/'))
            }
        },
    );
    let availability = first_of(object, &["availability"]).or_else(|| {
        ["inStock", "available"]
            .iter()
            .find_map(|k| object.get(*k).and_then(Value::as_bool))
            .map(|b| b.to_string())
    });
    let store_id = object
        .get("storeId")
        .and_then(|v| {
            v.as_u64()
                .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
        })
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(store_id);

    Some(SearchHit {
        item_id,
        product_url,
        name: first_of(object, &["name", "title", "productName"]),
        price: first_of(object, &["price", "salePrice", "currentPrice"]),
        store_id: Some(store_id),
        availability,
        image_url: first_of(object, &["image", "thumbnailImage", "imageUrl"]),
    })
}
