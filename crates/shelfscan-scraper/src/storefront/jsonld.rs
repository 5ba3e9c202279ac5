//! schema.org `Product` blocks from `<script type="application/ld+json">`.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use shelfscan_core::PageProduct;

use super::text::{as_f64, as_u64, str_at, strip_html};

static SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]+type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .expect("valid regex")
});

/// Every JSON-LD node of `html` whose `@type` is `Product`.
pub(crate) fn extract_jsonld_products(html: &str) -> Vec<Value> {
    let mut products = Vec::new();

    for cap in SCRIPT_RE.captures_iter(html) {
        let Some(json_text) = cap.get(1) else {
            continue;
        };
        let Ok(value) = serde_json::from_str::<Value>(json_text.as_str()) else {
            continue;
        };

        // Accept top-level object, array, or @graph container.
        let mut candidates = match value {
            Value::Array(items) => items,
            other => vec![other],
        };
        let graph: Vec<Value> = candidates
            .iter()
            .filter_map(|item| item.get("@graph").and_then(Value::as_array))
            .flatten()
            .cloned()
            .collect();
        candidates.extend(graph);

        products.extend(candidates.into_iter().filter(is_product));
    }

    products
}

/// `@type` may be a string or an array of strings.
fn is_product(item: &Value) -> bool {
    match item.get("@type") {
        Some(Value::String(s)) => s.eq_ignore_ascii_case("Product"),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|s| s.eq_ignore_ascii_case("Product")),
        _ => false,
    }
}

/// Fills only the fields of `page` that are still unset.
pub(crate) fn apply_jsonld(product: &Value, page: &mut PageProduct) {
    if page.name.is_none() {
        page.name = str_at(product, "/name");
    }
    if page.description.is_none() {
        page.description = str_at(product, "/description").map(|s| strip_html(&s));
    }
    if let Some(rating) = product.get("aggregateRating") {
        if page.rating.is_none() {
            page.rating = rating.get("ratingValue").and_then(as_f64);
        }
        if page.review_count.is_none() {
            page.review_count = rating.get("reviewCount").and_then(as_u64);
        }
    }
    if page.price.is_none() {
        let offer = match product.get("offers") {
            Some(Value::Array(offers)) => offers.first(),
            other => other,
        };
        page.price = offer.and_then(|o| o.get("price")).and_then(as_f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn script(body: &str) -> String {
        format!(r#"<script type="application/ld+json">{body}</script>"#)
    }

    #[test]
    fn finds_product_nodes_in_graph_and_arrays() {
        let html = format!(
            "{}{}{}",
            script(r#"{"@type":"Organization","name":"Walmart"}"#),
            script(r#"{"@graph":[{"@type":"Product","name":"Bananas"}]}"#),
            script(r#"[{"@type":["Thing","Product"],"name":"Apples"}]"#),
        );
        let names: Vec<String> = extract_jsonld_products(&html)
            .iter()
            .filter_map(|p| str_at(p, "/name"))
            .collect();
        assert_eq!(names, vec!["Bananas", "Apples"]);
    }

    #[test]
    fn skips_invalid_json() {
        assert!(extract_jsonld_products(&script("{oops")).is_empty());
    }

    #[test]
    fn apply_jsonld_uses_first_offer_price() {
        let product = json!({
            "@type": "Product",
            "name": "Bananas",
            "description": "Fresh <b>bananas</b>",
            "aggregateRating": { "ratingValue": "4.5", "reviewCount": "88" },
            "offers": [{ "price": "0.27" }, { "price": "9.99" }]
        });
        let mut page = PageProduct::new("1", "u");
        apply_jsonld(&product, &mut page);
        assert_eq!(page.name.as_deref(), Some("Bananas"));
        assert_eq!(page.description.as_deref(), Some("Fresh bananas"));
        assert_eq!(page.rating, Some(4.5));
        assert_eq!(page.review_count, Some(88));
        assert_eq!(page.price, Some(0.27));
    }

    #[test]
    fn apply_jsonld_keeps_existing_values() {
        let product = json!({ "name": "Other", "offers": { "price": 1.0 } });
        let mut page = PageProduct::new("1", "u");
        page.name = Some("Kept".to_owned());
        page.price = Some(3.48);
        apply_jsonld(&product, &mut page);
        assert_eq!(page.name.as_deref(), Some("Kept"));
        assert_eq!(page.price, Some(3.48));
    }

    #[test]
    fn apply_jsonld_fills_review_count_when_rating_is_already_set() {
        let product = json!({
            "@type": "Product",
            "aggregateRating": { "ratingValue": 2.0, "reviewCount": 1520 }
        });
        let mut page = PageProduct::new("1", "u");
        page.rating = Some(4.7);
        apply_jsonld(&product, &mut page);
        assert_eq!(page.rating, Some(4.7));
        assert_eq!(page.review_count, Some(1520));
    }
}
