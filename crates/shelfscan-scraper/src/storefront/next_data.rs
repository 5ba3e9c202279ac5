//! The server-rendered page state (`__NEXT_DATA__`) of a product page.
//!
//! ## Observed shape
//!
//! ```text
//! props.pageProps.initialData.data
//!   ├─ product   name, shortDescription, priceInfo.{currentPrice,unitPrice},
//!   │            availabilityStatus, category.path[], imageInfo.allImages[],
//!   │            productLocation[], fulfillmentOptions[], averageRating,
//!   │            numberOfReviews
//!   └─ idml      longDescription, specifications[], ingredients, directions,
//!                warnings, warranty
//! ```
//!
//! Every key is optional. A missing node at any depth leaves the field
//! unset.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use shelfscan_core::{PageProduct, Specification};

use super::text::{as_f64, as_u64, non_blank, str_at, strip_html};

static NEXT_DATA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<script id="__NEXT_DATA__"[^>]*>(.*?)</script>"#).expect("valid regex")
});

const PRODUCT_POINTER: &str = "/props/pageProps/initialData/data/product";
const IDML_POINTER: &str = "/props/pageProps/initialData/data/idml";

/// Ingredient sources in preference order, relative to `idml`.
const INGREDIENT_POINTERS: [&str; 4] = [
    "/ingredients/ingredients/value",
    "/ingredients/value",
    "/ingredients/activeIngredients/value",
    "/ingredients/inactiveIngredients/value",
];

/// Decodes the `__NEXT_DATA__` blob of `html`, if present and valid JSON.
#[must_use]
pub fn extract_next_data(html: &str) -> Option<Value> {
    let blob = NEXT_DATA_RE.captures(html)?.get(1)?.as_str();
    match serde_json::from_str(blob) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(error = %e, "__NEXT_DATA__ is not valid JSON");
            None
        }
    }
}

/// Fills `page` from the product and idml nodes of `data`.
pub(crate) fn apply_next_data(data: &Value, page: &mut PageProduct) {
    if let Some(product) = data.pointer(PRODUCT_POINTER) {
        apply_product(product, page);
    }
    if let Some(idml) = data.pointer(IDML_POINTER) {
        apply_idml(idml, page);
    }
}

fn apply_product(product: &Value, page: &mut PageProduct) {
    page.name = str_at(product, "/name");
    page.short_description = str_at(product, "/shortDescription").map(|s| strip_html(&s));
    page.price = product
        .pointer("/priceInfo/currentPrice/price")
        .and_then(as_f64);
    page.price_per_unit = str_at(product, "/priceInfo/unitPrice/priceString");
    page.availability = str_at(product, "/availabilityStatus");
    page.store_availability = product
        .get("fulfillmentOptions")
        .and_then(Value::as_array)
        .and_then(|options| {
            options.iter().find(|o| {
                matches!(
                    o.get("type").and_then(Value::as_str),
                    Some("PICKUP" | "IN_STORE")
                )
            })
        })
        .and_then(|o| str_at(o, "/availabilityStatus"));
    page.category_path = strings_at(product, "/category/path", "/name");
    page.image_urls = strings_at(product, "/imageInfo/allImages", "/url");
    page.location = product
        .pointer("/productLocation/0/displayValue")
        .and_then(non_blank);
    page.rating = product.get("averageRating").and_then(as_f64);
    page.review_count = product.get("numberOfReviews").and_then(as_u64);
}

fn apply_idml(idml: &Value, page: &mut PageProduct) {
    page.description = str_at(idml, "/longDescription").map(|s| strip_html(&s));
    page.specifications = idml
        .get("specifications")
        .and_then(Value::as_array)
        .map(|specs| {
            specs
                .iter()
                .filter_map(|spec| {
                    Some(Specification {
                        name: str_at(spec, "/name")?,
                        value: str_at(spec, "/value")?,
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    page.ingredients = INGREDIENT_POINTERS
        .iter()
        .find_map(|pointer| str_at(idml, pointer))
        .or_else(|| idml.get("ingredients").and_then(non_blank));
    page.directions = idml.get("directions").and_then(first_text);
    page.warnings = idml.get("warnings").and_then(first_text);
    page.warranty = str_at(idml, "/warranty/information")
        .or_else(|| idml.get("warranty").and_then(non_blank));
}

/// Text of a string, the first entry of a list, or an object's `value`.
fn first_text(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => items.first().and_then(first_text),
        Value::Object(_) => value.get("value").and_then(non_blank),
        other => non_blank(other).map(|s| strip_html(&s)),
    }
}

/// The non-blank `field` of every entry of the array at `pointer`.
fn strings_at(value: &Value, pointer: &str, field: &str) -> Vec<String> {
    value
        .pointer(pointer)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(|i| str_at(i, field)).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page_state(product: Value, idml: Value) -> Value {
        json!({
            "props": { "pageProps": { "initialData": { "data": {
                "product": product,
                "idml": idml
            } } } }
        })
    }

    #[test]
    fn extract_next_data_decodes_script_blob() {
        let html = r#"<html><script id="__NEXT_DATA__" type="application/json">{"props":{"pageProps":{}}}</script></html>"#;
        let data = extract_next_data(html).unwrap();
        assert!(data.pointer("/props/pageProps").is_some());
    }

    #[test]
    fn extract_next_data_rejects_invalid_json() {
        let html = r#"<script id="__NEXT_DATA__">{not json</script>"#;
        assert!(extract_next_data(html).is_none());
        assert!(extract_next_data("<html></html>").is_none());
    }

    #[test]
    fn apply_next_data_fills_product_and_idml_fields() {
        let data = page_state(
            json!({
                "name": "Great Value Whole Milk, 1 gal",
                "shortDescription": "<p>Fresh milk</p>",
                "priceInfo": {
                    "currentPrice": { "price": 3.48 },
                    "unitPrice": { "priceString": "2.7 ¢/fl oz" }
                },
                "availabilityStatus": "IN_STOCK",
                "fulfillmentOptions": [
                    { "type": "DELIVERY", "availabilityStatus": "OUT_OF_STOCK" },
                    { "type": "PICKUP", "availabilityStatus": "AVAILABLE" }
                ],
                "category": { "path": [{ "name": "Food" }, { "name": "Dairy" }] },
                "imageInfo": { "allImages": [{ "url": "https://i5.walmartimages.com/a.jpeg" }] },
                "productLocation": [{ "displayValue": "A12" }],
                "averageRating": 4.6,
                "numberOfReviews": 1203
            }),
            json!({
                "longDescription": "<ul><li>Vitamin D</li></ul>",
                "specifications": [
                    { "name": "Brand", "value": "Great Value" },
                    { "name": "Size" }
                ],
                "ingredients": { "ingredients": { "value": "Milk, Vitamin D3." } },
                "directions": [{ "value": "Keep refrigerated." }],
                "warnings": [{ "value": "Contains milk." }],
                "warranty": { "information": "None" }
            }),
        );
        let mut page = PageProduct::new("10450114", "https://www.walmart.com/ip/10450114");
        apply_next_data(&data, &mut page);

        assert_eq!(page.name.as_deref(), Some("Great Value Whole Milk, 1 gal"));
        assert_eq!(page.short_description.as_deref(), Some("Fresh milk"));
        assert_eq!(page.price, Some(3.48));
        assert_eq!(page.price_per_unit.as_deref(), Some("2.7 ¢/fl oz"));
        assert_eq!(page.availability.as_deref(), Some("IN_STOCK"));
        assert_eq!(page.store_availability.as_deref(), Some("AVAILABLE"));
        assert_eq!(page.category_path, vec!["Food", "Dairy"]);
        assert_eq!(page.image_urls, vec!["https://i5.walmartimages.com/a.jpeg"]);
        assert_eq!(page.location.as_deref(), Some("A12"));
        assert_eq!(page.rating, Some(4.6));
        assert_eq!(page.review_count, Some(1203));
        assert_eq!(page.description.as_deref(), Some("Vitamin D"));
        assert_eq!(page.specifications.len(), 1);
        assert_eq!(page.ingredients.as_deref(), Some("Milk, Vitamin D3."));
        assert_eq!(page.directions.as_deref(), Some("Keep refrigerated."));
        assert_eq!(page.warnings.as_deref(), Some("Contains milk."));
        assert_eq!(page.warranty.as_deref(), Some("None"));
    }

    #[test]
    fn missing_nodes_leave_fields_unset() {
        let mut page = PageProduct::new("1", "u");
        apply_next_data(&json!({ "props": { "pageProps": {} } }), &mut page);
        assert!(page.is_empty());

        apply_next_data(&page_state(json!({ "priceInfo": null }), json!(null)), &mut page);
        assert!(page.is_empty());
    }

    #[test]
    fn plain_string_directions_and_ingredients_are_accepted() {
        let data = page_state(
            json!({}),
            json!({ "ingredients": "Water, Sugar.", "directions": "Serve chilled." }),
        );
        let mut page = PageProduct::new("1", "u");
        apply_next_data(&data, &mut page);
        assert_eq!(page.ingredients.as_deref(), Some("Water, Sugar."));
        assert_eq!(page.directions.as_deref(), Some("Serve chilled."));
    }
}
