use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Returns `true` if `key` may be stored in a category-key set.
///
/// Empty and whitespace-only keys are rejected at every insertion point.
#[must_use]
pub fn is_valid_category_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// One entry of a product-search listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    /// SKU; unique across the catalog.
    pub id: String,
    pub name: String,
    pub brand: String,
    /// Display price as the API formats it, e.g. `"$2.49"`. `"N/A"` when absent.
    pub price_display: String,
    /// Selling size, e.g. `"16 oz"`. `"N/A"` when absent.
    pub unit_label: String,
    pub url_slug: String,
    pub snap_eligible: bool,
}

/// Full detail for one SKU, hydrated from the per-product endpoint.
///
/// A detail fetch that cannot be recovered yields [`ProductDetail::placeholder`]
/// rather than an error.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductDetail {
    pub id: String,
    pub description: String,
    pub category_names: Vec<String>,
    pub category_keys: BTreeSet<String>,
    pub country_of_origin: String,
    pub image_url: Option<String>,
    pub warning_code: Option<String>,
    pub warning_text: Option<String>,
}

impl ProductDetail {
    /// The empty-but-valid detail returned when hydration fails.
    #[must_use]
    pub fn placeholder(id: &str) -> Self {
        Self {
            id: id.to_owned(),
            ..Self::default()
        }
    }

    /// Adds `key` to the category-key set unless it is blank.
    /// Returns `true` if the key was newly inserted.
    pub fn insert_category_key(&mut self, key: &str) -> bool {
        if !is_valid_category_key(key) {
            return false;
        }
        self.category_keys.insert(key.to_owned())
    }

    /// Category names joined the way the flat output expects them.
    #[must_use]
    pub fn joined_categories(&self) -> String {
        self.category_names.join(", ")
    }
}

/// Flat output row: a [`ProductSummary`] left-joined with its
/// [`ProductDetail`]. Category keys are deliberately not carried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub sku: String,
    pub name: String,
    pub brand_name: String,
    pub price_unit: String,
    pub slug: String,
    pub formatted_price: String,
    pub snap_eligible: bool,
    pub description: Option<String>,
    pub categories: Option<String>,
    pub country_origin: Option<String>,
    pub image_url: Option<String>,
    pub warning_code: Option<String>,
    pub warning_desc: Option<String>,
}

impl CatalogRecord {
    /// Joins a summary with its detail. A missing detail leaves every
    /// detail column `None`.
    #[must_use]
    pub fn merge(summary: ProductSummary, detail: Option<&ProductDetail>) -> Self {
        Self {
            sku: summary.id,
            name: summary.name,
            brand_name: summary.brand,
            price_unit: summary.unit_label,
            slug: summary.url_slug,
            formatted_price: summary.price_display,
            snap_eligible: summary.snap_eligible,
            description: detail.map(|d| d.description.clone()),
            categories: detail.map(ProductDetail::joined_categories),
            country_origin: detail.map(|d| d.country_of_origin.clone()),
            image_url: detail.and_then(|d| d.image_url.clone()),
            warning_code: detail.and_then(|d| d.warning_code.clone()),
            warning_desc: detail.and_then(|d| d.warning_text.clone()),
        }
    }
}

/// A name/value pair from a product page's specification table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specification {
    pub name: String,
    pub value: String,
}

/// Everything recoverable from one storefront product page.
///
/// Every field is optional; a page with no recognisable data produces a
/// record with only `item_id` and `product_url` set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PageProduct {
    pub item_id: String,
    pub product_url: String,
    pub name: Option<String>,
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub price_per_unit: Option<String>,
    pub availability: Option<String>,
    pub store_availability: Option<String>,
    pub category_path: Vec<String>,
    pub image_urls: Vec<String>,
    /// Aisle / shelf location text.
    pub location: Option<String>,
    pub specifications: Vec<Specification>,
    pub ingredients: Option<String>,
    pub directions: Option<String>,
    pub warnings: Option<String>,
    pub warranty: Option<String>,
    pub rating: Option<f64>,
    pub review_count: Option<u64>,
}

impl PageProduct {
    #[must_use]
    pub fn new(item_id: &str, product_url: &str) -> Self {
        Self {
            item_id: item_id.to_owned(),
            product_url: product_url.to_owned(),
            ..Self::default()
        }
    }

    /// `true` when nothing beyond the identifiers was extracted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::new(&self.item_id, &self.product_url)
    }
}

/// A product reference found on a storefront search page.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchHit {
    pub item_id: String,
    pub product_url: String,
    pub name: Option<String>,
    pub price: Option<String>,
    pub store_id: Option<u32>,
    pub availability: Option<String>,
    pub image_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: &str) -> ProductSummary {
        ProductSummary {
            id: id.to_owned(),
            name: "Whole Milk".to_owned(),
            brand: "Friendly Farms".to_owned(),
            price_display: "$3.05".to_owned(),
            unit_label: "1 gal".to_owned(),
            url_slug: "friendly-farms-whole-milk".to_owned(),
            snap_eligible: true,
        }
    }

    #[test]
    fn blank_category_keys_are_invalid() {
        assert!(!is_valid_category_key(""));
        assert!(!is_valid_category_key("   "));
        assert!(!is_valid_category_key("\t\n"));
        assert!(is_valid_category_key("dairy-eggs"));
    }

    #[test]
    fn insert_category_key_skips_blank_values() {
        let mut detail = ProductDetail::placeholder("1");
        assert!(!detail.insert_category_key(""));
        assert!(!detail.insert_category_key("   "));
        assert!(detail.insert_category_key("88"));
        assert!(!detail.insert_category_key("88"));
        assert_eq!(detail.category_keys.len(), 1);
    }

    #[test]
    fn placeholder_has_only_id() {
        let detail = ProductDetail::placeholder("0000000042");
        assert_eq!(detail.id, "0000000042");
        assert!(detail.description.is_empty());
        assert!(detail.category_names.is_empty());
        assert!(detail.category_keys.is_empty());
        assert!(detail.image_url.is_none());
        assert!(detail.warning_code.is_none());
        assert!(detail.warning_text.is_none());
    }

    #[test]
    fn merge_joins_category_names() {
        let mut detail = ProductDetail::placeholder("1");
        detail.category_names = vec!["Dairy".to_owned(), "Milk".to_owned()];
        detail.image_url = Some("https://img/1.jpg".to_owned());
        let record = CatalogRecord::merge(summary("1"), Some(&detail));
        assert_eq!(record.sku, "1");
        assert_eq!(record.categories.as_deref(), Some("Dairy, Milk"));
        assert_eq!(record.image_url.as_deref(), Some("https://img/1.jpg"));
        assert_eq!(record.formatted_price, "$3.05");
    }

    #[test]
    fn merge_without_detail_leaves_detail_columns_empty() {
        let record = CatalogRecord::merge(summary("2"), None);
        assert!(record.description.is_none());
        assert!(record.categories.is_none());
        assert!(record.country_origin.is_none());
    }

    #[test]
    fn catalog_record_serializes_without_category_keys() {
        let record = CatalogRecord::merge(summary("3"), Some(&ProductDetail::placeholder("3")));
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("category_keys").is_none());
        assert_eq!(json["brand_name"], "Friendly Farms");
    }

    #[test]
    fn page_product_is_empty_until_a_field_is_set() {
        let mut page = PageProduct::new("123", "https://www.walmart.com/ip/123");
        assert!(page.is_empty());
        page.rating = Some(4.5);
        assert!(!page.is_empty());
    }
}
