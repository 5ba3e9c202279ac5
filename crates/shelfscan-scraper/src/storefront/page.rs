//! Product-page extraction in strict precedence order.

use shelfscan_core::PageProduct;

use super::jsonld::{apply_jsonld, extract_jsonld_products};
use super::next_data::{apply_next_data, extract_next_data};
use super::rules::{apply_rules, title_name};

/// Extracts everything recoverable from one product page.
///
/// Sources, highest precedence first; each only fills fields still unset:
///
/// 1. the `__NEXT_DATA__` page state
/// 2. JSON-LD `Product` blocks
/// 3. the `<title>` tag, for the name only
/// 4. the regex rule table over raw markup
///
/// Never fails: a page with nothing recognisable yields a record holding
/// only `item_id` and `product_url`.
#[must_use]
pub fn parse_product_page(html: &str, item_id: &str, product_url: &str) -> PageProduct {
    let mut page = PageProduct::new(item_id, product_url);

    if let Some(data) = extract_next_data(html) {
        apply_next_data(&data, &mut page);
    }

    for product in extract_jsonld_products(html) {
        apply_jsonld(&product, &mut page);
    }

    if page.name.is_none() {
        page.name = title_name(html);
    }

    apply_rules(html, &mut page);

    if page.is_empty() {
        tracing::debug!(item_id, "no product data found on page");
    }
    page
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEXT_DATA_PAGE: &str = r#"<html><head>
<title>Ignored Title - Walmart.com</title>
<script type="application/ld+json">{"@type":"Product","name":"LD Name","description":"From JSON-LD markup","offers":{"price":"7.00"},"aggregateRating":{"ratingValue":3.9,"reviewCount":12}}</script>
</head><body>
<span>$9.99</span>
<script id="__NEXT_DATA__" type="application/json">{"props":{"pageProps":{"initialData":{"data":{"product":{"name":"Great Value Whole Milk","priceInfo":{"currentPrice":{"price":3.48}},"imageInfo":{"allImages":[{"url":"https://i5.walmartimages.com/a.jpeg"}]}},"idml":{}}}}}}</script>
</body></html>"#;

    #[test]
    fn structured_price_beats_regex_and_jsonld() {
        let page = parse_product_page(NEXT_DATA_PAGE, "10450114", "https://www.walmart.com/ip/10450114");
        assert_eq!(page.price, Some(3.48));
        assert_eq!(page.name.as_deref(), Some("Great Value Whole Milk"));
    }

    #[test]
    fn jsonld_fills_fields_the_page_state_lacks() {
        let page = parse_product_page(NEXT_DATA_PAGE, "10450114", "u");
        assert_eq!(page.description.as_deref(), Some("From JSON-LD markup"));
        assert_eq!(page.rating, Some(3.9));
        assert_eq!(page.review_count, Some(12));
    }

    #[test]
    fn structured_images_are_not_extended_by_the_sweep() {
        let page = parse_product_page(NEXT_DATA_PAGE, "10450114", "u");
        assert_eq!(page.image_urls, vec!["https://i5.walmartimages.com/a.jpeg"]);
    }

    #[test]
    fn title_supplies_name_without_structured_data() {
        let html = "<title>Fresh Banana, Each - Walmart.com</title><span>$0.27</span>";
        let page = parse_product_page(html, "44390948", "u");
        assert_eq!(page.name.as_deref(), Some("Fresh Banana, Each"));
        assert_eq!(page.price, Some(0.27));
    }

    #[test]
    fn unrecognisable_page_yields_identifiers_only() {
        let page = parse_product_page("<html><body>Robot check</body></html>", "1", "u");
        assert!(page.is_empty());
        assert_eq!(page.item_id, "1");
        assert_eq!(page.product_url, "u");
    }

    #[test]
    fn jsonld_review_count_wins_over_loose_text_when_rating_is_structured() {
        let html = r#"<html><head>
<script id="__NEXT_DATA__" type="application/json">{"props":{"pageProps":{"initialData":{"data":{"product":{"name":"Eggs","averageRating":4.6}}}}}}</script>
<script type="application/ld+json">{"@type":"Product","aggregateRating":{"ratingValue":1.0,"reviewCount":312}}</script>
</head><body><script>window.related = {"numberOfReviews": 7};</script></body></html>"#;
        let page = parse_product_page(html, "1", "u");
        assert_eq!(page.rating, Some(4.6));
        assert_eq!(page.review_count, Some(312));
    }

    #[test]
    fn bot_check_title_does_not_become_a_name() {
        let html = "<html><head><title>Robot or human?</title></head>\
                    <body><p>Activate and hold the button to confirm that you're human.</p></body></html>";
        let page = parse_product_page(html, "1", "u");
        assert!(page.name.is_none());
        assert!(page.is_empty());
    }
}
