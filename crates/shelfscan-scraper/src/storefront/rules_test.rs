use super::*;

fn rule(field: Field) -> &'static ExtractionRule {
    RULES
        .iter()
        .find(|r| r.field == field)
        .expect("every field has a rule")
}

// -----------------------------------------------------------------------
// price
// -----------------------------------------------------------------------

#[test]
fn price_prefers_embedded_current_price_over_display_text() {
    let html = r#"<span>$9.99</span><script>{"currentPrice":{"currencyUnit":"USD","price":3.48}}</script>"#;
    assert_eq!(apply_rule(rule(Field::Price), html).as_deref(), Some("3.48"));
}

#[test]
fn price_falls_back_to_dollar_text() {
    let html = "<div>Now $4.97</div>";
    assert_eq!(apply_rule(rule(Field::Price), html).as_deref(), Some("4.97"));
}

#[test]
fn price_rejects_zero() {
    let html = r#"{"price":0}"#;
    assert_eq!(apply_rule(rule(Field::Price), html), None);
}

// -----------------------------------------------------------------------
// unit price / rating / reviews
// -----------------------------------------------------------------------

#[test]
fn price_per_unit_matches_cents_per_unit() {
    let html = "<span>27.4 ¢/oz</span>";
    assert_eq!(
        apply_rule(rule(Field::PricePerUnit), html).as_deref(),
        Some("27.4 ¢/oz")
    );
}

#[test]
fn rating_outside_five_stars_is_rejected() {
    assert_eq!(
        apply_rule(rule(Field::Rating), r#""averageRating":4.7"#).as_deref(),
        Some("4.7")
    );
    assert_eq!(apply_rule(rule(Field::Rating), r#""averageRating":9"#), None);
}

#[test]
fn review_count_strips_thousands_separator() {
    assert_eq!(
        apply_rule(rule(Field::ReviewCount), "<a>1,204 reviews</a>").as_deref(),
        Some("1204")
    );
}

// -----------------------------------------------------------------------
// description / ingredients / directions
// -----------------------------------------------------------------------

#[test]
fn description_reads_about_this_item_block() {
    let html = "<h2>About this item</h2><ul><li>Grade A large eggs from cage-free hens</li></ul>";
    assert_eq!(
        apply_rule(rule(Field::Description), html).as_deref(),
        Some("Grade A large eggs from cage-free hens")
    );
}

#[test]
fn description_rejects_short_block() {
    let html = "<h2>About this item</h2><ul><li>Eggs</li></ul>";
    assert_eq!(apply_rule(rule(Field::Description), html), None);
}

#[test]
fn ingredients_anchor_on_water_and_colorants() {
    let html = "<p>Water, Sugar, Citric Acid, Natural Flavors, Colorants.</p>";
    assert_eq!(
        apply_rule(rule(Field::Ingredients), html).as_deref(),
        Some("Water, Sugar, Citric Acid, Natural Flavors, Colorants")
    );
}

#[test]
fn ingredients_fall_back_to_labelled_block() {
    let html = "<h3>Ingredients</h3><p>Enriched flour, sugar, salt</p>";
    assert_eq!(
        apply_rule(rule(Field::Ingredients), html).as_deref(),
        Some("Enriched flour, sugar, salt")
    );
}

#[test]
fn directions_require_an_instruction_keyword() {
    let accepted = "<h3>Directions</h3><p>Shake well before use.</p>";
    assert_eq!(
        apply_rule(rule(Field::Directions), accepted).as_deref(),
        Some("Shake well before use.")
    );

    let rejected = "<h3>Directions</h3><p>Made in a facility with nuts.</p>";
    assert_eq!(apply_rule(rule(Field::Directions), rejected), None);
}

// -----------------------------------------------------------------------
// specs / images / title
// -----------------------------------------------------------------------

#[test]
fn known_spec_labels_are_paired_with_values() {
    let html = "<div><span>Brand</span><span>Great Value</span></div>";
    let specs = extract_known_specs(html);
    assert_eq!(
        specs,
        vec![Specification {
            name: "Brand".to_owned(),
            value: "Great Value".to_owned(),
        }]
    );
}

#[test]
fn image_urls_are_deduplicated_across_patterns() {
    let html = r#"<img src="https://i5.walmartimages.com/asr/abc.jpeg?odnHeight=612">
        <script>{"url":"https://i5.walmartimages.com/asr/abc.jpeg"}</script>"#;
    assert_eq!(
        extract_image_urls(html),
        vec!["https://i5.walmartimages.com/asr/abc.jpeg"]
    );
}

#[test]
fn image_urls_ignore_other_hosts() {
    let html = r#"<img src="https://cdn.example.com/x.jpeg">"#;
    assert!(extract_image_urls(html).is_empty());
}

#[test]
fn title_name_strips_site_suffix() {
    assert_eq!(
        title_name("<title>Great Value Whole Milk - Walmart.com</title>").as_deref(),
        Some("Great Value Whole Milk")
    );
    assert_eq!(title_name("<title>Walmart.com</title>"), None);
    assert_eq!(title_name("<title> - Walmart.com</title>"), None);
    assert_eq!(
        title_name("<title>Eggs, 12 ct | Walmart.com</title>").as_deref(),
        Some("Eggs, 12 ct")
    );
}

#[test]
fn title_name_rejects_interstitial_titles() {
    assert_eq!(title_name("<title>Robot or human?</title>"), None);
    assert_eq!(title_name("<title>Verify Your Identity</title>"), None);
    assert_eq!(title_name("<html><body>no title</body></html>"), None);
}

// -----------------------------------------------------------------------
// apply_rules
// -----------------------------------------------------------------------

#[test]
fn apply_rules_only_fills_unset_fields() {
    let html = r#"<span>$9.99</span><span>4.5 out of 5 Stars</span>"#;
    let mut page = PageProduct::new("1", "u");
    page.price = Some(3.48);
    apply_rules(html, &mut page);
    assert_eq!(page.price, Some(3.48));
    assert_eq!(page.rating, Some(4.5));
}

#[test]
fn apply_rules_keeps_structured_specs() {
    let html = "<div><span>Brand</span><span>Other</span></div>";
    let mut page = PageProduct::new("1", "u");
    page.specifications.push(Specification {
        name: "Brand".to_owned(),
        value: "Great Value".to_owned(),
    });
    apply_rules(html, &mut page);
    assert_eq!(page.specifications.len(), 1);
    assert_eq!(page.specifications[0].value, "Great Value");
}
