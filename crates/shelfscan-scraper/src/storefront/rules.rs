//! Regex fallbacks over raw product-page markup.
//!
//! Each [`ExtractionRule`] pairs a field with patterns in priority order and
//! a validator. [`apply_rule`] returns the first capture that passes the
//! validator; a rule that matches nothing, or only junk, yields `None`.
//! [`apply_rules`] runs the table against a page and fills only fields that
//! are still unset.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use shelfscan_core::{PageProduct, Specification};

use super::text::{collapse_whitespace, looks_like_json, strip_html, truncate_chars};

/// The page field a rule fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Price,
    PricePerUnit,
    Rating,
    ReviewCount,
    Description,
    Ingredients,
    Directions,
}

/// One field's ordered patterns and the check a capture must pass.
pub struct ExtractionRule {
    pub field: Field,
    /// Tried in order; capture group 1 is the candidate value.
    pub patterns: Vec<Regex>,
    /// Cleans a candidate, or rejects it with `None`.
    pub validator: fn(&str) -> Option<String>,
}

const DESCRIPTION_MAX_CHARS: usize = 2000;
const INGREDIENTS_MAX_CHARS: usize = 1500;
const DIRECTIONS_MAX_CHARS: usize = 1000;

/// A directions candidate must mention one of these.
const DIRECTION_KEYWORDS: [&str; 12] = [
    "apply",
    "use",
    "shake",
    "mix",
    "heat",
    "cook",
    "serve",
    "store",
    "refrigerate",
    "take",
    "rinse",
    "wash",
];

/// Specification labels recognised in raw markup.
const KNOWN_SPEC_LABELS: [&str; 10] = [
    "Brand",
    "Manufacturer",
    "Size",
    "Count",
    "Flavor",
    "Food Form",
    "Container Type",
    "Dietary Features",
    "Net Content Statement",
    "Assembled Product Weight",
];

const IMAGE_PATTERNS: [&str; 3] = [
    r#"(?:src|data-src)\s*=\s*["'](https://i5\.walmartimages\.com/[^"'\s]+)"#,
    r#""url"\s*:\s*"(https://i5\.walmartimages\.com/[^"]+)""#,
    r#"(https://i5\.walmartimages\.com/[^"'\s)<>]+\.(?:jpe?g|png|webp))"#,
];

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("valid regex"))
        .collect()
}

/// The rule table in evaluation order.
pub static RULES: LazyLock<Vec<ExtractionRule>> = LazyLock::new(|| {
    vec![
        ExtractionRule {
            field: Field::Price,
            patterns: compile(&[
                r#""currentPrice"\s*:\s*\{[^{}]*?"price"\s*:\s*([0-9]+(?:\.[0-9]+)?)"#,
                r#"itemprop\s*=\s*["']price["'][^>]*?content\s*=\s*["']([0-9]+(?:\.[0-9]+)?)"#,
                r#""price"\s*:\s*"?\$?([0-9]+(?:\.[0-9]{1,2})?)"#,
                r"\$\s?([0-9]+\.[0-9]{2})\b",
            ]),
            validator: valid_price,
        },
        ExtractionRule {
            field: Field::PricePerUnit,
            patterns: compile(&[
                r#""unitPrice"\s*:\s*\{[^{}]*?"priceString"\s*:\s*"([^"]+)""#,
                r"([0-9]+(?:\.[0-9]+)?\s?¢/[A-Za-z. ]{1,12})",
                r"(\$[0-9]+\.[0-9]{2}\s?/\s?[A-Za-z. ]{1,12})",
            ]),
            validator: valid_short_text,
        },
        ExtractionRule {
            field: Field::Rating,
            patterns: compile(&[
                r#""averageRating"\s*:\s*([0-9](?:\.[0-9]+)?)"#,
                r"([0-9](?:\.[0-9])?) out of 5 [Ss]tars",
            ]),
            validator: valid_rating,
        },
        ExtractionRule {
            field: Field::ReviewCount,
            patterns: compile(&[
                r#""numberOfReviews"\s*:\s*([0-9]+)"#,
                r#""reviewCount"\s*:\s*"?([0-9]+)"#,
                r"([0-9][0-9,]*) (?:reviews|ratings)",
            ]),
            validator: valid_count,
        },
        ExtractionRule {
            field: Field::Description,
            patterns: compile(&[
                r"(?is)About this item\s*</h[1-6]>(.*?)</(?:section|ul)>",
                r"(?is)About this item(.+?)(?:Specifications|Ingredients|Directions)",
            ]),
            validator: valid_description,
        },
        ExtractionRule {
            field: Field::Ingredients,
            patterns: compile(&[
                r#"(Water,[^<>{}"]+?(?:Colorants|Fragrances?)[^<>{}".]*)"#,
                r#"(Water[^<>{}"]+?(?:Colorants|Fragrances?))"#,
                r"(?i)Ingredients:?\s*</[^>]+>\s*<[^>]+>([^<]+)",
                r#"(?i)Ingredients:\s*([^<{}"]+)"#,
            ]),
            validator: valid_ingredients,
        },
        ExtractionRule {
            field: Field::Directions,
            patterns: compile(&[
                r"(?i)Directions:?\s*</[^>]+>\s*<[^>]+>([^<]+)",
                r#"(?i)Directions:\s*([^<{}"]+)"#,
            ]),
            validator: valid_directions,
        },
    ]
});

static SPEC_RULES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    KNOWN_SPEC_LABELS
        .iter()
        .map(|label| {
            let pattern = format!(
                r"(?is)>\s*{}\s*</[^>]+>\s*(?:<[^>]+>\s*)+([^<]+)<",
                regex::escape(label)
            );
            (*label, Regex::new(&pattern).expect("valid regex"))
        })
        .collect()
});

static IMAGE_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| compile(&IMAGE_PATTERNS));

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid regex"));

/// The first validated capture of `rule` in `html`.
#[must_use]
pub fn apply_rule(rule: &ExtractionRule, html: &str) -> Option<String> {
    rule.patterns.iter().find_map(|pattern| {
        pattern
            .captures(html)
            .and_then(|cap| cap.get(1))
            .and_then(|m| (rule.validator)(m.as_str()))
    })
}

/// Runs [`RULES`], the specification labels, and the image sweep over
/// `html`, filling only fields of `page` that are still unset.
pub(crate) fn apply_rules(html: &str, page: &mut PageProduct) {
    for rule in RULES.iter() {
        if is_set(page, rule.field) {
            continue;
        }
        if let Some(value) = apply_rule(rule, html) {
            set(page, rule.field, &value);
        }
    }

    for spec in extract_known_specs(html) {
        if !page.specifications.iter().any(|s| s.name == spec.name) {
            page.specifications.push(spec);
        }
    }

    if page.image_urls.is_empty() {
        page.image_urls = extract_image_urls(html);
    }
}

fn is_set(page: &PageProduct, field: Field) -> bool {
    match field {
        Field::Price => page.price.is_some(),
        Field::PricePerUnit => page.price_per_unit.is_some(),
        Field::Rating => page.rating.is_some(),
        Field::ReviewCount => page.review_count.is_some(),
        Field::Description => page.description.is_some(),
        Field::Ingredients => page.ingredients.is_some(),
        Field::Directions => page.directions.is_some(),
    }
}

/// Stores a validated value. Validators guarantee numeric fields parse.
fn set(page: &mut PageProduct, field: Field, value: &str) {
    match field {
        Field::Price => page.price = value.parse().ok(),
        Field::PricePerUnit => page.price_per_unit = Some(value.to_owned()),
        Field::Rating => page.rating = value.parse().ok(),
        Field::ReviewCount => page.review_count = value.parse().ok(),
        Field::Description => page.description = Some(value.to_owned()),
        Field::Ingredients => page.ingredients = Some(value.to_owned()),
        Field::Directions => page.directions = Some(value.to_owned()),
    }
}

/// Label/value pairs for the known specification labels found in `html`.
#[must_use]
pub fn extract_known_specs(html: &str) -> Vec<Specification> {
    SPEC_RULES
        .iter()
        .filter_map(|(label, re)| {
            let value = collapse_whitespace(&strip_html(re.captures(html)?.get(1)?.as_str()));
            valid_short_text(&value).map(|value| Specification {
                name: (*label).to_owned(),
                value,
            })
        })
        .collect()
}

/// Product image URLs across every image pattern, query strings removed,
/// first occurrence kept.
#[must_use]
pub fn extract_image_urls(html: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();
    for re in IMAGE_RES.iter() {
        for cap in re.captures_iter(html) {
            let Some(m) = cap.get(1) else {
                continue;
            };
            let url = m.as_str().split('?').next().unwrap_or_default().to_owned();
            if seen.insert(url.clone()) {
                urls.push(url);
            }
        }
    }
    urls
}

/// The page `<title>` without the site suffix.
///
/// Product pages are titled `<name> - Walmart.com` (or `| Walmart.com`).
/// A title without that suffix, such as a bot-check interstitial, is not a
/// product name.
#[must_use]
pub fn title_name(html: &str) -> Option<String> {
    let title = strip_html(TITLE_RE.captures(html)?.get(1)?.as_str());
    let title = title.trim();
    let name = title
        .strip_suffix("Walmart.com")?
        .trim_end()
        .strip_suffix(['-', '|'])?
        .trim();
    (!name.is_empty()).then(|| name.to_owned())
}

fn valid_price(raw: &str) -> Option<String> {
    let price: f64 = raw.trim().parse().ok()?;
    (price > 0.0 && price < 100_000.0).then(|| raw.trim().to_owned())
}

fn valid_rating(raw: &str) -> Option<String> {
    let rating: f64 = raw.trim().parse().ok()?;
    (0.0..=5.0).contains(&rating).then(|| raw.trim().to_owned())
}

fn valid_count(raw: &str) -> Option<String> {
    let digits = raw.trim().replace(',', "");
    digits.parse::<u64>().ok().map(|_| digits)
}

fn valid_short_text(raw: &str) -> Option<String> {
    let text = collapse_whitespace(raw);
    (!text.is_empty() && text.chars().count() <= 200 && !looks_like_json(&text)).then_some(text)
}

fn valid_description(raw: &str) -> Option<String> {
    let text = strip_html(raw);
    if text.chars().count() < 20 || looks_like_json(&text) {
        return None;
    }
    Some(truncate_chars(&text, DESCRIPTION_MAX_CHARS))
}

fn valid_ingredients(raw: &str) -> Option<String> {
    let text = collapse_whitespace(&strip_html(raw));
    let len = text.chars().count();
    if !(10..=INGREDIENTS_MAX_CHARS).contains(&len) || looks_like_json(&text) || !text.contains(',')
    {
        return None;
    }
    Some(text)
}

fn valid_directions(raw: &str) -> Option<String> {
    let text = collapse_whitespace(&strip_html(raw));
    let len = text.chars().count();
    if !(10..=DIRECTIONS_MAX_CHARS).contains(&len) || looks_like_json(&text) {
        return None;
    }
    let lower = text.to_lowercase();
    DIRECTION_KEYWORDS
        .iter()
        .any(|k| lower.contains(k))
        .then_some(text)
}

#[cfg(test)]
#[path = "rules_test.rs"]
mod tests;
