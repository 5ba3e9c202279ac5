//! Field extraction from raw API records to flat [`shelfscan_core`] records.
//!
//! Pure functions only: no I/O, no logging. Missing optional fields become
//! the documented defaults (`"N/A"`, `false`, empty) instead of errors.

use std::collections::BTreeSet;
use std::iter::Peekable;
use std::str::Chars;

use serde_json::Value;
use shelfscan_core::{is_valid_category_key, ProductDetail, ProductSummary};

use crate::types::{RawCategory, RawDetail, RawProduct};

const NOT_AVAILABLE: &str = "N/A";

/// Maps one listing entry to a [`ProductSummary`].
#[must_use]
pub fn normalize_summary(raw: RawProduct) -> ProductSummary {
    let price_display = raw
        .price
        .and_then(|p| p.amount_relevant_display)
        .unwrap_or_else(|| NOT_AVAILABLE.to_owned());
    let snap_eligible = raw
        .country_extensions
        .and_then(|c| c.us_snap_eligible)
        .unwrap_or(false);

    ProductSummary {
        id: raw.sku,
        name: raw.name,
        brand: raw.brand_name.unwrap_or_default(),
        price_display,
        unit_label: raw
            .selling_size
            .unwrap_or_else(|| NOT_AVAILABLE.to_owned()),
        url_slug: raw.url_slug_text.unwrap_or_default(),
        snap_eligible,
    }
}

/// Maps a detail record to a [`ProductDetail`].
///
/// `requested_id` is used when the record does not echo its own SKU.
#[must_use]
pub fn normalize_detail(requested_id: &str, raw: RawDetail) -> ProductDetail {
    let id = raw
        .sku
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| requested_id.to_owned());

    let mut detail = ProductDetail {
        id,
        description: raw.description.unwrap_or_default(),
        country_of_origin: raw.country_origin.unwrap_or_default(),
        ..ProductDetail::default()
    };

    for category in raw.categories.unwrap_or_default() {
        if let Some(key) = category_key(&category) {
            detail.insert_category_key(&key);
        }
        if let Some(name) = category.name.filter(|n| !n.is_empty()) {
            detail.category_names.push(name);
        }
    }

    detail.image_url = raw
        .assets
        .unwrap_or_default()
        .into_iter()
        .next()
        .and_then(|a| a.url);

    if let Some(warning) = raw.warnings.unwrap_or_default().into_iter().next() {
        detail.warning_code = warning.key;
        detail.warning_text = warning.message;
    }

    detail
}

/// A category's key, preferring `key` and falling back to `id`.
fn category_key(category: &RawCategory) -> Option<String> {
    category
        .key
        .as_ref()
        .and_then(scalar_to_string)
        .filter(|k| is_valid_category_key(k))
        .or_else(|| {
            category
                .id
                .as_ref()
                .and_then(scalar_to_string)
                .filter(|k| is_valid_category_key(k))
        })
}

/// Renders a string or number as a key; anything else is not a key.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Union of every non-blank category key across `details`.
#[must_use]
pub fn extract_category_keys(details: &[ProductDetail]) -> BTreeSet<String> {
    details
        .iter()
        .flat_map(|d| d.category_keys.iter())
        .filter(|k| is_valid_category_key(k))
        .cloned()
        .collect()
}

/// Parses a stringified key list such as `["12", "34"]` or `['12', '34']`.
///
/// Returns `None` when `raw` is not a bracketed list of quoted strings or
/// numbers. Quoted items may contain commas and backslash escapes. Blank
/// entries are dropped from a successful parse.
#[must_use]
pub fn try_parse_key_list(raw: &str) -> Option<Vec<String>> {
    let trimmed = raw.trim();
    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(trimmed) {
        return items
            .iter()
            .map(scalar_to_string)
            .collect::<Option<Vec<_>>>()
            .map(|keys| keys.into_iter().filter(|k| is_valid_category_key(k)).collect());
    }

    let inner = trimmed.strip_prefix('[')?.strip_suffix(']')?;

    let mut keys = Vec::new();
    let mut chars = inner.chars().peekable();
    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let Some(&first) = chars.peek() else {
            break;
        };

        let key = if first == '\'' || first == '"' {
            chars.next();
            read_quoted(&mut chars, first)?
        } else {
            let mut bare = String::new();
            while let Some(c) = chars.next_if(|c| *c != ',') {
                bare.push(c);
            }
            let bare = bare.trim_end().to_owned();
            if bare.is_empty() || !bare.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            bare
        };
        if is_valid_category_key(&key) {
            keys.push(key);
        }

        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        match chars.next() {
            None => break,
            Some(',') => {}
            Some(_) => return None,
        }
    }
    Some(keys)
}

/// Reads up to the closing `quote`, honouring backslash escapes. `None` if
/// the string is unterminated.
fn read_quoted(chars: &mut Peekable<Chars<'_>>, quote: char) -> Option<String> {
    let mut out = String::new();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push(chars.next()?),
            c if c == quote => return Some(out),
            c => out.push(c),
        }
    }
    None
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
