//! Product extraction
//!
//! Two strategies, picked by [`CrawlMode`]:
//! - **Structured**: the first JSON-LD block whose `@type` is `Product`
//! - **Heuristic**: elements found by class token or `itemprop` attribute
//!
//! Missing elements turn into placeholder values rather than failing the
//! record; a record without any real data is suppressed.

use crate::config::{CrawlMode, SelectorConfig};
use crate::output::{decimal_comma, CrawlLog, FieldValue, ProductRecord};
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use url::Url;

/// Extracts a product from a parsed page
///
/// # Arguments
///
/// * `document` - The parsed page
/// * `mode` - Extraction strategy
/// * `selectors` - Class tokens for heuristic mode (empty = use `itemprop`)
/// * `page_url` - URL the page was fetched from
/// * `log` - Receives parse errors and missing-element notes
///
/// # Returns
///
/// * `Some(ProductRecord)` - At least one field holds real data
/// * `None` - No product markup, or every field empty/placeholder
pub fn extract_product(
    document: &Html,
    mode: CrawlMode,
    selectors: &SelectorConfig,
    page_url: &Url,
    log: &CrawlLog,
) -> Option<ProductRecord> {
    let record = match mode {
        CrawlMode::Structured => extract_structured(document, page_url, log)?,
        CrawlMode::Heuristic => extract_heuristic(document, selectors, page_url, log),
    };

    if record.is_empty() {
        tracing::debug!("Discarding empty product record from {}", page_url);
        None
    } else {
        Some(record)
    }
}

// ===== Structured (JSON-LD) =====

fn extract_structured(document: &Html, page_url: &Url, log: &CrawlLog) -> Option<ProductRecord> {
    let selector = Selector::parse(r#"script[type="application/ld+json"]"#).ok()?;

    for script in document.select(&selector) {
        let json_text: String = script.text().collect();

        let data: Value = match serde_json::from_str(&json_text) {
            Ok(data) => data,
            Err(e) => {
                log.error(format!("Error parsing JSON from {}: {}", page_url, e));
                continue;
            }
        };

        if data.get("@type").and_then(Value::as_str) != Some("Product") {
            continue;
        }

        return Some(product_from_json(&data, page_url));
    }

    None
}

fn product_from_json(data: &Value, page_url: &Url) -> ProductRecord {
    let image = match data.get("image") {
        Some(Value::Array(images)) => images.first().map(json_text).unwrap_or_default(),
        Some(Value::Object(object)) => object.get("url").map(json_text).unwrap_or_default(),
        Some(other) => json_text(other),
        None => String::new(),
    };

    // `offers` may be a single Offer or a list of them
    let offers = match data.get("offers") {
        Some(Value::Array(list)) => list.first(),
        other => other,
    };

    let price = offers
        .and_then(|o| o.get("price"))
        .map(json_text)
        .unwrap_or_default();

    let url = offers
        .and_then(|o| o.get("url"))
        .and_then(Value::as_str)
        .filter(|u| !u.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| page_url.to_string());

    ProductRecord {
        name: FieldValue::found(data.get("name").map(json_text).unwrap_or_default()),
        image: FieldValue::found(image),
        description: FieldValue::found(data.get("description").map(json_text).unwrap_or_default()),
        sku: FieldValue::found(data.get("sku").map(json_text).unwrap_or_default()),
        price: FieldValue::found(decimal_comma(&price)),
        url,
    }
}

/// Scalar JSON values as text; objects, arrays and null become empty
fn json_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

// ===== Heuristic (HTML) =====

/// The five product fields, named by their default `itemprop`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Image,
    Description,
    Sku,
    Price,
}

impl Field {
    fn itemprop(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Image => "image",
            Self::Description => "description",
            Self::Sku => "sku",
            Self::Price => "price",
        }
    }
}

fn extract_heuristic(
    document: &Html,
    selectors: &SelectorConfig,
    page_url: &Url,
    log: &CrawlLog,
) -> ProductRecord {
    ProductRecord {
        name: find_field(document, &selectors.name, Field::Name, log),
        image: find_field(document, &selectors.image, Field::Image, log),
        description: find_field(document, &selectors.description, Field::Description, log),
        sku: find_field(document, &selectors.sku, Field::Sku, log),
        price: find_field(document, &selectors.price, Field::Price, log),
        url: page_url.to_string(),
    }
}

/// Locates one field by class token (if given) or by its `itemprop`
fn find_field(document: &Html, class_token: &str, field: Field, log: &CrawlLog) -> FieldValue {
    let class_token = class_token.trim();
    let by_class = !class_token.is_empty();

    let element = if by_class {
        find_by_class(document, class_token)
    } else {
        find_by_itemprop(document, field.itemprop())
    };

    let Some(element) = element else {
        log.warn(format!(
            "{} not found using {}.",
            field.itemprop(),
            if by_class { "class" } else { "itemprop" }
        ));
        return FieldValue::not_found(format!("No {} found.", field.itemprop()));
    };

    match (field, by_class) {
        (Field::Image, true) => image_in_container(element, log),
        (Field::Image, false) => {
            let attrs = element.value();
            match attrs.attr("content").or_else(|| attrs.attr("src")) {
                Some(src) => FieldValue::found(src),
                None => missing(log, "Image not found with itemprop."),
            }
        }
        (Field::Description, true) => FieldValue::found(element.html()),
        (Field::Price, false) => {
            if has_offer_scope(document) {
                FieldValue::found(decimal_comma(&element_value(element)))
            } else {
                missing(log, "No itemprop offer found to get price from!")
            }
        }
        (Field::Price, true) => FieldValue::found(decimal_comma(&element_value(element))),
        _ => FieldValue::found(element_value(element)),
    }
}

fn missing(log: &CrawlLog, placeholder: &str) -> FieldValue {
    log.warn(placeholder);
    FieldValue::not_found(placeholder)
}

/// First element whose class list contains `token`
///
/// A token containing whitespace must equal the whole `class` attribute.
fn find_by_class<'a>(document: &'a Html, token: &str) -> Option<ElementRef<'a>> {
    let multi_word = token.split_whitespace().nth(1).is_some();

    all_elements(document).find(|element| {
        if multi_word {
            element.value().attr("class").map(str::trim) == Some(token)
        } else {
            element.value().classes().any(|class| class == token)
        }
    })
}

fn find_by_itemprop<'a>(document: &'a Html, itemprop: &str) -> Option<ElementRef<'a>> {
    all_elements(document).find(|element| element.value().attr("itemprop") == Some(itemprop))
}

/// True if the page declares an `itemprop="offers"` scope
fn has_offer_scope(document: &Html) -> bool {
    all_elements(document).any(|element| {
        let attrs = element.value();
        attrs.attr("itemprop") == Some("offers") && attrs.attr("itemscope").is_some()
    })
}

fn all_elements(document: &Html) -> impl Iterator<Item = ElementRef<'_>> {
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
}

fn image_in_container(element: ElementRef<'_>, log: &CrawlLog) -> FieldValue {
    let src = Selector::parse("img[src]")
        .ok()
        .and_then(|selector| element.select(&selector).next())
        .and_then(|img| img.value().attr("src"));

    match src {
        Some(src) => FieldValue::found(src),
        None => missing(log, "No image found in parent element!"),
    }
}

/// `content` of a meta element, otherwise the trimmed text
fn element_value(element: ElementRef<'_>) -> String {
    if element.value().name() == "meta" {
        return element.value().attr("content").unwrap_or_default().to_string();
    }

    element
        .text()
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .collect()
}
