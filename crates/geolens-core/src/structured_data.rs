//! Schema.org extraction from JSON-LD, microdata and RDFa

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde_json::{Map, Value as JsonValue};

use crate::types::{SchemaItem, SchemaOrgSummary, SchemaSource};

const MAX_SCHEMAS: usize = 10;
const MAX_SCORE: u32 = 15;

const ARTICLE_TYPES: &[&str] = &["Article", "NewsArticle", "BlogPosting", "TechArticle"];
const QA_TYPES: &[&str] = &["QAPage", "Question", "Answer"];
const PRODUCT_TYPES: &[&str] = &["Product", "Offer"];

static SCRIPT: Lazy<Selector> = Lazy::new(|| Selector::parse("script").expect("valid selector"));
static MICRODATA_ROOT: Lazy<Selector> =
    Lazy::new(|| Selector::parse("[itemscope][itemtype]").expect("valid selector"));
static RDFA_ROOT: Lazy<Selector> =
    Lazy::new(|| Selector::parse("[typeof]").expect("valid selector"));
static ITEMPROP: Lazy<Selector> =
    Lazy::new(|| Selector::parse("[itemprop]").expect("valid selector"));
static RDFA_PROPERTY: Lazy<Selector> =
    Lazy::new(|| Selector::parse("[property]").expect("valid selector"));

/// Extract JSON-LD script blocks from a parsed document
pub fn extract_json_ld_blocks(document: &Html) -> Vec<String> {
    document
        .select(&SCRIPT)
        .filter_map(|element| {
            let script_type = element
                .value()
                .attr("type")
                .map(|t| t.trim().to_ascii_lowercase())
                .unwrap_or_default();

            // Use contains() to catch variations like "application/ld+json; charset=utf-8"
            if script_type.contains("ld+json") {
                let text = element.text().collect::<String>().trim().to_string();
                if text.is_empty() { None } else { Some(text) }
            } else {
                None
            }
        })
        .collect()
}

/// Schema.org summary for `document`, or [`SchemaOrgSummary::unavailable`]
/// when the capability is switched off.
pub fn extract_structured_data(document: &Html, enabled: bool) -> SchemaOrgSummary {
    if !enabled {
        return SchemaOrgSummary::unavailable();
    }

    let mut items = json_ld_items(document);
    items.extend(microdata_items(document));
    items.extend(rdfa_items(document));
    summarize(items)
}

/// Flags and score for a list of discovered schemas.
pub fn summarize(items: Vec<SchemaItem>) -> SchemaOrgSummary {
    let mut types_found: Vec<String> = Vec::new();
    for item in &items {
        if !types_found.contains(&item.schema_type) {
            types_found.push(item.schema_type.clone());
        }
    }

    let has_article = has_any(&types_found, ARTICLE_TYPES);
    let has_faq = has_any(&types_found, &["FAQPage"]);
    let has_howto = has_any(&types_found, &["HowTo"]);
    let has_qa = has_any(&types_found, QA_TYPES);
    let has_organization = has_any(&types_found, &["Organization"]);
    let has_person = has_any(&types_found, &["Person"]);
    let has_product = has_any(&types_found, PRODUCT_TYPES);
    let has_breadcrumb = has_any(&types_found, &["BreadcrumbList"]);

    let mut score: u32 = 0;
    if !items.is_empty() {
        score += 5;
    }
    if has_article {
        score += 3;
    }
    if has_faq {
        score += 4;
    }
    if has_howto {
        score += 3;
    }
    if has_qa {
        score += 3;
    }
    if has_breadcrumb {
        score += 1;
    }

    let mut schemas = items;
    schemas.truncate(MAX_SCHEMAS);

    SchemaOrgSummary {
        available: true,
        schemas,
        types_found,
        has_article,
        has_faq,
        has_howto,
        has_qa,
        has_organization,
        has_person,
        has_product,
        has_breadcrumb,
        score_contribution: score.min(MAX_SCORE),
    }
}

fn has_any(types: &[String], candidates: &[&str]) -> bool {
    types.iter().any(|t| candidates.contains(&t.as_str()))
}

fn json_ld_items(document: &Html) -> Vec<SchemaItem> {
    let mut items = Vec::new();

    for block in extract_json_ld_blocks(document) {
        let parsed: JsonValue = match serde_json::from_str(&block) {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!(error = %err, "skipping JSON-LD block that failed to parse");
                continue;
            }
        };

        for node in flatten_json_ld(parsed) {
            items.push(SchemaItem {
                schema_type: json_ld_type(&node),
                source: SchemaSource::JsonLd,
                data: node,
            });
        }
    }

    items
}

/// Top-level objects of a JSON-LD document, expanding arrays and `@graph`.
fn flatten_json_ld(value: JsonValue) -> Vec<JsonValue> {
    match value {
        JsonValue::Array(values) => values.into_iter().flat_map(flatten_json_ld).collect(),
        JsonValue::Object(mut obj) => match obj.remove("@graph") {
            Some(JsonValue::Array(graph)) => graph
                .into_iter()
                .filter(JsonValue::is_object)
                .collect(),
            Some(graph @ JsonValue::Object(_)) => vec![graph],
            Some(other) => {
                obj.insert("@graph".to_string(), other);
                vec![JsonValue::Object(obj)]
            }
            None => vec![JsonValue::Object(obj)],
        },
        _ => Vec::new(),
    }
}

fn json_ld_type(node: &JsonValue) -> String {
    let raw = match node.get("@type") {
        Some(JsonValue::String(t)) => Some(t.as_str()),
        Some(JsonValue::Array(types)) => types.first().and_then(JsonValue::as_str),
        _ => None,
    };
    raw.map(short_type).unwrap_or_else(|| "Unknown".to_string())
}

/// `https://schema.org/Article` and `schema:Article` both become `Article`.
fn short_type(raw: &str) -> String {
    let first = raw.split_whitespace().next().unwrap_or(raw);
    first
        .rsplit(['/', '#', ':'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(first)
        .to_string()
}

fn microdata_items(document: &Html) -> Vec<SchemaItem> {
    document
        .select(&MICRODATA_ROOT)
        .filter(|el| !has_ancestor_with(el, "itemscope"))
        .map(|el| {
            let data = microdata_object(el);
            SchemaItem {
                schema_type: short_type(el.value().attr("itemtype").unwrap_or_default()),
                source: SchemaSource::Microdata,
                data,
            }
        })
        .collect()
}

fn microdata_object(scope: ElementRef<'_>) -> JsonValue {
    let mut obj = Map::new();
    if let Some(itemtype) = scope.value().attr("itemtype") {
        obj.insert("@type".to_string(), JsonValue::String(short_type(itemtype)));
    }

    for prop in scope.select(&ITEMPROP) {
        if nearest_scope(&prop, "itemscope").map(|s| s.id()) != Some(scope.id()) {
            continue;
        }
        let Some(name) = prop.value().attr("itemprop") else {
            continue;
        };
        let value = if prop.value().attr("itemscope").is_some() {
            microdata_object(prop)
        } else {
            JsonValue::String(property_value(&prop))
        };
        insert_property(&mut obj, name, value);
    }

    JsonValue::Object(obj)
}

fn rdfa_items(document: &Html) -> Vec<SchemaItem> {
    document
        .select(&RDFA_ROOT)
        .filter(|el| !has_ancestor_with(el, "typeof"))
        .map(|el| SchemaItem {
            schema_type: short_type(el.value().attr("typeof").unwrap_or_default()),
            source: SchemaSource::Rdfa,
            data: rdfa_object(el),
        })
        .collect()
}

fn rdfa_object(scope: ElementRef<'_>) -> JsonValue {
    let mut obj = Map::new();
    if let Some(kind) = scope.value().attr("typeof") {
        obj.insert("@type".to_string(), JsonValue::String(short_type(kind)));
    }

    for prop in scope.select(&RDFA_PROPERTY) {
        if nearest_scope(&prop, "typeof").map(|s| s.id()) != Some(scope.id()) {
            continue;
        }
        let Some(name) = prop.value().attr("property") else {
            continue;
        };
        let value = if prop.value().attr("typeof").is_some() {
            rdfa_object(prop)
        } else {
            JsonValue::String(property_value(&prop))
        };
        insert_property(&mut obj, &short_type(name), value);
    }

    JsonValue::Object(obj)
}

/// The closest ancestor carrying `attr`.
fn nearest_scope<'a>(element: &ElementRef<'a>, attr: &str) -> Option<ElementRef<'a>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().attr(attr).is_some())
}

fn has_ancestor_with(element: &ElementRef<'_>, attr: &str) -> bool {
    nearest_scope(element, attr).is_some()
}

fn property_value(element: &ElementRef<'_>) -> String {
    let el = element.value();
    ["content", "href", "src", "datetime"]
        .iter()
        .find_map(|attr| el.attr(attr))
        .map(str::to_string)
        .unwrap_or_else(|| {
            element
                .text()
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
}

/// Repeated properties collect into an array.
fn insert_property(obj: &mut Map<String, JsonValue>, name: &str, value: JsonValue) {
    match obj.get_mut(name) {
        Some(JsonValue::Array(values)) => values.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = JsonValue::Array(vec![first, value]);
        }
        None => {
            obj.insert(name.to_string(), value);
        }
    }
}
