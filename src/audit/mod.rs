//! Local, deterministic accessibility checks that need no upstream model.

pub mod contrast;
pub mod headings;
pub mod images;
pub mod keyboard;
pub mod page;

use scraper::{ElementRef, Html, Node, Selector};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// True when the element or any of its ancestors is hidden from assistive tech.
pub(crate) fn is_hidden(el: &ElementRef<'_>) -> bool {
    is_hidden_self(el) || el.ancestors().filter_map(ElementRef::wrap).any(|a| is_hidden_self(&a))
}

pub(crate) fn is_hidden_self(el: &ElementRef<'_>) -> bool {
    let attrs = el.value();
    if attrs.attr("hidden").is_some() || attrs.attr("aria-hidden") == Some("true") {
        return true;
    }
    attrs.attr("style").map_or(false, style_hides)
}

/// Inline declarations that take an element out of the rendered page:
/// `display:none`, `visibility:hidden`, or a zero opacity, height or width.
fn style_hides(style: &str) -> bool {
    declarations(style).any(|(property, value)| {
        let value = value.to_ascii_lowercase();
        match property.as_str() {
            "display" => value == "none",
            "visibility" => value == "hidden",
            "opacity" | "height" | "width" => is_zero_length(&value),
            _ => false,
        }
    })
}

/// `property: value` pairs of one declaration block. Properties are lowercased
/// and `!important` is dropped from values.
pub(crate) fn declarations(block: &str) -> impl Iterator<Item = (String, &str)> {
    block.split(';').filter_map(|decl| {
        let (property, value) = decl.split_once(':')?;
        let value = value.trim().trim_end_matches("!important").trim_end();
        Some((property.trim().to_ascii_lowercase(), value))
    })
}

/// Contents of every `<style>` element, joined.
pub(crate) fn embedded_css(document: &Html) -> String {
    let Ok(sel) = Selector::parse("style") else {
        return String::new();
    };
    document
        .select(&sel)
        .map(|style| style.text().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text content with hidden descendants left out, whitespace collapsed.
pub(crate) fn visible_text(el: &ElementRef<'_>) -> String {
    let mut parts = Vec::new();
    collect_text(el, &mut parts);
    parts.join(" ")
}

fn collect_text(el: &ElementRef<'_>, parts: &mut Vec<String>) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => {
                let words = text.split_whitespace().collect::<Vec<_>>().join(" ");
                if !words.is_empty() {
                    parts.push(words);
                }
            }
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    if !is_hidden_self(&child_el) {
                        collect_text(&child_el, parts);
                    }
                }
            }
            _ => {}
        }
    }
}

fn is_zero_length(value: &str) -> bool {
    value
        .trim_end_matches(|c: char| c.is_ascii_alphabetic() || c == '%')
        .parse::<f64>()
        .map_or(false, |v| v == 0.0)
}
