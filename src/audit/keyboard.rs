//! Keyboard focus order and focus management checks.

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use super::{embedded_css, is_hidden, visible_text, Severity};

const NATIVE_FOCUSABLE: &str = "a[href], area[href], input:not([disabled]), \
    select:not([disabled]), textarea:not([disabled]), button:not([disabled]), \
    iframe, object, embed, [contenteditable], [tabindex]:not([tabindex^='-'])";

const INTERACTIVE_ROLES: &[&str] = &[
    "button",
    "checkbox",
    "link",
    "menuitem",
    "menuitemcheckbox",
    "menuitemradio",
    "option",
    "radio",
    "slider",
    "spinbutton",
    "switch",
    "tab",
    "textbox",
    "treeitem",
];

const FOCUS_PATTERNS: &[&str] = &[":focus", "focus-visible", "focus-within"];
const SKIP_LINK_WORDS: &[&str] = &["skip", "pular", "saltar"];
const MAX_TEXT_CHARS: usize = 50;

const FOCUS_RECOMMENDATIONS: &[&str] = &[
    "Ensure focus indicators are clearly visible",
    "Test navigation using only keyboard",
    "Verify focus doesn't get trapped in components",
    "Consider using skip links for long navigation lists",
];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusableElement {
    /// 1-based position in document order.
    pub order: usize,
    pub tag: String,
    #[serde(rename = "type")]
    pub input_type: Option<String>,
    pub role: Option<String>,
    pub tabindex: Option<String>,
    pub has_aria_label: bool,
    pub has_aria_labelledby: bool,
    pub has_accessible_name: bool,
    pub text_content: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyboardIssue {
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_order: Option<usize>,
    pub message: String,
}

impl KeyboardIssue {
    fn page(severity: Severity, message: &str) -> Self {
        Self {
            severity,
            element_order: None,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusOrder {
    pub total_focusable: usize,
    pub elements: Vec<FocusableElement>,
    pub issues: Vec<KeyboardIssue>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyboardTrap {
    pub element: String,
    pub classes: Vec<String>,
    pub warning: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusManagement {
    pub skip_links: bool,
    pub focus_indicators: bool,
    pub keyboard_traps: Vec<KeyboardTrap>,
    pub modal_focus: bool,
    pub issues: Vec<KeyboardIssue>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyboardReport {
    pub focus_order: FocusOrder,
    pub focus_management: FocusManagement,
}

impl KeyboardReport {
    /// Focus order and focus management issues together.
    pub fn issues(&self) -> impl Iterator<Item = &KeyboardIssue> {
        self.focus_order
            .issues
            .iter()
            .chain(self.focus_management.issues.iter())
    }
}

pub fn analyze_keyboard(html: &str, css: &str) -> KeyboardReport {
    let document = Html::parse_document(html);
    KeyboardReport {
        focus_order: focus_order(&document),
        focus_management: focus_management(&document, css),
    }
}

/// Visible keyboard-reachable elements in document order, with naming and
/// tabindex problems.
pub fn analyze_focus_order(html: &str) -> FocusOrder {
    focus_order(&Html::parse_document(html))
}

/// Page-wide focus handling: skip links, focus styles and modal traps.
/// `css` is checked along with the page's own `<style>` elements.
pub fn validate_focus_management(html: &str, css: &str) -> FocusManagement {
    focus_management(&Html::parse_document(html), css)
}

fn focus_order(document: &Html) -> FocusOrder {
    let candidate_list = format!("{}, [role]", NATIVE_FOCUSABLE);
    let (Ok(native), Ok(candidates)) = (
        Selector::parse(NATIVE_FOCUSABLE),
        Selector::parse(&candidate_list),
    ) else {
        return FocusOrder {
            total_focusable: 0,
            elements: Vec::new(),
            issues: Vec::new(),
            recommendations: Vec::new(),
        };
    };

    let focusable = document.select(&candidates).filter(|el| {
        let attrs = el.value();
        if is_hidden(el) || attrs.attr("type").map_or(false, |t| t.eq_ignore_ascii_case("hidden")) {
            return false;
        }
        native.matches(el)
            || attrs
                .attr("role")
                .map_or(false, |role| INTERACTIVE_ROLES.contains(&role.trim()))
    });

    let mut elements = Vec::new();
    let mut issues = Vec::new();

    for (i, el) in focusable.enumerate() {
        let order = i + 1;
        let attrs = el.value();
        let text = visible_text(&el);
        let element = FocusableElement {
            order,
            tag: attrs.name().to_string(),
            input_type: attrs.attr("type").map(str::to_string),
            role: attrs.attr("role").map(str::to_string),
            tabindex: attrs.attr("tabindex").map(str::to_string),
            has_aria_label: non_empty_attr(&el, "aria-label"),
            has_aria_labelledby: non_empty_attr(&el, "aria-labelledby"),
            has_accessible_name: has_accessible_name(&el, document, &text),
            text_content: text.chars().take(MAX_TEXT_CHARS).collect(),
        };

        if !element.has_accessible_name {
            issues.push(KeyboardIssue {
                severity: Severity::Error,
                element_order: Some(order),
                message: format!("Focusable {} element lacks accessible name", element.tag),
            });
        }

        if let Some(tabindex) = element.tabindex.as_deref() {
            if tabindex.trim().parse::<i32>().map_or(false, |v| v > 0) {
                issues.push(KeyboardIssue {
                    severity: Severity::Warning,
                    element_order: Some(order),
                    message: format!(
                        "Positive tabindex ({}) can disrupt natural focus order",
                        tabindex.trim()
                    ),
                });
            }
        }

        elements.push(element);
    }

    let recommendations = if elements.is_empty() {
        Vec::new()
    } else {
        FOCUS_RECOMMENDATIONS.iter().map(|r| r.to_string()).collect()
    };

    FocusOrder {
        total_focusable: elements.len(),
        elements,
        issues,
        recommendations,
    }
}

fn focus_management(document: &Html, css: &str) -> FocusManagement {
    let mut issues = Vec::new();

    let skip_links = select_all(document, "a").iter().any(is_skip_link);
    if !skip_links {
        issues.push(KeyboardIssue::page(
            Severity::Warning,
            "No skip links found. Consider adding skip navigation for keyboard users.",
        ));
    }

    let styles = format!("{}\n{}", css, embedded_css(document));
    let focus_indicators = FOCUS_PATTERNS.iter().any(|p| styles.contains(p));
    if !focus_indicators {
        issues.push(KeyboardIssue::page(
            Severity::Error,
            "No focus indicators found in styles. All interactive elements must have visible focus indicators.",
        ));
    }

    let keyboard_traps: Vec<KeyboardTrap> = select_all(document, "[tabindex='-1']")
        .iter()
        .filter(|el| is_modal_like(el))
        .map(|el| KeyboardTrap {
            element: el.value().name().to_string(),
            classes: el.value().classes().map(str::to_string).collect(),
            warning: "Potential keyboard trap in modal-like element".to_string(),
        })
        .collect();

    FocusManagement {
        skip_links,
        focus_indicators,
        modal_focus: keyboard_traps.is_empty(),
        keyboard_traps,
        issues,
    }
}

fn has_accessible_name(el: &ElementRef<'_>, document: &Html, text: &str) -> bool {
    if !text.is_empty()
        || non_empty_attr(el, "aria-label")
        || non_empty_attr(el, "aria-labelledby")
        || non_empty_attr(el, "title")
    {
        return true;
    }

    match el.value().name() {
        "input" => {
            let kind = el.value().attr("type").unwrap_or("text").to_ascii_lowercase();
            match kind.as_str() {
                // browsers supply a default label
                "submit" | "reset" => true,
                "button" => non_empty_attr(el, "value"),
                "image" => non_empty_attr(el, "alt"),
                _ => has_label(el, document),
            }
        }
        "select" | "textarea" => has_label(el, document),
        _ => select_within(el, "img[alt]")
            .iter()
            .any(|img| non_empty_attr(img, "alt")),
    }
}

/// Wrapped in a `<label>`, or pointed at by one through `for`.
fn has_label(el: &ElementRef<'_>, document: &Html) -> bool {
    if el
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| a.value().name() == "label")
    {
        return true;
    }
    let Some(id) = el.value().id() else {
        return false;
    };
    select_all(document, "label[for]")
        .iter()
        .any(|label| label.value().attr("for") == Some(id) && !visible_text(label).is_empty())
}

fn is_skip_link(a: &ElementRef<'_>) -> bool {
    if a.value().classes().any(|c| c.to_ascii_lowercase().contains("skip")) {
        return true;
    }
    let in_page = a.value().attr("href").map_or(false, |h| h.starts_with('#'));
    let text = visible_text(a).to_lowercase();
    in_page && SKIP_LINK_WORDS.iter().any(|w| text.contains(w))
}

fn is_modal_like(el: &ElementRef<'_>) -> bool {
    let attrs = el.value();
    attrs.classes().any(|c| c == "modal")
        || matches!(attrs.attr("role"), Some("dialog") | Some("alertdialog"))
        || attrs.attr("aria-modal") == Some("true")
}

fn non_empty_attr(el: &ElementRef<'_>, name: &str) -> bool {
    el.value().attr(name).map_or(false, |v| !v.trim().is_empty())
}

fn select_all<'a>(document: &'a Html, selector: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(selector) {
        Ok(sel) => document.select(&sel).collect(),
        Err(_) => Vec::new(),
    }
}

fn select_within<'a>(el: &ElementRef<'a>, selector: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(selector) {
        Ok(sel) => el.select(&sel).collect(),
        Err(_) => Vec::new(),
    }
}
