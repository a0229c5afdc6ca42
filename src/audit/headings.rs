//! Heading hierarchy validation.

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use super::{is_hidden, visible_text, Severity};

const HEADING_SELECTOR: &str = "h1, h2, h3, h4, h5, h6, [role=heading]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Document,
    Main,
    Article,
}

impl Scope {
    fn selector(&self) -> Option<&'static str> {
        match self {
            Scope::Document => None,
            Scope::Main => Some("main, [role=main]"),
            Scope::Article => Some("article, [role=article]"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeadingOptions {
    pub allow_multiple_h1: bool,
    pub allow_start_at_h2: bool,
    pub scope: Scope,
    pub check_empty_headings: bool,
    pub check_long_headings: bool,
    pub max_heading_length: usize,
}

impl Default for HeadingOptions {
    fn default() -> Self {
        Self {
            allow_multiple_h1: false,
            allow_start_at_h2: false,
            scope: Scope::Document,
            check_empty_headings: true,
            check_long_headings: true,
            max_heading_length: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    /// `h1`..`h6`, or `role=heading` for ARIA headings.
    pub tag: String,
    pub level: u8,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<Heading>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<Heading>,
}

impl Finding {
    fn new(severity: Severity, message: String) -> Self {
        Self {
            severity,
            message,
            previous: None,
            current: None,
        }
    }

    fn at(mut self, current: &Heading) -> Self {
        self.current = Some(current.clone());
        self
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadingSummary {
    pub h1_count: usize,
    pub total: usize,
    pub valid_hierarchy: bool,
    pub max_level: u8,
    pub scope: Scope,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeadingReport {
    pub headings: Vec<Heading>,
    pub findings: Vec<Finding>,
    pub summary: HeadingSummary,
}

/// Visible headings inside `scope`, in document order.
pub fn parse_headings(html: &str, scope: Scope) -> Vec<Heading> {
    let document = Html::parse_document(html);
    let root = scope
        .selector()
        .and_then(|s| Selector::parse(s).ok())
        .and_then(|sel| document.select(&sel).next())
        .unwrap_or_else(|| document.root_element());

    let selector = match Selector::parse(HEADING_SELECTOR) {
        Ok(sel) => sel,
        Err(_) => return Vec::new(),
    };

    root.select(&selector)
        .filter(|el| !is_hidden(el))
        .filter_map(|el| {
            let name = el.value().name();
            let (tag, level) = match heading_tag_level(name) {
                Some(level) => (name.to_string(), level),
                None => ("role=heading".to_string(), aria_level(&el)?),
            };
            Some(Heading {
                tag,
                level,
                text: visible_text(&el),
            })
        })
        .collect()
}

pub fn check_hierarchy(html: &str, options: &HeadingOptions) -> HeadingReport {
    let headings = parse_headings(html, options.scope);
    let mut findings = Vec::new();

    if headings.is_empty() {
        findings.push(Finding::new(
            Severity::Warning,
            "No headings found. Consider adding headings to improve document structure and accessibility.".to_string(),
        ));
        return HeadingReport {
            headings,
            findings,
            summary: HeadingSummary {
                h1_count: 0,
                total: 0,
                valid_hierarchy: false,
                max_level: 0,
                scope: options.scope,
            },
        };
    }

    let first = &headings[0];
    if !options.allow_start_at_h2 && first.level > 1 {
        findings.push(
            Finding::new(
                Severity::Warning,
                format!(
                    "Document starts with H{} instead of H1. Consider starting with H1 for better document structure.",
                    first.level
                ),
            )
            .at(first),
        );
    }

    let h1_count = headings.iter().filter(|h| h.level == 1).count();
    if !options.allow_multiple_h1 && h1_count > 1 {
        findings.push(
            Finding::new(
                Severity::Warning,
                format!(
                    "Multiple H1 headings found ({}). Consider using only one H1 per page.",
                    h1_count
                ),
            )
            .at(first),
        );
    } else if h1_count == 0 {
        findings.push(Finding::new(
            Severity::Warning,
            "No H1 heading found. Each page should have exactly one H1 for the main title.".to_string(),
        ));
    }

    let mut valid_hierarchy = true;
    for pair in headings.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);
        if curr.level > prev.level + 1 {
            valid_hierarchy = false;
            findings.push(Finding {
                severity: Severity::Error,
                message: format!(
                    "Invalid heading level jump: H{} to H{}. Headings should increase by one level at a time. Consider using H{}.",
                    prev.level,
                    curr.level,
                    prev.level + 1
                ),
                previous: Some(prev.clone()),
                current: Some(curr.clone()),
            });
        }
    }

    if options.check_empty_headings {
        for heading in headings.iter().filter(|h| h.text.is_empty()) {
            findings.push(
                Finding::new(
                    Severity::Error,
                    format!(
                        "Empty heading found: {}. All headings must have meaningful text content.",
                        heading.tag.to_uppercase()
                    ),
                )
                .at(heading),
            );
        }
    }

    if options.check_long_headings {
        for heading in &headings {
            let length = heading.text.chars().count();
            if length > options.max_heading_length {
                let preview: String = heading.text.chars().take(50).collect();
                findings.push(
                    Finding::new(
                        Severity::Warning,
                        format!(
                            "Long heading text ({} chars): {}... Consider keeping headings under {} characters for better accessibility.",
                            length, preview, options.max_heading_length
                        ),
                    )
                    .at(heading),
                );
            }
        }
    }

    let summary = HeadingSummary {
        h1_count,
        total: headings.len(),
        valid_hierarchy,
        max_level: headings.iter().map(|h| h.level).max().unwrap_or(0),
        scope: options.scope,
    };

    HeadingReport {
        headings,
        findings,
        summary,
    }
}

fn heading_tag_level(name: &str) -> Option<u8> {
    match name {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

fn aria_level(el: &ElementRef<'_>) -> Option<u8> {
    el.value()
        .attr("aria-level")
        .and_then(|v| v.trim().parse::<u8>().ok())
        .filter(|level| (1..=6).contains(level))
}
