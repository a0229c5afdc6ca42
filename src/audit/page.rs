//! All four checks over one page, with a combined score.

use serde::Serialize;

use super::contrast::{self, PageContrastReport};
use super::headings::{self, HeadingOptions, HeadingReport};
use super::images::{self, ImageReport};
use super::keyboard::{self, KeyboardReport};
use super::Severity;

const ERROR_PENALTY: u32 = 10;
const WARNING_PENALTY: u32 = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckCounts {
    pub errors: u32,
    pub warnings: u32,
    pub total_issues: u32,
}

impl CheckCounts {
    fn from_severities<'a>(severities: impl Iterator<Item = &'a Severity>) -> Self {
        let mut counts = Self::default();
        for severity in severities {
            match severity {
                Severity::Error => counts.errors += 1,
                Severity::Warning => counts.warnings += 1,
                Severity::Info => {}
            }
            counts.total_issues += 1;
        }
        counts
    }

    fn warnings(n: usize) -> Self {
        let n = n as u32;
        Self {
            errors: 0,
            warnings: n,
            total_issues: n,
        }
    }

    fn add(&mut self, other: CheckCounts) {
        self.errors += other.errors;
        self.warnings += other.warnings;
        self.total_issues += other.total_issues;
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerCheckCounts {
    pub headings: CheckCounts,
    pub images: CheckCounts,
    pub color_contrast: CheckCounts,
    pub keyboard_navigation: CheckCounts,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditSummary {
    pub total_issues: u32,
    pub errors: u32,
    pub warnings: u32,
    pub accessibility_score: f64,
    pub checks: PerCheckCounts,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageAudit {
    pub headings: HeadingReport,
    pub images: ImageReport,
    pub color_contrast: PageContrastReport,
    pub keyboard_navigation: KeyboardReport,
    pub summary: AuditSummary,
}

/// Runs the heading, image, contrast and keyboard checks over one page.
///
/// Contrast failures and keyboard findings count as warnings whatever their
/// own severity. The score starts at 100 and loses 10 per error and 2 per
/// warning; a page with no issues at all is scored as the mean of the
/// per-check scores instead.
pub fn audit_page(html: &str, css: &str, options: &HeadingOptions) -> PageAudit {
    let headings = headings::check_hierarchy(html, options);
    let images = images::analyze_images(html);
    let color_contrast = contrast::analyze_page(html, css);
    let keyboard_navigation = keyboard::analyze_keyboard(html, css);

    let checks = PerCheckCounts {
        headings: CheckCounts::from_severities(headings.findings.iter().map(|f| &f.severity)),
        images: CheckCounts::from_severities(images.issues.iter().map(|i| &i.severity)),
        color_contrast: CheckCounts::warnings(color_contrast.failing_pairs),
        keyboard_navigation: CheckCounts::warnings(keyboard_navigation.issues().count()),
    };

    let mut totals = CheckCounts::default();
    for counts in [
        checks.headings,
        checks.images,
        checks.color_contrast,
        checks.keyboard_navigation,
    ] {
        totals.add(counts);
    }

    let accessibility_score = if totals.total_issues == 0 {
        component_score(&headings, &images, &color_contrast)
    } else {
        let penalty = totals.errors * ERROR_PENALTY + totals.warnings * WARNING_PENALTY;
        f64::from(100u32.saturating_sub(penalty))
    };

    PageAudit {
        headings,
        images,
        color_contrast,
        keyboard_navigation,
        summary: AuditSummary {
            total_issues: totals.total_issues,
            errors: totals.errors,
            warnings: totals.warnings,
            accessibility_score,
            checks,
        },
    }
}

/// Mean of the per-check scores for an issue-free page. Keyboard scores 100
/// here since any keyboard finding would have been counted as an issue.
fn component_score(
    headings: &HeadingReport,
    images: &ImageReport,
    color_contrast: &PageContrastReport,
) -> f64 {
    let heading_score = if headings.summary.valid_hierarchy {
        100.0
    } else {
        let errors = headings
            .findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
            .count();
        (100.0 - 25.0 * errors as f64).max(50.0)
    };
    let scores = [
        heading_score,
        images.summary.accessibility_score,
        color_contrast.accessibility_score,
        100.0,
    ];
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    (mean * 100.0).round() / 100.0
}
