//! Image and SVG text-alternative checks.

use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use super::Severity;

const DECORATIVE_PATTERNS: &[&str] = &[
    "decoration",
    "ornament",
    "divider",
    "spacer",
    "bullet",
    "icon-only",
    "background",
    "texture",
];

const COMPLEX_IMAGE_TYPES: &[&str] = &[
    "chart",
    "graph",
    "diagram",
    "map",
    "infographic",
    "flowchart",
    "screenshot",
    "data-viz",
];

const REDUNDANT_PHRASES: &[&str] = &[
    "image of",
    "picture of",
    "photo of",
    "graphic of",
    "icon of",
    "logo of",
    "illustration of",
];

const MAX_ALT_LENGTH: usize = 125;
const GOOD_ALT_SCORE: u8 = 7;

const COMPLEX_NEEDS_DESCRIPTION: &str = "Complex image needs long description";

#[derive(Debug, Clone, Serialize)]
pub struct AltQuality {
    /// Out of 10.
    pub score: u8,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageFinding {
    pub index: usize,
    pub src: String,
    /// `None` when the attribute is absent, `Some("")` for explicit decoration.
    pub alt: Option<String>,
    pub in_figure: bool,
    pub has_figcaption: bool,
    pub is_decorative: bool,
    pub is_complex: bool,
    pub alt_quality: AltQuality,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SvgFinding {
    pub index: usize,
    pub has_title: bool,
    pub has_desc: bool,
    pub aria_label: Option<String>,
    pub role: Option<String>,
    pub needs_attention: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Issue {
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSummary {
    pub missing_alt: usize,
    pub weak_alt: usize,
    pub good_alt: usize,
    pub decorative: usize,
    pub complex_images: usize,
    pub accessibility_score: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageReport {
    pub total_images: usize,
    pub svg_count: usize,
    pub figure_count: usize,
    pub images: Vec<ImageFinding>,
    pub svgs: Vec<SvgFinding>,
    pub issues: Vec<Issue>,
    pub summary: ImageSummary,
    pub recommendations: Vec<String>,
}

pub fn analyze_images(html: &str) -> ImageReport {
    let document = Html::parse_document(html);

    let images: Vec<ImageFinding> = select_all(&document, "img")
        .iter()
        .enumerate()
        .map(|(i, img)| analyze_image(img, i + 1))
        .collect();
    let svgs: Vec<SvgFinding> = select_all(&document, "svg")
        .iter()
        .enumerate()
        .map(|(i, svg)| analyze_svg(svg, i + 1))
        .collect();
    let figure_count = select_all(&document, "figure").len();

    let mut summary = ImageSummary::default();
    let mut issues = Vec::new();

    for image in &images {
        match image.alt.as_deref() {
            None => {
                summary.missing_alt += 1;
                issues.push(Issue {
                    severity: Severity::Error,
                    message: format!(
                        "Image #{} missing alt attribute: {}",
                        image.index, image.src
                    ),
                });
            }
            Some("") => summary.decorative += 1,
            Some(_) if image.alt_quality.score >= GOOD_ALT_SCORE => summary.good_alt += 1,
            Some(_) => summary.weak_alt += 1,
        }
        if image.is_complex {
            summary.complex_images += 1;
        }
    }

    for svg in svgs.iter().filter(|s| s.needs_attention) {
        issues.push(Issue {
            severity: Severity::Warning,
            message: format!("SVG #{} may need accessibility improvements", svg.index),
        });
    }

    summary.accessibility_score = if images.is_empty() {
        100.0
    } else {
        (summary.good_alt + summary.decorative) as f64 / images.len() as f64 * 100.0
    };

    let recommendations = recommendations(&images, &summary);

    ImageReport {
        total_images: images.len(),
        svg_count: svgs.len(),
        figure_count,
        images,
        svgs,
        issues,
        summary,
        recommendations,
    }
}

/// Scores an alt attribute against the image source it describes.
pub fn assess_alt_quality(alt: Option<&str>, src: &str) -> AltQuality {
    let alt = match alt {
        None => {
            return AltQuality {
                score: 0,
                issues: vec!["Missing alt text".to_string()],
            }
        }
        Some("") => {
            return AltQuality {
                score: 10,
                issues: Vec::new(),
            }
        }
        Some(alt) => alt,
    };

    let mut issues = Vec::new();
    let mut score: i32 = 10;
    let lower = alt.to_lowercase();
    let length = alt.chars().count();

    if length > MAX_ALT_LENGTH {
        issues.push(format!("Too long (>{} characters)", MAX_ALT_LENGTH));
        score -= 3;
    } else if length < 3 {
        issues.push("Too short".to_string());
        score -= 2;
    }

    if let Some(phrase) = REDUNDANT_PHRASES.iter().find(|p| lower.starts_with(*p)) {
        issues.push(format!("Starts with redundant phrase: '{}'", phrase));
        score -= 2;
    }

    let stem = file_stem(src);
    if !stem.is_empty() && lower == stem {
        issues.push("Alt text is just filename".to_string());
        score -= 4;
    }

    if placeholder_patterns().iter().any(|re| re.is_match(&lower)) {
        issues.push("Appears to be placeholder text".to_string());
        score -= 5;
    }

    AltQuality {
        score: score.max(0) as u8,
        issues,
    }
}

fn analyze_image(img: &ElementRef<'_>, index: usize) -> ImageFinding {
    let attrs = img.value();
    let src = attrs.attr("src").unwrap_or_default().to_string();
    let alt = attrs.attr("alt").map(str::to_string);
    let described_by = attrs
        .attr("aria-describedby")
        .map(|v| !v.trim().is_empty())
        .unwrap_or(false);

    let figure = img
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "figure");
    let has_figcaption = figure
        .map(|fig| {
            fig.descendants()
                .filter_map(ElementRef::wrap)
                .any(|el| el.value().name() == "figcaption")
        })
        .unwrap_or(false);

    let is_decorative = is_likely_decorative(img, &src, alt.as_deref());
    let is_complex = is_complex_image(&src, alt.as_deref());
    let alt_quality = assess_alt_quality(alt.as_deref(), &src);

    let mut issues = Vec::new();
    match alt.as_deref() {
        None => issues.push("Missing alt attribute".to_string()),
        Some(text) if text.chars().count() > MAX_ALT_LENGTH => {
            issues.push(format!("Alt text too long (>{} characters)", MAX_ALT_LENGTH))
        }
        Some(text) => {
            let lower = text.to_lowercase();
            if ["image of", "picture of", "photo of"]
                .iter()
                .any(|p| lower.starts_with(p))
            {
                issues.push("Alt text includes redundant phrases".to_string());
            }
        }
    }
    if is_complex && !(described_by || has_figcaption) {
        issues.push(COMPLEX_NEEDS_DESCRIPTION.to_string());
    }

    ImageFinding {
        index,
        src,
        alt,
        in_figure: figure.is_some(),
        has_figcaption,
        is_decorative,
        is_complex,
        alt_quality,
        issues,
    }
}

fn analyze_svg(svg: &ElementRef<'_>, index: usize) -> SvgFinding {
    let has_child = |name: &str| {
        svg.descendants()
            .filter_map(ElementRef::wrap)
            .any(|el| el.value().name() == name)
    };
    let non_empty_attr = |name: &str| {
        svg.value()
            .attr(name)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let has_title = has_child("title");
    let has_desc = has_child("desc");
    let aria_label = non_empty_attr("aria-label");
    let labelled_by = non_empty_attr("aria-labelledby");
    let role = non_empty_attr("role");

    let is_decorative = matches!(role.as_deref(), Some("presentation") | Some("img"));
    let has_name = has_title || aria_label.is_some() || labelled_by.is_some();

    SvgFinding {
        index,
        has_title,
        has_desc,
        aria_label,
        role,
        needs_attention: !is_decorative && !has_name,
    }
}

fn is_likely_decorative(img: &ElementRef<'_>, src: &str, alt: Option<&str>) -> bool {
    if alt == Some("") {
        return true;
    }
    let filename = file_name(src);
    let classes = img.value().classes().collect::<Vec<_>>().join(" ").to_lowercase();
    DECORATIVE_PATTERNS
        .iter()
        .any(|p| filename.contains(p) || classes.contains(p))
}

fn is_complex_image(src: &str, alt: Option<&str>) -> bool {
    if src.is_empty() && alt.map_or(true, str::is_empty) {
        return false;
    }
    let haystack = format!("{} {}", src, alt.unwrap_or_default()).to_lowercase();
    COMPLEX_IMAGE_TYPES.iter().any(|t| haystack.contains(t))
}

fn recommendations(images: &[ImageFinding], summary: &ImageSummary) -> Vec<String> {
    let mut out = Vec::new();
    let total = images.len();

    if summary.missing_alt > 0 {
        out.push(format!(
            "Add alt attributes to {} images missing them",
            summary.missing_alt
        ));
    }

    if summary.accessibility_score < 50.0 {
        out.push("Critical: Most images fail accessibility standards".to_string());
    } else if summary.accessibility_score < 80.0 {
        out.push("Improve alt text quality for better accessibility".to_string());
    }

    let undescribed = images
        .iter()
        .filter(|img| img.issues.iter().any(|i| i == COMPLEX_NEEDS_DESCRIPTION))
        .count();
    if undescribed > 0 {
        out.push(format!(
            "Add long descriptions for {} complex images",
            undescribed
        ));
    }

    if (summary.good_alt as f64) < total as f64 * 0.8 {
        out.push(
            "Review and improve alt text quality - aim for concise, descriptive text".to_string(),
        );
    }

    if out.is_empty() {
        out.push("Great job! Image accessibility looks good.".to_string());
    }
    out
}

fn select_all<'a>(document: &'a Html, selector: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(selector) {
        Ok(sel) => document.select(&sel).collect(),
        Err(_) => Vec::new(),
    }
}

fn file_name(src: &str) -> String {
    let path = src.split(['?', '#']).next().unwrap_or_default();
    path.rsplit('/').next().unwrap_or_default().to_lowercase()
}

fn file_stem(src: &str) -> String {
    let name = file_name(src);
    match name.rfind('.') {
        Some(dot) if dot > 0 => name[..dot].to_string(),
        _ => name,
    }
}

fn placeholder_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"^\w+\.(jpg|jpeg|png|gif|svg)$",
            r"^image\d*$",
            r"^(untitled|placeholder|default)$",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    })
}
