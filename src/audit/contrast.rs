//! WCAG 2.1 colour contrast checks.
//!
//! See <https://www.w3.org/WAI/WCAG21/Understanding/contrast-minimum.html>.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use scraper::{Html, Selector};
use serde::Serialize;

use super::{declarations, embedded_css};
use crate::error::{AnalyzerError, Result};

pub const WCAG_AA_NORMAL: f64 = 4.5;
pub const WCAG_AA_LARGE: f64 = 3.0;
pub const WCAG_AAA_NORMAL: f64 = 7.0;
pub const WCAG_AAA_LARGE: f64 = 4.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn grey(v: u8) -> Self {
        Self { r: v, g: v, b: v }
    }

    /// Parses `#rgb` or `#rrggbb`; the leading `#` is optional.
    pub fn from_hex(input: &str) -> Result<Self> {
        let hex = input.trim().trim_start_matches('#');
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            _ => return Err(AnalyzerError::InvalidColor(input.to_string())),
        };
        let channel = |i: usize| {
            expanded
                .get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| AnalyzerError::InvalidColor(input.to_string()))
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Hue in degrees, saturation and lightness in percent. Channels are
    /// truncated, not rounded.
    pub fn from_hsl(h: f64, s: f64, l: f64) -> Self {
        let h = (h.rem_euclid(360.0)) / 360.0;
        let s = (s / 100.0).clamp(0.0, 1.0);
        let l = (l / 100.0).clamp(0.0, 1.0);

        if s == 0.0 {
            let v = (l * 255.0) as u8;
            return Self::grey(v);
        }

        let m2 = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let m1 = 2.0 * l - m2;
        let channel = |hue: f64| (hue_to_channel(m1, m2, hue) * 255.0) as u8;

        Self::new(
            channel(h + 1.0 / 3.0),
            channel(h),
            channel(h - 1.0 / 3.0),
        )
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Relative luminance, 0.0 for black up to 1.0 for white.
    pub fn luminance(&self) -> f64 {
        fn linearize(c: u8) -> f64 {
            let c = c as f64 / 255.0;
            if c <= 0.03928 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }

        0.2126 * linearize(self.r) + 0.7152 * linearize(self.g) + 0.0722 * linearize(self.b)
    }
}

fn hue_to_channel(m1: f64, m2: f64, hue: f64) -> f64 {
    let hue = hue.rem_euclid(1.0);
    if hue < 1.0 / 6.0 {
        m1 + (m2 - m1) * hue * 6.0
    } else if hue < 0.5 {
        m2
    } else if hue < 2.0 / 3.0 {
        m1 + (m2 - m1) * (2.0 / 3.0 - hue) * 6.0
    } else {
        m1
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Rgb {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl FromStr for Rgb {
    type Err = AnalyzerError;

    /// Accepts hex, `rgb(r, g, b)` and `hsl(h, s%, l%)`.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let lower = trimmed.to_ascii_lowercase();

        if let Some(caps) = rgb_pattern().captures(&lower) {
            if caps.get(0).map(|m| m.as_str()) == Some(lower.as_str()) {
                return rgb_from_captures(&caps).ok_or_else(|| AnalyzerError::InvalidColor(s.to_string()));
            }
        }
        if let Some(caps) = hsl_pattern().captures(&lower) {
            if caps.get(0).map(|m| m.as_str()) == Some(lower.as_str()) {
                return hsl_from_captures(&caps).ok_or_else(|| AnalyzerError::InvalidColor(s.to_string()));
            }
        }
        Rgb::from_hex(trimmed)
    }
}

/// Contrast ratio between two colours, from 1.0 (none) to 21.0 (black on white).
pub fn contrast_ratio(a: Rgb, b: Rgb) -> f64 {
    let la = a.luminance();
    let lb = b.luminance();
    let (lighter, darker) = if la >= lb { (la, lb) } else { (lb, la) };
    (lighter + 0.05) / (darker + 0.05)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextSize {
    Normal,
    Large,
}

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Level {
    AA,
    AAA,
}

impl Level {
    pub fn threshold(&self, size: TextSize) -> f64 {
        match (self, size) {
            (Level::AA, TextSize::Normal) => WCAG_AA_NORMAL,
            (Level::AA, TextSize::Large) => WCAG_AA_LARGE,
            (Level::AAA, TextSize::Normal) => WCAG_AAA_NORMAL,
            (Level::AAA, TextSize::Large) => WCAG_AAA_LARGE,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Compliance {
    pub passes: bool,
    pub ratio: f64,
    pub threshold: f64,
    pub level: Level,
    pub text_size: TextSize,
}

pub fn check_compliance(ratio: f64, text_size: TextSize, level: Level) -> Compliance {
    let threshold = level.threshold(text_size);
    Compliance {
        passes: ratio >= threshold,
        ratio,
        threshold,
        level,
        text_size,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SizeCompliance {
    pub normal: Compliance,
    pub large: Compliance,
}

impl SizeCompliance {
    fn at(ratio: f64, level: Level) -> Self {
        Self {
            normal: check_compliance(ratio, TextSize::Normal, level),
            large: check_compliance(ratio, TextSize::Large, level),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairAnalysis {
    pub foreground: Rgb,
    pub background: Rgb,
    /// Rounded to two decimals.
    pub contrast_ratio: f64,
    pub wcag_aa: SizeCompliance,
    pub wcag_aaa: SizeCompliance,
    pub recommendations: Vec<String>,
}

pub fn analyze_pair(foreground: Rgb, background: Rgb) -> PairAnalysis {
    let ratio = contrast_ratio(foreground, background);

    let mut recommendations = Vec::new();
    if ratio < WCAG_AA_NORMAL {
        recommendations.push("Increase contrast to meet WCAG AA standards".to_string());
    }
    if ratio < WCAG_AAA_NORMAL {
        recommendations.push("Consider increasing contrast for AAA compliance".to_string());
    } else {
        recommendations.push("Excellent contrast ratio - exceeds all WCAG guidelines".to_string());
    }

    PairAnalysis {
        foreground,
        background,
        contrast_ratio: round2(ratio),
        wcag_aa: SizeCompliance::at(ratio, Level::AA),
        wcag_aaa: SizeCompliance::at(ratio, Level::AAA),
        recommendations,
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundSuggestion {
    pub background: Rgb,
    pub contrast_ratio: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestions {
    pub base_color: Rgb,
    pub target_contrast: f64,
    pub light_backgrounds: Vec<BackgroundSuggestion>,
    pub dark_backgrounds: Vec<BackgroundSuggestion>,
}

/// Grey backgrounds that reach `target` against `base`.
pub fn suggest_backgrounds(base: Rgb, target: f64) -> Suggestions {
    let candidates = |lightness: std::ops::RangeInclusive<u32>| -> Vec<BackgroundSuggestion> {
        lightness
            .step_by(5)
            .filter_map(|l| {
                let background = Rgb::grey((l * 255 / 100) as u8);
                let ratio = contrast_ratio(base, background);
                (ratio >= target).then(|| BackgroundSuggestion {
                    background,
                    contrast_ratio: round2(ratio),
                })
            })
            .collect()
    };

    Suggestions {
        base_color: base,
        target_contrast: target,
        light_backgrounds: candidates(85..=100),
        dark_backgrounds: candidates(0..=20),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorNotation {
    Hex,
    Rgb,
    Hsl,
}

#[derive(Debug, Clone, Serialize)]
pub struct CssColor {
    pub notation: ColorNotation,
    /// The colour as written in the stylesheet, normalised.
    pub value: String,
    pub rgb: Rgb,
}

/// Every colour literal in a stylesheet: hex first, then `rgb()`, then `hsl()`.
pub fn extract_css_colors(css: &str) -> Vec<CssColor> {
    let mut found = Vec::new();

    for caps in hex_pattern().captures_iter(css) {
        let digits = &caps[1];
        if let Ok(rgb) = Rgb::from_hex(digits) {
            found.push(CssColor {
                notation: ColorNotation::Hex,
                value: format!("#{}", digits),
                rgb,
            });
        }
    }

    for caps in rgb_pattern().captures_iter(css) {
        if let Some(rgb) = rgb_from_captures(&caps) {
            found.push(CssColor {
                notation: ColorNotation::Rgb,
                value: format!("rgb({}, {}, {})", &caps[1], &caps[2], &caps[3]),
                rgb,
            });
        }
    }

    for caps in hsl_pattern().captures_iter(css) {
        if let Some(rgb) = hsl_from_captures(&caps) {
            found.push(CssColor {
                notation: ColorNotation::Hsl,
                value: format!("hsl({}, {}%, {}%)", &caps[1], &caps[2], &caps[3]),
                rgb,
            });
        }
    }

    found
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageContrastReport {
    pub css_colors_found: usize,
    pub colors: Vec<CssColor>,
    pub color_pairs_analyzed: Vec<PairAnalysis>,
    pub failing_pairs: usize,
    pub accessibility_score: f64,
    pub recommendations: Vec<String>,
}

/// Contrast report for a whole page. Colours come from `css`, the page's
/// `<style>` elements and inline `style` attributes; pairs are the
/// `color`/`background` combinations declared together in one block.
pub fn analyze_page(html: &str, css: &str) -> PageContrastReport {
    let document = Html::parse_document(html);
    let mut blocks: Vec<String> = Vec::new();

    let stylesheet = format!("{}\n{}", css, embedded_css(&document));
    blocks.extend(block_pattern().captures_iter(&stylesheet).map(|caps| caps[1].to_string()));
    if let Ok(sel) = Selector::parse("[style]") {
        blocks.extend(
            document
                .select(&sel)
                .filter_map(|el| el.value().attr("style"))
                .map(str::to_string),
        );
    }

    let colors: Vec<CssColor> = blocks.iter().flat_map(|b| extract_css_colors(b)).collect();

    let mut pairs: Vec<(Rgb, Rgb)> = Vec::new();
    for pair in blocks.iter().filter_map(|b| declared_pair(b)) {
        if !pairs.contains(&pair) {
            pairs.push(pair);
        }
    }

    let analyzed: Vec<PairAnalysis> = pairs
        .into_iter()
        .map(|(fg, bg)| analyze_pair(fg, bg))
        .collect();
    let failing_pairs = analyzed.iter().filter(|p| !p.wcag_aa.normal.passes).count();

    let accessibility_score = if analyzed.is_empty() {
        100.0
    } else {
        round2((analyzed.len() - failing_pairs) as f64 / analyzed.len() as f64 * 100.0)
    };

    let recommendation = if accessibility_score < 70.0 {
        "Critical: Many color combinations fail WCAG standards"
    } else if accessibility_score < 90.0 {
        "Warning: Some color combinations need improvement"
    } else {
        "Good: Most color combinations meet accessibility standards"
    };

    PageContrastReport {
        css_colors_found: colors.len(),
        colors,
        color_pairs_analyzed: analyzed,
        failing_pairs,
        accessibility_score,
        recommendations: vec![recommendation.to_string()],
    }
}

/// The text and background colours a declaration block sets, if it sets both.
fn declared_pair(block: &str) -> Option<(Rgb, Rgb)> {
    let mut foreground = None;
    let mut background = None;
    for (property, value) in declarations(block) {
        match property.as_str() {
            "color" => foreground = value.parse::<Rgb>().ok(),
            "background" | "background-color" => {
                background = extract_css_colors(value).first().map(|c| c.rgb);
            }
            _ => {}
        }
    }
    Some((foreground?, background?))
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn hex_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#([0-9a-fA-F]{6}|[0-9a-fA-F]{3})\b").expect("valid hex regex"))
}

fn rgb_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"rgb\s*\(\s*(\d+)\s*,\s*(\d+)\s*,\s*(\d+)\s*\)").expect("valid rgb regex")
    })
}

fn hsl_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"hsl\s*\(\s*(\d+)\s*,\s*(\d+)%?\s*,\s*(\d+)%?\s*\)").expect("valid hsl regex")
    })
}

/// Innermost `{ ... }` declaration blocks of a stylesheet.
fn block_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([^{}]*)\}").expect("valid block regex"))
}

fn rgb_from_captures(caps: &regex::Captures<'_>) -> Option<Rgb> {
    let channel = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u8>().ok());
    Some(Rgb::new(channel(1)?, channel(2)?, channel(3)?))
}

fn hsl_from_captures(caps: &regex::Captures<'_>) -> Option<Rgb> {
    let part = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<f64>().ok());
    let (h, s, l) = (part(1)?, part(2)?, part(3)?);
    if s > 100.0 || l > 100.0 {
        return None;
    }
    Some(Rgb::from_hsl(h, s, l))
}
