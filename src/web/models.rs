use serde::{Deserialize, Deserializer, Serialize};

use crate::audit::contrast::{PairAnalysis, Suggestions, WCAG_AA_NORMAL};
use crate::audit::headings::HeadingOptions;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    /// An HTML fragment for `analyze`/`suggest`, the question itself for `chat`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub html_content: String,
    #[serde(default)]
    pub action: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub result: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContrastRequest {
    pub foreground: String,
    pub background: String,
    #[serde(default = "default_target_contrast")]
    pub target_contrast: f64,
}

fn default_target_contrast() -> f64 {
    WCAG_AA_NORMAL
}

#[derive(Debug, Clone, Serialize)]
pub struct ContrastResponse {
    pub analysis: PairAnalysis,
    pub suggestions: Suggestions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadingsRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub html_content: String,
    #[serde(default)]
    pub options: HeadingOptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagesRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub html_content: String,
}

/// Body of the page-level audits. `css` is stylesheet text checked along with
/// the page's own `<style>` elements.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub html_content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub css: String,
    #[serde(default)]
    pub options: HeadingOptions,
}

/// Treats an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
