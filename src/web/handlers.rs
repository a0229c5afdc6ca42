use actix_web::{web, HttpRequest, HttpResponse, Responder};
use log::{error, info};
use serde_json::json;

use crate::audit::{contrast, headings, images, keyboard, page};
use crate::error::AnalyzerError;
use crate::prompts::{Action, PromptPair};
use crate::web::models::{
    AnalysisRequest, AnalysisResponse, ContrastRequest, ContrastResponse, HeadingsRequest,
    ImagesRequest, PageRequest,
};
use crate::web::AppState;

// Health check endpoint
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

// CORS pre-flight; the headers themselves come from the app-wide middleware
pub async fn preflight() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

pub async fn not_found(req: HttpRequest) -> HttpResponse {
    if req.method() == actix_web::http::Method::OPTIONS {
        return HttpResponse::NoContent().finish();
    }
    HttpResponse::NotFound().json(json!({ "error": "Not found" }))
}

// Known path, unsupported method
pub async fn method_not_allowed() -> HttpResponse {
    HttpResponse::MethodNotAllowed().json(json!({ "error": "Method not allowed" }))
}

/// Forwards one analysis request to the completion provider.
pub async fn accessibility_analyzer(
    data: web::Data<AppState>,
    req: web::Json<AnalysisRequest>,
) -> Result<HttpResponse, AnalyzerError> {
    let req = req.into_inner();

    let action = Action::resolve(req.action.as_deref(), data.config.strict_actions)
        .map_err(|e| log_failure("accessibility-analyzer", e))?;

    info!(
        "Analyzer request: action={} content_length={}",
        action,
        req.html_content.len()
    );

    let messages = PromptPair::build(action, &req.html_content).into_messages();
    let result = data
        .provider
        .complete(&messages)
        .await
        .map_err(|e| log_failure("accessibility-analyzer", e))?;

    Ok(HttpResponse::Ok().json(AnalysisResponse { result }))
}

pub async fn audit_contrast(
    req: web::Json<ContrastRequest>,
) -> Result<HttpResponse, AnalyzerError> {
    let foreground = req
        .foreground
        .parse::<contrast::Rgb>()
        .map_err(|e| log_failure("audit/contrast", e))?;
    let background = req
        .background
        .parse::<contrast::Rgb>()
        .map_err(|e| log_failure("audit/contrast", e))?;

    Ok(HttpResponse::Ok().json(ContrastResponse {
        analysis: contrast::analyze_pair(foreground, background),
        suggestions: contrast::suggest_backgrounds(foreground, req.target_contrast),
    }))
}

pub async fn audit_headings(req: web::Json<HeadingsRequest>) -> impl Responder {
    let report = headings::check_hierarchy(&req.html_content, &req.options);
    info!(
        "Heading audit: {} headings, {} findings",
        report.summary.total,
        report.findings.len()
    );
    HttpResponse::Ok().json(report)
}

pub async fn audit_images(req: web::Json<ImagesRequest>) -> impl Responder {
    let report = images::analyze_images(&req.html_content);
    info!(
        "Image audit: {} images, score {:.0}",
        report.total_images, report.summary.accessibility_score
    );
    HttpResponse::Ok().json(report)
}

pub async fn audit_contrast_page(req: web::Json<PageRequest>) -> impl Responder {
    let report = contrast::analyze_page(&req.html_content, &req.css);
    info!(
        "Page contrast audit: {} colours, {} pairs, score {:.0}",
        report.css_colors_found,
        report.color_pairs_analyzed.len(),
        report.accessibility_score
    );
    HttpResponse::Ok().json(report)
}

pub async fn audit_keyboard(req: web::Json<PageRequest>) -> impl Responder {
    let report = keyboard::analyze_keyboard(&req.html_content, &req.css);
    info!(
        "Keyboard audit: {} focusable, {} issues",
        report.focus_order.total_focusable,
        report.issues().count()
    );
    HttpResponse::Ok().json(report)
}

/// Headings, images, contrast and keyboard checks in one report.
pub async fn audit_page(req: web::Json<PageRequest>) -> impl Responder {
    let audit = page::audit_page(&req.html_content, &req.css, &req.options);
    info!(
        "Page audit: {} errors, {} warnings, score {:.0}",
        audit.summary.errors, audit.summary.warnings, audit.summary.accessibility_score
    );
    HttpResponse::Ok().json(audit)
}

fn log_failure(handler: &str, err: AnalyzerError) -> AnalyzerError {
    error!("Error in {}: {}", handler, err);
    err
}
