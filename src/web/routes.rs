use actix_web::http::Method;
use actix_web::middleware::DefaultHeaders;
use actix_web::{error, web, FromRequest, Handler, Resource, Responder};

use crate::error::AnalyzerError;
use crate::web::handlers;

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

const JSON_BODY_LIMIT: usize = 4 * 1024 * 1024;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(
            web::scope("/api")
                .service(post_resource("/accessibility-analyzer", handlers::accessibility_analyzer))
                .service(
                    web::scope("/audit")
                        .service(post_resource("", handlers::audit_page))
                        .service(post_resource("/contrast", handlers::audit_contrast))
                        .service(post_resource("/contrast/page", handlers::audit_contrast_page))
                        .service(post_resource("/headings", handlers::audit_headings))
                        .service(post_resource("/images", handlers::audit_images))
                        .service(post_resource("/keyboard", handlers::audit_keyboard)),
                ),
        )
        .route("/health", web::get().to(handlers::health_check))
        .default_service(web::to(handlers::not_found));
}

/// A POST endpoint with its CORS pre-flight. Any other method gets a JSON 405.
fn post_resource<F, Args>(path: &str, handler: F) -> Resource
where
    F: Handler<Args>,
    Args: FromRequest + 'static,
    F::Output: Responder + 'static,
{
    web::resource(path)
        .route(web::post().to(handler))
        .route(web::method(Method::OPTIONS).to(handlers::preflight))
        .default_service(web::to(handlers::method_not_allowed))
}

/// Permissive CORS headers stamped on every response, errors included.
pub fn cors_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("Access-Control-Allow-Origin", ALLOW_ORIGIN))
        .add(("Access-Control-Allow-Headers", ALLOW_HEADERS))
}

/// Body parse failures are reported like any other unexpected error. The body
/// is read as JSON whatever `Content-Type` the caller sent.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_BODY_LIMIT)
        .content_type(|_| true)
        .content_type_required(false)
        .error_handler(|err: error::JsonPayloadError, _req| {
            AnalyzerError::InvalidBody(err.to_string()).into()
        })
}
