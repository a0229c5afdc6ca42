use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

pub const RATE_LIMITED_MESSAGE: &str =
    "Limite de taxa excedido. Por favor, tente novamente mais tarde.";
pub const PAYMENT_REQUIRED_MESSAGE: &str =
    "Pagamento necessário. Por favor, adicione créditos ao seu workspace.";
pub const GATEWAY_ERROR_MESSAGE: &str = "AI gateway error";
pub const CONFIGURATION_ERROR_MESSAGE: &str = "Server configuration error";

/// Every failure a request can end in. Each variant maps to one status code
/// and is rendered as `{ "error": <message> }`.
#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("{0} is not configured")]
    MissingConfig(&'static str),
    #[error("{}", RATE_LIMITED_MESSAGE)]
    RateLimited,
    #[error("{}", PAYMENT_REQUIRED_MESSAGE)]
    PaymentRequired,
    #[error("{}", GATEWAY_ERROR_MESSAGE)]
    Gateway { status: u16, body: String },
    #[error("Unknown action: {0}")]
    UnknownAction(String),
    #[error("Invalid color: {0}")]
    InvalidColor(String),
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
    #[error("Failed to extract content from response: {0}")]
    MalformedCompletion(String),
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;

impl AnalyzerError {
    /// Text shown to the caller. Configuration details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AnalyzerError::MissingConfig(_) => CONFIGURATION_ERROR_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for AnalyzerError {
    fn status_code(&self) -> StatusCode {
        match self {
            AnalyzerError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AnalyzerError::PaymentRequired => StatusCode::PAYMENT_REQUIRED,
            AnalyzerError::UnknownAction(_) | AnalyzerError::InvalidColor(_) => {
                StatusCode::BAD_REQUEST
            }
            AnalyzerError::MissingConfig(_)
            | AnalyzerError::Gateway { .. }
            | AnalyzerError::InvalidBody(_)
            | AnalyzerError::MalformedCompletion(_)
            | AnalyzerError::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.public_message() }))
    }
}
