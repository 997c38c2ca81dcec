//! HTTP surface
//!
//! Route table, shared application state and the mapping from the error
//! taxonomy to transport status codes.

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError, web};

use crate::config::AppConfig;
use crate::errors::ShortenerError;
use crate::services::{DeleteService, ShortenerService};
use crate::storage::Storage;

pub mod auth;
pub mod handlers;

pub use auth::JwtService;

/// Shared state handed to every handler.
pub struct AppState {
    pub config: AppConfig,
    pub storage: Arc<dyn Storage>,
    pub shortener: ShortenerService,
    pub delete_service: Arc<DeleteService>,
    pub jwt: JwtService,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        storage: Arc<dyn Storage>,
        delete_service: Arc<DeleteService>,
    ) -> Self {
        let jwt = JwtService::from_secret(config.jwt_secret.as_deref());
        let shortener = ShortenerService::new(Arc::clone(&storage));
        AppState {
            config,
            storage,
            shortener,
            delete_service,
            jwt,
        }
    }
}

impl ResponseError for ShortenerError {
    fn status_code(&self) -> StatusCode {
        match self {
            ShortenerError::Validation(_) => StatusCode::BAD_REQUEST,
            ShortenerError::Conflict(_) => StatusCode::CONFLICT,
            ShortenerError::NotFound(_) => StatusCode::NOT_FOUND,
            ShortenerError::NotSupported(_) => StatusCode::NOT_IMPLEMENTED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Backend detail must not leak through the service boundary.
        let body = match self {
            ShortenerError::Validation(_)
            | ShortenerError::Conflict(_)
            | ShortenerError::NotFound(_)
            | ShortenerError::NotSupported(_) => self.message().to_string(),
            _ => {
                tracing::error!("backend error: {}", self);
                String::new()
            }
        };
        HttpResponse::build(self.status_code()).body(body)
    }
}

/// Register the route table on an actix app.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::post().to(handlers::shorten_text))
        .route("/ping", web::get().to(handlers::ping))
        .service(
            web::scope("/api")
                .route("/shorten", web::post().to(handlers::shorten_json))
                .route("/shorten/batch", web::post().to(handlers::shorten_batch))
                .route("/user/urls", web::get().to(handlers::user_urls))
                .route("/user/urls", web::delete().to(handlers::delete_user_urls)),
        )
        .route("/{id}", web::get().to(handlers::redirect));
}
