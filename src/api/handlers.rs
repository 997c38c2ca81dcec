//! HTTP handlers
//!
//! Thin transport layer over [`ShortenerService`], the storage backend and
//! the deletion pipeline. Conflicts are not failures here: shortening an
//! already-known URL answers 409 with the existing short link in the body.

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, cookie::Cookie, web};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::AppState;
use crate::api::auth::AUTH_COOKIE_NAME;
use crate::errors::{Result, ShortenerError};
use crate::storage::DeleteRequest;

// ============ Request/Response DTOs ============

#[derive(Debug, Deserialize)]
pub struct ShortenRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ShortenResponse {
    pub result: String,
}

#[derive(Debug, Deserialize)]
pub struct BatchShortenRequestEntry {
    pub correlation_id: String,
    pub original_url: String,
}

#[derive(Debug, Serialize)]
pub struct BatchShortenResponseEntry {
    pub correlation_id: String,
    pub short_url: String,
}

#[derive(Debug, Serialize)]
pub struct UserShortenedUrl {
    pub short_url: String,
    pub original_url: String,
}

/// Identity of the caller plus the cookie to (re)issue, if any.
struct CallerIdentity {
    user_id: i32,
    fresh_token: Option<String>,
}

/// Resolve the caller's owner ID from the auth cookie, allocating a fresh
/// identity when the cookie is missing or invalid.
async fn authenticate(req: &HttpRequest, state: &AppState) -> Result<CallerIdentity> {
    if let Some(cookie) = req.cookie(AUTH_COOKIE_NAME)
        && let Ok(claims) = state.jwt.claims_from_token(cookie.value())
    {
        return Ok(CallerIdentity {
            user_id: claims.user_id,
            fresh_token: None,
        });
    }

    let user_id = state.storage.allocate_user_id().await?;
    let token = state
        .jwt
        .create_token(user_id)
        .map_err(|e| ShortenerError::validation(format!("cannot issue identity token: {e}")))?;

    Ok(CallerIdentity {
        user_id,
        fresh_token: Some(token),
    })
}

fn attach_identity(response: &mut HttpResponse, identity: &CallerIdentity) {
    if let Some(token) = &identity.fresh_token {
        let cookie = Cookie::build(AUTH_COOKIE_NAME, token.clone()).path("/").finish();
        // Cookie serialization cannot fail for these values.
        let _ = response.add_cookie(&cookie);
    }
}

// ============ Handlers ============

/// POST `/` — plain-text body, answers the short URL as text.
pub async fn shorten_text(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: String,
) -> Result<HttpResponse> {
    let identity = authenticate(&req, &state).await?;
    let outcome = state.shortener.shorten(identity.user_id, &body).await?;

    let status = if outcome.existed {
        StatusCode::CONFLICT
    } else {
        StatusCode::CREATED
    };

    let mut response = HttpResponse::build(status)
        .content_type("text/plain; charset=utf-8")
        .body(state.config.short_url(&outcome.short_id));
    attach_identity(&mut response, &identity);
    Ok(response)
}

/// POST `/api/shorten` — JSON envelope around the same operation.
pub async fn shorten_json(
    req: HttpRequest,
    state: web::Data<AppState>,
    payload: web::Json<ShortenRequest>,
) -> Result<HttpResponse> {
    let identity = authenticate(&req, &state).await?;
    let outcome = state.shortener.shorten(identity.user_id, &payload.url).await?;

    let status = if outcome.existed {
        StatusCode::CONFLICT
    } else {
        StatusCode::CREATED
    };

    let mut response = HttpResponse::build(status).json(ShortenResponse {
        result: state.config.short_url(&outcome.short_id),
    });
    attach_identity(&mut response, &identity);
    Ok(response)
}

/// POST `/api/shorten/batch`
pub async fn shorten_batch(
    req: HttpRequest,
    state: web::Data<AppState>,
    payload: web::Json<Vec<BatchShortenRequestEntry>>,
) -> Result<HttpResponse> {
    let identity = authenticate(&req, &state).await?;

    let full_urls: Vec<String> = payload.iter().map(|e| e.original_url.clone()).collect();
    let short_ids = state
        .shortener
        .shorten_batch(identity.user_id, &full_urls)
        .await?;

    let entries: Vec<BatchShortenResponseEntry> = payload
        .iter()
        .zip(short_ids)
        .map(|(request, short_id)| BatchShortenResponseEntry {
            correlation_id: request.correlation_id.clone(),
            short_url: state.config.short_url(&short_id),
        })
        .collect();

    let mut response = HttpResponse::Created().json(entries);
    attach_identity(&mut response, &identity);
    Ok(response)
}

/// GET `/{id}` — 307 to the full URL; 410 once soft-deleted; 404 otherwise.
pub async fn redirect(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let short_id = path.into_inner();

    match state.shortener.resolve(&short_id).await {
        Some(entry) if entry.is_deleted => HttpResponse::Gone().finish(),
        Some(entry) => HttpResponse::TemporaryRedirect()
            .insert_header(("Location", entry.full_url))
            .finish(),
        None => HttpResponse::NotFound().finish(),
    }
}

/// GET `/api/user/urls`
pub async fn user_urls(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse> {
    let identity = authenticate(&req, &state).await?;
    if identity.user_id < 1 {
        return Ok(HttpResponse::Unauthorized().finish());
    }

    let entries = state.storage.list_by_owner(identity.user_id).await?;
    if entries.is_empty() {
        let mut response = HttpResponse::NoContent().finish();
        attach_identity(&mut response, &identity);
        return Ok(response);
    }

    let body: Vec<UserShortenedUrl> = entries
        .into_iter()
        .map(|(short_id, full_url)| UserShortenedUrl {
            short_url: state.config.short_url(&short_id),
            original_url: full_url,
        })
        .collect();

    let mut response = HttpResponse::Ok().json(body);
    attach_identity(&mut response, &identity);
    Ok(response)
}

/// DELETE `/api/user/urls` — enqueue owned deletions; answers 202 before
/// anything is written.
pub async fn delete_user_urls(
    req: HttpRequest,
    state: web::Data<AppState>,
    payload: web::Json<Vec<String>>,
) -> Result<HttpResponse> {
    let identity = authenticate(&req, &state).await?;

    let requests: Vec<DeleteRequest> = payload
        .into_inner()
        .into_iter()
        .map(|short_id| DeleteRequest {
            user_id: identity.user_id,
            short_id,
        })
        .collect();

    info!(
        "accepted {} delete requests from user {}",
        requests.len(),
        identity.user_id
    );
    state.delete_service.submit(requests);

    let mut response = HttpResponse::Accepted().finish();
    attach_identity(&mut response, &identity);
    Ok(response)
}

/// GET `/ping` — backend liveness.
pub async fn ping(state: web::Data<AppState>) -> HttpResponse {
    match state.storage.check_liveness().await {
        Ok(()) => HttpResponse::Ok().finish(),
        Err(e) => {
            info!("liveness check failed: {}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}
