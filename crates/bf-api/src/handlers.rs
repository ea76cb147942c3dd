//! # bf-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the core `SocialService`.

use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest, HttpResponse, Responder};
use bf_core::error::AppError;
use bf_core::models::{
    FeedLimits, FeedQuery, FollowRequest, LoginRequest, SearchQuery, SignupRequest, TweetRequest,
};
use bf_core::service::SocialService;
use serde_json::json;

use crate::error::ApiError;
use crate::middleware::LEGACY_TOKEN_HEADER;

/// State shared across all Actix-web workers.
pub struct AppState {
    pub service: SocialService,
    pub limits: FeedLimits,
}

/// The identity behind a verified bearer token.
#[derive(Debug, Clone)]
pub struct Requester(pub String);

/// `Authorization: Bearer <token>`, falling back to the legacy `token` header.
fn extract_token(req: &HttpRequest) -> Option<&str> {
    let headers = req.headers();
    if let Some(value) = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        return value.strip_prefix("Bearer ").map(str::trim);
    }
    headers
        .get(LEGACY_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
}

impl FromRequest for Requester {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(state) = req.app_data::<web::Data<AppState>>() else {
            return ready(Err(AppError::Internal("app state not configured".into()).into()));
        };
        let result = match extract_token(req) {
            Some(token) if !token.is_empty() => state
                .service
                .authenticate(token)
                .map(Requester)
                .map_err(ApiError::from),
            _ => Err(AppError::Unauthorized("missing bearer token".into()).into()),
        };
        ready(result)
    }
}

pub async fn index() -> impl Responder {
    HttpResponse::Ok().json(json!({ "message": "birdfeed API is running" }))
}

pub async fn signup(
    data: web::Data<AppState>,
    body: web::Json<SignupRequest>,
) -> Result<HttpResponse, ApiError> {
    let user_id = data.service.signup(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({
        "message": "User registered successfully",
        "user_id": user_id,
    })))
}

pub async fn login(
    data: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let token = data.service.login(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Login successful", "token": token })))
}

pub async fn profile(
    data: web::Data<AppState>,
    requester: Requester,
) -> Result<HttpResponse, ApiError> {
    let profile = data
        .service
        .profile(&requester.0)
        .await
        .map_err(|e| ApiError::for_requester(e, &requester.0))?;
    Ok(HttpResponse::Ok().json(profile))
}

pub async fn tweet(
    data: web::Data<AppState>,
    requester: Requester,
    body: web::Json<TweetRequest>,
) -> Result<HttpResponse, ApiError> {
    let post = data
        .service
        .post(&requester.0, body.into_inner())
        .await
        .map_err(|e| ApiError::for_requester(e, &requester.0))?;
    Ok(HttpResponse::Created().json(json!({ "message": "Tweet posted", "id": post.id })))
}

pub async fn follow(
    data: web::Data<AppState>,
    requester: Requester,
    body: web::Json<FollowRequest>,
) -> Result<HttpResponse, ApiError> {
    let target = body.target.clone();
    data.service
        .follow(&requester.0, body.into_inner())
        .await
        .map_err(|e| ApiError::for_requester(e, &requester.0))?;
    Ok(HttpResponse::Ok().json(json!({ "message": format!("Now following {target}") })))
}

pub async fn unfollow(
    data: web::Data<AppState>,
    requester: Requester,
    body: web::Json<FollowRequest>,
) -> Result<HttpResponse, ApiError> {
    let target = body.target.clone();
    data.service
        .unfollow(&requester.0, body.into_inner())
        .await
        .map_err(|e| ApiError::for_requester(e, &requester.0))?;
    Ok(HttpResponse::Ok().json(json!({ "message": format!("Unfollowed {target}") })))
}

/// Most recent posts from the requester and the accounts they follow.
pub async fn feed(
    data: web::Data<AppState>,
    requester: Requester,
    query: web::Query<FeedQuery>,
) -> Result<HttpResponse, ApiError> {
    let limit = data.limits.resolve(query.limit);
    let page = data
        .service
        .feed(&requester.0, limit)
        .await
        .map_err(|e| ApiError::for_requester(e, &requester.0))?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn search(
    data: web::Data<AppState>,
    _requester: Requester,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse, ApiError> {
    let names = data.service.search(&query.prefix).await?;
    Ok(HttpResponse::Ok().json(names))
}
