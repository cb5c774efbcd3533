//! HTTP JSON API over [`ChatService`].
//!
//! [`router`] builds the axum routes; [`serve`] binds the configured address
//! and runs until ctrl-c.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::affirmations::daily_affirmation;
use crate::chat::{ChatReply, ChatService};
use crate::config::CalmConfig;
use crate::profile::stats::ConversationStats;
use crate::profile::store::Login;
use crate::profile::types::{ChatMessage, ProfileUpdate, UserRecord};
use crate::profile::ValidationError;

/// JSON error body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

/// Handler error: validation failures become 400, everything else 500.
#[derive(Debug)]
pub struct ApiError(anyhow::Error);

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = if self.0.downcast_ref::<ValidationError>().is_some() {
            (StatusCode::BAD_REQUEST, "INVALID_INPUT")
        } else {
            tracing::error!(error = %format!("{:#}", self.0), "request failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
        };
        let body = ErrorResponse {
            code: code.to_string(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IncognitoResponse {
    pub incognito_mode: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AffirmationResponse {
    pub affirmation: String,
}

pub fn router(service: ChatService) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/affirmation", get(affirmation))
        .route("/users/{user_id}", get(get_user).delete(delete_user))
        .route("/users/{user_id}/login", post(login))
        .route("/users/{user_id}/profile", put(update_profile))
        .route("/users/{user_id}/incognito", post(toggle_incognito))
        .route("/users/{user_id}/messages", post(send_message))
        .route("/users/{user_id}/history", get(history))
        .route("/users/{user_id}/stats", get(stats))
        .with_state(service)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn affirmation() -> Json<AffirmationResponse> {
    Json(AffirmationResponse {
        affirmation: daily_affirmation().to_string(),
    })
}

async fn get_user(State(service): State<ChatService>, Path(user_id): Path<String>) -> ApiResult<UserRecord> {
    Ok(Json(service.profile(&user_id).await?))
}

async fn delete_user(
    State(service): State<ChatService>,
    Path(user_id): Path<String>,
) -> ApiResult<DeleteResponse> {
    let deleted = service.delete_user(&user_id).await?;
    Ok(Json(DeleteResponse { deleted }))
}

async fn login(State(service): State<ChatService>, Path(user_id): Path<String>) -> ApiResult<Login> {
    Ok(Json(service.login(&user_id).await?))
}

async fn update_profile(
    State(service): State<ChatService>,
    Path(user_id): Path<String>,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult<UserRecord> {
    Ok(Json(service.update_profile(&user_id, update).await?))
}

async fn toggle_incognito(
    State(service): State<ChatService>,
    Path(user_id): Path<String>,
) -> ApiResult<IncognitoResponse> {
    let incognito_mode = service.toggle_incognito(&user_id).await?;
    Ok(Json(IncognitoResponse { incognito_mode }))
}

async fn send_message(
    State(service): State<ChatService>,
    Path(user_id): Path<String>,
    Json(request): Json<MessageRequest>,
) -> ApiResult<ChatReply> {
    Ok(Json(service.respond(&user_id, &request.message).await?))
}

async fn history(State(service): State<ChatService>, Path(user_id): Path<String>) -> ApiResult<Vec<ChatMessage>> {
    Ok(Json(service.history(&user_id).await?))
}

async fn stats(
    State(service): State<ChatService>,
    Path(user_id): Path<String>,
) -> ApiResult<ConversationStats> {
    Ok(Json(service.stats(&user_id).await?))
}

/// Start the HTTP API on the configured host and port.
pub async fn serve(config: CalmConfig) -> anyhow::Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!(addr = %bind_addr, "starting Calm HTTP server");

    let service = ChatService::from_config(config)?;
    let app = router(service);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "listening at http://{bind_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("shutting down HTTP server");
        })
        .await?;

    Ok(())
}
