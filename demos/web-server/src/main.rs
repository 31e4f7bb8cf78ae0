//! Example web server with Redis-backed sessions.
//!
//! Run with: cargo run -p web-server-demo
//!
//! Then:
//!   curl -c jar -b jar 'http://localhost:3000/set?key=foo&value="bar"'
//!   curl -b jar 'http://localhost:3000/get?key=foo'
//!
//! `REDIS_URL` selects the server (default `redis://127.0.0.1:6379`).
//! Set `DRSESSION_STORE=memory` to run without Redis.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::Query,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use drsession_middleware::SessionLayer;
use drsession_session::{
    Session, SessionConfig, SessionError, SessionStore,
    storage::{MemoryStore, RedisStore, redis::DEFAULT_URL},
};
use serde::Deserialize;
use serde_json::Value;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Deserialize)]
struct KeyQuery {
    key: String,
}

#[derive(Deserialize)]
struct SetQuery {
    key: String,
    /// JSON-encoded value; bare text is stored as a string.
    value: String,
}

/// Handler error mapped onto HTTP statuses.
struct AppError(SessionError);

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        Self(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            SessionError::KeyNotFound(_) => StatusCode::NOT_FOUND,
            SessionError::Deserialization { .. } | SessionError::Serialization { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            SessionError::NotSupported(_) => StatusCode::NOT_IMPLEMENTED,
            SessionError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        tracing::warn!("Request failed: {}", self.0);
        (status, self.0.to_string()).into_response()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = SessionConfig::from_env();
    let store = if std::env::var("DRSESSION_STORE").as_deref() == Ok("memory") {
        tracing::info!("Using in-memory session store");
        SessionStore::new(Arc::new(MemoryStore::new()), config)
    } else {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
        tracing::info!("Using Redis session store at {url}");
        SessionStore::new(Arc::new(RedisStore::connect(&url).await?), config)
    };

    // Build router
    let app = Router::new()
        .route("/set", get(set_handler))
        .route("/get", get(get_handler))
        .route("/pop", post(pop_handler))
        .route("/session", get(dump_handler).delete(destroy_handler))
        .layer(SessionLayer::new(store))
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    tracing::info!("Server listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn set_handler(session: Session, Query(q): Query<SetQuery>) -> Result<StatusCode, AppError> {
    let value = serde_json::from_str(&q.value).unwrap_or(Value::String(q.value));
    session.set(&q.key, value).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_handler(session: Session, Query(q): Query<KeyQuery>) -> Result<Json<Value>, AppError> {
    Ok(Json(session.get(&q.key).await?))
}

async fn pop_handler(session: Session, Query(q): Query<KeyQuery>) -> Result<Json<Value>, AppError> {
    Ok(Json(session.pop(&q.key, Value::Null).await?))
}

async fn dump_handler(session: Session) -> Result<Json<serde_json::Map<String, Value>>, AppError> {
    Ok(Json(session.items().await?.into_iter().collect()))
}

async fn destroy_handler(session: Session) -> Result<StatusCode, AppError> {
    session.destroy().await?;
    Ok(StatusCode::NO_CONTENT)
}
