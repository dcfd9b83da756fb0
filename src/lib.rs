pub mod appresult;
pub mod clock;
pub mod config;
pub mod db;
pub mod messages;
pub mod models;
pub mod participants;
pub mod presence;
pub mod reaper;
pub mod session;
pub mod status;

use axum::{extract::{rejection::JsonRejection, FromRef}, routing::post, Json, Router};
use serde_json::Value;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use appresult::{AppError, AppResult};
use db::Store;
use presence::PresenceTracker;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub store: Store,
    pub presence: PresenceTracker,
}

impl AppState {
    pub fn new(store: Store) -> Self {
        AppState {
            presence: PresenceTracker::new(store.clone()),
            store,
        }
    }
}

pub trait GetField {
    /// A required, non-empty string field. The error names the field.
    fn get_str_field(&self, field: &str) -> Result<String, String>;
}

impl GetField for Value {
    fn get_str_field(&self, field: &str) -> Result<String, String> {
        match self.get(field) {
            None | Some(Value::Null) => Err(format!("{field} is required")),
            Some(Value::String(s)) if s.is_empty() => Err(format!("{field} must not be empty")),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(format!("{field} must be a string")),
        }
    }
}

/// A request body that failed to parse as JSON (or was missing) reads as `{}`,
/// so field validation reports every required field instead of a 4xx rejection.
pub fn body_or_empty(body: Result<Json<Value>, JsonRejection>) -> Value {
    match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            tracing::debug!(%rejection, "unreadable request body");
            Value::Object(Default::default())
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(participants::router())
        .merge(messages::router())
        .route("/status", post(status::heartbeat))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
