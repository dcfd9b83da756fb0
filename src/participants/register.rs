use axum::{debug_handler, extract::{rejection::JsonRejection, State}, http::StatusCode, Json};
use serde_json::Value;

use crate::{
    clock,
    db::Store,
    models::{Message, Participant, JOIN_TEXT},
    body_or_empty, AppError, AppResult, GetField,
};

#[debug_handler]
pub(crate) async fn register(
    State(store): State<Store>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<StatusCode> {
    let body = body_or_empty(body);
    let name = body.get_str_field("name").map_err(AppError::invalid)?;

    let now = clock::now_millis();
    let participant = Participant::new(name, now);
    let notice = Message::status(&participant.name, JOIN_TEXT, now)?;

    // the unique index on name turns a lost race into a Conflict
    store.register(&participant, &notice).await?;

    tracing::info!(participant = %participant.name, "participant joined");
    Ok(StatusCode::CREATED)
}
