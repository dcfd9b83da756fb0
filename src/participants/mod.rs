mod register;

use axum::{debug_handler, extract::State, routing::get, Json, Router};

use crate::{db::Store, models::Participant, AppResult, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/participants", get(list).post(register::register))
}

#[debug_handler]
async fn list(State(store): State<Store>) -> AppResult<Json<Vec<Participant>>> {
    Ok(Json(store.participants().await?))
}
