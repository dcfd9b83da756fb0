use axum::{debug_handler, extract::{Query, State}, http::HeaderMap, Json};
use serde::Deserialize;

use crate::{db::Store, models::Message, session, AppError, AppResult};

use super::visibility::{limited_view, visible_messages, Limit};

#[derive(Debug, Deserialize)]
pub(crate) struct ListQuery {
    limit: Option<String>,
}

#[debug_handler]
pub(crate) async fn list_messages(
    State(store): State<Store>,
    headers: HeaderMap,
    Query(ListQuery { limit }): Query<ListQuery>,
) -> AppResult<Json<Vec<Message>>> {
    let user = session::user(&headers).ok_or(AppError::MissingHeader(session::USER))?;
    let limit = Limit::parse(limit.as_deref())?;

    let visible = visible_messages(store.messages().await?, &user);
    Ok(Json(limited_view(visible, limit)))
}
