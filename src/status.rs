use axum::{debug_handler, extract::State, http::{HeaderMap, StatusCode}};

use crate::{clock, presence::PresenceTracker, session, AppError, AppResult};

/// Heartbeat. Keeps the caller from being evicted for another inactivity window.
#[debug_handler]
pub async fn heartbeat(
    State(presence): State<PresenceTracker>,
    headers: HeaderMap,
) -> AppResult<StatusCode> {
    let Some(user) = session::user(&headers) else {
        return Err(AppError::Anonymous(session::USER));
    };

    presence.touch(&user, clock::now_millis()).await?;
    Ok(StatusCode::OK)
}
