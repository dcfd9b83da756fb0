mod list;
mod send;
pub mod visibility;

use axum::{routing::get, Router};

use crate::AppState;

pub use visibility::{limited_view, visible_messages, Limit};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/messages", get(list::list_messages).post(send::send_message))
}
