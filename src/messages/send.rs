use axum::{debug_handler, extract::{rejection::JsonRejection, State}, http::{HeaderMap, StatusCode}, Json};
use serde_json::Value;

use crate::{
    clock,
    db::Store,
    models::{Message, MessageKind},
    body_or_empty, session, AppError, AppResult, GetField,
};

/// Checks the `{to, text, type}` body, reporting every bad field at once.
pub(crate) fn validate(body: &Value) -> AppResult<(String, String, MessageKind)> {
    let mut details = Vec::new();

    let to = body.get_str_field("to").map_err(|e| details.push(e)).ok();
    let text = body.get_str_field("text").map_err(|e| details.push(e)).ok();
    let kind = match body.get_str_field("type").as_deref() {
        Ok("message") => Some(MessageKind::Message),
        Ok("private_message") => Some(MessageKind::PrivateMessage),
        Ok(_) => {
            details.push("type must be one of message, private_message".to_owned());
            None
        }
        Err(e) => {
            details.push(e.clone());
            None
        }
    };

    match (to, text, kind) {
        (Some(to), Some(text), Some(kind)) => Ok((to, text, kind)),
        _ => Err(AppError::Validation(details)),
    }
}

#[debug_handler]
pub(crate) async fn send_message(
    State(store): State<Store>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<StatusCode> {
    let (to, text, kind) = validate(&body_or_empty(body))?;

    let from = session::user(&headers).unwrap_or_default();
    if store.find_participant(&from).await?.is_none() {
        return Err(AppError::UnknownSender(from));
    }

    let message = Message::new(from, to, text, kind, clock::now_millis())?;
    store.append(&message).await?;

    tracing::debug!(from = %message.from, to = %message.to, kind = %message.kind, "message stored");
    Ok(StatusCode::CREATED)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn accepts_private_message() {
        let (to, text, kind) = validate(&json!({"to": "Bob", "text": "oi", "type": "private_message"})).unwrap();

        assert_eq!(to, "Bob");
        assert_eq!(text, "oi");
        assert_eq!(kind, MessageKind::PrivateMessage);
    }

    #[test]
    fn reports_every_violation() {
        let details = match validate(&json!({"text": 3, "type": "status"})) {
            Err(AppError::Validation(details)) => details,
            other => panic!("expected validation error, got {other:?}"),
        };
        assert_eq!(details.len(), 3);
        assert!(details[0].contains("to"));
        assert!(details[1].contains("text"));
        assert!(details[2].contains("type"));
    }

    #[test]
    fn empty_strings_are_rejected() {
        assert!(validate(&json!({"to": "", "text": "oi", "type": "message"})).is_err());
    }
}
