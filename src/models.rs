use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{clock, AppError, AppResult};

/// Broadcast recipient.
pub const EVERYONE: &str = "Todos";

pub const JOIN_TEXT: &str = "entra na sala...";
pub const LEAVE_TEXT: &str = "sai da sala...";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: Uuid,
    pub name: String,
    pub last_status: i64,
}

impl Participant {
    pub fn new(name: String, now: i64) -> Self {
        Participant {
            id: Uuid::now_v7(),
            name,
            last_status: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Message,
    PrivateMessage,
    Status,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        use MessageKind::*;
        match self {
            Message => "message",
            PrivateMessage => "private_message",
            Status => "status",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use MessageKind::*;
        match s {
            "message" => Ok(Message),
            "private_message" => Ok(PrivateMessage),
            "status" => Ok(Status),
            other => Err(AppError::invalid(format!("unknown message type {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub from: String,
    pub to: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub time: String,
}

impl Message {
    pub fn new(from: String, to: String, text: String, kind: MessageKind, now: i64) -> AppResult<Self> {
        Ok(Message {
            id: Uuid::now_v7(),
            from,
            to,
            text,
            kind,
            time: clock::format_hms(now)?,
        })
    }

    /// System notice addressed to everyone.
    pub fn status(from: &str, text: &str, now: i64) -> AppResult<Self> {
        Self::new(from.to_owned(), EVERYONE.to_owned(), text.to_owned(), MessageKind::Status, now)
    }
}
