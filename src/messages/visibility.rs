use crate::{
    models::{Message, MessageKind, EVERYONE},
    AppError, AppResult,
};

/// Requested size of a message listing. `None` means everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit(Option<usize>);

impl Limit {
    pub const ALL: Limit = Limit(None);

    /// Parses the raw `limit` query value. Absent and `0` both mean "all";
    /// negative or non-numeric values are rejected.
    pub fn parse(raw: Option<&str>) -> AppResult<Limit> {
        let Some(raw) = raw else {
            return Ok(Limit::ALL);
        };

        let n: i64 = raw
            .trim()
            .parse()
            .map_err(|_| AppError::invalid(format!("limit must be an integer, got {raw:?}")))?;

        match n {
            0 => Ok(Limit::ALL),
            n if n < 0 => Err(AppError::invalid(format!("limit must not be negative, got {n}"))),
            n => Ok(Limit(Some(n as usize))),
        }
    }

    pub fn last(n: usize) -> Limit {
        if n == 0 { Limit::ALL } else { Limit(Some(n)) }
    }
}

pub fn is_visible_to(message: &Message, user: &str) -> bool {
    message.kind == MessageKind::Message
        || message.to == EVERYONE
        || message.to == user
        || message.from == user
}

/// Messages `user` may read, in storage order.
pub fn visible_messages(messages: impl IntoIterator<Item = Message>, user: &str) -> Vec<Message> {
    messages
        .into_iter()
        .filter(|message| is_visible_to(message, user))
        .collect()
}

/// Keeps the most recent `limit` entries, oldest first.
pub fn limited_view(mut visible: Vec<Message>, limit: Limit) -> Vec<Message> {
    if let Limit(Some(n)) = limit {
        if visible.len() > n {
            visible.drain(..visible.len() - n);
        }
    }
    visible
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(from: &str, to: &str, kind: MessageKind, text: &str) -> Message {
        Message::new(from.to_owned(), to.to_owned(), text.to_owned(), kind, 0).unwrap()
    }

    fn texts(messages: &[Message]) -> Vec<&str> {
        messages.iter().map(|m| m.text.as_str()).collect()
    }

    #[test]
    fn private_messages_between_others_are_hidden() {
        let log = vec![
            msg("Eve", "Xavier", MessageKind::Message, "public"),
            msg("Ana", EVERYONE, MessageKind::Status, "broadcast"),
            msg("Ana", "Bob", MessageKind::PrivateMessage, "for bob"),
            msg("Dan", "Carl", MessageKind::PrivateMessage, "for carl"),
        ];

        let visible = visible_messages(log.clone(), "Bob");
        assert_eq!(texts(&visible), vec!["public", "broadcast", "for bob"]);

        let mut reversed = log;
        reversed.reverse();
        let visible = visible_messages(reversed, "Bob");
        assert_eq!(texts(&visible), vec!["for bob", "broadcast", "public"]);
    }

    #[test]
    fn sender_sees_own_private_messages() {
        let log = vec![msg("Dan", "Carl", MessageKind::PrivateMessage, "psst")];

        assert_eq!(visible_messages(log.clone(), "Dan").len(), 1);
        assert_eq!(visible_messages(log.clone(), "Carl").len(), 1);
        assert!(visible_messages(log, "Bob").is_empty());
    }

    #[test]
    fn message_matching_several_rules_appears_once() {
        let log = vec![msg("Bob", "Bob", MessageKind::Message, "to myself")];

        assert_eq!(visible_messages(log, "Bob").len(), 1);
    }

    #[test]
    fn limit_keeps_most_recent_in_order() {
        let log: Vec<Message> = (1..=5)
            .map(|i| msg("Ana", EVERYONE, MessageKind::Message, &i.to_string()))
            .collect();

        assert_eq!(texts(&limited_view(log.clone(), Limit::last(2))), vec!["4", "5"]);
        assert_eq!(limited_view(log.clone(), Limit::ALL).len(), 5);
        assert_eq!(limited_view(log.clone(), Limit::last(0)).len(), 5);
        assert_eq!(limited_view(log, Limit::last(50)).len(), 5);
    }

    #[test]
    fn limit_parsing() {
        assert_eq!(Limit::parse(None).unwrap(), Limit::ALL);
        assert_eq!(Limit::parse(Some("0")).unwrap(), Limit::ALL);
        assert_eq!(Limit::parse(Some("2")).unwrap(), Limit::last(2));
        assert!(matches!(Limit::parse(Some("-1")), Err(AppError::Validation(_))));
        assert!(matches!(Limit::parse(Some("abc")), Err(AppError::Validation(_))));
        assert!(matches!(Limit::parse(Some("")), Err(AppError::Validation(_))));
    }
}
