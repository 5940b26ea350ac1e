//! Plain-text rendering of the inbox.

use std::fmt::Write;

use chrono::{DateTime, Local, TimeZone};
use postline_core::Message;

/// Renders messages in the order given, one block per message.
pub fn inbox<Tz: TimeZone>(messages: &[Message], tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    if messages.is_empty() {
        return "No messages.\n".to_string();
    }

    let mut out = String::new();
    for (idx, message) in messages.iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        let date: DateTime<Tz> = message.date.with_timezone(tz);
        let _ = writeln!(out, "{}", message.subject);
        let _ = writeln!(out, "From: {}", message.sender);
        let _ = writeln!(out, "To: {}", message.receiver);
        let _ = writeln!(out, "{}", message.message);
        let _ = writeln!(out, "{}", date.format("%Y-%m-%d %H:%M:%S"));
    }
    out
}

/// Renders messages in the local time zone.
pub fn inbox_local(messages: &[Message]) -> String {
    inbox(messages, &Local)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn message(subject: &str) -> Message {
        Message {
            subject: subject.to_string(),
            sender: "bob".to_string(),
            receiver: "alice".to_string(),
            message: "Hello".to_string(),
            date: DateTime::from_timestamp(1_705_314_600, 0).unwrap(),
        }
    }

    #[test]
    fn test_empty_inbox() {
        assert_eq!(inbox(&[], &Utc), "No messages.\n");
    }

    #[test]
    fn test_renders_in_order_with_time_zone() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let text = inbox(&[message("First"), message("Second")], &tz);

        assert_eq!(
            text,
            "First\nFrom: bob\nTo: alice\nHello\n2024-01-15 12:30:00\n\n\
             Second\nFrom: bob\nTo: alice\nHello\n2024-01-15 12:30:00\n"
        );
    }
}
