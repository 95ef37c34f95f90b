//! Stream entry field layout.

use redis::streams::StreamId;

use notiq_common::types::PushedNotification;

/// Field holding the notification body.
pub const FIELD_MESSAGE: &str = "message";

/// Field holding the string-encoded epoch-seconds append time.
pub const FIELD_TIMESTAMP: &str = "timestamp";

/// Convert a raw stream entry into the client-facing wire shape.
///
/// Entries without a `message` field are skipped rather than delivered
/// half-formed.
pub fn to_notification(entry: &StreamId) -> Option<PushedNotification> {
    let message: String = entry.get(FIELD_MESSAGE)?;
    Some(PushedNotification {
        message_id: entry.id.clone(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use redis::Value;
    use std::collections::HashMap;

    fn raw_entry(id: &str, fields: &[(&str, &str)]) -> StreamId {
        let mut map = HashMap::new();
        for (k, v) in fields {
            map.insert(k.to_string(), Value::BulkString(v.as_bytes().to_vec()));
        }
        StreamId {
            id: id.to_string(),
            map,
        }
    }

    #[test]
    fn converts_well_formed_entry() {
        let entry = raw_entry(
            "1714-0",
            &[(FIELD_MESSAGE, "hello"), (FIELD_TIMESTAMP, "1714000000")],
        );
        let notification = to_notification(&entry).unwrap();
        assert_eq!(notification.message_id, "1714-0");
        assert_eq!(notification.message, "hello");
    }

    #[test]
    fn skips_entry_without_message_field() {
        let entry = raw_entry("1714-1", &[(FIELD_TIMESTAMP, "1714000000")]);
        assert!(to_notification(&entry).is_none());
    }
}
