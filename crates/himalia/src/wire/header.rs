/*
 * header.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use chrono::SecondsFormat;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use uuid::Uuid;

/// Version of the messaging protocol stamped on the messages we create
pub const PROTOCOL_VERSION: &str = "5.3";

/// Represents the header of a Jupyter message.
///
/// Headers received from the wire are not guaranteed to be complete (parent
/// headers in particular are sometimes partial), so every field is optional on
/// the wire. Absent fields are empty strings here and are left out again when
/// the header is serialized. Fields serialize in declaration order, followed
/// by any fields this crate doesn't know about (such as `subshell_id` from
/// newer protocol versions), which are carried through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JupyterHeader {
    /// Message type
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub msg_type: String,

    /// The message identifier; must be unique per message
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub msg_id: String,

    /// Username; must be unique per user
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,

    /// Date/time when message was created (ISO 8601)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub date: String,

    /// Message protocol version
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,

    /// Session ID; must be unique per session
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub session: String,

    /// Header fields not listed above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl JupyterHeader {
    /// Create a header for a new message, with a fresh message ID and the
    /// current time.
    pub fn create(msg_type: String, session: String, username: String) -> Self {
        Self {
            msg_type,
            msg_id: Uuid::new_v4().to_string(),
            username,
            date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            version: String::from(PROTOCOL_VERSION),
            session,
            extra: Map::new(),
        }
    }

    /// Whether the header has no fields at all. On the wire, such a header
    /// can't be told apart from a missing one.
    pub fn is_empty(&self) -> bool {
        self.msg_type.is_empty()
            && self.msg_id.is_empty()
            && self.username.is_empty()
            && self.date.is_empty()
            && self.version.is_empty()
            && self.session.is_empty()
            && self.extra.is_empty()
    }
}
