/*
 * history_reply.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::wire::jupyter_message::MessageType;
use crate::wire::jupyter_message::Status;

/// Represents a reply to a `history_request`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HistoryReply {
    #[serde(default)]
    pub status: Status,

    /// `(session, line_number, input)` tuples, or `(session, line_number,
    /// (input, output))` when output was requested
    #[serde(default)]
    pub history: Vec<Value>,
}

impl MessageType for HistoryReply {
    fn message_type() -> String {
        String::from("history_reply")
    }
}
