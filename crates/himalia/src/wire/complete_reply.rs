/*
 * complete_reply.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::wire::jupyter_message::MessageType;
use crate::wire::jupyter_message::Status;

/// Represents a reply to a completion request
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CompleteReply {
    #[serde(default)]
    pub status: Status,

    /// The list of all matches
    #[serde(default)]
    pub matches: Vec<String>,

    /// The range of text that should be replaced by a match
    #[serde(default)]
    pub cursor_start: u32,
    #[serde(default)]
    pub cursor_end: u32,

    /// Extra information about the matches
    #[serde(default)]
    pub metadata: Value,
}

impl MessageType for CompleteReply {
    fn message_type() -> String {
        String::from("complete_reply")
    }
}
