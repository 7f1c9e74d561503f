/*
 * is_complete_reply.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

use crate::wire::jupyter_message::MessageType;

/// Represents a reply to an `is_complete_request`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct IsCompleteReply {
    /// Whether the code is complete
    pub status: IsComplete,

    /// Characters to use to indent the next line (for incomplete code)
    #[serde(default)]
    pub indent: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IsComplete {
    Complete,
    Incomplete,
    Invalid,
    Unknown,
}

impl MessageType for IsCompleteReply {
    fn message_type() -> String {
        String::from("is_complete_reply")
    }
}
