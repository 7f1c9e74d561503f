/*
 * inspect_reply.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::wire::jupyter_message::MessageType;
use crate::wire::jupyter_message::Status;

/// Represents a reply to an `inspect_request`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InspectReply {
    #[serde(default)]
    pub status: Status,

    /// Whether an object was found
    #[serde(default)]
    pub found: bool,

    /// MIME bundle describing the object
    #[serde(default)]
    pub data: Value,

    #[serde(default)]
    pub metadata: Value,
}

impl MessageType for InspectReply {
    fn message_type() -> String {
        String::from("inspect_reply")
    }
}
