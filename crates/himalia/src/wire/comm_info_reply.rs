/*
 * comm_info_reply.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::wire::jupyter_message::MessageType;
use crate::wire::jupyter_message::Status;

/// Represents a reply to a `comm_info_request`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CommInfoReply {
    /// The status of the request (usually "ok")
    #[serde(default)]
    pub status: Status,

    /// Dictionary of comms, keyed by comm ID, each holding its target name
    #[serde(default)]
    pub comms: Value,
}

impl MessageType for CommInfoReply {
    fn message_type() -> String {
        String::from("comm_info_reply")
    }
}
