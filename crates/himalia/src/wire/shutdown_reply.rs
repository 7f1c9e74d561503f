/*
 * shutdown_reply.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

use crate::wire::jupyter_message::MessageType;
use crate::wire::jupyter_message::Status;

/// Represents a reply to a `shutdown_request`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ShutdownReply {
    #[serde(default)]
    pub status: Status,

    /// Whether the kernel is shutting down in preparation for a restart
    #[serde(default)]
    pub restart: bool,
}

impl MessageType for ShutdownReply {
    fn message_type() -> String {
        String::from("shutdown_reply")
    }
}
