/*
 * interrupt_reply.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

use crate::wire::jupyter_message::MessageType;
use crate::wire::jupyter_message::Status;

/// Represents a reply to an `interrupt_request`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InterruptReply {
    #[serde(default)]
    pub status: Status,
}

impl MessageType for InterruptReply {
    fn message_type() -> String {
        String::from("interrupt_reply")
    }
}
