/*
 * input_reply.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

use crate::wire::jupyter_message::MessageType;

/// What the user typed in answer to an `input_request`. Sent on stdin, with
/// the request as parent.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InputReply {
    pub value: String,
}

impl MessageType for InputReply {
    fn message_type() -> String {
        String::from("input_reply")
    }
}
