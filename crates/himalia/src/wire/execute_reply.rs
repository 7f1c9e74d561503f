/*
 * execute_reply.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::wire::jupyter_message::MessageType;
use crate::wire::jupyter_message::Status;

/// Represents a reply from an execute_request message
#[serde_with::skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ExecuteReply {
    /// The status of the request
    pub status: Status,

    /// Monotonically increasing execution counter. Aborted requests don't
    /// have one.
    #[serde(default)]
    pub execution_count: Option<u32>,

    /// Page or editor payloads, acted on by the frontend
    #[serde(default)]
    pub payload: Vec<Value>,

    /// Results for user expressions
    #[serde(default)]
    pub user_expressions: Option<Value>,
}

impl MessageType for ExecuteReply {
    fn message_type() -> String {
        String::from("execute_reply")
    }
}
