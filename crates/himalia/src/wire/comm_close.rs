/*
 * comm_close.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::wire::jupyter_message::MessageType;

/// Represents a request to close a comm
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CommClose {
    pub comm_id: String,

    /// Data sent along with the close request
    #[serde(default)]
    pub data: Value,
}

impl CommClose {
    pub fn new(comm_id: impl Into<String>) -> Self {
        Self {
            comm_id: comm_id.into(),
            data: serde_json::json!({}),
        }
    }
}

impl MessageType for CommClose {
    fn message_type() -> String {
        String::from("comm_close")
    }
}
