/*
 * comm_msg.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::wire::jupyter_message::MessageType;

/// Represents a message sent through an open comm
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CommWireMsg {
    pub comm_id: String,
    pub data: Value,
}

impl CommWireMsg {
    pub fn new(comm_id: impl Into<String>, data: Value) -> Self {
        Self {
            comm_id: comm_id.into(),
            data,
        }
    }
}

impl MessageType for CommWireMsg {
    fn message_type() -> String {
        String::from("comm_msg")
    }
}
