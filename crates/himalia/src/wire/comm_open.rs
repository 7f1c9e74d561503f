/*
 * comm_open.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::wire::jupyter_message::MessageType;

/// Represents a request to open a comm
#[serde_with::skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CommOpen {
    pub comm_id: String,
    pub target_name: String,

    /// The module in which the target is defined. Left off the wire entirely
    /// when not given.
    #[serde(default)]
    pub target_module: Option<String>,

    #[serde(default)]
    pub data: Value,
}

impl CommOpen {
    pub fn new(
        comm_id: impl Into<String>,
        target_name: impl Into<String>,
        target_module: Option<String>,
        data: Value,
    ) -> Self {
        Self {
            comm_id: comm_id.into(),
            target_name: target_name.into(),
            target_module,
            data,
        }
    }
}

impl MessageType for CommOpen {
    fn message_type() -> String {
        String::from("comm_open")
    }
}
