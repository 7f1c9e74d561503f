/*
 * display_data.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::wire::jupyter_message::MessageType;

/// Represents a rich output to be displayed
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DisplayData {
    /// The data giving the MIME key/value pairs to display
    pub data: Value,

    /// Optional additional metadata about the data
    #[serde(default)]
    pub metadata: Value,

    /// Additional information not to be persisted; `display_id` lives here
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub transient: Value,
}

impl DisplayData {
    pub fn new(data: Value) -> Self {
        Self {
            data,
            metadata: serde_json::json!({}),
            transient: Value::Null,
        }
    }

    /// Tag the output with a display ID so later `update_display_data`
    /// messages can replace it.
    pub fn with_display_id(mut self, display_id: impl Into<String>) -> Self {
        self.transient = serde_json::json!({ "display_id": display_id.into() });
        self
    }
}

impl MessageType for DisplayData {
    fn message_type() -> String {
        String::from("display_data")
    }
}
