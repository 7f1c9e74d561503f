/*
 * update_display_data.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::wire::jupyter_message::MessageType;

/// Represents a request to replace an output previously displayed with a
/// `display_id`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UpdateDisplayData {
    pub data: Value,

    #[serde(default)]
    pub metadata: Value,

    /// Must carry the `display_id` of the output to update
    pub transient: Value,
}

impl MessageType for UpdateDisplayData {
    fn message_type() -> String {
        String::from("update_display_data")
    }
}
