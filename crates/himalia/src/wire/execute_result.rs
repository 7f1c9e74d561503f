/*
 * execute_result.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::wire::display_data::DisplayData;
use crate::wire::jupyter_message::MessageType;

/// Represents the result of a cell execution; a `display_data` that also
/// carries the execution count
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ExecuteResult {
    /// The data giving the MIME key/value pairs to display
    pub data: Value,

    /// Optional additional metadata about the data
    #[serde(default)]
    pub metadata: Value,

    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub transient: Value,

    /// The execution count of the cell that produced the result
    pub execution_count: u32,
}

impl ExecuteResult {
    pub fn new(display: DisplayData, execution_count: u32) -> Self {
        Self {
            data: display.data,
            metadata: display.metadata,
            transient: display.transient,
            execution_count,
        }
    }
}

impl MessageType for ExecuteResult {
    fn message_type() -> String {
        String::from("execute_result")
    }
}
