/*
 * execute_input.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

use crate::wire::jupyter_message::MessageType;

/// Represents a rebroadcast of code input; used to notify frontends of code
/// being executed.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ExecuteInput {
    /// The code being executed
    pub code: String,

    /// The execution count
    pub execution_count: u32,
}

impl MessageType for ExecuteInput {
    fn message_type() -> String {
        String::from("execute_input")
    }
}
