/*
 * clear_output.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

use crate::wire::jupyter_message::MessageType;

/// Represents a request from the kernel to clear the output of the cell that
/// is currently executing
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ClearOutput {
    /// Wait to clear the output until new output is available
    #[serde(default)]
    pub wait: bool,
}

impl MessageType for ClearOutput {
    fn message_type() -> String {
        String::from("clear_output")
    }
}
