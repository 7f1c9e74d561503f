/*
 * input_request.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

use crate::wire::jupyter_message::MessageType;

/// Represents a request from the kernel to the frontend to prompt the user for
/// input
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InputRequest {
    /// The prompt to display to the user
    #[serde(default)]
    pub prompt: String,

    /// Whether the string being requested is a password (and should therefore
    /// be obscured)
    #[serde(default)]
    pub password: bool,
}

impl MessageType for InputRequest {
    fn message_type() -> String {
        String::from("input_request")
    }
}
