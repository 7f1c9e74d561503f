/*
 * is_complete_request.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

use crate::wire::jupyter_message::MessageType;

/// Represents a request to test code for completeness
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct IsCompleteRequest {
    /// The code to test for completeness
    pub code: String,
}

impl MessageType for IsCompleteRequest {
    fn message_type() -> String {
        String::from("is_complete_request")
    }
}
