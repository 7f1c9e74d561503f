/*
 * inspect_request.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

use crate::wire::jupyter_message::MessageType;

/// Represents a request to introspect the object at the cursor
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InspectRequest {
    /// The code context in which introspection is requested
    pub code: String,

    /// The cursor position within `code`, in unicode characters
    pub cursor_pos: u32,

    /// 0 for a summary, 1 for more detail
    pub detail_level: u32,
}

impl MessageType for InspectRequest {
    fn message_type() -> String {
        String::from("inspect_request")
    }
}
