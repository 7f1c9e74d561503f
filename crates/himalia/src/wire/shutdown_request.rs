/*
 * shutdown_request.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

use crate::wire::jupyter_message::MessageType;

/// Represents a request to shut down the kernel
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ShutdownRequest {
    /// Whether a new kernel will be started in place of this one
    pub restart: bool,
}

impl MessageType for ShutdownRequest {
    fn message_type() -> String {
        String::from("shutdown_request")
    }
}
