/*
 * interrupt_request.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

use crate::wire::jupyter_message::MessageType;

/// Represents a request to interrupt the kernel; it has no content. Sent on
/// the control channel.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct InterruptRequest {}

impl MessageType for InterruptRequest {
    fn message_type() -> String {
        String::from("interrupt_request")
    }
}
