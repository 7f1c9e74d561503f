/*
 * jupyter_channel.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

/// The set of all Jupyter sockets ("channels") over which messages are sent
/// and received.
#[derive(
    Serialize,
    Deserialize,
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum JupyterChannel {
    Shell,
    IOPub,
    Stdin,
    Control,
    Heartbeat,
}

impl JupyterChannel {
    /// The channel a message of the given type travels on, from the point of
    /// view of a frontend.
    ///
    /// Message types that aren't in the table (including comm messages and
    /// types we don't know about) go to the shell. This is a compatibility
    /// fallback: comms opened by a frontend are addressed to the kernel's
    /// shell, and unknown requests are far more likely to be shell requests
    /// than anything else. Callers that need another channel set
    /// `WireMessage::channel` explicitly.
    pub fn for_message_type(msg_type: &str) -> JupyterChannel {
        match msg_type {
            "execute_request" |
            "execute_reply" |
            "inspect_request" |
            "inspect_reply" |
            "kernel_info_request" |
            "kernel_info_reply" |
            "complete_request" |
            "complete_reply" |
            "history_request" |
            "history_reply" |
            "is_complete_request" |
            "is_complete_reply" |
            "comm_info_request" |
            "comm_info_reply" |
            "shutdown_request" |
            "shutdown_reply" => JupyterChannel::Shell,

            "display_data" |
            "stream" |
            "update_display_data" |
            "execute_input" |
            "execute_result" |
            "error" |
            "status" |
            "clear_output" => JupyterChannel::IOPub,

            "input_request" | "input_reply" => JupyterChannel::Stdin,

            "interrupt_request" | "interrupt_reply" => JupyterChannel::Control,

            "comm_open" | "comm_msg" | "comm_close" => JupyterChannel::Shell,

            _ => JupyterChannel::Shell,
        }
    }
}
