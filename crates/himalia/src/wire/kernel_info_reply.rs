/*
 * kernel_info_reply.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

use crate::wire::help_link::HelpLink;
use crate::wire::jupyter_message::MessageType;
use crate::wire::jupyter_message::Status;
use crate::wire::language_info::LanguageInfo;

/// Represents a reply to a `kernel_info_request`.
///
/// Kernels in the wild leave out fields freely, so everything but the
/// language info has a default.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct KernelInfoReply {
    /// The execution status ("ok" or "error")
    #[serde(default)]
    pub status: Status,

    /// Version of messaging protocol
    #[serde(default)]
    pub protocol_version: String,

    /// The kernel implementation name (e.g. "ipython")
    #[serde(default)]
    pub implementation: String,

    /// The kernel implementation version
    #[serde(default)]
    pub implementation_version: String,

    /// Information about the language the kernel supports
    pub language_info: LanguageInfo,

    /// A startup banner
    #[serde(default)]
    pub banner: String,

    /// Whether debugging is supported
    #[serde(default)]
    pub debugger: bool,

    /// A list of help links
    #[serde(default)]
    pub help_links: Vec<HelpLink>,
}

impl MessageType for KernelInfoReply {
    fn message_type() -> String {
        String::from("kernel_info_reply")
    }
}
