/*
 * history_request.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

use crate::wire::jupyter_message::MessageType;

/// Represents a request for entries from the kernel's execution history
#[serde_with::skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HistoryRequest {
    /// Whether to include the output of each entry
    pub output: bool,

    /// Whether to return the raw input rather than the transformed input
    pub raw: bool,

    /// One of "range", "tail" or "search"
    pub hist_access_type: String,

    /// Number of entries to return ("tail" and "search")
    pub n: Option<u32>,

    /// Glob pattern to match ("search")
    pub pattern: Option<String>,

    /// Only return unique entries ("search")
    pub unique: Option<bool>,
}

impl HistoryRequest {
    /// Request the last `n` entries.
    pub fn tail(n: u32) -> Self {
        Self {
            output: false,
            raw: true,
            hist_access_type: String::from("tail"),
            n: Some(n),
            pattern: None,
            unique: None,
        }
    }
}

impl MessageType for HistoryRequest {
    fn message_type() -> String {
        String::from("history_request")
    }
}
