/*
 * kernel.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use crate::kernel_channel::KernelChannel;

/// The state of a kernel connection, as tracked by whoever launched it
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
)]
pub enum KernelStatus {
    #[serde(rename = "not connected")]
    #[strum(serialize = "not connected")]
    NotConnected,

    #[serde(rename = "starting")]
    #[strum(serialize = "starting")]
    Starting,

    #[serde(rename = "idle")]
    #[strum(serialize = "idle")]
    Idle,

    #[serde(rename = "busy")]
    #[strum(serialize = "busy")]
    Busy,

    #[serde(rename = "restarting")]
    #[strum(serialize = "restarting")]
    Restarting,

    #[serde(rename = "dead")]
    #[strum(serialize = "dead")]
    Dead,
}

impl KernelStatus {
    /// Whether requests may be sent to the kernel. A kernel that is still
    /// starting, or that we never connected to, can't take requests.
    pub fn accepts_requests(&self) -> bool {
        !matches!(self, KernelStatus::NotConnected | KernelStatus::Starting)
    }
}

/// A kernel connection. The channel handle is borrowed for the duration of a
/// request; the record is owned by whoever launched the kernel.
#[derive(Debug, Clone)]
pub struct KernelRecord {
    pub kernel_ref: String,
    pub kernel_spec_name: String,
    pub cwd: String,
    pub status: KernelStatus,

    /// Missing when the connection is not (or no longer) usable
    pub channels: Option<Arc<KernelChannel>>,
}

/// Looks up the kernel serving a piece of content.
pub trait KernelRegistry: Send + Sync {
    fn kernel_for(&self, content_id: &str) -> Option<KernelRecord>;
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_kernel_status_names() {
        assert_eq!(KernelStatus::NotConnected.to_string(), "not connected");
        assert_eq!(KernelStatus::from_str("busy").unwrap(), KernelStatus::Busy);
        assert_eq!(
            serde_json::to_value(KernelStatus::NotConnected).unwrap(),
            serde_json::json!("not connected")
        );
    }

    #[test]
    fn test_kernel_status_readiness() {
        assert!(!KernelStatus::NotConnected.accepts_requests());
        assert!(!KernelStatus::Starting.accepts_requests());
        assert!(KernelStatus::Idle.accepts_requests());
        assert!(KernelStatus::Busy.accepts_requests());
    }
}
