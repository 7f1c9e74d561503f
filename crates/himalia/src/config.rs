/*
 * config.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use serde_with::serde_as;
use serde_with::DurationMilliSeconds;

/// Tunables for a kernel client. Every field has a default, so partial JSON
/// documents are accepted.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelClientConfig {
    /// How many inbound messages the multiplexed channel buffers for a slow
    /// subscriber before that subscriber starts missing messages
    pub inbound_capacity: usize,

    /// How long to wait for a `kernel_info_reply`
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub kernel_info_timeout: Duration,

    /// How long a restarted kernel has to report a successful launch
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub restart_timeout: Duration,

    /// How long to wait for replies on the control channel (interrupt and
    /// shutdown)
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub control_reply_timeout: Duration,
}

impl Default for KernelClientConfig {
    fn default() -> Self {
        Self {
            inbound_capacity: 1024,
            kernel_info_timeout: Duration::from_secs(10),
            restart_timeout: Duration::from_secs(60),
            control_reply_timeout: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_partial_json() {
        let config: KernelClientConfig =
            serde_json::from_str(r#"{ "kernel_info_timeout": 2500 }"#).unwrap();
        assert_eq!(config.kernel_info_timeout, Duration::from_millis(2500));
        assert_eq!(config.restart_timeout, Duration::from_secs(60));
        assert_eq!(config.inbound_capacity, 1024);
    }

    #[test]
    fn test_config_serializes_milliseconds() {
        let value = serde_json::to_value(KernelClientConfig::default()).unwrap();
        assert_eq!(value["restart_timeout"], 60000);
    }
}
