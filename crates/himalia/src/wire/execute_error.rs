/*
 * execute_error.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

use crate::wire::exception::Exception;
use crate::wire::jupyter_message::MessageType;

/// Represents an exception that occurred while executing code. This is
/// broadcast on IOPub; the `execute_reply` on the shell carries an error
/// status separately.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ExecuteError {
    /// The exception that occurred during execution
    #[serde(flatten)]
    pub exception: Exception,
}

impl ExecuteError {
    pub fn new(ename: impl Into<String>, evalue: impl Into<String>, traceback: Vec<String>) -> Self {
        Self {
            exception: Exception {
                ename: ename.into(),
                evalue: evalue.into(),
                traceback,
            },
        }
    }
}

impl MessageType for ExecuteError {
    fn message_type() -> String {
        String::from("error")
    }
}
