/*
 * exception.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

/// Represents an exception that occurred while executing code
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Exception {
    /// The name of the exception
    pub ename: String,

    /// The value/description of the exception
    pub evalue: String,

    /// List of traceback frames, as strings
    #[serde(default)]
    pub traceback: Vec<String>,
}
