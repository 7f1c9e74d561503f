/*
 * language_info.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// Represents information about the language that the kernel implements
#[serde_with::skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct LanguageInfo {
    /// The name of the programming language the kernel implements
    pub name: String,

    /// The version of the language
    #[serde(default)]
    pub version: String,

    /// The MIME type for script files in the language
    #[serde(default)]
    pub mimetype: String,

    /// The file extension for script files in the language
    #[serde(default)]
    pub file_extension: String,

    /// Pygments lexer (for highlighting), if different than `name`
    #[serde(default)]
    pub pygments_lexer: Option<String>,

    /// Codemirror mode (for editing), if different than `name`. Either a mode
    /// name or a mode spec object.
    #[serde(default)]
    pub codemirror_mode: Option<Value>,

    /// Nbconvert exporter, if not the default 'script' exporter
    #[serde(default)]
    pub nbconvert_exporter: Option<String>,
}
