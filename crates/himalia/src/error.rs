/*
 * error.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::wire::jupyter_channel::JupyterChannel;

#[derive(Debug)]
pub enum Error {
    MissingDelimiter,
    InsufficientParts(usize, usize),
    InvalidHmac(Vec<u8>, hex::FromHexError),
    BadSignature(Vec<u8>, hmac::digest::MacError),
    Utf8Error(String, Vec<u8>, std::str::Utf8Error),
    JsonParseError(String, String, serde_json::Error),
    InvalidPart(String, serde_json::Value, serde_json::Error),
    InvalidMessage(String, serde_json::Value, serde_json::Error),
    CannotSerialize(serde_json::Error),
    MissingMessageType(String),
    HmacKeyInvalid(String, hmac::digest::InvalidLength),
    UnsupportedSignatureScheme(String),
    ReadConnectionFile(String, std::io::Error),
    ParseConnectionFile(String, serde_json::Error),
    NoEndpoint(JupyterChannel),
    CannotSend(String, String),
    Disconnected(JupyterChannel, String),
    Lagged(u64),
    ChannelClosed(String),
    Timeout(String, Duration),
}

impl Error {
    /// Whether this error means the message failed authentication. These must
    /// never be treated as a generic parse failure.
    pub fn is_signature_error(&self) -> bool {
        matches!(self, Error::InvalidHmac(..) | Error::BadSignature(..))
    }
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MissingDelimiter => {
                write!(f, "Message did not include expected <IDS|MSG> delimiter")
            },
            Error::InsufficientParts(found, expected) => {
                write!(
                    f,
                    "Message did not contain sufficient parts after the delimiter (found {}, expected {})",
                    found, expected
                )
            },
            Error::InvalidHmac(data, err) => {
                write!(
                    f,
                    "Message HMAC signature {:?} is not a valid lowercase hexadecimal value: {}",
                    String::from_utf8_lossy(data),
                    err
                )
            },
            Error::BadSignature(sig, err) => {
                write!(
                    f,
                    "Message HMAC signature {} is incorrect: {}",
                    hex::encode(sig),
                    err
                )
            },
            Error::Utf8Error(part, data, err) => {
                write!(
                    f,
                    "Message part '{}' was not valid UTF-8: {} (raw: {:?})",
                    part, err, data
                )
            },
            Error::JsonParseError(part, str, err) => {
                write!(
                    f,
                    "Message part '{}' is invalid JSON: {} (raw: {})",
                    part, err, str
                )
            },
            Error::InvalidPart(part, json, err) => {
                write!(
                    f,
                    "Message part '{}' does not match schema: {} (raw: {})",
                    part, err, json
                )
            },
            Error::InvalidMessage(kind, json, err) => {
                write!(f, "Invalid '{}' message: {} (raw: {})", kind, err, json)
            },
            Error::CannotSerialize(err) => {
                write!(f, "Cannot serialize message: {}", err)
            },
            Error::MissingMessageType(msg_id) => {
                write!(f, "Message '{}' has no message type in its header", msg_id)
            },
            Error::HmacKeyInvalid(str, err) => {
                write!(
                    f,
                    "The HMAC supplied signing key '{}' ({} bytes) cannot be used: {}",
                    str,
                    str.len(),
                    err
                )
            },
            Error::UnsupportedSignatureScheme(scheme) => {
                write!(
                    f,
                    "Unsupported signature scheme '{}' (only 'hmac-sha256' is supported)",
                    scheme
                )
            },
            Error::ReadConnectionFile(path, err) => {
                write!(f, "Could not read connection file '{}': {}", path, err)
            },
            Error::ParseConnectionFile(path, err) => {
                write!(f, "Could not parse connection file '{}': {}", path, err)
            },
            Error::NoEndpoint(channel) => {
                write!(f, "No endpoint is connected for the {} channel", channel)
            },
            Error::CannotSend(name, reason) => {
                write!(f, "Cannot send message via {} socket: {}", name, reason)
            },
            Error::Disconnected(channel, reason) => {
                write!(f, "The {} channel disconnected: {}", channel, reason)
            },
            Error::Lagged(count) => {
                write!(
                    f,
                    "{} inbound messages were lost before they could be delivered",
                    count
                )
            },
            Error::ChannelClosed(what) => {
                write!(f, "Channel closed while waiting for {}", what)
            },
            Error::Timeout(what, duration) => {
                write!(
                    f,
                    "Timed out after {}ms while waiting for {}",
                    duration.as_millis(),
                    what
                )
            },
        }
    }
}

/// Stable identifiers attached to failure events so that consumers can
/// render a specific message for each failure reason.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The content targeted by an execution is not a notebook
    ExecNotANotebook,

    /// The cell targeted by an execution does not exist
    ExecCellNotFound,

    /// Only code cells can be executed
    ExecInvalidCellType,

    /// The cell has no source to execute
    ExecNoSource,

    /// No kernel is connected (or it is still starting)
    ExecNoKernel,

    /// The kernel record has no usable channel handle
    ExecMalformedChannel,

    /// The transport failed while sending or receiving for a request
    ExecTransport,

    /// A correlated message could not be processed
    ExecStreamError,

    /// The kernel speaks an incompatible protocol version
    KernelProtocolIncompatible,

    /// The kernel did not answer a `kernel_info_request` in time
    KernelInfoTimeout,

    /// The kernel info exchange failed for another reason
    KernelInfoFailed,

    /// The restarted kernel did not come up in time
    KernelRestartTimeout,

    /// The restart could not be completed
    KernelRestartFailed,

    /// Anything that escaped a request pipeline
    Unexpected,
}

/// A failure that travels downstream as part of an event rather than as a
/// Rust error. Unlike `Error`, it is cheap to clone and compare.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub code: ErrorCode,
    pub message: String,
}

impl Failure {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn from_error(code: ErrorCode, error: &Error) -> Self {
        Self::new(code, error.to_string())
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_error_codes_are_stable_identifiers() {
        assert_eq!(ErrorCode::ExecNoKernel.to_string(), "EXEC_NO_KERNEL");
        assert_eq!(ErrorCode::ExecNotANotebook.as_ref(), "EXEC_NOT_A_NOTEBOOK");
        assert_eq!(
            ErrorCode::from_str("KERNEL_RESTART_TIMEOUT").unwrap(),
            ErrorCode::KernelRestartTimeout
        );
        assert_eq!(
            serde_json::to_value(ErrorCode::ExecInvalidCellType).unwrap(),
            serde_json::json!("EXEC_INVALID_CELL_TYPE")
        );
    }

    #[test]
    fn test_signature_errors_are_classified() {
        let err = hex::decode("zz").unwrap_err();
        assert!(Error::InvalidHmac(b"zz".to_vec(), err).is_signature_error());
        assert!(!Error::MissingDelimiter.is_signature_error());
    }

    #[test]
    fn test_failure_display() {
        let failure = Failure::new(ErrorCode::ExecNoSource, "Cell 'a' has no source");
        assert_eq!(failure.to_string(), "EXEC_NO_SOURCE: Cell 'a' has no source");
    }
}
