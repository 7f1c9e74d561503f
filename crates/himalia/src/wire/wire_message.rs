/*
 * wire_message.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use hmac::digest::MacError;
use hmac::Hmac;
use hmac::Mac;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde_json::json;
use serde_json::value::Value;
use sha2::Sha256;

use crate::error::Error;
use crate::session::hmac_from_key;
use crate::wire::header::JupyterHeader;
use crate::wire::jupyter_channel::JupyterChannel;
use crate::wire::jupyter_message::JupyterMessage;
use crate::wire::jupyter_message::ProtocolMessage;

/// This delimiter separates the socket identities (IDS) from the message
/// body payload (MSG).
pub const MSG_DELIM: &[u8] = b"<IDS|MSG>";

/// Number of frames that must follow the delimiter: the signature and the
/// four JSON parts.
const REQUIRED_PARTS: usize = 5;

/// Represents an untyped Jupyter message delivered over the wire. A WireMessage
/// can represent any kind of Jupyter message; this is the form that flows
/// through the router and the channel multiplexer. Typically its header will
/// be examined and it will be converted into a typed JupyterMessage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    /// The routing identities. These store the peer identity for messages
    /// delivered request-reply style over ROUTER sockets (like the shell)
    #[serde(skip)]
    pub zmq_identities: Vec<Vec<u8>>,

    /// The header for this message
    pub header: JupyterHeader,

    /// The header of the message from which this message originated, if any.
    /// If none, it's serialized as an empty dict as required by the Jupyter
    /// protocol. An empty dict always decodes as `None`, so a parent header
    /// with no fields is treated as no parent.
    #[serde(
        default,
        serialize_with = "serialize_none_as_empty_dict",
        deserialize_with = "deserialize_empty_dict_as_none"
    )]
    pub parent_header: Option<JupyterHeader>,

    /// Additional metadata, if any
    #[serde(default = "empty_dict")]
    pub metadata: Value,

    /// The body (payload) of the message
    pub content: Value,

    /// Binary buffers that trail the JSON parts on the wire
    #[serde(skip)]
    pub buffers: Vec<Vec<u8>>,

    /// The channel this message arrived on, or should be sent on. Stamped by
    /// the channel multiplexer on inbound messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<JupyterChannel>,
}

impl WireMessage {
    /// Create a new untyped message of the given type. The session and
    /// username are left blank for the channel multiplexer to fill in; all
    /// public fields may be overridden after creation.
    pub fn create(msg_type: &str, content: Value) -> WireMessage {
        Self {
            zmq_identities: Vec::new(),
            header: JupyterHeader::create(String::from(msg_type), String::new(), String::new()),
            parent_header: None,
            metadata: empty_dict(),
            content,
            buffers: Vec::new(),
            channel: Some(JupyterChannel::for_message_type(msg_type)),
        }
    }

    /// Return the Jupyter type of the message.
    pub fn message_type(&self) -> String {
        self.header.msg_type.clone()
    }

    /// The ID of the message that caused this one, if it has a parent with a
    /// (non-empty) ID.
    pub fn parent_msg_id(&self) -> Option<&str> {
        match &self.parent_header {
            Some(parent) if !parent.msg_id.is_empty() => Some(parent.msg_id.as_str()),
            _ => None,
        }
    }

    /// Whether this message is a reply to, or a side effect of, `parent`.
    pub fn is_child_of(&self, parent: &WireMessage) -> bool {
        match self.parent_msg_id() {
            Some(id) => id == parent.header.msg_id,
            None => false,
        }
    }

    /// Parse a Jupyter message from an array of frames (from a multipart
    /// transport message)
    pub fn from_buffers(
        mut bufs: Vec<Vec<u8>>,
        hmac_key: &Option<Hmac<Sha256>>,
    ) -> Result<WireMessage, Error> {
        // Find the position of the <IDS|MSG> delimiter in the message, which
        // separates the socket identities (IDS) from the body of the message
        // (MSG).
        let pos = match bufs.iter().position(|buf| &buf[..] == MSG_DELIM) {
            Some(p) => p,
            None => return Err(Error::MissingDelimiter),
        };

        // Form a collection of the remaining parts, and remove the delimiter.
        let mut parts: Vec<_> = bufs.drain(pos + 1..).collect();
        bufs.pop();

        // We expect to have at least 5 parts left (the HMAC + 4 message frames)
        if parts.len() < REQUIRED_PARTS {
            return Err(Error::InsufficientParts(parts.len(), REQUIRED_PARTS));
        }

        // Everything after the JSON parts is a raw binary buffer
        let buffers = parts.split_off(REQUIRED_PARTS);

        // Consume and validate the HMAC signature.
        WireMessage::validate_hmac(&parts, hmac_key)?;

        // Parse the message header
        let header_val = WireMessage::parse_buffer(String::from("header"), &parts[1])?;
        let header: JupyterHeader = match serde_json::from_value(header_val.clone()) {
            Ok(h) => h,
            Err(err) => return Err(Error::InvalidPart(String::from("header"), header_val, err)),
        };

        // Parse the parent header. An empty dict means there's no parent,
        // which is OK per the wire protocol.
        let parent = match parts[2].len() {
            0 => None,
            _ => {
                let parent_val =
                    WireMessage::parse_buffer(String::from("parent header"), &parts[2])?;
                if is_empty_header(&parent_val) {
                    None
                } else {
                    match serde_json::from_value(parent_val.clone()) {
                        Ok(h) => Some(h),
                        Err(err) => {
                            return Err(Error::InvalidPart(
                                String::from("parent header"),
                                parent_val,
                                err,
                            ))
                        },
                    }
                }
            },
        };

        Ok(Self {
            zmq_identities: bufs,
            header,
            parent_header: parent,
            metadata: WireMessage::parse_buffer(String::from("metadata"), &parts[3])?,
            content: WireMessage::parse_buffer(String::from("content"), &parts[4])?,
            buffers,
            channel: None,
        })
    }

    /// Validates the message's HMAC signature
    fn validate_hmac(bufs: &[Vec<u8>], hmac_key: &Option<Hmac<Sha256>>) -> Result<(), Error> {
        // The hmac signature is the first value
        let data = &bufs[0];

        // If we don't have a key at all, no need to validate. It is acceptable
        // (per Jupyter spec) to have an empty connection key, which indicates
        // that no HMAC signatures are to be validated.
        let key = match hmac_key {
            Some(k) => k,
            None => return Ok(()),
        };

        // Decode the hexadecimal representation of the signature
        let decoded = match hex::decode(data) {
            Ok(decoded_bytes) => decoded_bytes,
            Err(error) => return Err(Error::InvalidHmac(data.to_vec(), error)),
        };

        // Compute the real signature according to our own key, over the four
        // JSON parts
        let mut hmac_validator = key.clone();
        for buf in &bufs[1..REQUIRED_PARTS] {
            hmac_validator.update(buf);
        }
        if let Err(err) = hmac_validator.verify_slice(&decoded) {
            return Err(Error::BadSignature(decoded, err));
        }

        // The signature must match our own encoding byte for byte, and we only
        // ever produce lowercase hex
        if data.iter().any(|b| b.is_ascii_uppercase()) {
            return Err(Error::BadSignature(decoded, MacError));
        }

        Ok(())
    }

    /// Parse raw buffer data from a single part of a multipart message into a
    /// JSON value.
    fn parse_buffer(desc: String, buf: &[u8]) -> Result<Value, Error> {
        let str = match std::str::from_utf8(buf) {
            Ok(s) => s,
            Err(err) => return Err(Error::Utf8Error(desc, buf.to_vec(), err)),
        };

        match serde_json::from_str(str) {
            Ok(v) => Ok(v),
            Err(err) => Err(Error::JsonParseError(desc, String::from(str), err)),
        }
    }

    /// Serialize and sign this message into the frames of a multipart
    /// transport message.
    pub fn to_buffers(&self, hmac_key: &Option<Hmac<Sha256>>) -> Result<Vec<Vec<u8>>, Error> {
        // Serialize JSON values into byte parts in preparation for transmission
        let mut parts: Vec<Vec<u8>> = match self.to_raw_parts() {
            Ok(v) => v,
            Err(err) => return Err(Error::CannotSerialize(err)),
        };

        // Compute HMAC signature
        let hmac = match hmac_key {
            Some(key) => {
                let mut sig = key.clone();
                for part in &parts {
                    sig.update(part);
                }
                hex::encode(sig.finalize().into_bytes().as_slice())
            },
            None => String::new(),
        };

        // Start with the socket identities, if any
        let mut msg: Vec<Vec<u8>> = self.zmq_identities.clone();
        msg.push(MSG_DELIM.to_vec());
        msg.push(hmac.into_bytes());
        msg.append(&mut parts);
        msg.extend(self.buffers.iter().cloned());

        Ok(msg)
    }

    /// Returns a vector containing the four JSON parts of the message
    fn to_raw_parts(&self) -> Result<Vec<Vec<u8>>, serde_json::Error> {
        let mut parts: Vec<Vec<u8>> = Vec::new();
        parts.push(serde_json::to_vec(&self.header)?);

        // Orphan messages have an empty dict as parent. The field's
        // `serialize_with` isn't consulted when serializing it on its own.
        match &self.parent_header {
            Some(parent) => parts.push(serde_json::to_vec(parent)?),
            None => parts.push(serde_json::to_vec(&serde_json::Map::new())?),
        }

        parts.push(serde_json::to_vec(&self.metadata)?);
        parts.push(serde_json::to_vec(&self.content)?);
        Ok(parts)
    }

    /// The message type, enriched with the execution state for status
    /// messages and the comm ID and method for comm messages. Used for logging.
    pub(crate) fn describe(&self) -> String {
        match self.header.msg_type.as_str() {
            "comm_msg" => {
                if let Value::Object(map) = &self.content {
                    let comm_id = match map.get("comm_id") {
                        Some(Value::String(id)) => id.as_str(),
                        _ => "unknown",
                    };
                    let method = match map.get("data") {
                        Some(Value::Object(data)) => match data.get("method") {
                            Some(Value::String(method)) => method.as_str(),
                            _ => "unknown",
                        },
                        _ => "unknown",
                    };
                    return format!("comm_msg/{comm_id}/{method}");
                }
            },
            "status" => {
                if let Some(Value::String(execution_state)) = self.content.get("execution_state") {
                    return format!("status/{execution_state}");
                }
            },
            _ => {},
        }
        self.header.msg_type.clone()
    }
}

/// Decode the frames of a multipart message, verifying the signature when a
/// key is given. The scheme is the signature scheme name from the connection
/// file (`hmac-sha256`, or the bare digest name `sha256`).
pub fn decode(frames: Vec<Vec<u8>>, key: Option<&str>, scheme: &str) -> Result<WireMessage, Error> {
    let hmac = match key {
        Some(key) => hmac_from_key(key, scheme)?,
        None => None,
    };
    WireMessage::from_buffers(frames, &hmac)
}

/// Encode a message into the frames of a multipart message, signing it when
/// a key is given.
pub fn encode(msg: &WireMessage, key: Option<&str>, scheme: &str) -> Result<Vec<Vec<u8>>, Error> {
    let hmac = match key {
        Some(key) => hmac_from_key(key, scheme)?,
        None => None,
    };
    msg.to_buffers(&hmac)
}

// Conversion: WireMessage (untyped) -> JupyterMessage (typed); used on
// messages we receive over the wire to parse into the correct type.
impl<T: ProtocolMessage + DeserializeOwned> TryFrom<&WireMessage> for JupyterMessage<T> {
    type Error = crate::error::Error;
    fn try_from(msg: &WireMessage) -> Result<JupyterMessage<T>, Error> {
        let content = match serde_json::from_value(msg.content.clone()) {
            Ok(val) => val,
            Err(err) => {
                return Err(Error::InvalidMessage(
                    T::message_type(),
                    msg.content.clone(),
                    err,
                ))
            },
        };
        Ok(JupyterMessage {
            zmq_identities: msg.zmq_identities.clone(),
            header: msg.header.clone(),
            parent_header: msg.parent_header.clone(),
            metadata: msg.metadata.clone(),
            content,
            buffers: msg.buffers.clone(),
        })
    }
}

// Conversion: JupyterMessage (typed) -> WireMessage (untyped); used prior to
// sending messages to get them ready for dispatch.
impl<T: ProtocolMessage> TryFrom<&JupyterMessage<T>> for WireMessage {
    type Error = crate::error::Error;

    fn try_from(msg: &JupyterMessage<T>) -> Result<Self, Error> {
        let content = match serde_json::to_value(&msg.content) {
            Ok(val) => val,
            Err(err) => return Err(Error::CannotSerialize(err)),
        };
        Ok(Self {
            zmq_identities: msg.zmq_identities.clone(),
            header: msg.header.clone(),
            parent_header: msg.parent_header.clone(),
            metadata: msg.metadata.clone(),
            content,
            buffers: msg.buffers.clone(),
            channel: Some(JupyterChannel::for_message_type(&msg.header.msg_type)),
        })
    }
}

fn empty_dict() -> Value {
    json!({})
}

fn is_empty_header(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn serialize_none_as_empty_dict<S, T>(option: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
    T: serde::Serialize,
{
    match option {
        Some(value) => value.serialize(serializer),
        None => serde_json::Map::new().serialize(serializer),
    }
}

fn deserialize_empty_dict_as_none<'de, D>(deserializer: D) -> Result<Option<JupyterHeader>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if is_empty_header(&value) {
        return Ok(None);
    }
    serde_json::from_value(value)
        .map(Some)
        .map_err(serde::de::Error::custom)
}
