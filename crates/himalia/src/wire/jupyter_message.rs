/*
 * jupyter_message.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use serde_json::Value;

use crate::error::Error;
use crate::session::Session;
use crate::wire::clear_output::ClearOutput;
use crate::wire::comm_close::CommClose;
use crate::wire::comm_info_reply::CommInfoReply;
use crate::wire::comm_info_request::CommInfoRequest;
use crate::wire::comm_msg::CommWireMsg;
use crate::wire::comm_open::CommOpen;
use crate::wire::complete_reply::CompleteReply;
use crate::wire::complete_request::CompleteRequest;
use crate::wire::display_data::DisplayData;
use crate::wire::execute_error::ExecuteError;
use crate::wire::execute_input::ExecuteInput;
use crate::wire::execute_reply::ExecuteReply;
use crate::wire::execute_request::ExecuteRequest;
use crate::wire::execute_result::ExecuteResult;
use crate::wire::header::JupyterHeader;
use crate::wire::history_reply::HistoryReply;
use crate::wire::history_request::HistoryRequest;
use crate::wire::input_reply::InputReply;
use crate::wire::input_request::InputRequest;
use crate::wire::inspect_reply::InspectReply;
use crate::wire::inspect_request::InspectRequest;
use crate::wire::interrupt_reply::InterruptReply;
use crate::wire::interrupt_request::InterruptRequest;
use crate::wire::is_complete_reply::IsCompleteReply;
use crate::wire::is_complete_request::IsCompleteRequest;
use crate::wire::kernel_info_reply::KernelInfoReply;
use crate::wire::kernel_info_request::KernelInfoRequest;
use crate::wire::shutdown_reply::ShutdownReply;
use crate::wire::shutdown_request::ShutdownRequest;
use crate::wire::status::KernelStatus;
use crate::wire::stream::StreamOutput;
use crate::wire::update_display_data::UpdateDisplayData;
use crate::wire::wire_message::WireMessage;

/// Represents a Jupyter message
#[derive(Debug, Clone, PartialEq)]
pub struct JupyterMessage<T> {
    /// The routing identities (for ROUTER sockets)
    pub zmq_identities: Vec<Vec<u8>>,

    /// The header for this message
    pub header: JupyterHeader,

    /// The header of the message from which this message originated. Optional;
    /// not all messages have a parent.
    pub parent_header: Option<JupyterHeader>,

    /// Additional metadata
    pub metadata: Value,

    /// The body (payload) of the message
    pub content: T,

    /// Binary buffers sent alongside the content
    pub buffers: Vec<Vec<u8>>,
}

/// Trait used to extract the wire message type from a Jupyter message
pub trait MessageType {
    fn message_type() -> String;
}

/// Convenience trait for grouping traits that must be present on all Jupyter
/// protocol messages
pub trait ProtocolMessage: MessageType + Serialize + std::fmt::Debug + Clone {}
impl<T> ProtocolMessage for T where T: MessageType + Serialize + std::fmt::Debug + Clone {}

/// Represents status returned from kernel inside messages.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Ok,
    Error,
    Aborted,
}

/// Declares `Message`, with one variant per known message type, along with
/// the conversions between it and `WireMessage`.
macro_rules! protocol_messages {
    ($($variant:ident($content:ty)),* $(,)?) => {
        /// A message of a type we know, with its content parsed into the
        /// matching structure. Messages of other types are kept as is.
        #[derive(Debug, Clone)]
        pub enum Message {
            $($variant(JupyterMessage<$content>),)*
            Unknown(WireMessage),
        }

        impl TryFrom<&Message> for WireMessage {
            type Error = Error;

            fn try_from(msg: &Message) -> Result<Self, Error> {
                match msg {
                    $(Message::$variant(msg) => WireMessage::try_from(msg),)*
                    Message::Unknown(msg) => Ok(msg.clone()),
                }
            }
        }

        impl TryFrom<&WireMessage> for Message {
            type Error = Error;

            /// Parse the content according to the message type. A message
            /// without a type is an error; one whose content doesn't match
            /// its type's structure is too.
            fn try_from(msg: &WireMessage) -> Result<Self, Error> {
                let kind = msg.header.msg_type.as_str();
                if kind.is_empty() {
                    return Err(Error::MissingMessageType(msg.header.msg_id.clone()));
                }
                $(
                    if kind == <$content>::message_type() {
                        return Ok(Message::$variant(JupyterMessage::try_from(msg)?));
                    }
                )*
                Ok(Message::Unknown(msg.clone()))
            }
        }
    };
}

protocol_messages! {
    // Shell
    ExecuteRequest(ExecuteRequest),
    ExecuteReply(ExecuteReply),
    InspectRequest(InspectRequest),
    InspectReply(InspectReply),
    KernelInfoRequest(KernelInfoRequest),
    KernelInfoReply(KernelInfoReply),
    CompleteRequest(CompleteRequest),
    CompleteReply(CompleteReply),
    HistoryRequest(HistoryRequest),
    HistoryReply(HistoryReply),
    IsCompleteRequest(IsCompleteRequest),
    IsCompleteReply(IsCompleteReply),
    CommInfoRequest(CommInfoRequest),
    CommInfoReply(CommInfoReply),

    // Control; shutdown is also accepted on the shell
    ShutdownRequest(ShutdownRequest),
    ShutdownReply(ShutdownReply),
    InterruptRequest(InterruptRequest),
    InterruptReply(InterruptReply),

    // IOPub
    DisplayData(DisplayData),
    Stream(StreamOutput),
    UpdateDisplayData(UpdateDisplayData),
    ExecuteInput(ExecuteInput),
    ExecuteResult(ExecuteResult),
    ExecuteError(ExecuteError),
    Status(KernelStatus),
    ClearOutput(ClearOutput),

    // Stdin
    InputRequest(InputRequest),
    InputReply(InputReply),

    // Comms
    CommOpen(CommOpen),
    CommMsg(CommWireMsg),
    CommClose(CommClose),
}

impl<T> JupyterMessage<T>
where
    T: ProtocolMessage,
{
    /// Create a new Jupyter message, optionally as a child (reply) to an
    /// existing message.
    pub fn create(
        content: T,
        parent: Option<JupyterHeader>,
        session: &Session,
    ) -> JupyterMessage<T> {
        JupyterMessage::<T> {
            zmq_identities: Vec::new(),
            header: JupyterHeader::create(
                T::message_type(),
                session.session_id.clone(),
                session.username.clone(),
            ),
            parent_header: parent,
            metadata: json!({}),
            content,
            buffers: Vec::new(),
        }
    }

    /// Create a new Jupyter message with no session identity; the channel
    /// multiplexer stamps its own identity when the message is sent.
    pub fn new(content: T) -> JupyterMessage<T> {
        JupyterMessage::<T> {
            zmq_identities: Vec::new(),
            header: JupyterHeader::create(T::message_type(), String::new(), String::new()),
            parent_header: None,
            metadata: json!({}),
            content,
            buffers: Vec::new(),
        }
    }

    /// Create a reply to this message with the given content.
    pub fn create_reply<R: ProtocolMessage>(
        &self,
        content: R,
        session: &Session,
    ) -> JupyterMessage<R> {
        JupyterMessage::<R> {
            zmq_identities: self.zmq_identities.clone(),
            header: JupyterHeader::create(
                R::message_type(),
                session.session_id.clone(),
                session.username.clone(),
            ),
            parent_header: Some(self.header.clone()),
            metadata: json!({}),
            content,
            buffers: Vec::new(),
        }
    }

    /// Convert into the untyped form that is sent over a channel.
    pub fn to_wire(&self) -> Result<WireMessage, Error> {
        WireMessage::try_from(self)
    }
}
