/*
 * socket.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use futures::future;
use futures::StreamExt;
use log::error;
use log::trace;
use log::warn;

use crate::error::Error;
use crate::kernel_channel::ChannelEndpoint;
use crate::router::MessageStream;
use crate::session::Session;
use crate::socket::transport::FrameTransport;
use crate::wire::wire_message::WireMessage;

/// Represents a socket that sends and receives messages that are optionally
/// signed with a SHA-256 HMAC.
pub struct Socket {
    /// The Jupyter session information associated with the socket, including
    /// the session ID and HMAC signing key
    pub session: Session,

    /// The name of the socket; used only to give context to debugging/trace
    /// messages
    pub name: String,

    /// The connection over which signed messages are sent/received
    transport: Box<dyn FrameTransport>,
}

impl Socket {
    pub fn new<T: FrameTransport + 'static>(session: Session, name: String, transport: T) -> Self {
        Self {
            session,
            name,
            transport: Box::new(transport),
        }
    }

    /// Sign and send a message.
    pub fn send(&self, msg: &WireMessage) -> Result<(), Error> {
        match &msg.parent_header {
            Some(parent) => {
                trace!(
                    "Sending '{}' message (reply to '{}') via {} socket",
                    msg.describe(),
                    parent.msg_type,
                    self.name
                );
            },
            None => {
                trace!(
                    "Sending '{}' message via {} socket",
                    msg.describe(),
                    self.name
                );
            },
        }

        let frames = msg.to_buffers(&self.session.hmac)?;
        self.transport.send_multipart(frames)
    }

    /// Decoded inbound messages. Frames that can't be decoded are logged and
    /// dropped; a message that fails authentication is never delivered.
    /// Transport errors are passed through.
    pub fn messages(&self) -> MessageStream {
        let hmac = self.session.hmac.clone();
        let name = self.name.clone();
        self.transport
            .incoming()
            .filter_map(move |item| {
                let item = match item {
                    Ok(frames) => match WireMessage::from_buffers(frames, &hmac) {
                        Ok(msg) => {
                            trace!("Received '{}' message via {} socket", msg.describe(), name);
                            Some(Ok(msg))
                        },
                        Err(err) if err.is_signature_error() => {
                            error!("Rejecting unauthenticated message on {} socket: {}", name, err);
                            None
                        },
                        Err(err) => {
                            warn!("Dropping malformed message on {} socket: {}", name, err);
                            None
                        },
                    },
                    Err(err) => Some(Err(err)),
                };
                future::ready(item)
            })
            .boxed()
    }
}

impl ChannelEndpoint for Socket {
    fn messages(&self) -> MessageStream {
        Socket::messages(self)
    }

    fn send(&self, msg: WireMessage) -> Result<(), Error> {
        Socket::send(self, &msg)
    }
}
