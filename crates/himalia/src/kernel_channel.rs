/*
 * kernel_channel.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use log::debug;
use log::trace;
use log::warn;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::KernelClientConfig;
use crate::error::Error;
use crate::router::MessageStream;
use crate::router::MessageStreamExt;
use crate::session::Session;
use crate::socket::transport::broadcast_stream;
use crate::wire::input_reply::InputReply;
use crate::wire::jupyter_channel::JupyterChannel;
use crate::wire::jupyter_message::JupyterMessage;
use crate::wire::wire_message::WireMessage;

/// One of the kernel's channels, as seen by the multiplexer: a hot stream of
/// inbound messages and a way to send.
pub trait ChannelEndpoint: Send + Sync {
    /// Inbound messages that arrive after the call. The stream ends, or
    /// yields an error, when the connection is lost.
    fn messages(&self) -> MessageStream;

    fn send(&self, msg: WireMessage) -> Result<(), Error>;
}

/// What travels on the multiplexed inbound stream
#[derive(Debug, Clone)]
enum ChannelItem {
    Message(WireMessage),

    /// The endpoint dropped `count` inbound messages before they could be
    /// forwarded
    Lagged {
        channel: JupyterChannel,
        count: u64,
    },
    Disconnected {
        channel: JupyterChannel,
        reason: String,
    },
}

/// All the channels of one kernel connection, merged into a single inbound
/// stream and a single send entry point.
///
/// Inbound messages are stamped with the channel they arrived on. The inbound
/// stream is a broadcast: every subscriber gets the messages that arrive
/// after it subscribed, and nothing is replayed.
pub struct KernelChannel {
    endpoints: HashMap<JupyterChannel, Arc<dyn ChannelEndpoint>>,
    inbound: broadcast::Sender<ChannelItem>,
    username: String,
    session_id: String,
    tasks: Vec<JoinHandle<()>>,
}

impl KernelChannel {
    /// Start forwarding from every endpoint. Must be called from within a
    /// tokio runtime. The session provides the identity stamped on outgoing
    /// messages that don't carry one. A zero inbound capacity is treated as 1.
    pub fn new(
        endpoints: HashMap<JupyterChannel, Arc<dyn ChannelEndpoint>>,
        session: &Session,
        config: &KernelClientConfig,
    ) -> Self {
        let (inbound, _) = broadcast::channel(config.inbound_capacity.max(1));

        let mut tasks = Vec::new();
        for (channel, endpoint) in endpoints.iter() {
            // Subscribe before spawning so nothing that arrives from here on
            // is missed
            let messages = endpoint.messages();
            tasks.push(tokio::spawn(forward(*channel, messages, inbound.clone())));
        }

        Self {
            endpoints,
            inbound,
            username: session.username.clone(),
            session_id: session.session_id.clone(),
            tasks,
        }
    }

    /// An independent stream of every inbound message from now on. A
    /// disconnected channel shows up as an `Error::Disconnected` item. Lost
    /// messages show up as an `Error::Lagged` item, whether the subscriber
    /// fell too far behind or an endpoint dropped them.
    pub fn subscribe(&self) -> MessageStream {
        broadcast_stream(self.inbound.subscribe())
            .map(|item| match item {
                Ok(ChannelItem::Message(msg)) => Ok(msg),
                Ok(ChannelItem::Lagged { channel, count }) => {
                    trace!("{count} messages were lost on the {channel} channel");
                    Err(Error::Lagged(count))
                },
                Ok(ChannelItem::Disconnected { channel, reason }) => {
                    Err(Error::Disconnected(channel, reason))
                },
                Err(err) => Err(err),
            })
            .boxed()
    }

    /// Send a message to the kernel, on the channel it names (the shell if it
    /// names none). The session ID and username are filled in from this
    /// channel's session unless the message already has them.
    pub fn send(&self, mut msg: WireMessage) -> Result<(), Error> {
        let channel = msg.channel.unwrap_or(JupyterChannel::Shell);

        if msg.header.session.is_empty() {
            msg.header.session = self.session_id.clone();
        }
        if msg.header.username.is_empty() {
            msg.header.username = self.username.clone();
        }

        let endpoint = match self.endpoints.get(&channel) {
            Some(endpoint) => endpoint,
            None => return Err(Error::NoEndpoint(channel)),
        };

        msg.channel = Some(channel);
        endpoint.send(msg)
    }

    /// Send a request and wait for the first reply of the given type to it.
    pub async fn request(
        &self,
        msg: WireMessage,
        reply_type: &str,
        timeout: Duration,
    ) -> Result<WireMessage, Error> {
        let mut replies = self.subscribe().child_of(&msg).of_message_type(&[reply_type]);
        self.send(msg)?;

        match tokio::time::timeout(timeout, replies.next()).await {
            Ok(Some(reply)) => reply,
            Ok(None) => Err(Error::ChannelClosed(format!("'{reply_type}'"))),
            Err(_) => Err(Error::Timeout(format!("'{reply_type}'"), timeout)),
        }
    }

    /// Answer an `input_request` from the kernel.
    pub fn send_input_reply(&self, value: &str, request: &WireMessage) -> Result<(), Error> {
        let mut reply = JupyterMessage::new(InputReply {
            value: String::from(value),
        });
        reply.parent_header = Some(request.header.clone());
        self.send(reply.to_wire()?)
    }

    /// The channels this connection can send on.
    pub fn channels(&self) -> Vec<JupyterChannel> {
        self.endpoints.keys().copied().collect()
    }
}

async fn forward(
    channel: JupyterChannel,
    mut messages: MessageStream,
    inbound: broadcast::Sender<ChannelItem>,
) {
    let reason = loop {
        match messages.next().await {
            Some(Ok(mut msg)) => {
                msg.channel = Some(channel);
                if inbound.send(ChannelItem::Message(msg)).is_err() {
                    trace!("No subscribers for message on {channel} channel");
                }
            },
            Some(Err(Error::Lagged(count))) => {
                warn!("The {channel} channel dropped {count} inbound messages");
                if inbound.send(ChannelItem::Lagged { channel, count }).is_err() {
                    trace!("No subscribers to notify about lost {channel} messages");
                }
            },
            Some(Err(err)) => break err.to_string(),
            None => break String::from("connection closed"),
        }
    };

    debug!("The {channel} channel disconnected: {reason}");
    if inbound
        .send(ChannelItem::Disconnected { channel, reason })
        .is_err()
    {
        trace!("No subscribers to notify about {channel} channel");
    }
}

impl Drop for KernelChannel {
    fn drop(&mut self) {
        for task in self.tasks.iter() {
            task.abort();
        }
    }
}

impl fmt::Debug for KernelChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelChannel")
            .field("channels", &self.channels())
            .field("username", &self.username)
            .field("session_id", &self.session_id)
            .finish()
    }
}
