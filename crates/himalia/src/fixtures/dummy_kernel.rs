/*
 * dummy_kernel.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::Stream;
use futures::StreamExt;
use uuid::Uuid;

use crate::config::KernelClientConfig;
use crate::kernel_channel::ChannelEndpoint;
use crate::kernel_channel::KernelChannel;
use crate::router::MessageStream;
use crate::session::Session;
use crate::session::DEFAULT_SIGNATURE_SCHEME;
use crate::socket::socket::Socket;
use crate::socket::transport::InMemoryTransport;
use crate::wire::jupyter_channel::JupyterChannel;
use crate::wire::jupyter_message::JupyterMessage;
use crate::wire::jupyter_message::ProtocolMessage;
use crate::wire::status::ExecutionState;
use crate::wire::status::KernelStatus;
use crate::wire::wire_message::WireMessage;

/// How long to wait for a message that is expected to arrive
const RECV_TIMEOUT: Duration = Duration::from_secs(1);

/// The kernel side of an in-memory connection, scripted by tests. The
/// frontend side is `channel`.
pub struct DummyKernel {
    /// The frontend's multiplexed view of this kernel
    pub channel: Arc<KernelChannel>,

    session: Session,
    shell_socket: Socket,
    iopub_socket: Socket,
    stdin_socket: Socket,
    control_socket: Socket,

    shell_inbox: MessageStream,
    stdin_inbox: MessageStream,
    control_inbox: MessageStream,
}

impl DummyKernel {
    /// Connect a new kernel. Must be called from within a tokio runtime.
    pub fn new() -> Self {
        // Both sides sign with a fresh key
        let key = Uuid::new_v4().simple().to_string();
        let session = Session::create(&key, DEFAULT_SIGNATURE_SCHEME).unwrap();
        let frontend_session = session
            .clone()
            .with_identity("frontend", Uuid::new_v4().to_string());

        let mut endpoints: HashMap<JupyterChannel, Arc<dyn ChannelEndpoint>> = HashMap::new();
        let mut socket = |channel: JupyterChannel| {
            let name = channel.to_string();
            let (frontend, kernel) = InMemoryTransport::pair(&name, 64);
            endpoints.insert(
                channel,
                Arc::new(Socket::new(frontend_session.clone(), name.clone(), frontend)),
            );
            Socket::new(session.clone(), name, kernel)
        };

        let shell_socket = socket(JupyterChannel::Shell);
        let iopub_socket = socket(JupyterChannel::IOPub);
        let stdin_socket = socket(JupyterChannel::Stdin);
        let control_socket = socket(JupyterChannel::Control);

        // Listen before the frontend can send anything
        let shell_inbox = shell_socket.messages();
        let stdin_inbox = stdin_socket.messages();
        let control_inbox = control_socket.messages();

        let channel = KernelChannel::new(endpoints, &frontend_session, &KernelClientConfig::default());

        Self {
            channel: Arc::new(channel),
            session,
            shell_socket,
            iopub_socket,
            stdin_socket,
            control_socket,
            shell_inbox,
            stdin_inbox,
            control_inbox,
        }
    }

    async fn recv(inbox: &mut MessageStream, name: &str) -> WireMessage {
        // Wait with a timeout so that a test that expects a message the
        // frontend never sends fails instead of hanging
        match tokio::time::timeout(RECV_TIMEOUT, inbox.next()).await {
            Ok(Some(Ok(msg))) => msg,
            Ok(Some(Err(err))) => panic!("Error while expecting message on {name} socket: {err}"),
            Ok(None) => panic!("The {name} socket closed while expecting a message"),
            Err(_) => panic!("Timeout while expecting message on {name} socket"),
        }
    }

    /// Receives a message sent by the frontend on the Shell socket
    pub async fn recv_shell(&mut self) -> WireMessage {
        Self::recv(&mut self.shell_inbox, "Shell").await
    }

    /// Receives a message sent by the frontend on the Stdin socket
    pub async fn recv_stdin(&mut self) -> WireMessage {
        Self::recv(&mut self.stdin_inbox, "Stdin").await
    }

    /// Receives a message sent by the frontend on the Control socket
    pub async fn recv_control(&mut self) -> WireMessage {
        Self::recv(&mut self.control_inbox, "Control").await
    }

    /// Receives from Shell and asserts the message type
    pub async fn recv_shell_request(&mut self, msg_type: &str) -> WireMessage {
        let msg = self.recv_shell().await;
        assert_eq!(msg.header.msg_type, msg_type);
        msg
    }

    fn reply<T: ProtocolMessage>(&self, parent: &WireMessage, content: T) -> WireMessage {
        JupyterMessage::create(content, Some(parent.header.clone()), &self.session)
            .to_wire()
            .unwrap()
    }

    /// Sends a reply to `parent` on the Shell socket
    pub fn send_shell<T: ProtocolMessage>(&self, parent: &WireMessage, content: T) {
        self.shell_socket.send(&self.reply(parent, content)).unwrap();
    }

    /// Publishes a side effect of `parent` on the IOPub socket
    pub fn send_iopub<T: ProtocolMessage>(&self, parent: &WireMessage, content: T) {
        self.iopub_socket.send(&self.reply(parent, content)).unwrap();
    }

    /// Sends a request related to `parent` on the Stdin socket
    pub fn send_stdin<T: ProtocolMessage>(&self, parent: &WireMessage, content: T) {
        self.stdin_socket.send(&self.reply(parent, content)).unwrap();
    }

    /// Sends a reply to `parent` on the Control socket
    pub fn send_control<T: ProtocolMessage>(&self, parent: &WireMessage, content: T) {
        self.control_socket.send(&self.reply(parent, content)).unwrap();
    }

    /// Sends an already built message on the IOPub socket, as is
    pub fn send_iopub_raw(&self, msg: &WireMessage) {
        self.iopub_socket.send(msg).unwrap();
    }

    pub fn send_iopub_busy(&self, parent: &WireMessage) {
        self.send_iopub(parent, KernelStatus {
            execution_state: ExecutionState::Busy,
        });
    }

    pub fn send_iopub_idle(&self, parent: &WireMessage) {
        self.send_iopub(parent, KernelStatus {
            execution_state: ExecutionState::Idle,
        });
    }

    /// Asserts that the frontend has not sent anything that hasn't been
    /// received yet
    pub fn assert_no_incoming(&mut self) {
        for (name, inbox) in [
            ("Shell", &mut self.shell_inbox),
            ("Stdin", &mut self.stdin_inbox),
            ("Control", &mut self.control_inbox),
        ] {
            if let Some(Some(msg)) = inbox.next().now_or_never() {
                panic!("Unexpected message on {name} socket: {msg:?}");
            }
        }
    }
}

/// Receives the next item of a stream that is expected to produce one soon.
pub async fn recv_next<S: Stream + Unpin>(stream: &mut S) -> S::Item {
    match tokio::time::timeout(RECV_TIMEOUT, stream.next()).await {
        Ok(Some(item)) => item,
        Ok(None) => panic!("Stream ended while expecting an item"),
        Err(_) => panic!("Timeout while expecting an item"),
    }
}

/// Collects the rest of a stream that is expected to end soon.
pub async fn recv_all<S: Stream + Unpin>(stream: &mut S) -> Vec<S::Item> {
    let mut items = Vec::new();
    loop {
        match tokio::time::timeout(RECV_TIMEOUT, stream.next()).await {
            Ok(Some(item)) => items.push(item),
            Ok(None) => return items,
            Err(_) => panic!("Timeout while expecting the end of a stream"),
        }
    }
}
