/*
 * transport.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use futures::stream;
use futures::stream::BoxStream;
use futures::StreamExt;
use log::trace;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::error::Error;

/// A multipart message, as a list of frames
pub type Frames = Vec<Vec<u8>>;

/// A connection that moves multipart messages. Implementations wrap a concrete
/// transport (a ZeroMQ socket, a WebSocket, ...); the frames they carry are
/// already encoded and signed.
pub trait FrameTransport: Send + Sync {
    /// Inbound messages. The stream is hot: it yields the messages that arrive
    /// after the call, and ends when the connection closes.
    fn incoming(&self) -> BoxStream<'static, Result<Frames, Error>>;

    /// Send a multipart message.
    fn send_multipart(&self, frames: Frames) -> Result<(), Error>;
}

/// One end of an in-process connection. Used for tests, and for embedding a
/// kernel in the same process as its frontend.
pub struct InMemoryTransport {
    name: String,
    outbound: broadcast::Sender<Frames>,
    inbound: broadcast::Sender<Frames>,
}

impl InMemoryTransport {
    /// Create both ends of a connection. Each end buffers up to `capacity`
    /// messages (at least one) for a slow reader.
    pub fn pair(name: &str, capacity: usize) -> (InMemoryTransport, InMemoryTransport) {
        let capacity = capacity.max(1);
        let (a_to_b, _) = broadcast::channel(capacity);
        let (b_to_a, _) = broadcast::channel(capacity);
        let a = InMemoryTransport {
            name: String::from(name),
            outbound: a_to_b.clone(),
            inbound: b_to_a.clone(),
        };
        let b = InMemoryTransport {
            name: String::from(name),
            outbound: b_to_a,
            inbound: a_to_b,
        };
        (a, b)
    }
}

impl FrameTransport for InMemoryTransport {
    fn incoming(&self) -> BoxStream<'static, Result<Frames, Error>> {
        broadcast_stream(self.inbound.subscribe())
    }

    fn send_multipart(&self, frames: Frames) -> Result<(), Error> {
        // Like a PUB socket, a message sent while nobody is reading the other
        // end is dropped
        if self.outbound.send(frames).is_err() {
            trace!("Dropping message on {} transport: no reader", self.name);
        }
        Ok(())
    }
}

/// Adapt a broadcast receiver into a stream. A receiver that falls behind gets
/// an `Error::Lagged` item and then resumes with the oldest retained value;
/// the stream ends when every sender is gone.
pub(crate) fn broadcast_stream<T>(rx: broadcast::Receiver<T>) -> BoxStream<'static, Result<T, Error>>
where
    T: Clone + Send + 'static,
{
    stream::unfold(rx, |mut rx| async move {
        match rx.recv().await {
            Ok(item) => Some((Ok(item), rx)),
            Err(RecvError::Lagged(count)) => Some((Err(Error::Lagged(count)), rx)),
            Err(RecvError::Closed) => None,
        }
    })
    .boxed()
}
