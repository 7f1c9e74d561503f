/*
 * router.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

//! Operators that route the messages of a kernel channel to the request that
//! caused them, and reshape them into the values a frontend acts on.
//!
//! Every operator is a per-message filter or map: order is preserved, and
//! upstream errors and completion pass through untouched.

use futures::future;
use futures::stream;
use futures::stream::BoxStream;
use futures::Stream;
use futures::StreamExt;
use log::trace;
use serde_json::Map;
use serde_json::Value;

use crate::error::Error;
use crate::wire::wire_message::WireMessage;

/// A stream of inbound messages, as produced by a `KernelChannel`
pub type MessageStream = BoxStream<'static, Result<WireMessage, Error>>;

/// Message types that produce a cell output
pub const OUTPUT_TYPES: &[&str] = &["execute_result", "display_data", "stream", "error"];

pub trait MessageStreamExt: Stream<Item = Result<WireMessage, Error>> + Send + Sized + 'static {
    /// Only the replies to, and side effects of, `parent`. Messages without a
    /// parent ID are unsolicited and are dropped.
    fn child_of(self, parent: &WireMessage) -> MessageStream {
        let parent_id = parent.header.msg_id.clone();
        self.filter(move |item| {
            let keep = match item {
                Ok(msg) => match msg.parent_msg_id() {
                    Some(id) => id == parent_id,
                    None => {
                        trace!("Dropping unsolicited '{}' message", msg.describe());
                        false
                    },
                },
                Err(_) => true,
            };
            future::ready(keep)
        })
        .boxed()
    }

    /// Only the messages addressed to the given comm.
    fn with_comm_id(self, comm_id: &str) -> MessageStream {
        let comm_id = String::from(comm_id);
        self.filter(move |item| {
            let keep = match item {
                Ok(msg) => msg.content.get("comm_id").and_then(Value::as_str) == Some(comm_id.as_str()),
                Err(_) => true,
            };
            future::ready(keep)
        })
        .boxed()
    }

    /// Only the messages of the given types. A message without a type can't be
    /// classified at all, and becomes an error item.
    fn of_message_type(self, types: &[&str]) -> MessageStream {
        let types: Vec<String> = types.iter().map(|t| String::from(*t)).collect();
        self.filter_map(move |item| {
            let item = match item {
                Ok(msg) if msg.header.msg_type.is_empty() => {
                    Some(Err(Error::MissingMessageType(msg.header.msg_id)))
                },
                Ok(msg) => {
                    if types.contains(&msg.header.msg_type) {
                        Some(Ok(msg))
                    } else {
                        None
                    }
                },
                Err(err) => Some(Err(err)),
            };
            future::ready(item)
        })
        .boxed()
    }

    /// Cell outputs: the content of each output message, tagged with its
    /// `output_type`.
    fn outputs(self) -> BoxStream<'static, Result<Value, Error>> {
        self.of_message_type(OUTPUT_TYPES)
            .map(|item| item.map(|msg| output_of(&msg, &msg.header.msg_type)))
            .boxed()
    }

    /// Replacement outputs from `update_display_data`, tagged as display data.
    fn updated_outputs(self) -> BoxStream<'static, Result<Value, Error>> {
        self.of_message_type(&["update_display_data"])
            .map(|item| item.map(|msg| output_of(&msg, "display_data")))
            .boxed()
    }

    /// The individual payloads carried by `execute_reply` messages.
    fn payloads(self) -> BoxStream<'static, Result<Value, Error>> {
        self.of_message_type(&["execute_reply"])
            .flat_map(|item| {
                let items: Vec<Result<Value, Error>> = match item {
                    Ok(msg) => payloads_of(&msg).into_iter().map(Ok).collect(),
                    Err(err) => vec![Err(err)],
                };
                stream::iter(items)
            })
            .boxed()
    }

    /// Execution counts from `execute_input` and `execute_reply`.
    fn execution_counts(self) -> BoxStream<'static, Result<u32, Error>> {
        self.of_message_type(&["execute_input", "execute_reply"])
            .filter_map(|item| {
                future::ready(match item {
                    Ok(msg) => execution_count_of(&msg).map(Ok),
                    Err(err) => Some(Err(err)),
                })
            })
            .boxed()
    }

    /// Execution states from `status` broadcasts.
    fn kernel_statuses(self) -> BoxStream<'static, Result<String, Error>> {
        self.of_message_type(&["status"])
            .filter_map(|item| {
                future::ready(match item {
                    Ok(msg) => kernel_status_of(&msg).map(Ok),
                    Err(err) => Some(Err(err)),
                })
            })
            .boxed()
    }

    /// The content of `input_request` messages.
    fn input_requests(self) -> BoxStream<'static, Result<Value, Error>> {
        self.of_message_type(&["input_request"])
            .map(|item| item.map(|msg| msg.content))
            .boxed()
    }
}

impl<S> MessageStreamExt for S where S: Stream<Item = Result<WireMessage, Error>> + Send + 'static {}

/// Reshape a message into an output: its content, plus the output type.
pub fn output_of(msg: &WireMessage, output_type: &str) -> Value {
    let mut output = match &msg.content {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    output.insert(
        String::from("output_type"),
        Value::String(String::from(output_type)),
    );
    Value::Object(output)
}

/// The payloads of an `execute_reply`; empty when there are none.
pub fn payloads_of(msg: &WireMessage) -> Vec<Value> {
    match msg.content.get("payload") {
        Some(Value::Array(payloads)) => payloads.clone(),
        _ => Vec::new(),
    }
}

pub fn execution_count_of(msg: &WireMessage) -> Option<u32> {
    msg.content
        .get("execution_count")
        .and_then(Value::as_u64)
        .and_then(|count| u32::try_from(count).ok())
}

pub fn kernel_status_of(msg: &WireMessage) -> Option<String> {
    msg.content
        .get("execution_state")
        .and_then(Value::as_str)
        .map(String::from)
}
