/*
 * execution.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use std::sync::Arc;

use futures::stream;
use futures::stream::BoxStream;
use futures::StreamExt;
use log::debug;
use log::warn;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::error::Error;
use crate::error::ErrorCode;
use crate::error::Failure;
use crate::kernel_channel::KernelChannel;
use crate::router::execution_count_of;
use crate::router::kernel_status_of;
use crate::router::output_of;
use crate::router::payloads_of;
use crate::router::MessageStreamExt;
use crate::router::OUTPUT_TYPES;
use crate::wire::jupyter_channel::JupyterChannel;
use crate::wire::wire_message::WireMessage;

/// A request to run one cell
#[derive(Debug, Clone)]
pub struct ExecuteCell {
    pub cell_id: String,
    pub content_id: String,

    /// The `execute_request` to send
    pub message: WireMessage,
}

/// Something that happened to a cell because of its execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionEvent {
    pub cell_id: String,
    pub content_id: String,
    pub kind: ExecutionEventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionEventKind {
    ClearOutputs,
    UpdateCellStatus { status: String },
    AcceptPayload { payload: Value },

    /// Record `value` at `path` in the cell
    SetInCell { path: Vec<String>, value: Value },

    UpdateExecutionCount { value: u32 },
    AppendOutput { output: Value },

    /// Replace the output with the same display ID
    UpdateDisplay { output: Value },

    PromptInputRequest { prompt: String, password: bool },
    ExecuteFailed { failure: Failure },
}

/// Set up an execution. Nothing is sent until the result is activated.
pub fn prepare_execution(channel: Arc<KernelChannel>, request: ExecuteCell) -> PendingExecution {
    PendingExecution { channel, request }
}

/// An execution that is ready to go
pub struct PendingExecution {
    channel: Arc<KernelChannel>,
    request: ExecuteCell,
}

impl PendingExecution {
    /// Subscribe to the kernel's replies, then send the `execute_request` on
    /// the shell.
    ///
    /// The stream starts with `ClearOutputs` and a "queued" status, followed
    /// by the events derived from the kernel's replies in the order they
    /// arrive. It ends once both the `execute_reply` and the kernel's return
    /// to idle have been seen. Dropping it stops all processing of the
    /// request's replies.
    pub fn activate(self) -> BoxStream<'static, ExecutionEvent> {
        let cell_id = self.request.cell_id;
        let content_id = self.request.content_id;
        let mut message = self.request.message;
        message.channel = Some(JupyterChannel::Shell);

        let event = move |kind: ExecutionEventKind| ExecutionEvent {
            cell_id: cell_id.clone(),
            content_id: content_id.clone(),
            kind,
        };

        let mut prelude = vec![
            event(ExecutionEventKind::ClearOutputs),
            event(ExecutionEventKind::UpdateCellStatus {
                status: String::from("queued"),
            }),
        ];

        let replies = self.channel.subscribe().child_of(&message);

        debug!(
            "Executing cell '{}' with request '{}'",
            prelude[0].cell_id, message.header.msg_id
        );
        if let Err(err) = self.channel.send(message) {
            warn!("Could not send execute request: {err}");
            prelude.push(event(ExecutionEventKind::ExecuteFailed {
                failure: Failure::from_error(ErrorCode::ExecTransport, &err),
            }));
            return stream::iter(prelude).boxed();
        }

        let kernel_events = stream::unfold(
            Some((replies, ExecutionProgress::default())),
            |state| async move {
                let (mut replies, mut progress) = state?;
                let item = replies.next().await;
                let (events, next) = match item {
                    None => return None,
                    Some(Ok(msg)) => match progress.events_for(&msg) {
                        Ok(events) if progress.is_complete() => (events, None),
                        Ok(events) => (events, Some((replies, progress))),
                        Err(err) => (vec![failed(ErrorCode::ExecStreamError, &err)], None),
                    },
                    Some(Err(err)) => {
                        // Lost messages may include the reply or the idle
                        // status, so the request can't complete
                        let code = match err {
                            Error::Disconnected(..) | Error::Lagged(_) => ErrorCode::ExecTransport,
                            _ => ErrorCode::ExecStreamError,
                        };
                        (vec![failed(code, &err)], None)
                    },
                };
                Some((stream::iter(events), next))
            },
        )
        .flatten()
        .map(event);

        stream::iter(prelude).chain(kernel_events).boxed()
    }
}

fn failed(code: ErrorCode, err: &Error) -> ExecutionEventKind {
    warn!("Execution failed: {err}");
    ExecutionEventKind::ExecuteFailed {
        failure: Failure::from_error(code, err),
    }
}

/// What has been seen so far of the replies to one request
#[derive(Default)]
struct ExecutionProgress {
    replied: bool,
    idle: bool,
}

impl ExecutionProgress {
    fn is_complete(&self) -> bool {
        self.replied && self.idle
    }

    /// The events for one reply to the request.
    fn events_for(&mut self, msg: &WireMessage) -> Result<Vec<ExecutionEventKind>, Error> {
        let msg_type = msg.header.msg_type.as_str();
        if msg_type.is_empty() {
            return Err(Error::MissingMessageType(msg.header.msg_id.clone()));
        }

        let mut events = Vec::new();

        if msg_type == "execute_reply" {
            for payload in payloads_of(msg) {
                events.push(ExecutionEventKind::AcceptPayload { payload });
            }
        }

        // Execution timestamps
        let stamp = match msg_type {
            "execute_input" => Some(String::from("iopub.execute_input")),
            "execute_reply" => Some(String::from("shell.execute_reply")),
            "status" => kernel_status_of(msg).map(|state| format!("iopub.status.{state}")),
            _ => None,
        };
        if let Some(key) = stamp {
            events.push(ExecutionEventKind::SetInCell {
                path: vec![
                    String::from("metadata"),
                    String::from("execution"),
                    key,
                ],
                value: Value::String(msg.header.date.clone()),
            });
        }

        if msg_type == "status" {
            if let Some(state) = kernel_status_of(msg) {
                if state == "idle" {
                    self.idle = true;
                }
                events.push(ExecutionEventKind::UpdateCellStatus { status: state });
            }
        }

        if msg_type == "execute_input" || msg_type == "execute_reply" {
            if let Some(value) = execution_count_of(msg) {
                events.push(ExecutionEventKind::UpdateExecutionCount { value });
            }
        }

        if OUTPUT_TYPES.contains(&msg_type) {
            events.push(ExecutionEventKind::AppendOutput {
                output: output_of(msg, msg_type),
            });
        }

        match msg_type {
            "update_display_data" => events.push(ExecutionEventKind::UpdateDisplay {
                output: output_of(msg, "display_data"),
            }),
            "clear_output" => events.push(ExecutionEventKind::ClearOutputs),
            "input_request" => events.push(ExecutionEventKind::PromptInputRequest {
                prompt: msg
                    .content
                    .get("prompt")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                password: msg
                    .content
                    .get("password")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
            }),
            "execute_reply" => self.replied = true,
            _ => {},
        }

        Ok(events)
    }
}
