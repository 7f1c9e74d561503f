/*
 * dispatcher.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::channel::mpsc;
use futures::future;
use futures::stream;
use futures::stream::AbortHandle;
use futures::stream::BoxStream;
use futures::stream::SelectAll;
use futures::Stream;
use futures::StreamExt;
use log::debug;
use log::error;
use log::info;
use log::trace;

use crate::document::CellType;
use crate::document::ContentType;
use crate::document::DocumentAccess;
use crate::error::ErrorCode;
use crate::error::Failure;
use crate::event::KernelAction;
use crate::execution::prepare_execution;
use crate::execution::ExecuteCell;
use crate::execution::ExecutionEvent;
use crate::execution::ExecutionEventKind;
use crate::kernel::KernelRegistry;
use crate::kernel_channel::KernelChannel;
use crate::wire::execute_request::ExecuteRequest;
use crate::wire::jupyter_message::JupyterMessage;

/// Turns frontend actions into cell executions, and merges the events of all
/// running executions into one stream.
///
/// A new execution of a cell supersedes the one already running for that
/// cell. Executions of other cells are unaffected. Canceling or deleting a
/// cell stops its execution, and any kernel lifecycle action (launch,
/// interrupt, restart, kill) stops every execution for its content. A stopped
/// execution emits nothing further.
///
/// Failures are reported per request as `ExecuteFailed` events; one failed
/// request never stops the dispatcher.
pub struct ExecutionDispatcher {
    registry: Arc<dyn KernelRegistry>,
    documents: Arc<dyn DocumentAccess>,
}

/// A running execution
struct Running {
    content_id: String,
    handle: AbortHandle,
}

/// What the merged executions yield
enum Item {
    Event(ExecutionEvent),

    /// The execution of this cell ran to its end
    Finished(String),
}

/// The executions in flight, at most one per cell, merged into one stream.
///
/// An execution that is stopped yields nothing further. One that runs to its
/// end is forgotten once its last event has been taken.
#[derive(Default)]
struct Executions {
    streams: SelectAll<BoxStream<'static, Item>>,
    running: HashMap<String, Running>,
}

impl Executions {
    /// Track a new execution. Any previous execution of the cell must have
    /// been stopped already.
    fn insert(
        &mut self,
        cell_id: String,
        content_id: String,
        events: BoxStream<'static, ExecutionEvent>,
    ) {
        let finished = stream::once(future::ready(Item::Finished(cell_id.clone())));
        let (items, handle) = stream::abortable(events.map(Item::Event).chain(finished));
        self.running.insert(cell_id, Running { content_id, handle });
        self.streams.push(items.boxed());
    }

    /// Events that don't belong to a running execution, such as a rejected
    /// request's failure
    fn push_events(&mut self, events: BoxStream<'static, ExecutionEvent>) {
        self.streams.push(events.map(Item::Event).boxed());
    }

    fn stop_cell(&mut self, cell_id: &str) -> bool {
        match self.running.remove(cell_id) {
            Some(execution) => {
                execution.handle.abort();
                true
            },
            None => false,
        }
    }

    fn stop_content(&mut self, content_id: &str) {
        self.running.retain(|cell_id, execution| {
            if execution.content_id != content_id {
                return true;
            }
            debug!("Canceling execution of cell '{cell_id}'");
            execution.handle.abort();
            false
        });
    }

    fn stop_all(&mut self) {
        for (_, execution) in self.running.drain() {
            execution.handle.abort();
        }
    }

    fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    #[cfg(test)]
    fn is_running(&self, cell_id: &str) -> bool {
        self.running.contains_key(cell_id)
    }

    /// The next event of any execution. `None` once every stream has ended.
    async fn next(&mut self) -> Option<ExecutionEvent> {
        loop {
            match self.streams.next().await? {
                Item::Event(event) => return Some(event),
                Item::Finished(cell_id) => {
                    trace!("Execution of cell '{cell_id}' finished");
                    self.running.remove(&cell_id);
                },
            }
        }
    }
}

impl ExecutionDispatcher {
    pub fn new(registry: Arc<dyn KernelRegistry>, documents: Arc<dyn DocumentAccess>) -> Self {
        Self {
            registry,
            documents,
        }
    }

    /// Process `actions` until the stream ends. The returned stream ends once
    /// `actions` has ended and every execution has finished. Must be called
    /// from within a tokio runtime.
    pub fn run<S>(self, actions: S) -> BoxStream<'static, ExecutionEvent>
    where
        S: Stream<Item = KernelAction> + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded();
        tokio::spawn(self.dispatch(actions.boxed(), tx));
        rx.boxed()
    }

    async fn dispatch(
        self,
        mut actions: BoxStream<'static, KernelAction>,
        tx: mpsc::UnboundedSender<ExecutionEvent>,
    ) {
        let mut executions = Executions::default();
        let mut actions_done = false;

        // Aborting an execution happens on this task, between polls of
        // `executions`, so a stopped execution can't emit anything after the
        // action that stopped it.
        loop {
            let event = tokio::select! {
                action = actions.next(), if !actions_done => {
                    match action {
                        Some(action) => self.handle(action, &mut executions),
                        None => {
                            debug!("No more actions; finishing running executions");
                            actions_done = true;
                        },
                    }
                    continue;
                },
                Some(event) = executions.next(), if !executions.is_empty() => event,
                else => break,
            };

            if tx.unbounded_send(event).is_err() {
                info!("Execution events are no longer consumed; stopping");
                break;
            }
        }

        executions.stop_all();
    }

    fn handle(&self, action: KernelAction, executions: &mut Executions) {
        trace!("Handling {action:?}");

        if let Some(content_id) = action.lifecycle_content_id() {
            executions.stop_content(content_id);
            return;
        }

        match action {
            KernelAction::ExecuteCell {
                cell_id,
                content_id,
            } => {
                if executions.stop_cell(&cell_id) {
                    debug!("Superseding execution of cell '{cell_id}'");
                }

                let events = match self.start(&cell_id, &content_id) {
                    Ok(events) => events,
                    Err(failure) => {
                        info!("Not executing cell '{cell_id}': {failure}");
                        let event = ExecutionEvent {
                            cell_id,
                            content_id,
                            kind: ExecutionEventKind::ExecuteFailed { failure },
                        };
                        executions.push_events(stream::once(future::ready(event)).boxed());
                        return;
                    },
                };

                let events = catch_panics(events, cell_id.clone(), content_id.clone());
                executions.insert(cell_id, content_id, events);
            },
            KernelAction::CancelCell { cell_id, .. } | KernelAction::DeleteCell { cell_id, .. } => {
                if executions.stop_cell(&cell_id) {
                    debug!("Canceling execution of cell '{cell_id}'");
                }
            },
            _ => {},
        }
    }

    /// Validate the request and start the execution.
    fn start(
        &self,
        cell_id: &str,
        content_id: &str,
    ) -> Result<BoxStream<'static, ExecutionEvent>, Failure> {
        let (source, channel) = self.validate(cell_id, content_id)?;

        let message = match JupyterMessage::new(ExecuteRequest::new(source)).to_wire() {
            Ok(message) => message,
            Err(err) => return Err(Failure::from_error(ErrorCode::Unexpected, &err)),
        };

        let request = ExecuteCell {
            cell_id: String::from(cell_id),
            content_id: String::from(content_id),
            message,
        };
        Ok(prepare_execution(channel, request).activate())
    }

    /// Check that the cell can be run, in order: the content is a notebook,
    /// the cell exists, is a code cell, and has source, and there's a usable
    /// kernel. Returns the source and the kernel's channel.
    fn validate(
        &self,
        cell_id: &str,
        content_id: &str,
    ) -> Result<(String, Arc<KernelChannel>), Failure> {
        match self.documents.content_type(content_id) {
            Some(ContentType::Notebook) => {},
            _ => {
                return Err(Failure::new(
                    ErrorCode::ExecNotANotebook,
                    format!("Content '{content_id}' is not a notebook"),
                ))
            },
        }

        let cell = match self.documents.cell(content_id, cell_id) {
            Some(cell) => cell,
            None => {
                return Err(Failure::new(
                    ErrorCode::ExecCellNotFound,
                    format!("Cell '{cell_id}' was not found in '{content_id}'"),
                ))
            },
        };

        if cell.cell_type != Some(CellType::Code) {
            return Err(Failure::new(
                ErrorCode::ExecInvalidCellType,
                format!("Cell '{cell_id}' is not a code cell"),
            ));
        }

        if cell.source.is_empty() {
            return Err(Failure::new(
                ErrorCode::ExecNoSource,
                format!("Cell '{cell_id}' has no source to execute"),
            ));
        }

        let kernel = match self.registry.kernel_for(content_id) {
            Some(kernel) if kernel.status.accepts_requests() => kernel,
            Some(kernel) => {
                return Err(Failure::new(
                    ErrorCode::ExecNoKernel,
                    format!(
                        "Kernel '{}' for '{content_id}' is {}",
                        kernel.kernel_ref, kernel.status
                    ),
                ))
            },
            None => {
                return Err(Failure::new(
                    ErrorCode::ExecNoKernel,
                    format!("No kernel is connected to '{content_id}'"),
                ))
            },
        };

        match kernel.channels {
            Some(channel) => Ok((cell.source, channel)),
            None => Err(Failure::new(
                ErrorCode::ExecMalformedChannel,
                format!("Kernel '{}' has no usable channels", kernel.kernel_ref),
            )),
        }
    }
}

/// A panic while processing an execution becomes a failure event for that
/// execution, which then ends.
fn catch_panics(
    events: BoxStream<'static, ExecutionEvent>,
    cell_id: String,
    content_id: String,
) -> BoxStream<'static, ExecutionEvent> {
    AssertUnwindSafe(events)
        .catch_unwind()
        .map(move |item| match item {
            Ok(event) => event,
            Err(_) => {
                error!("Execution of cell '{cell_id}' panicked");
                ExecutionEvent {
                    cell_id: cell_id.clone(),
                    content_id: content_id.clone(),
                    kind: ExecutionEventKind::ExecuteFailed {
                        failure: Failure::new(
                            ErrorCode::Unexpected,
                            format!("Execution of cell '{cell_id}' failed unexpectedly"),
                        ),
                    },
                }
            },
        })
        .boxed()
}
