/*
 * execution.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use std::collections::HashMap;
use std::sync::Arc;

use assert_matches::assert_matches;
use futures::channel::mpsc;
use futures::stream;
use futures::stream::BoxStream;
use futures::StreamExt;
use himalia::config::KernelClientConfig;
use himalia::dispatcher::ExecutionDispatcher;
use himalia::document::CellType;
use himalia::document::ContentType;
use himalia::error::ErrorCode;
use himalia::event::KernelAction;
use himalia::execution::ExecutionEvent;
use himalia::execution::ExecutionEventKind;
use himalia::fixtures::dummy_kernel::recv_all;
use himalia::fixtures::dummy_kernel::recv_next;
use himalia::fixtures::dummy_kernel::DummyKernel;
use himalia::fixtures::notebook::InMemoryDocuments;
use himalia::fixtures::notebook::InMemoryKernels;
use himalia::kernel::KernelRecord;
use himalia::kernel::KernelStatus;
use himalia::kernel_channel::ChannelEndpoint;
use himalia::kernel_channel::KernelChannel;
use himalia::router::MessageStream;
use himalia::router::MessageStreamExt;
use himalia::session::Session;
use himalia::session::DEFAULT_SIGNATURE_SCHEME;
use himalia::wire::execute_input::ExecuteInput;
use himalia::wire::execute_reply::ExecuteReply;
use himalia::wire::input_request::InputRequest;
use himalia::wire::jupyter_channel::JupyterChannel;
use himalia::wire::jupyter_message::Status;
use himalia::wire::stream::Stream;
use himalia::wire::stream::StreamOutput;
use himalia::wire::update_display_data::UpdateDisplayData;
use himalia::wire::wire_message::WireMessage;
use himalia::Error;
use serde_json::json;

struct Frontend {
    kernel: DummyKernel,
    documents: Arc<InMemoryDocuments>,
    kernels: Arc<InMemoryKernels>,
    actions: mpsc::UnboundedSender<KernelAction>,
    events: BoxStream<'static, ExecutionEvent>,
}

impl Frontend {
    /// A dispatcher with notebook `nb` (one code cell `c1`) served by a dummy
    /// kernel
    fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let kernel = DummyKernel::new();
        let documents = Arc::new(InMemoryDocuments::default());
        let kernels = Arc::new(InMemoryKernels::default());
        documents.add_notebook("nb", "c1", "1 + 1");
        kernels.connect("nb", "k1", kernel.channel.clone());

        let (actions, rx) = mpsc::unbounded();
        let events = ExecutionDispatcher::new(kernels.clone(), documents.clone()).run(rx);

        Self {
            kernel,
            documents,
            kernels,
            actions,
            events,
        }
    }

    fn execute(&self, content_id: &str, cell_id: &str) {
        self.actions
            .unbounded_send(KernelAction::ExecuteCell {
                cell_id: String::from(cell_id),
                content_id: String::from(content_id),
            })
            .unwrap();
    }

    fn dispatch(&self, action: KernelAction) {
        self.actions.unbounded_send(action).unwrap();
    }

    /// Stops sending actions and collects every remaining event
    async fn finish(mut self) -> Vec<ExecutionEvent> {
        self.actions.close_channel();
        recv_all(&mut self.events).await
    }

    /// Plays a complete, successful execution of `request`
    fn complete(&self, request: &WireMessage, count: u32, output: &str) {
        let code = request.content["code"].as_str().unwrap();
        self.kernel.send_iopub_busy(request);
        self.kernel.send_iopub(request, ExecuteInput {
            code: String::from(code),
            execution_count: count,
        });
        self.kernel.send_iopub(request, StreamOutput {
            name: Stream::Stdout,
            text: String::from(output),
        });
        self.kernel.send_shell(request, ExecuteReply {
            status: Status::Ok,
            execution_count: Some(count),
            payload: vec![],
            user_expressions: None,
        });
        self.kernel.send_iopub_idle(request);
    }
}

fn kinds_for<'a>(events: &'a [ExecutionEvent], cell_id: &str) -> Vec<&'a ExecutionEventKind> {
    events
        .iter()
        .filter(|event| event.cell_id == cell_id)
        .map(|event| &event.kind)
        .collect()
}

fn position(kinds: &[&ExecutionEventKind], expected: &ExecutionEventKind) -> usize {
    kinds
        .iter()
        .position(|kind| *kind == expected)
        .unwrap_or_else(|| panic!("{expected:?} not found in {kinds:?}"))
}

fn stream_output(text: &str) -> ExecutionEventKind {
    ExecutionEventKind::AppendOutput {
        output: json!({"name": "stdout", "text": text, "output_type": "stream"}),
    }
}

fn status(status: &str) -> ExecutionEventKind {
    ExecutionEventKind::UpdateCellStatus {
        status: String::from(status),
    }
}

#[tokio::test]
async fn test_execution_events_follow_the_kernel() {
    let mut frontend = Frontend::new();

    frontend.execute("nb", "c1");
    let request = frontend.kernel.recv_shell_request("execute_request").await;
    assert_eq!(request.content["code"], "1 + 1");
    assert_eq!(request.content["silent"], false);
    assert_eq!(request.content["store_history"], true);
    assert_eq!(request.channel, Some(JupyterChannel::Shell));

    frontend.complete(&request, 3, "2\n");

    let events = frontend.finish().await;
    assert!(events.iter().all(|event| event.content_id == "nb"));
    let kinds = kinds_for(&events, "c1");
    assert_eq!(kinds.len(), events.len());

    assert_eq!(kinds[0], &ExecutionEventKind::ClearOutputs);
    assert_eq!(kinds[1], &status("queued"));

    // IOPub messages are processed in the order the kernel sent them
    let busy = position(&kinds, &status("busy"));
    let output = position(&kinds, &stream_output("2\n"));
    let idle = position(&kinds, &status("idle"));
    assert!(busy < output);
    assert!(output < idle);

    let counts: Vec<_> = kinds
        .iter()
        .filter(|kind| matches!(kind, ExecutionEventKind::UpdateExecutionCount { .. }))
        .collect();
    assert_eq!(counts.len(), 2);
    assert!(counts
        .iter()
        .all(|kind| **kind == &ExecutionEventKind::UpdateExecutionCount { value: 3 }));

    let stamps: Vec<&str> = kinds
        .iter()
        .filter_map(|kind| match kind {
            ExecutionEventKind::SetInCell { path, value } => {
                assert_eq!(path[..2], [String::from("metadata"), String::from("execution")]);
                assert!(value.is_string());
                Some(path[2].as_str())
            },
            _ => None,
        })
        .collect();
    for stamp in [
        "iopub.status.busy",
        "iopub.execute_input",
        "shell.execute_reply",
        "iopub.status.idle",
    ] {
        assert!(stamps.contains(&stamp), "missing {stamp} in {stamps:?}");
    }

    assert!(!kinds
        .iter()
        .any(|kind| matches!(kind, ExecutionEventKind::ExecuteFailed { .. })));
}

#[tokio::test]
async fn test_execution_completes_only_with_reply_and_idle() {
    let mut frontend = Frontend::new();

    frontend.execute("nb", "c1");
    let request = frontend.kernel.recv_shell_request("execute_request").await;
    frontend.kernel.send_iopub_busy(&request);
    frontend.kernel.send_iopub_idle(&request);

    assert_eq!(recv_next(&mut frontend.events).await.kind, ExecutionEventKind::ClearOutputs);
    assert_eq!(recv_next(&mut frontend.events).await.kind, status("queued"));
    loop {
        if recv_next(&mut frontend.events).await.kind == status("idle") {
            break;
        }
    }

    // Still waiting for the reply, so output keeps flowing
    frontend.kernel.send_iopub(&request, StreamOutput {
        name: Stream::Stdout,
        text: String::from("late\n"),
    });
    assert_eq!(recv_next(&mut frontend.events).await.kind, stream_output("late\n"));

    frontend.kernel.send_shell(&request, ExecuteReply {
        status: Status::Ok,
        execution_count: Some(1),
        payload: vec![json!({"source": "page", "data": {"text/plain": "help"}})],
        user_expressions: None,
    });

    // The reply's payload comes first
    assert_eq!(
        recv_next(&mut frontend.events).await.kind,
        ExecutionEventKind::AcceptPayload {
            payload: json!({"source": "page", "data": {"text/plain": "help"}}),
        }
    );

    // Nothing after completion
    let rest = frontend.finish().await;
    assert!(rest
        .iter()
        .all(|event| !matches!(event.kind, ExecutionEventKind::AppendOutput { .. })));
}

#[tokio::test]
async fn test_new_execution_supersedes_the_running_one() {
    let mut frontend = Frontend::new();

    frontend.execute("nb", "c1");
    let first = frontend.kernel.recv_shell_request("execute_request").await;

    frontend.documents.set_cell("nb", "c1", Some(CellType::Code), "2 + 2");
    frontend.execute("nb", "c1");
    let second = frontend.kernel.recv_shell_request("execute_request").await;
    assert_eq!(second.content["code"], "2 + 2");

    // The kernel is still working on the first request
    frontend.complete(&first, 1, "first\n");
    frontend.complete(&second, 2, "second\n");

    let events = frontend.finish().await;
    let kinds = kinds_for(&events, "c1");
    assert!(!kinds.contains(&&stream_output("first\n")));
    assert!(!kinds.contains(&&ExecutionEventKind::UpdateExecutionCount { value: 1 }));
    assert!(kinds.contains(&&stream_output("second\n")));
    assert!(kinds.contains(&&ExecutionEventKind::UpdateExecutionCount { value: 2 }));
}

#[tokio::test]
async fn test_superseding_a_cell_leaves_other_cells_running() {
    let mut frontend = Frontend::new();
    frontend
        .documents
        .set_cell("nb", "c2", Some(CellType::Code), "c2");

    frontend.execute("nb", "c2");
    let c2 = frontend.kernel.recv_shell_request("execute_request").await;

    let mut c1_requests = Vec::new();
    for _ in 0..3 {
        frontend.execute("nb", "c1");
        c1_requests.push(frontend.kernel.recv_shell_request("execute_request").await);
    }

    frontend.complete(&c2, 5, "c2\n");
    for (i, request) in c1_requests.iter().enumerate() {
        frontend.complete(request, 6 + i as u32, &format!("c1 run {i}\n"));
    }

    let events = frontend.finish().await;

    let c2_kinds = kinds_for(&events, "c2");
    assert!(c2_kinds.contains(&&stream_output("c2\n")));
    assert!(c2_kinds.contains(&&ExecutionEventKind::UpdateExecutionCount { value: 5 }));
    assert!(c2_kinds.contains(&&status("idle")));
    assert!(!c2_kinds
        .iter()
        .any(|kind| matches!(kind, ExecutionEventKind::ExecuteFailed { .. })));

    let c1_kinds = kinds_for(&events, "c1");
    assert!(!c1_kinds.contains(&&stream_output("c1 run 0\n")));
    assert!(!c1_kinds.contains(&&stream_output("c1 run 1\n")));
    assert!(c1_kinds.contains(&&stream_output("c1 run 2\n")));
}

#[tokio::test]
async fn test_lost_kernel_messages_fail_the_execution() {
    let mut frontend = Frontend::new();

    frontend.execute("nb", "c1");
    let request = frontend.kernel.recv_shell_request("execute_request").await;

    // More output than the IOPub transport holds, sent before the frontend
    // gets a chance to read any of it
    frontend.kernel.send_iopub_busy(&request);
    for i in 0..100 {
        frontend.kernel.send_iopub(&request, StreamOutput {
            name: Stream::Stdout,
            text: format!("{i}\n"),
        });
    }
    frontend.kernel.send_shell(&request, ExecuteReply {
        status: Status::Ok,
        execution_count: Some(1),
        payload: vec![],
        user_expressions: None,
    });
    frontend.kernel.send_iopub_idle(&request);

    let events = frontend.finish().await;
    let kinds = kinds_for(&events, "c1");

    let outputs = kinds
        .iter()
        .filter(|kind| matches!(kind, ExecutionEventKind::AppendOutput { .. }))
        .count();
    assert!(outputs < 100);

    // The failure is the last thing the cell hears about
    assert_matches!(kinds.last(), Some(ExecutionEventKind::ExecuteFailed { failure }) => {
        assert_eq!(failure.code, ErrorCode::ExecTransport);
        assert!(failure.message.contains("lost"));
    });
}

#[tokio::test]
async fn test_cancel_and_delete_stop_only_their_cell() {
    let mut frontend = Frontend::new();
    for cell_id in ["c2", "c3", "c4"] {
        frontend
            .documents
            .set_cell("nb", cell_id, Some(CellType::Code), cell_id);
    }

    frontend.execute("nb", "c1");
    let c1 = frontend.kernel.recv_shell_request("execute_request").await;
    frontend.execute("nb", "c2");
    let c2 = frontend.kernel.recv_shell_request("execute_request").await;
    frontend.execute("nb", "c3");
    let c3 = frontend.kernel.recv_shell_request("execute_request").await;

    frontend.dispatch(KernelAction::CancelCell {
        cell_id: String::from("c1"),
        content_id: String::from("nb"),
    });
    frontend.dispatch(KernelAction::DeleteCell {
        cell_id: String::from("c2"),
        content_id: String::from("nb"),
    });

    // Actions are handled in order, so once this request goes out the cancel
    // and delete have taken effect
    frontend.execute("nb", "c4");
    let c4 = frontend.kernel.recv_shell_request("execute_request").await;

    frontend.complete(&c1, 1, "c1\n");
    frontend.complete(&c2, 2, "c2\n");
    frontend.complete(&c3, 3, "c3\n");
    frontend.complete(&c4, 4, "c4\n");

    let events = frontend.finish().await;
    assert!(!kinds_for(&events, "c1").contains(&&stream_output("c1\n")));
    assert!(!kinds_for(&events, "c2").contains(&&stream_output("c2\n")));
    assert!(kinds_for(&events, "c3").contains(&&stream_output("c3\n")));
    assert!(kinds_for(&events, "c4").contains(&&stream_output("c4\n")));
}

#[tokio::test]
async fn test_kernel_lifecycle_actions_cancel_the_content() {
    for action in [
        KernelAction::LaunchKernel {
            content_id: String::from("nb"),
        },
        KernelAction::LaunchKernelByName {
            content_id: String::from("nb"),
            kernel_spec_name: String::from("ark"),
        },
        KernelAction::InterruptKernel {
            content_id: String::from("nb"),
        },
        KernelAction::RestartKernel {
            content_id: String::from("nb"),
        },
        KernelAction::KillKernel {
            content_id: String::from("nb"),
        },
    ] {
        let mut frontend = Frontend::new();
        frontend
            .documents
            .set_cell("nb", "c2", Some(CellType::Code), "c2");
        frontend.documents.add_notebook("other", "o1", "o1");
        frontend
            .kernels
            .connect("other", "k1", frontend.kernel.channel.clone());

        frontend.execute("nb", "c1");
        let c1 = frontend.kernel.recv_shell_request("execute_request").await;
        frontend.execute("nb", "c2");
        let c2 = frontend.kernel.recv_shell_request("execute_request").await;
        frontend.execute("other", "o1");
        let o1 = frontend.kernel.recv_shell_request("execute_request").await;

        frontend.dispatch(action.clone());
        frontend
            .documents
            .set_cell("nb", "c1", Some(CellType::Code), "again");
        frontend.execute("nb", "c1");
        let again = frontend.kernel.recv_shell_request("execute_request").await;

        frontend.complete(&c1, 1, "c1\n");
        frontend.complete(&c2, 2, "c2\n");
        frontend.complete(&o1, 3, "o1\n");
        frontend.complete(&again, 4, "again\n");

        let events = frontend.finish().await;
        let c1_kinds = kinds_for(&events, "c1");
        assert!(!c1_kinds.contains(&&stream_output("c1\n")), "{action:?}");
        assert!(c1_kinds.contains(&&stream_output("again\n")), "{action:?}");
        assert!(!kinds_for(&events, "c2").contains(&&stream_output("c2\n")), "{action:?}");
        assert!(kinds_for(&events, "o1").contains(&&stream_output("o1\n")), "{action:?}");
    }
}

#[tokio::test]
async fn test_invalid_requests_fail_without_reaching_the_kernel() {
    let mut frontend = Frontend::new();
    let documents = &frontend.documents;

    documents.add_content("script", ContentType::File);
    documents.set_cell("nb", "markdown", Some(CellType::Markdown), "# Title");
    documents.set_cell("nb", "untyped", None, "1");
    documents.set_cell("nb", "empty", Some(CellType::Code), "");

    documents.add_notebook("no-kernel", "c1", "1");
    documents.add_notebook("starting", "c1", "1");
    frontend
        .kernels
        .connect("starting", "k2", frontend.kernel.channel.clone());
    frontend.kernels.set_status("starting", KernelStatus::Starting);
    documents.add_notebook("broken", "c1", "1");
    frontend.kernels.set("broken", KernelRecord {
        kernel_ref: String::from("k3"),
        kernel_spec_name: String::from("dummy"),
        cwd: String::from("/"),
        status: KernelStatus::Idle,
        channels: None,
    });

    let cases = [
        ("script", "c1", ErrorCode::ExecNotANotebook),
        ("missing", "c1", ErrorCode::ExecNotANotebook),
        ("nb", "missing", ErrorCode::ExecCellNotFound),
        ("nb", "markdown", ErrorCode::ExecInvalidCellType),
        ("nb", "untyped", ErrorCode::ExecInvalidCellType),
        ("nb", "empty", ErrorCode::ExecNoSource),
        ("no-kernel", "c1", ErrorCode::ExecNoKernel),
        ("starting", "c1", ErrorCode::ExecNoKernel),
        ("broken", "c1", ErrorCode::ExecMalformedChannel),
    ];
    for (content_id, cell_id, _) in cases.iter() {
        frontend.execute(content_id, cell_id);
    }

    let mut failures = HashMap::new();
    for _ in 0..cases.len() {
        let event = recv_next(&mut frontend.events).await;
        assert_matches!(event.kind, ExecutionEventKind::ExecuteFailed { failure } => {
            failures.insert((event.content_id, event.cell_id), failure.code);
        });
    }
    for (content_id, cell_id, code) in cases.iter() {
        assert_eq!(
            failures.get(&(String::from(*content_id), String::from(*cell_id))),
            Some(code)
        );
    }

    frontend.kernel.assert_no_incoming();

    // The dispatcher keeps going after failures
    frontend.execute("nb", "c1");
    let request = frontend.kernel.recv_shell_request("execute_request").await;
    frontend.complete(&request, 1, "ok\n");
    let events = frontend.finish().await;
    assert!(kinds_for(&events, "c1").contains(&&stream_output("ok\n")));
}

/// An endpoint whose connection is gone
struct ClosedEndpoint;

impl ChannelEndpoint for ClosedEndpoint {
    fn messages(&self) -> MessageStream {
        stream::pending().boxed()
    }

    fn send(&self, _msg: WireMessage) -> Result<(), Error> {
        Err(Error::CannotSend(
            String::from("Shell"),
            String::from("connection refused"),
        ))
    }
}

#[tokio::test]
async fn test_send_failure_is_reported_on_the_cell() {
    let mut frontend = Frontend::new();

    let session = Session::create("", DEFAULT_SIGNATURE_SCHEME).unwrap();
    let mut endpoints: HashMap<JupyterChannel, Arc<dyn ChannelEndpoint>> = HashMap::new();
    endpoints.insert(JupyterChannel::Shell, Arc::new(ClosedEndpoint));
    let channel = KernelChannel::new(endpoints, &session, &KernelClientConfig::default());

    frontend.documents.add_notebook("remote", "r1", "1");
    frontend.kernels.connect("remote", "k9", Arc::new(channel));

    frontend.execute("remote", "r1");
    let events = frontend.finish().await;
    let kinds: Vec<_> = events.into_iter().map(|event| event.kind).collect();
    assert_eq!(kinds.len(), 3);
    assert_eq!(kinds[0], ExecutionEventKind::ClearOutputs);
    assert_eq!(kinds[1], status("queued"));
    assert_matches!(&kinds[2], ExecutionEventKind::ExecuteFailed { failure } => {
        assert_eq!(failure.code, ErrorCode::ExecTransport);
        assert!(failure.message.contains("connection refused"));
    });
}

#[tokio::test]
async fn test_input_prompts_and_display_updates() {
    let mut frontend = Frontend::new();
    let mut prompts = frontend
        .kernel
        .channel
        .subscribe()
        .of_message_type(&["input_request"]);

    frontend.execute("nb", "c1");
    let request = frontend.kernel.recv_shell_request("execute_request").await;
    assert_eq!(request.content["allow_stdin"], true);

    frontend.kernel.send_stdin(&request, InputRequest {
        prompt: String::from("Name: "),
        password: false,
    });

    let prompt = recv_next(&mut prompts).await.unwrap();
    assert_eq!(prompt.channel, Some(JupyterChannel::Stdin));
    frontend
        .kernel
        .channel
        .send_input_reply("Ada", &prompt)
        .unwrap();

    let reply = frontend.kernel.recv_stdin().await;
    assert_eq!(reply.header.msg_type, "input_reply");
    assert_eq!(reply.content["value"], "Ada");
    assert_eq!(reply.parent_msg_id(), Some(prompt.header.msg_id.as_str()));

    frontend.kernel.send_iopub(&request, UpdateDisplayData {
        data: json!({"text/plain": "50%"}),
        metadata: json!({}),
        transient: json!({"display_id": "progress"}),
    });
    frontend.complete(&request, 1, "Hello, Ada\n");

    let events = frontend.finish().await;
    let kinds = kinds_for(&events, "c1");
    assert!(kinds.contains(&&ExecutionEventKind::PromptInputRequest {
        prompt: String::from("Name: "),
        password: false,
    }));
    assert!(kinds.contains(&&ExecutionEventKind::UpdateDisplay {
        output: json!({
            "data": {"text/plain": "50%"},
            "metadata": {},
            "transient": {"display_id": "progress"},
            "output_type": "display_data",
        }),
    }));
}
