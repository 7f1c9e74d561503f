/*
 * lifecycle.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use std::time::Duration;

use assert_matches::assert_matches;
use futures::channel::mpsc;
use himalia::error::ErrorCode;
use himalia::event::KernelAction;
use himalia::event::KernelEvent;
use himalia::fixtures::dummy_kernel::DummyKernel;
use himalia::kernel_lifecycle::await_restart;
use himalia::kernel_lifecycle::interrupt_kernel;
use himalia::kernel_lifecycle::shutdown_kernel;
use himalia::wire::interrupt_reply::InterruptReply;
use himalia::wire::jupyter_channel::JupyterChannel;
use himalia::wire::jupyter_message::Status;
use himalia::wire::shutdown_reply::ShutdownReply;
use himalia::Error;

const TIMEOUT: Duration = Duration::from_secs(1);

#[tokio::test]
async fn test_interrupt_goes_to_control() {
    let mut kernel = DummyKernel::new();
    let channel = kernel.channel.clone();

    let (reply, _) = tokio::join!(interrupt_kernel(&channel, TIMEOUT), async {
        let request = kernel.recv_control().await;
        assert_eq!(request.header.msg_type, "interrupt_request");
        assert_eq!(request.channel, Some(JupyterChannel::Control));
        kernel.send_control(&request, InterruptReply { status: Status::Ok });
    });

    assert_eq!(reply.unwrap().status, Status::Ok);
    kernel.assert_no_incoming();
}

#[tokio::test]
async fn test_shutdown_for_restart() {
    let mut kernel = DummyKernel::new();
    let channel = kernel.channel.clone();

    let (reply, _) = tokio::join!(shutdown_kernel(&channel, true, TIMEOUT), async {
        let request = kernel.recv_control().await;
        assert_eq!(request.header.msg_type, "shutdown_request");
        assert_eq!(request.content["restart"], true);
        kernel.send_control(&request, ShutdownReply {
            status: Status::Ok,
            restart: true,
        });
    });
    assert!(reply.unwrap().restart);

    // The new kernel reports in
    let (actions, rx) = mpsc::unbounded();
    actions
        .unbounded_send(KernelAction::LaunchKernelSuccessful {
            kernel_ref: String::from("k2"),
            content_id: String::from("nb"),
        })
        .unwrap();
    let event = await_restart(rx, "k2", "nb", Duration::from_secs(60)).await;
    assert_eq!(event, KernelEvent::RestartKernelSuccessful {
        kernel_ref: String::from("k2"),
        content_ref: String::from("nb"),
    });
}

#[tokio::test(start_paused = true)]
async fn test_unanswered_interrupt_times_out() {
    let mut kernel = DummyKernel::new();
    let channel = kernel.channel.clone();

    let result = interrupt_kernel(&channel, Duration::from_secs(5)).await;
    assert_matches!(result, Err(Error::Timeout(what, timeout)) => {
        assert!(what.contains("interrupt_reply"));
        assert_eq!(timeout, Duration::from_secs(5));
    });

    // The request did go out
    let request = kernel.recv_control().await;
    assert_eq!(request.header.msg_type, "interrupt_request");
}

#[tokio::test(start_paused = true)]
async fn test_restart_times_out_after_a_minute() {
    let (actions, rx) = mpsc::unbounded::<KernelAction>();

    // Only the old kernel reports in
    actions
        .unbounded_send(KernelAction::LaunchKernelSuccessful {
            kernel_ref: String::from("k1"),
            content_id: String::from("nb"),
        })
        .unwrap();

    let start = tokio::time::Instant::now();
    let event = await_restart(rx, "k2", "nb", Duration::from_secs(60)).await;
    assert!(start.elapsed() >= Duration::from_secs(60));

    assert_matches!(event, KernelEvent::RestartKernelFailed { kernel_ref, content_ref, failure } => {
        assert_eq!(kernel_ref, "k2");
        assert_eq!(content_ref, "nb");
        assert_eq!(failure.code, ErrorCode::KernelRestartTimeout);
        assert!(failure.message.contains("k2"));
        assert!(failure.message.contains("nb"));
    });

    drop(actions);
}
