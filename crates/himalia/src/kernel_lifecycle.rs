/*
 * kernel_lifecycle.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use std::time::Duration;

use futures::Stream;
use futures::StreamExt;
use log::info;
use log::warn;

use crate::error::Error;
use crate::error::ErrorCode;
use crate::error::Failure;
use crate::event::KernelAction;
use crate::event::KernelEvent;
use crate::kernel_channel::KernelChannel;
use crate::wire::interrupt_reply::InterruptReply;
use crate::wire::interrupt_request::InterruptRequest;
use crate::wire::jupyter_channel::JupyterChannel;
use crate::wire::jupyter_message::JupyterMessage;
use crate::wire::jupyter_message::MessageType;
use crate::wire::jupyter_message::ProtocolMessage;
use crate::wire::shutdown_reply::ShutdownReply;
use crate::wire::shutdown_request::ShutdownRequest;

/// Wait for a restarted kernel to come up, as reported by a
/// `LaunchKernelSuccessful` action for `new_kernel_ref`. Gives up after
/// `timeout`.
pub async fn await_restart<S>(
    actions: S,
    new_kernel_ref: &str,
    content_ref: &str,
    timeout: Duration,
) -> KernelEvent
where
    S: Stream<Item = KernelAction> + Unpin,
{
    let mut launched = actions.filter(|action| {
        let matches = matches!(
            action,
            KernelAction::LaunchKernelSuccessful { kernel_ref, .. } if kernel_ref == new_kernel_ref
        );
        futures::future::ready(matches)
    });

    let failure = match tokio::time::timeout(timeout, launched.next()).await {
        Ok(Some(_)) => {
            info!("Kernel '{new_kernel_ref}' for '{content_ref}' restarted");
            return KernelEvent::RestartKernelSuccessful {
                kernel_ref: String::from(new_kernel_ref),
                content_ref: String::from(content_ref),
            };
        },
        Ok(None) => Failure::new(
            ErrorCode::KernelRestartFailed,
            format!(
                "No more actions while waiting for kernel '{new_kernel_ref}' to restart for '{content_ref}'"
            ),
        ),
        Err(_) => Failure::new(
            ErrorCode::KernelRestartTimeout,
            format!(
                "Kernel '{new_kernel_ref}' did not start within {}s of restarting for '{content_ref}'",
                timeout.as_secs()
            ),
        ),
    };

    warn!("{failure}");
    KernelEvent::RestartKernelFailed {
        kernel_ref: String::from(new_kernel_ref),
        content_ref: String::from(content_ref),
        failure,
    }
}

/// Ask the kernel to interrupt what it is doing, on the control channel.
pub async fn interrupt_kernel(
    channel: &KernelChannel,
    timeout: Duration,
) -> Result<InterruptReply, Error> {
    control_request(channel, InterruptRequest {}, timeout).await
}

/// Ask the kernel to shut down, on the control channel. `restart` tells the
/// kernel a restart will follow.
pub async fn shutdown_kernel(
    channel: &KernelChannel,
    restart: bool,
    timeout: Duration,
) -> Result<ShutdownReply, Error> {
    control_request(channel, ShutdownRequest { restart }, timeout).await
}

async fn control_request<T, R>(channel: &KernelChannel, content: T, timeout: Duration) -> Result<R, Error>
where
    T: ProtocolMessage,
    R: ProtocolMessage + serde::de::DeserializeOwned,
{
    let mut request = JupyterMessage::new(content).to_wire()?;
    request.channel = Some(JupyterChannel::Control);

    let reply = channel.request(request, &R::message_type(), timeout).await?;
    let reply = JupyterMessage::<R>::try_from(&reply)?;
    Ok(reply.content)
}
