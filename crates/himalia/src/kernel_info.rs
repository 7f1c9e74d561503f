/*
 * kernel_info.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use std::sync::Arc;
use std::time::Duration;

use futures::stream;
use futures::stream::BoxStream;
use futures::StreamExt;
use log::info;
use log::warn;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::error::Error;
use crate::error::ErrorCode;
use crate::error::Failure;
use crate::event::KernelEvent;
use crate::kernel_channel::KernelChannel;
use crate::router::MessageStream;
use crate::router::MessageStreamExt;
use crate::wire::help_link::HelpLink;
use crate::wire::jupyter_message::JupyterMessage;
use crate::wire::jupyter_message::MessageType;
use crate::wire::kernel_info_reply::KernelInfoReply;
use crate::wire::kernel_info_request::KernelInfoRequest;
use crate::wire::wire_message::WireMessage;

/// The protocol major version we speak
const SUPPORTED_PROTOCOL_MAJOR: &str = "5";

/// What the frontend records about a kernel once it is up
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KernelInfo {
    pub protocol_version: String,
    pub implementation: String,
    pub implementation_version: String,
    pub banner: String,
    pub help_links: Vec<HelpLink>,

    pub language_name: String,
    pub language_version: String,
    pub mimetype: String,
    pub file_extension: String,
    pub pygments_lexer: Option<String>,
    pub codemirror_mode: Option<Value>,
    pub nbconvert_exporter: Option<String>,
}

impl From<&KernelInfoReply> for KernelInfo {
    fn from(reply: &KernelInfoReply) -> Self {
        let language = &reply.language_info;
        Self {
            protocol_version: reply.protocol_version.clone(),
            implementation: reply.implementation.clone(),
            implementation_version: reply.implementation_version.clone(),
            banner: reply.banner.clone(),
            help_links: reply.help_links.clone(),
            language_name: language.name.clone(),
            language_version: language.version.clone(),
            mimetype: language.mimetype.clone(),
            file_extension: language.file_extension.clone(),
            pygments_lexer: language.pygments_lexer.clone(),
            codemirror_mode: language.codemirror_mode.clone(),
            nbconvert_exporter: language.nbconvert_exporter.clone(),
        }
    }
}

/// Set up a `kernel_info_request`. Nothing is sent until the result is
/// activated.
pub fn prepare_kernel_info(
    channel: Arc<KernelChannel>,
    kernel_ref: impl Into<String>,
    content_ref: impl Into<String>,
    timeout: Duration,
) -> PendingKernelInfo {
    PendingKernelInfo {
        channel,
        kernel_ref: kernel_ref.into(),
        content_ref: content_ref.into(),
        timeout,
    }
}

/// Ask a kernel about itself. Shorthand for preparing and activating the
/// request at once.
pub fn acquire_kernel_info(
    channel: Arc<KernelChannel>,
    kernel_ref: impl Into<String>,
    content_ref: impl Into<String>,
    timeout: Duration,
) -> BoxStream<'static, KernelEvent> {
    prepare_kernel_info(channel, kernel_ref, content_ref, timeout).activate()
}

pub struct PendingKernelInfo {
    channel: Arc<KernelChannel>,
    kernel_ref: String,
    content_ref: String,
    timeout: Duration,
}

impl PendingKernelInfo {
    /// Subscribe to the kernel's replies, then send the request.
    ///
    /// The stream waits for the first `kernel_info_reply` to the request and
    /// then ends. A kernel speaking protocol 5 yields `SetLanguageInfo`
    /// followed by `SetKernelInfo`. Anything else (an incompatible protocol
    /// version, no reply in time, a broken channel) yields a single
    /// `LaunchKernelFailed`.
    pub fn activate(self) -> BoxStream<'static, KernelEvent> {
        let kernel_ref = self.kernel_ref;
        let content_ref = self.content_ref;
        let timeout = self.timeout;

        let launch_failed = {
            let kernel_ref = kernel_ref.clone();
            let content_ref = content_ref.clone();
            move |failure: Failure| {
                warn!("Could not get kernel info from '{kernel_ref}': {failure}");
                vec![KernelEvent::LaunchKernelFailed {
                    kernel_ref: kernel_ref.clone(),
                    content_ref: content_ref.clone(),
                    failure,
                }]
            }
        };

        let request = match JupyterMessage::new(KernelInfoRequest {}).to_wire() {
            Ok(request) => request,
            Err(err) => {
                let events = launch_failed(Failure::from_error(ErrorCode::KernelInfoFailed, &err));
                return stream::iter(events).boxed();
            },
        };

        let replies = self
            .channel
            .subscribe()
            .child_of(&request)
            .of_message_type(&[KernelInfoReply::message_type().as_str()]);

        if let Err(err) = self.channel.send(request) {
            let events = launch_failed(Failure::from_error(ErrorCode::KernelInfoFailed, &err));
            return stream::iter(events).boxed();
        }

        stream::once(async move {
            let reply = match first_reply(replies, timeout).await {
                Ok(reply) => reply,
                Err(failure) => return launch_failed(failure),
            };

            match kernel_info_events(&reply, &kernel_ref, &content_ref) {
                Ok(events) => events,
                Err(failure) => launch_failed(failure),
            }
        })
        .flat_map(stream::iter)
        .boxed()
    }
}

async fn first_reply(mut replies: MessageStream, timeout: Duration) -> Result<WireMessage, Failure> {
    match tokio::time::timeout(timeout, replies.next()).await {
        Ok(Some(Ok(reply))) => Ok(reply),
        Ok(Some(Err(err))) => Err(Failure::from_error(ErrorCode::KernelInfoFailed, &err)),
        Ok(None) => Err(Failure::from_error(
            ErrorCode::KernelInfoFailed,
            &Error::ChannelClosed(KernelInfoReply::message_type()),
        )),
        Err(_) => Err(Failure::from_error(
            ErrorCode::KernelInfoTimeout,
            &Error::Timeout(KernelInfoReply::message_type(), timeout),
        )),
    }
}

/// The events for a `kernel_info_reply`, or the reason the kernel can't be
/// used.
fn kernel_info_events(
    reply: &WireMessage,
    kernel_ref: &str,
    content_ref: &str,
) -> Result<Vec<KernelEvent>, Failure> {
    // Gate on the raw field so that a reply from an incompatible kernel is
    // reported as such even if the rest of it doesn't parse
    let protocol_version = reply
        .content
        .get("protocol_version")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if !protocol_version.starts_with(SUPPORTED_PROTOCOL_MAJOR) {
        return Err(Failure::new(
            ErrorCode::KernelProtocolIncompatible,
            format!(
                "Kernel '{kernel_ref}' uses protocol version '{protocol_version}'; version {SUPPORTED_PROTOCOL_MAJOR}.x is required"
            ),
        ));
    }

    let reply = match JupyterMessage::<KernelInfoReply>::try_from(reply) {
        Ok(reply) => reply.content,
        Err(err) => return Err(Failure::from_error(ErrorCode::KernelInfoFailed, &err)),
    };

    info!(
        "Kernel '{kernel_ref}' is {} {} ({} {})",
        reply.implementation,
        reply.implementation_version,
        reply.language_info.name,
        reply.language_info.version
    );

    Ok(vec![
        KernelEvent::SetLanguageInfo {
            kernel_ref: String::from(kernel_ref),
            content_ref: String::from(content_ref),
            language_info: reply.language_info.clone(),
        },
        KernelEvent::SetKernelInfo {
            kernel_ref: String::from(kernel_ref),
            info: KernelInfo::from(&reply),
        },
    ])
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn reply(content: Value) -> WireMessage {
        WireMessage::create("kernel_info_reply", content)
    }

    #[test]
    fn test_compatible_reply() {
        let events = kernel_info_events(
            &reply(json!({
                "status": "ok",
                "protocol_version": "5.3",
                "implementation": "ark",
                "implementation_version": "0.1.9",
                "banner": "R version 4.4",
                "help_links": [{"text": "R", "url": "https://www.r-project.org"}],
                "language_info": {
                    "name": "R",
                    "version": "4.4.0",
                    "mimetype": "text/r-source",
                    "file_extension": ".R",
                    "codemirror_mode": {"name": "r"},
                },
            })),
            "k1",
            "nb",
        )
        .unwrap();

        assert_eq!(events.len(), 2);
        assert_matches!(&events[0], KernelEvent::SetLanguageInfo { language_info, .. } => {
            assert_eq!(language_info.name, "R");
        });
        assert_matches!(&events[1], KernelEvent::SetKernelInfo { kernel_ref, info } => {
            assert_eq!(kernel_ref, "k1");
            assert_eq!(info.protocol_version, "5.3");
            assert_eq!(info.language_version, "4.4.0");
            assert_eq!(info.codemirror_mode, Some(json!({"name": "r"})));
            assert_eq!(info.help_links.len(), 1);
        });
    }

    #[test]
    fn test_incompatible_reply() {
        for version in ["4.1", "", "6.0"] {
            let failure = kernel_info_events(
                &reply(json!({
                    "protocol_version": version,
                    "language_info": {"name": "python"},
                })),
                "k1",
                "nb",
            )
            .unwrap_err();
            assert_eq!(failure.code, ErrorCode::KernelProtocolIncompatible);
        }

        // The gate applies before the rest of the reply is looked at
        let failure = kernel_info_events(&reply(json!({"protocol_version": "4.0"})), "k1", "nb")
            .unwrap_err();
        assert_eq!(failure.code, ErrorCode::KernelProtocolIncompatible);
    }

    #[test]
    fn test_unparseable_reply() {
        let failure = kernel_info_events(&reply(json!({"protocol_version": "5.0"})), "k1", "nb")
            .unwrap_err();
        assert_eq!(failure.code, ErrorCode::KernelInfoFailed);
    }

    #[test]
    fn test_kernel_info_json_form() {
        let info = KernelInfo {
            protocol_version: String::from("5.3"),
            language_name: String::from("R"),
            ..Default::default()
        };
        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value["protocolVersion"], "5.3");
        assert_eq!(value["languageName"], "R");
        assert!(value.get("pygmentsLexer").is_none());
    }
}
