/*
 * event.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

//! Actions that drive the messaging core, and the kernel-level events it
//! emits. Cell-level events are in `execution`.

use serde::Deserialize;
use serde::Serialize;

use crate::error::Failure;
use crate::kernel_info::KernelInfo;
use crate::wire::language_info::LanguageInfo;

/// An action dispatched by the frontend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KernelAction {
    /// Run a cell
    ExecuteCell { cell_id: String, content_id: String },

    /// Stop tracking a cell's execution
    CancelCell { cell_id: String, content_id: String },

    DeleteCell { cell_id: String, content_id: String },

    /// Start a kernel for the content with its current kernel spec
    LaunchKernel { content_id: String },

    LaunchKernelByName {
        content_id: String,
        kernel_spec_name: String,
    },

    /// A kernel has started and is ready for requests
    LaunchKernelSuccessful { kernel_ref: String, content_id: String },

    InterruptKernel { content_id: String },

    RestartKernel { content_id: String },

    KillKernel { content_id: String },
}

impl KernelAction {
    /// The content a kernel lifecycle action applies to. Every execution for
    /// that content is canceled by it. `None` for cell actions.
    pub fn lifecycle_content_id(&self) -> Option<&str> {
        match self {
            KernelAction::LaunchKernel { content_id } |
            KernelAction::LaunchKernelByName { content_id, .. } |
            KernelAction::InterruptKernel { content_id } |
            KernelAction::RestartKernel { content_id } |
            KernelAction::KillKernel { content_id } => Some(content_id.as_str()),
            KernelAction::ExecuteCell { .. } |
            KernelAction::CancelCell { .. } |
            KernelAction::DeleteCell { .. } |
            KernelAction::LaunchKernelSuccessful { .. } => None,
        }
    }
}

/// An event about a kernel, for the frontend to record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KernelEvent {
    LaunchKernelFailed {
        kernel_ref: String,
        content_ref: String,
        failure: Failure,
    },

    SetLanguageInfo {
        kernel_ref: String,
        content_ref: String,
        language_info: LanguageInfo,
    },

    SetKernelInfo {
        kernel_ref: String,
        info: KernelInfo,
    },

    RestartKernelSuccessful {
        kernel_ref: String,
        content_ref: String,
    },

    RestartKernelFailed {
        kernel_ref: String,
        content_ref: String,
        failure: Failure,
    },
}
