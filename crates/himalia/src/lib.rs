/*
 * lib.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

pub mod config;
pub mod connection_file;
pub mod dispatcher;
pub mod document;
pub mod error;
pub mod event;
pub mod execution;
pub mod fixtures;
pub mod kernel;
pub mod kernel_channel;
pub mod kernel_info;
pub mod kernel_lifecycle;
pub mod router;
pub mod session;
pub mod socket;
pub mod wire;

pub use error::Error;
pub type Result<T> = std::result::Result<T, error::Error>;
