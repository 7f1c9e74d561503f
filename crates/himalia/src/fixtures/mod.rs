/*
 * mod.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

//! Test doubles for the other side of a kernel connection and for the
//! frontend's document and kernel bookkeeping.

pub mod dummy_kernel;
pub mod notebook;
