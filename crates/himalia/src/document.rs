/*
 * document.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

/// The kind of a piece of content. Only notebooks have executable cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Notebook,
    File,
    Directory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    Code,
    Markdown,
    Raw,
}

/// What the execution pipeline needs to know about a cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellRecord {
    /// Absent when the document doesn't say
    pub cell_type: Option<CellType>,
    pub source: String,
}

/// Read access to the documents open in the frontend.
pub trait DocumentAccess: Send + Sync {
    /// The kind of the content, or `None` if there's no such content.
    fn content_type(&self, content_id: &str) -> Option<ContentType>;

    /// A cell of a notebook, or `None` if there's no such cell.
    fn cell(&self, content_id: &str, cell_id: &str) -> Option<CellRecord>;
}
