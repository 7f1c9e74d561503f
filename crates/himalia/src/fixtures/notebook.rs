/*
 * notebook.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use crate::document::CellRecord;
use crate::document::CellType;
use crate::document::ContentType;
use crate::document::DocumentAccess;
use crate::kernel::KernelRecord;
use crate::kernel::KernelRegistry;
use crate::kernel::KernelStatus;
use crate::kernel_channel::KernelChannel;

struct Content {
    content_type: ContentType,
    cells: HashMap<String, CellRecord>,
}

/// Documents held in memory
#[derive(Default)]
pub struct InMemoryDocuments {
    contents: Mutex<HashMap<String, Content>>,
}

impl InMemoryDocuments {
    pub fn add_content(&self, content_id: &str, content_type: ContentType) {
        self.contents.lock().unwrap().insert(String::from(content_id), Content {
            content_type,
            cells: HashMap::new(),
        });
    }

    /// Adds a cell, or replaces it. The content must have been added.
    pub fn set_cell(
        &self,
        content_id: &str,
        cell_id: &str,
        cell_type: Option<CellType>,
        source: &str,
    ) {
        let mut contents = self.contents.lock().unwrap();
        let content = contents.get_mut(content_id).unwrap();
        content.cells.insert(String::from(cell_id), CellRecord {
            cell_type,
            source: String::from(source),
        });
    }

    /// Adds a notebook with a single code cell
    pub fn add_notebook(&self, content_id: &str, cell_id: &str, source: &str) {
        self.add_content(content_id, ContentType::Notebook);
        self.set_cell(content_id, cell_id, Some(CellType::Code), source);
    }
}

impl DocumentAccess for InMemoryDocuments {
    fn content_type(&self, content_id: &str) -> Option<ContentType> {
        let contents = self.contents.lock().unwrap();
        contents.get(content_id).map(|content| content.content_type)
    }

    fn cell(&self, content_id: &str, cell_id: &str) -> Option<CellRecord> {
        let contents = self.contents.lock().unwrap();
        contents.get(content_id)?.cells.get(cell_id).cloned()
    }
}

/// Kernel connections held in memory, one per content
#[derive(Default)]
pub struct InMemoryKernels {
    kernels: Mutex<HashMap<String, KernelRecord>>,
}

impl InMemoryKernels {
    /// Records an idle kernel serving `content_id`
    pub fn connect(&self, content_id: &str, kernel_ref: &str, channel: Arc<KernelChannel>) {
        self.set(content_id, KernelRecord {
            kernel_ref: String::from(kernel_ref),
            kernel_spec_name: String::from("dummy"),
            cwd: String::from("/"),
            status: KernelStatus::Idle,
            channels: Some(channel),
        });
    }

    pub fn set(&self, content_id: &str, record: KernelRecord) {
        self.kernels
            .lock()
            .unwrap()
            .insert(String::from(content_id), record);
    }

    pub fn set_status(&self, content_id: &str, status: KernelStatus) {
        let mut kernels = self.kernels.lock().unwrap();
        let record = kernels.get_mut(content_id).unwrap();
        record.status = status;
    }
}

impl KernelRegistry for InMemoryKernels {
    fn kernel_for(&self, content_id: &str) -> Option<KernelRecord> {
        self.kernels.lock().unwrap().get(content_id).cloned()
    }
}
