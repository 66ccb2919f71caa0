// src/table_state.rs
use std::collections::HashMap;

use chrono::{DateTime, Local};

use crate::data_types::{CellCoord, OrderField, OrderRecord, OrderStatus, SheetSnapshot, Summary};
use crate::transform::locate;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Draft {
    text: String,
    saving: bool,
}

/// A cell write the table is waiting on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingWrite {
    pub tab: String,
    pub id: usize,
    pub field: OrderField,
    pub coord: CellCoord,
    pub value: String,
}

/// Records of the selected tab plus the cells currently being edited.
///
/// Edits never touch a record directly: a draft is applied only once its
/// write has been confirmed.
#[derive(Debug)]
pub struct TableView {
    tab: String,
    records: Vec<OrderRecord>,
    summary: Summary,
    loading: bool,
    fetched_at: Option<DateTime<Local>>,
    edits: HashMap<(usize, OrderField), Draft>,
}

impl TableView {
    pub fn new(tab: &str) -> Self {
        TableView {
            tab: tab.to_string(),
            records: Vec::new(),
            summary: Summary::default(),
            loading: true,
            fetched_at: None,
            edits: HashMap::new(),
        }
    }

    pub fn tab(&self) -> &str {
        &self.tab
    }

    pub fn records(&self) -> &[OrderRecord] {
        &self.records
    }

    pub fn summary(&self) -> Summary {
        self.summary
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn fetched_at(&self) -> Option<DateTime<Local>> {
        self.fetched_at
    }

    /// Switches tab, dropping everything loaded or edited for the old one.
    pub fn select_tab(&mut self, tab: &str) {
        *self = TableView::new(tab);
    }

    /// Starts a re-fetch of the current tab.
    pub fn reload(&mut self) {
        self.loading = true;
    }

    pub fn load(&mut self, snapshot: SheetSnapshot) {
        // Ids are reassigned on every fetch, so old drafts cannot carry over
        self.records = snapshot.records;
        self.summary = snapshot.summary;
        self.fetched_at = Some(snapshot.fetched_at);
        self.edits.clear();
        self.loading = false;
    }

    pub fn load_failed(&mut self) {
        self.records.clear();
        self.summary = Summary::default();
        self.edits.clear();
        self.loading = false;
    }

    pub fn is_editing(&self, id: usize, field: OrderField) -> bool {
        self.edits.contains_key(&(id, field))
    }

    pub fn is_saving(&self, id: usize, field: OrderField) -> bool {
        self.edits.get(&(id, field)).map_or(false, |d| d.saving)
    }

    pub fn draft(&self, id: usize, field: OrderField) -> Option<&str> {
        self.edits.get(&(id, field)).map(|d| d.text.as_str())
    }

    pub fn edit_count(&self) -> usize {
        self.edits.len()
    }

    fn record(&self, id: usize) -> Option<&OrderRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Opens a text editor on the cell, or closes it and drops the draft.
    /// Status is chosen from a fixed list and never opens an editor.
    pub fn toggle_edit(&mut self, id: usize, field: OrderField) {
        if field == OrderField::Status {
            return;
        }
        if self.edits.remove(&(id, field)).is_some() {
            return;
        }
        if let Some(text) = self.record(id).map(|r| r.field_text(field)) {
            self.edits.insert((id, field), Draft { text, saving: false });
        }
    }

    pub fn update_draft(&mut self, id: usize, field: OrderField, text: String) {
        if let Some(draft) = self.edits.get_mut(&(id, field)) {
            draft.text = text;
        }
    }

    /// Turns the cell's draft into a write. `None` if the cell is not being
    /// edited or a write for it is already in flight.
    pub fn commit(&mut self, id: usize, field: OrderField) -> Option<PendingWrite> {
        let draft = self.edits.get_mut(&(id, field))?;
        if draft.saving {
            return None;
        }
        draft.saving = true;
        Some(PendingWrite {
            tab: self.tab.clone(),
            id,
            field,
            coord: locate(id, field),
            value: draft.text.clone(),
        })
    }

    pub fn pick_status(&mut self, id: usize, status: OrderStatus) -> Option<PendingWrite> {
        // No draft here: the picked value is written straight away
        self.record(id)?;
        Some(PendingWrite {
            tab: self.tab.clone(),
            id,
            field: OrderField::Status,
            coord: locate(id, OrderField::Status),
            value: status.label().to_string(),
        })
    }

    /// Applies a confirmed write to its record and closes the editor. A
    /// failed write leaves the record alone and keeps the editor open.
    pub fn finish_write(&mut self, write: &PendingWrite, success: bool) {
        // Tab changed while the write was in flight; ids now belong to other rows
        if write.tab != self.tab {
            return;
        }
        let key = (write.id, write.field);
        if !success {
            // Keep the draft so the user can retry
            if let Some(draft) = self.edits.get_mut(&key) {
                draft.saving = false;
            }
            return;
        }

        if let Some(record) = self.records.iter_mut().find(|r| r.id == write.id) {
            record.apply(write.field, &write.value);
        }
        self.edits.remove(&key);
    }
}
