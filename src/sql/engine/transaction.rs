use std::collections::BTreeMap;

use crate::{
    error::{Error, Result},
    sql::types::Row,
};

/// (database, table)
pub type TableKey = (String, String);

/// Auto-commit flag and per-table row buffers
///
/// `in_progress` is an explicit START TRANSACTION. With auto-commit off and no
/// explicit transaction, mutations still buffer and COMMIT/ROLLBACK end that
/// implicit scope.
#[derive(Debug)]
pub struct TransactionState {
    auto_commit: bool,
    in_progress: bool,
    /// Restored when an explicit transaction ends
    auto_commit_before: bool,
    buffers: BTreeMap<TableKey, Vec<Row>>,
}

impl Default for TransactionState {
    fn default() -> Self {
        Self {
            auto_commit: true,
            in_progress: false,
            auto_commit_before: true,
            buffers: BTreeMap::new(),
        }
    }
}

impl TransactionState {
    pub fn auto_commit(&self) -> bool {
        self.auto_commit
    }

    pub fn in_progress(&self) -> bool {
        self.in_progress
    }

    /// During an explicit transaction the flag stays off and the new value
    /// is applied when the transaction ends.
    pub fn set_auto_commit(&mut self, enabled: bool) {
        if self.in_progress {
            self.auto_commit_before = enabled;
        } else {
            self.auto_commit = enabled;
        }
    }

    /// Starts an explicit transaction, returning the buffers left over from
    /// earlier work. The caller flushes them.
    pub fn begin(&mut self) -> BTreeMap<TableKey, Vec<Row>> {
        let carried = std::mem::take(&mut self.buffers);
        if !self.in_progress {
            self.auto_commit_before = self.auto_commit;
        }
        self.in_progress = true;
        self.auto_commit = false;
        carried
    }

    /// Ends the current transaction scope, returning its buffers
    pub fn end(&mut self) -> Result<BTreeMap<TableKey, Vec<Row>>> {
        if !self.in_progress && self.auto_commit {
            return Err(Error::NoTransactionInProgress);
        }
        if self.in_progress {
            self.in_progress = false;
            self.auto_commit = self.auto_commit_before;
        }
        Ok(std::mem::take(&mut self.buffers))
    }

    pub fn buffer(&self, key: &TableKey) -> Option<&Vec<Row>> {
        self.buffers.get(key)
    }

    pub fn buffer_mut(&mut self, key: &TableKey) -> Option<&mut Vec<Row>> {
        self.buffers.get_mut(key)
    }

    pub fn set_buffer(&mut self, key: TableKey, rows: Vec<Row>) {
        self.buffers.insert(key, rows);
    }

    pub fn discard(&mut self, key: &TableKey) {
        self.buffers.remove(key);
    }
}
