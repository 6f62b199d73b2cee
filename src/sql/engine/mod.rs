use std::collections::BTreeMap;

use tracing::debug;

use crate::error::Result;

use super::{
    executor::{Executor, ResultSet},
    parser::{is_exit, Parser},
    schema::{Database, Table},
    types::Row,
};

mod store;
mod transaction;

pub use store::StoreEngine;

/// Data access seam used by the executors (registry, schema, rows, transactions)
///
/// Row reads and writes go to the table's buffer when one is active and to
/// the persisted store otherwise.
pub trait Transaction {
    fn create_database(&mut self, name: &str) -> Result<()>;
    /// Sets the database targeted by table statements
    fn use_database(&mut self, name: &str) -> Result<()>;
    fn current_database(&self) -> Result<&Database>;
    fn get_database(&self, name: &str) -> Result<&Database>;

    /// Registers a table in the current database and persists its schema
    fn create_table(&mut self, table: Table) -> Result<()>;
    /// Returns false if the table's files were only partially removed
    fn drop_table(&mut self, name: &str) -> Result<bool>;
    /// Returns table info from the current database, error if it doesn't exist
    fn must_get_table(&self, name: &str) -> Result<Table> {
        Ok(self.current_database()?.must_get_table(name)?.clone())
    }

    /// Current row set of the table
    fn scan_table(&self, table: &Table) -> Result<Vec<Row>>;
    fn insert_row(&mut self, table: &Table, row: Row) -> Result<()>;
    /// Replaces the table's full row set
    fn write_rows(&mut self, table: &Table, rows: Vec<Row>) -> Result<()>;
    /// Table name -> row count
    fn row_counts(&self, database: &str) -> Result<BTreeMap<String, usize>>;

    fn set_auto_commit(&mut self, enabled: bool) -> Result<()>;
    fn begin(&mut self) -> Result<()>;
    fn commit(&mut self) -> Result<()>;
    fn rollback(&mut self) -> Result<()>;
}

/// Session for executing statements
pub struct Session<T: Transaction> {
    txn: T,
}

impl<T: Transaction + 'static> Session<T> {
    pub fn new(txn: T) -> Self {
        Self { txn }
    }

    /// Executes one line of command text
    pub fn execute(&mut self, sql: &str) -> Result<ResultSet> {
        if is_exit(sql) {
            return Ok(ResultSet::Exit);
        }
        let stmt = Parser::new(sql).parse()?;
        debug!("executing {:?}", stmt);
        <dyn Executor<T>>::build(stmt).execute(&mut self.txn)
    }

    pub fn transaction(&self) -> &T {
        &self.txn
    }
}
