use crate::{
    error::Result,
    sql::{schema::Table, types::Row},
};

/// Persisted row store interface
///
/// Different from sql::engine::Transaction, which adds the database registry,
/// constraint checks and transaction buffering on top of this.
pub trait RowStore {
    /// Registered database names, in registration order
    fn load_databases(&self) -> Result<Vec<String>>;
    fn create_database(&mut self, name: &str) -> Result<()>;

    /// Schemas of every table in the database, sorted by name
    fn load_tables(&self, database: &str) -> Result<Vec<Table>>;
    /// Persists the schema of a new, empty table
    fn create_table(&mut self, table: &Table) -> Result<()>;
    /// Removes the table's artifacts. Returns false if any of them could not be removed.
    fn drop_table(&mut self, table: &Table) -> Result<bool>;

    fn read_rows(&self, table: &Table) -> Result<Vec<Row>>;
    /// Appends a single row
    fn append_row(&mut self, table: &Table, row: &Row) -> Result<()>;
    /// Replaces the full row set
    fn write_rows(&mut self, table: &Table, rows: &[Row]) -> Result<()>;
}
