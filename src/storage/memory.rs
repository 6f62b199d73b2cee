use std::collections::BTreeMap;

use crate::{
    error::{Error, Result},
    sql::{schema::Table, types::Row},
    storage::engine::RowStore,
};

/// In-memory row store
#[derive(Default)]
pub struct MemoryStore {
    databases: Vec<String>,
    /// (database, table) -> schema and rows
    tables: BTreeMap<(String, String), (Table, Vec<Row>)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(table: &Table) -> (String, String) {
        (table.database.clone(), table.name.clone())
    }

    fn rows_mut(&mut self, table: &Table) -> Result<&mut Vec<Row>> {
        self.tables
            .get_mut(&Self::key(table))
            .map(|(_, rows)| rows)
            .ok_or_else(|| Error::TableNotFound(table.name.clone()))
    }
}

impl RowStore for MemoryStore {
    fn load_databases(&self) -> Result<Vec<String>> {
        Ok(self.databases.clone())
    }

    fn create_database(&mut self, name: &str) -> Result<()> {
        self.databases.push(name.to_string());
        Ok(())
    }

    fn load_tables(&self, database: &str) -> Result<Vec<Table>> {
        Ok(self
            .tables
            .iter()
            .filter(|((db, _), _)| db == database)
            .map(|(_, (table, _))| table.clone())
            .collect())
    }

    fn create_table(&mut self, table: &Table) -> Result<()> {
        self.tables
            .insert(Self::key(table), (table.clone(), Vec::new()));
        Ok(())
    }

    fn drop_table(&mut self, table: &Table) -> Result<bool> {
        Ok(self.tables.remove(&Self::key(table)).is_some())
    }

    fn read_rows(&self, table: &Table) -> Result<Vec<Row>> {
        self.tables
            .get(&Self::key(table))
            .map(|(_, rows)| rows.clone())
            .ok_or_else(|| Error::TableNotFound(table.name.clone()))
    }

    fn append_row(&mut self, table: &Table, row: &Row) -> Result<()> {
        self.rows_mut(table)?.push(row.clone());
        Ok(())
    }

    fn write_rows(&mut self, table: &Table, rows: &[Row]) -> Result<()> {
        *self.rows_mut(table)? = rows.to_vec();
        Ok(())
    }
}
