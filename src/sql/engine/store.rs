use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::{
    error::{Error, Result},
    sql::{
        schema::{Database, Table, RESERVED_NAME_CHARS},
        types::Row,
    },
    storage::engine::RowStore,
};

use super::{
    transaction::{TableKey, TransactionState},
    Transaction,
};

/// Database registry and transaction coordinator over a row store
pub struct StoreEngine<S: RowStore> {
    store: S,
    databases: BTreeMap<String, Database>,
    current: Option<String>,
    state: TransactionState,
}

impl<S: RowStore> StoreEngine<S> {
    /// Loads every registered database and its table schemas from the store
    pub fn new(store: S) -> Result<Self> {
        let mut databases = BTreeMap::new();
        for name in store.load_databases()? {
            let mut database = Database::new(&name);
            for table in store.load_tables(&name)? {
                database.add_table(table);
            }
            debug!("loaded database {} with {} table(s)", name, database.tables.len());
            databases.insert(name, database);
        }
        info!("loaded {} database(s)", databases.len());

        Ok(Self {
            store,
            databases,
            current: None,
            state: TransactionState::default(),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn auto_commit(&self) -> bool {
        self.state.auto_commit()
    }

    pub fn in_transaction(&self) -> bool {
        self.state.in_progress()
    }

    fn key(table: &Table) -> TableKey {
        (table.database.clone(), table.name.clone())
    }

    fn current_mut(&mut self) -> Result<&mut Database> {
        let name = self.current.as_ref().ok_or(Error::NoDatabaseSelected)?;
        self.databases
            .get_mut(name)
            .ok_or_else(|| Error::DatabaseNotFound(name.clone()))
    }

    /// Writes buffered row sets to the store
    fn flush(&mut self, buffers: BTreeMap<TableKey, Vec<Row>>) -> Result<()> {
        for ((database, name), rows) in buffers {
            let Some(table) = self
                .databases
                .get(&database)
                .and_then(|db| db.get_table(&name))
            else {
                continue;
            };
            debug!("flushing {} row(s) to {}.{}", rows.len(), database, name);
            self.store.write_rows(table, &rows)?;
        }
        Ok(())
    }
}

/// Names become directory and file names
fn check_name(kind: &str, name: &str) -> Result<()> {
    // `<table>_metadata` would share a file with the metadata of `<table>`
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.contains(RESERVED_NAME_CHARS)
        || name.to_lowercase().ends_with("_metadata")
    {
        return Err(Error::MalformedStatement(format!(
            "CREATE {} (invalid name {})",
            kind, name
        )));
    }
    Ok(())
}

impl<S: RowStore> Transaction for StoreEngine<S> {
    fn create_database(&mut self, name: &str) -> Result<()> {
        check_name("DATABASE", name)?;
        if self.databases.contains_key(name) {
            return Err(Error::AlreadyExists(format!("database {}", name)));
        }
        self.store.create_database(name)?;
        self.databases.insert(name.to_string(), Database::new(name));
        info!("created database {}", name);
        Ok(())
    }

    fn use_database(&mut self, name: &str) -> Result<()> {
        if !self.databases.contains_key(name) {
            return Err(Error::DatabaseNotFound(name.to_string()));
        }
        self.current = Some(name.to_string());
        Ok(())
    }

    fn current_database(&self) -> Result<&Database> {
        let name = self.current.as_ref().ok_or(Error::NoDatabaseSelected)?;
        self.get_database(name)
    }

    fn get_database(&self, name: &str) -> Result<&Database> {
        self.databases
            .get(name)
            .ok_or_else(|| Error::DatabaseNotFound(name.to_string()))
    }

    fn create_table(&mut self, mut table: Table) -> Result<()> {
        check_name("TABLE", &table.name)?;
        let database = self.current_database()?;
        table.database = database.name.clone();
        database.check_new_table(&table)?;
        self.store.create_table(&table)?;
        info!("created table {}.{}", table.database, table.name);
        self.current_mut()?.add_table(table);
        Ok(())
    }

    fn drop_table(&mut self, name: &str) -> Result<bool> {
        let table = self
            .current_mut()?
            .remove_table(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))?;
        self.state.discard(&Self::key(&table));

        let dropped = self.store.drop_table(&table)?;
        info!("dropped table {}.{} (clean: {})", table.database, table.name, dropped);
        Ok(dropped)
    }

    fn scan_table(&self, table: &Table) -> Result<Vec<Row>> {
        match self.state.buffer(&Self::key(table)) {
            Some(rows) => Ok(rows.clone()),
            None => self.store.read_rows(table),
        }
    }

    fn insert_row(&mut self, table: &Table, row: Row) -> Result<()> {
        let key = Self::key(table);
        if let Some(buffer) = self.state.buffer_mut(&key) {
            buffer.push(row);
        } else if self.state.auto_commit() {
            self.store.append_row(table, &row)?;
        } else {
            let mut rows = self.store.read_rows(table)?;
            rows.push(row);
            self.state.set_buffer(key, rows);
        }
        Ok(())
    }

    fn write_rows(&mut self, table: &Table, rows: Vec<Row>) -> Result<()> {
        let key = Self::key(table);
        if self.state.buffer(&key).is_some() || !self.state.auto_commit() {
            self.state.set_buffer(key, rows);
        } else {
            self.store.write_rows(table, &rows)?;
        }
        Ok(())
    }

    fn row_counts(&self, database: &str) -> Result<BTreeMap<String, usize>> {
        let mut counts = BTreeMap::new();
        for table in &self.get_database(database)?.tables {
            counts.insert(table.name.clone(), self.scan_table(table)?.len());
        }
        Ok(counts)
    }

    fn set_auto_commit(&mut self, enabled: bool) -> Result<()> {
        self.state.set_auto_commit(enabled);
        Ok(())
    }

    fn begin(&mut self) -> Result<()> {
        let carried = self.state.begin();
        self.flush(carried)?;
        info!("transaction started");
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        let buffers = self.state.end()?;
        self.flush(buffers)?;
        info!("transaction committed");
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        let discarded = self.state.end()?;
        info!("transaction rolled back, {} table buffer(s) discarded", discarded.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::StoreEngine;
    use crate::{
        error::{Error, Result},
        sql::{
            engine::Transaction,
            schema::{Column, Constraint, Table},
            types::{DataType, Row},
        },
        storage::{engine::RowStore, memory::MemoryStore},
    };

    fn users() -> Result<Table> {
        Ok(Table {
            database: "shop".to_string(),
            name: "users".to_string(),
            columns: vec![Column::new(
                "name",
                DataType::String,
                vec![Constraint::Unique],
                None,
            )?],
        })
    }

    fn row(name: &str) -> Row {
        Row::from([("name".to_string(), Some(name.to_string()))])
    }

    fn engine() -> Result<StoreEngine<MemoryStore>> {
        let mut engine = StoreEngine::new(MemoryStore::new())?;
        engine.create_database("shop")?;
        engine.use_database("shop")?;
        engine.create_table(users()?)?;
        Ok(engine)
    }

    #[test]
    fn test_registry() -> Result<()> {
        let mut engine = StoreEngine::new(MemoryStore::new())?;
        assert_eq!(engine.current_database(), Err(Error::NoDatabaseSelected));
        assert!(matches!(engine.create_table(users()?), Err(Error::NoDatabaseSelected)));
        assert!(matches!(engine.use_database("shop"), Err(Error::DatabaseNotFound(_))));

        engine.create_database("shop")?;
        assert!(matches!(engine.create_database("shop"), Err(Error::AlreadyExists(_))));
        assert!(matches!(engine.create_database("../etc"), Err(Error::MalformedStatement(_))));
        engine.use_database("shop")?;
        engine.create_table(users()?)?;
        assert!(matches!(engine.create_table(users()?), Err(Error::AlreadyExists(_))));
        assert_eq!(engine.current_database()?.tables.len(), 1);
        Ok(())
    }

    #[test]
    fn test_reload_from_store() -> Result<()> {
        let mut store = MemoryStore::new();
        store.create_database("shop")?;
        store.create_table(&users()?)?;

        let reloaded = StoreEngine::new(store)?;
        assert_eq!(reloaded.get_database("shop")?.tables, vec![users()?]);
        Ok(())
    }

    #[test]
    fn test_auto_commit_writes_through() -> Result<()> {
        let mut engine = engine()?;
        let table = users()?;
        engine.insert_row(&table, row("a"))?;
        engine.write_rows(&table, vec![row("b"), row("c")])?;
        assert_eq!(engine.store().read_rows(&table)?, vec![row("b"), row("c")]);
        assert_eq!(engine.row_counts("shop")?.get("users"), Some(&2));
        Ok(())
    }

    #[test]
    fn test_rollback_leaves_store_untouched() -> Result<()> {
        let mut engine = engine()?;
        let table = users()?;
        engine.insert_row(&table, row("a"))?;

        engine.begin()?;
        assert!(engine.in_transaction());
        engine.insert_row(&table, row("b"))?;
        engine.write_rows(&table, vec![row("b")])?;
        assert_eq!(engine.scan_table(&table)?, vec![row("b")]);
        assert_eq!(engine.store().read_rows(&table)?, vec![row("a")]);

        engine.rollback()?;
        assert!(!engine.in_transaction());
        assert!(engine.auto_commit());
        assert_eq!(engine.scan_table(&table)?, vec![row("a")]);
        assert_eq!(engine.rollback(), Err(Error::NoTransactionInProgress));
        Ok(())
    }

    #[test]
    fn test_commit_flushes_buffer() -> Result<()> {
        let mut engine = engine()?;
        let table = users()?;
        engine.set_auto_commit(false)?;
        engine.insert_row(&table, row("a"))?;
        engine.insert_row(&table, row("b"))?;
        assert!(engine.store().read_rows(&table)?.is_empty());

        engine.commit()?;
        assert_eq!(engine.store().read_rows(&table)?, vec![row("a"), row("b")]);
        Ok(())
    }

    #[test]
    fn test_start_transaction_flushes_earlier_work() -> Result<()> {
        let mut engine = engine()?;
        let table = users()?;
        engine.set_auto_commit(false)?;
        engine.insert_row(&table, row("a"))?;

        engine.begin()?;
        assert_eq!(engine.store().read_rows(&table)?, vec![row("a")]);
        engine.insert_row(&table, row("b"))?;
        engine.rollback()?;
        assert_eq!(engine.scan_table(&table)?, vec![row("a")]);
        assert!(!engine.auto_commit());
        Ok(())
    }

    #[test]
    fn test_reserved_table_names() -> Result<()> {
        let mut engine = engine()?;
        for name in ["users_metadata", "Users_METADATA", "a:b", "a|b", "../x", ".."] {
            let table = Table {
                name: name.to_string(),
                ..users()?
            };
            assert!(
                matches!(engine.create_table(table), Err(Error::MalformedStatement(_))),
                "{:?}",
                name
            );
        }
        assert!(matches!(
            engine.create_database("db_metadata"),
            Err(Error::MalformedStatement(_))
        ));
        assert_eq!(engine.current_database()?.tables.len(), 1);
        Ok(())
    }

    #[test]
    fn test_drop_discards_buffer() -> Result<()> {
        let mut engine = engine()?;
        let table = users()?;
        engine.begin()?;
        engine.insert_row(&table, row("a"))?;
        assert!(engine.drop_table("users")?);
        assert!(matches!(engine.drop_table("users"), Err(Error::TableNotFound(_))));
        engine.commit()?;
        assert!(engine.current_database()?.tables.is_empty());
        Ok(())
    }
}
