use crate::{
    error::Result,
    sql::{
        engine::Transaction,
        executor::{Executor, ResultSet},
        schema::{Column, Table},
    },
};

/// CREATE DATABASE executor
pub struct CreateDatabase {
    name: String,
}

impl CreateDatabase {
    pub fn new(name: String) -> Box<Self> {
        Box::new(Self { name })
    }
}

impl<T: Transaction> Executor<T> for CreateDatabase {
    fn execute(self: Box<Self>, txn: &mut T) -> Result<ResultSet> {
        txn.create_database(&self.name)?;
        Ok(ResultSet::CreateDatabase { name: self.name })
    }
}

/// USE executor
pub struct UseDatabase {
    name: String,
}

impl UseDatabase {
    pub fn new(name: String) -> Box<Self> {
        Box::new(Self { name })
    }
}

impl<T: Transaction> Executor<T> for UseDatabase {
    fn execute(self: Box<Self>, txn: &mut T) -> Result<ResultSet> {
        txn.use_database(&self.name)?;
        Ok(ResultSet::UseDatabase { name: self.name })
    }
}

/// CREATE TABLE executor
pub struct CreateTable {
    name: String,
    columns: Vec<Column>,
}

impl CreateTable {
    pub fn new(name: String, columns: Vec<Column>) -> Box<Self> {
        Box::new(Self { name, columns })
    }
}

impl<T: Transaction> Executor<T> for CreateTable {
    fn execute(self: Box<Self>, txn: &mut T) -> Result<ResultSet> {
        let table = Table {
            database: txn.current_database()?.name.clone(),
            name: self.name.clone(),
            columns: self.columns,
        };
        txn.create_table(table)?;
        Ok(ResultSet::CreateTable {
            table_name: self.name,
        })
    }
}

/// DROP TABLE executor
pub struct DropTable {
    name: String,
}

impl DropTable {
    pub fn new(name: String) -> Box<Self> {
        Box::new(Self { name })
    }
}

impl<T: Transaction> Executor<T> for DropTable {
    fn execute(self: Box<Self>, txn: &mut T) -> Result<ResultSet> {
        let dropped = txn.drop_table(&self.name)?;
        Ok(ResultSet::DropTable {
            table_name: self.name,
            dropped,
        })
    }
}
