use crate::sql::{condition::Condition, schema::Column};

/// Validated statement operands, one variant per statement kind
#[derive(Debug, PartialEq)]
pub enum Statement {
    /// CREATE DATABASE name
    CreateDatabase { name: String },
    /// CREATE TABLE name (col type [constraint|foreign_key t.c]*, ...)
    ///
    /// Foreign key targets are checked against the database at execution time.
    CreateTable { name: String, columns: Vec<Column> },
    /// USE name
    UseDatabase { name: String },
    /// INSERT INTO name [(col, ...)] VALUES (v, ...)
    Insert {
        table_name: String,
        /// None means every column of the table, in schema order
        columns: Option<Vec<String>>,
        values: Vec<Option<String>>,
    },
    /// SELECT cols|* FROM name [WHERE cond]
    Select {
        table_name: String,
        /// None means `*`
        columns: Option<Vec<String>>,
        filter: Option<Condition>,
    },
    /// UPDATE name SET col = value WHERE cond
    Update {
        table_name: String,
        column: String,
        value: Option<String>,
        filter: Condition,
    },
    /// DELETE FROM name WHERE cond
    Delete { table_name: String, filter: Condition },
    /// DROP TABLE name
    DropTable { name: String },
    /// SET AUTOCOMMIT = 0|1
    SetAutoCommit { enabled: bool },
    StartTransaction,
    Commit,
    Rollback,
}
