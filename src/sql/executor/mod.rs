use std::fmt::Display;

use crate::{
    error::Result,
    sql::{
        engine::Transaction,
        executor::{
            mutation::{Delete, Insert, Update},
            query::{render_table, Scan},
            schema::{CreateDatabase, CreateTable, DropTable, UseDatabase},
            transaction::{Begin, Commit, Rollback, SetAutoCommit},
        },
        parser::ast::Statement,
        types::Row,
    },
};

mod mutation;
mod query;
mod schema;
mod transaction;

/// Widest a select column is rendered before its values wrap
pub const DEFAULT_MAX_WIDTH: usize = 50;

/// SQL executor trait
pub trait Executor<T: Transaction> {
    fn execute(self: Box<Self>, txn: &mut T) -> Result<ResultSet>;
}

/// Builds an executor from a parsed statement
impl<T: Transaction + 'static> dyn Executor<T> {
    pub fn build(stmt: Statement) -> Box<dyn Executor<T>> {
        match stmt {
            Statement::CreateDatabase { name } => CreateDatabase::new(name),
            Statement::UseDatabase { name } => UseDatabase::new(name),
            Statement::CreateTable { name, columns } => CreateTable::new(name, columns),
            Statement::DropTable { name } => DropTable::new(name),
            Statement::Insert {
                table_name,
                columns,
                values,
            } => Insert::new(table_name, columns, values),
            Statement::Select {
                table_name,
                columns,
                filter,
            } => Scan::new(table_name, columns, filter),
            Statement::Update {
                table_name,
                column,
                value,
                filter,
            } => Update::new(table_name, column, value, filter),
            Statement::Delete { table_name, filter } => Delete::new(table_name, filter),
            Statement::SetAutoCommit { enabled } => SetAutoCommit::new(enabled),
            Statement::StartTransaction => Box::new(Begin),
            Statement::Commit => Box::new(Commit),
            Statement::Rollback => Box::new(Rollback),
        }
    }
}

/// Execution result set
#[derive(Debug, PartialEq)]
pub enum ResultSet {
    CreateDatabase { name: String },
    UseDatabase { name: String },
    CreateTable { table_name: String },
    /// `dropped` is false when the table's files were only partially removed
    DropTable { table_name: String, dropped: bool },
    Insert { count: usize },
    Scan {
        /// Projection order
        columns: Vec<String>,
        /// Projected rows, keyed by column name
        rows: Vec<Row>,
    },
    Update { count: usize },
    Delete { count: usize },
    SetAutoCommit { enabled: bool },
    Begin,
    Commit,
    Rollback,
    /// The command loop should stop
    Exit,
}

impl ResultSet {
    /// User-visible text, wrapping select values longer than `max_width`
    pub fn render(&self, max_width: usize) -> String {
        match self {
            ResultSet::Scan { columns, rows } => render_table(columns, rows, max_width),
            other => other.to_string(),
        }
    }
}

impl Display for ResultSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultSet::CreateDatabase { name } => write!(f, "Database created: {}", name),
            ResultSet::UseDatabase { name } => write!(f, "Using database: {}", name),
            ResultSet::CreateTable { table_name } => write!(f, "Table created: {}", table_name),
            ResultSet::DropTable {
                table_name,
                dropped: true,
            } => write!(f, "Table dropped: {}", table_name),
            ResultSet::DropTable {
                table_name,
                dropped: false,
            } => write!(f, "Failed to drop table: {}", table_name),
            ResultSet::Insert { .. } => write!(f, "Row added successfully."),
            ResultSet::Scan { columns, rows } => {
                write!(f, "{}", render_table(columns, rows, DEFAULT_MAX_WIDTH))
            }
            ResultSet::Update { count } => write!(f, "{} row(s) affected.", count),
            ResultSet::Delete { count } => write!(f, "{} row(s) deleted successfully.", count),
            ResultSet::SetAutoCommit { enabled } => {
                write!(f, "Set auto commit status set to: {}", enabled)
            }
            ResultSet::Begin => write!(f, "Started transaction"),
            ResultSet::Commit => write!(f, "Changes committed"),
            ResultSet::Rollback => write!(f, "Changes rolled back"),
            ResultSet::Exit => write!(f, "Bye"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ResultSet;
    use crate::{
        error::{Error, Result},
        sql::{
            engine::{Session, StoreEngine, Transaction},
            types::Row,
        },
        storage::{engine::RowStore, file::FileStore, memory::MemoryStore},
    };

    fn session() -> Result<Session<StoreEngine<MemoryStore>>> {
        let mut session = Session::new(StoreEngine::new(MemoryStore::new())?);
        session.execute("CREATE DATABASE shop")?;
        session.execute("USE shop")?;
        session.execute(
            "CREATE TABLE users (id int primary_key auto_increment, name string non_null);",
        )?;
        Ok(session)
    }

    fn scan<T: Transaction + 'static>(session: &mut Session<T>, sql: &str) -> Result<Vec<Row>> {
        match session.execute(sql)? {
            ResultSet::Scan { rows, .. } => Ok(rows),
            other => panic!("expected scan, got {:?}", other),
        }
    }

    fn user(id: &str, name: &str) -> Row {
        Row::from([
            ("id".to_string(), Some(id.to_string())),
            ("name".to_string(), Some(name.to_string())),
        ])
    }

    #[test]
    fn test_insert_then_select_by_id() -> Result<()> {
        let mut session = session()?;
        assert_eq!(
            session.execute("INSERT INTO users (name) VALUES ('Alice')")?,
            ResultSet::Insert { count: 1 }
        );
        assert_eq!(
            scan(&mut session, "SELECT * FROM users WHERE id = 1")?,
            vec![user("1", "Alice")]
        );
        Ok(())
    }

    #[test]
    fn test_rollback_discards_manual_insert() -> Result<()> {
        let mut session = session()?;
        session.execute("INSERT INTO users (name) VALUES ('Alice')")?;
        session.execute("SET AUTOCOMMIT = 0")?;
        session.execute("INSERT INTO users (name) VALUES ('Bob')")?;
        assert_eq!(scan(&mut session, "SELECT * FROM users")?.len(), 2);

        assert_eq!(session.execute("ROLLBACK")?, ResultSet::Rollback);
        assert_eq!(scan(&mut session, "SELECT * FROM users")?, vec![user("1", "Alice")]);
        Ok(())
    }

    #[test]
    fn test_delete_then_select() -> Result<()> {
        let mut session = session()?;
        session.execute("INSERT INTO users (name) VALUES ('Alice')")?;
        session.execute("INSERT INTO users (name) VALUES ('Bob')")?;
        assert_eq!(
            session.execute("DELETE FROM users WHERE id = 1")?,
            ResultSet::Delete { count: 1 }
        );
        assert!(scan(&mut session, "SELECT * FROM users WHERE id = 1")?.is_empty());
        assert_eq!(scan(&mut session, "SELECT * FROM users")?, vec![user("2", "Bob")]);
        Ok(())
    }

    #[test]
    fn test_unique_violation_is_not_persisted() -> Result<()> {
        let mut session = session()?;
        session.execute("CREATE TABLE codes (code int primary_key, label string unique)")?;
        session.execute("INSERT INTO codes VALUES (1, 'red')")?;
        for sql in [
            "INSERT INTO codes VALUES (1, 'blue')",
            "INSERT INTO codes VALUES (2, 'red')",
            "INSERT INTO codes (label) VALUES ('green')",
        ] {
            assert!(session.execute(sql).is_err(), "{}", sql);
        }
        assert!(matches!(
            session.execute("INSERT INTO codes VALUES (2, 'red')"),
            Err(Error::ConstraintViolation(_))
        ));
        assert!(matches!(
            session.execute("INSERT INTO codes (label) VALUES ('green')"),
            Err(Error::MissingRequiredValue(_))
        ));
        assert_eq!(scan(&mut session, "SELECT * FROM codes")?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_le_and_lt_boundary() -> Result<()> {
        let mut session = session()?;
        for name in ["a", "b", "c", "d", "e", "f"] {
            session.execute(&format!("INSERT INTO users (name) VALUES ('{}')", name))?;
        }
        assert_eq!(scan(&mut session, "SELECT id FROM users WHERE id <= 5")?.len(), 5);
        assert_eq!(scan(&mut session, "SELECT id FROM users WHERE id < 5")?.len(), 4);
        assert_eq!(scan(&mut session, "SELECT id FROM users WHERE id >= 5")?.len(), 2);
        Ok(())
    }

    #[test]
    fn test_buffered_uniqueness_sees_buffer() -> Result<()> {
        let mut session = session()?;
        session.execute("CREATE TABLE tags (label string unique)")?;
        session.execute("START TRANSACTION")?;
        session.execute("INSERT INTO tags VALUES ('red')")?;
        assert!(matches!(
            session.execute("INSERT INTO tags VALUES ('red')"),
            Err(Error::ConstraintViolation(_))
        ));
        session.execute("COMMIT")?;
        assert_eq!(scan(&mut session, "SELECT * FROM tags")?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_transaction_statements() -> Result<()> {
        let mut session = session()?;
        assert_eq!(
            session.execute("COMMIT"),
            Err(Error::NoTransactionInProgress)
        );
        assert_eq!(session.execute("START TRANSACTION")?, ResultSet::Begin);
        session.execute("INSERT INTO users (name) VALUES ('Alice')")?;
        assert_eq!(session.execute("commit;")?, ResultSet::Commit);
        assert_eq!(
            session.execute("ROLLBACK"),
            Err(Error::NoTransactionInProgress)
        );
        assert_eq!(
            session.execute("SET AUTOCOMMIT = 1")?.to_string(),
            "Set auto commit status set to: true"
        );
        assert_eq!(session.execute("exit")?, ResultSet::Exit);
        Ok(())
    }

    #[test]
    fn test_commit_is_durable_on_disk() -> Result<()> {
        let dir = tempfile::tempdir()?;
        {
            let mut session = Session::new(StoreEngine::new(FileStore::new(dir.path())?)?);
            session.execute("CREATE DATABASE shop")?;
            session.execute("USE shop")?;
            session.execute("CREATE TABLE users (id int primary_key auto_increment, name string)")?;
            session.execute("INSERT INTO users (name) VALUES ('Alice')")?;

            session.execute("START TRANSACTION")?;
            session.execute("INSERT INTO users (name) VALUES ('Bob')")?;
            session.execute("UPDATE users SET name = 'Alicia' WHERE id = 1")?;
            let users = session.transaction().current_database()?.must_get_table("users")?.clone();
            assert_eq!(session.transaction().store().read_rows(&users)?.len(), 1);
            session.execute("COMMIT")?;
        }

        let mut session = Session::new(StoreEngine::new(FileStore::new(dir.path())?)?);
        session.execute("USE shop")?;
        assert_eq!(
            scan(&mut session, "SELECT * FROM users")?,
            vec![user("1", "Alicia"), user("2", "Bob")]
        );
        Ok(())
    }

    #[test]
    fn test_rollback_leaves_disk_unchanged() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut session = Session::new(StoreEngine::new(FileStore::new(dir.path())?)?);
        session.execute("CREATE DATABASE shop")?;
        session.execute("USE shop")?;
        session.execute("CREATE TABLE users (id int primary_key auto_increment, name string)")?;
        session.execute("INSERT INTO users (name) VALUES ('Alice')")?;
        session.execute("INSERT INTO users (name) VALUES ('Bob')")?;
        let path = dir.path().join("shop").join("users.txt");
        let before = std::fs::read_to_string(&path)?;

        session.execute("START TRANSACTION")?;
        session.execute("INSERT INTO users (name) VALUES ('Carol')")?;
        session.execute("UPDATE users SET name = 'Al' WHERE id = 1")?;
        session.execute("DELETE FROM users WHERE id = 2")?;
        session.execute("ROLLBACK")?;

        assert_eq!(std::fs::read_to_string(&path)?, before);
        assert_eq!(scan(&mut session, "SELECT * FROM users")?.len(), 2);
        Ok(())
    }

    #[test]
    fn test_rejected_names_keep_disk_reopenable() -> Result<()> {
        let dir = tempfile::tempdir()?;
        {
            let mut session = Session::new(StoreEngine::new(FileStore::new(dir.path())?)?);
            session.execute("CREATE DATABASE shop")?;
            session.execute("USE shop")?;
            session.execute("CREATE TABLE a (id int, note string)")?;
            assert!(matches!(
                session.execute("CREATE TABLE t (a:b int)"),
                Err(Error::InvalidColumnDefinition(_))
            ));
            assert!(matches!(
                session.execute("CREATE TABLE a_metadata (id int)"),
                Err(Error::MalformedStatement(_))
            ));
            session.execute("INSERT INTO a VALUES (1, 'kept')")?;
        }

        let mut session = Session::new(StoreEngine::new(FileStore::new(dir.path())?)?);
        session.execute("USE shop")?;
        let tables = session.transaction().current_database()?.tables.clone();
        assert_eq!(tables.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(scan(&mut session, "SELECT note FROM a")?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_messages() -> Result<()> {
        let mut session = session()?;
        assert_eq!(
            session.execute("CREATE DATABASE blog")?.to_string(),
            "Database created: blog"
        );
        assert_eq!(session.execute("USE blog")?.to_string(), "Using database: blog");
        assert_eq!(
            session.execute("CREATE TABLE posts (title string)")?.to_string(),
            "Table created: posts"
        );
        assert_eq!(
            session.execute("INSERT INTO posts VALUES ('x')")?.to_string(),
            "Row added successfully."
        );
        assert_eq!(
            session.execute("UPDATE posts SET title = 'y' WHERE title = 'x'")?.to_string(),
            "1 row(s) affected."
        );
        assert_eq!(
            session.execute("DELETE FROM posts WHERE title = 'y'")?.to_string(),
            "1 row(s) deleted successfully."
        );
        assert_eq!(
            session.execute("SELECT * FROM posts")?.to_string(),
            "No rows found."
        );
        assert_eq!(
            session.execute("DROP TABLE posts")?.to_string(),
            "Table dropped: posts"
        );
        assert!(matches!(
            session.execute("SELECT * FROM posts"),
            Err(Error::TableNotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn test_statements_need_a_database() -> Result<()> {
        let mut session = Session::new(StoreEngine::new(MemoryStore::new())?);
        for sql in [
            "CREATE TABLE t (a int)",
            "SELECT * FROM t",
            "INSERT INTO t VALUES (1)",
            "DROP TABLE t",
        ] {
            assert_eq!(session.execute(sql), Err(Error::NoDatabaseSelected), "{}", sql);
        }
        assert!(matches!(
            session.execute("HELLO"),
            Err(Error::UnknownStatement(_))
        ));
        Ok(())
    }
}
