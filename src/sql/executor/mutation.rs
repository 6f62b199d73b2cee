use std::collections::HashMap;

use crate::{
    error::{Error, Result},
    sql::{
        condition::Condition,
        engine::Transaction,
        executor::ResultSet,
        schema::{Column, Constraint, Table},
        types::Row,
    },
};

use super::Executor;

/// INSERT executor
pub struct Insert {
    table_name: String,
    columns: Option<Vec<String>>,
    values: Vec<Option<String>>,
}

impl Insert {
    pub fn new(
        table_name: String,
        columns: Option<Vec<String>>,
        values: Vec<Option<String>>,
    ) -> Box<Self> {
        Box::new(Self {
            table_name,
            columns,
            values,
        })
    }
}

/// Next value of an auto_increment column: max existing integer + 1, or 1
fn next_auto_increment(table: &Table, column: &Column, rows: &[Row]) -> Result<i64> {
    let max = rows
        .iter()
        .filter_map(|r| r.get(&column.name)?.as_deref()?.parse::<i64>().ok())
        .max();
    match max {
        None => Ok(1),
        Some(max) => max.checked_add(1).ok_or_else(|| {
            Error::ConstraintViolation(format!(
                "auto_increment column {}.{} is exhausted at {}",
                table.name, column.name, max
            ))
        }),
    }
}

/// Checks a value about to be stored against the column's type and constraints.
/// `others` are the rows the value must not collide with.
fn check_value<'a>(
    table: &Table,
    column: &Column,
    value: Option<&str>,
    others: impl IntoIterator<Item = &'a Row>,
) -> Result<()> {
    let Some(value) = value else {
        if column.is_required() {
            return Err(Error::ConstraintViolation(format!(
                "column {}.{} cannot be null",
                table.name, column.name
            )));
        }
        return Ok(());
    };
    if column.is_required() && value.eq_ignore_ascii_case("null") {
        return Err(Error::ConstraintViolation(format!(
            "column {}.{} cannot be null",
            table.name, column.name
        )));
    }
    column.datatype.validate(&column.name, value)?;

    if column.is_unique()
        && others
            .into_iter()
            .any(|r| r.get(&column.name).and_then(|v| v.as_deref()) == Some(value))
    {
        return Err(Error::ConstraintViolation(format!(
            "duplicate value {} for {} column {}.{}",
            value,
            if column.has(Constraint::PrimaryKey) {
                "primary_key"
            } else {
                "unique"
            },
            table.name,
            column.name
        )));
    }
    Ok(())
}

// Builds the row to insert, one value per table column in schema order:
// auto_increment first, then the supplied value, then absent if allowed.
fn make_row(
    table: &Table,
    columns: &[String],
    values: &[Option<String>],
    rows: &[Row],
) -> Result<Row> {
    if columns.len() != values.len() {
        return Err(Error::ColumnValueCountMismatch {
            columns: columns.len(),
            values: values.len(),
        });
    }

    let mut inputs = HashMap::new();
    for (name, value) in columns.iter().zip(values) {
        let column = table.must_get_column(name)?;
        inputs.insert(column.name.as_str(), value.as_deref());
    }

    let mut row = Row::new();
    for col in &table.columns {
        let value = if col.has(Constraint::AutoIncrement) {
            Some(next_auto_increment(table, col, rows)?.to_string())
        } else if let Some(value) = inputs.get(col.name.as_str()) {
            check_value(table, col, *value, rows)?;
            value.map(str::to_string)
        } else if col.is_required() {
            return Err(Error::MissingRequiredValue(format!("{}.{}", table.name, col.name)));
        } else {
            None
        };
        row.insert(col.name.clone(), value);
    }
    Ok(row)
}

impl<T: Transaction> Executor<T> for Insert {
    fn execute(self: Box<Self>, txn: &mut T) -> Result<ResultSet> {
        let table = txn.must_get_table(&self.table_name)?;
        let rows = txn.scan_table(&table)?;
        let columns = self.columns.unwrap_or_else(|| table.column_names());

        let row = make_row(&table, &columns, &self.values, &rows)?;
        txn.insert_row(&table, row)?;
        Ok(ResultSet::Insert { count: 1 })
    }
}

/// UPDATE executor
pub struct Update {
    table_name: String,
    column: String,
    value: Option<String>,
    filter: Condition,
}

impl Update {
    pub fn new(
        table_name: String,
        column: String,
        value: Option<String>,
        filter: Condition,
    ) -> Box<Self> {
        Box::new(Self {
            table_name,
            column,
            value,
            filter,
        })
    }
}

impl<T: Transaction> Executor<T> for Update {
    fn execute(self: Box<Self>, txn: &mut T) -> Result<ResultSet> {
        let table = txn.must_get_table(&self.table_name)?;
        let column = table.must_get_column(&self.column)?;
        table.must_get_column(&self.filter.column)?;

        let mut rows = txn.scan_table(&table)?;
        let (matched, others): (Vec<&Row>, Vec<&Row>) =
            rows.iter().partition(|r| self.filter.evaluate(r));
        let count = matched.len();
        if count == 0 {
            return Ok(ResultSet::Update { count });
        }

        check_value(&table, column, self.value.as_deref(), others)?;
        if column.is_unique() && self.value.is_some() && count > 1 {
            return Err(Error::ConstraintViolation(format!(
                "{} rows would share the value of unique column {}.{}",
                count, table.name, column.name
            )));
        }

        for row in rows.iter_mut().filter(|r| self.filter.evaluate(r)) {
            row.insert(column.name.clone(), self.value.clone());
        }
        txn.write_rows(&table, rows)?;
        Ok(ResultSet::Update { count })
    }
}

/// DELETE executor
pub struct Delete {
    table_name: String,
    filter: Condition,
}

impl Delete {
    pub fn new(table_name: String, filter: Condition) -> Box<Self> {
        Box::new(Self { table_name, filter })
    }
}

impl<T: Transaction> Executor<T> for Delete {
    fn execute(self: Box<Self>, txn: &mut T) -> Result<ResultSet> {
        let table = txn.must_get_table(&self.table_name)?;
        table.must_get_column(&self.filter.column)?;

        let rows = txn.scan_table(&table)?;
        let before = rows.len();
        let kept = rows
            .into_iter()
            .filter(|r| !self.filter.evaluate(r))
            .collect::<Vec<_>>();
        let count = before - kept.len();
        if count > 0 {
            txn.write_rows(&table, kept)?;
        }
        Ok(ResultSet::Delete { count })
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        error::{Error, Result},
        sql::{
            engine::{Session, StoreEngine},
            executor::ResultSet,
        },
        storage::memory::MemoryStore,
    };

    fn session() -> Result<Session<StoreEngine<MemoryStore>>> {
        let mut session = Session::new(StoreEngine::new(MemoryStore::new())?);
        session.execute("CREATE DATABASE shop")?;
        session.execute("USE shop")?;
        session.execute(
            "CREATE TABLE items (id int primary_key auto_increment, sku string unique, \
             price double non_null, note string)",
        )?;
        Ok(session)
    }

    #[test]
    fn test_insert_checks() -> Result<()> {
        let mut session = session()?;
        session.execute("INSERT INTO items (sku, price) VALUES ('a1', 9.5)")?;

        assert_eq!(
            session.execute("INSERT INTO items (sku, price) VALUES ('a2')"),
            Err(Error::ColumnValueCountMismatch {
                columns: 2,
                values: 1
            })
        );
        assert!(matches!(
            session.execute("INSERT INTO items (sku, price) VALUES ('a2', 'cheap')"),
            Err(Error::TypeMismatch(_))
        ));
        assert!(matches!(
            session.execute("INSERT INTO items (sku, price) VALUES ('a2', null)"),
            Err(Error::ConstraintViolation(_))
        ));
        assert!(matches!(
            session.execute("INSERT INTO items (sku) VALUES ('a2')"),
            Err(Error::MissingRequiredValue(_))
        ));
        assert!(matches!(
            session.execute("INSERT INTO items (sku, weight) VALUES ('a2', 1)"),
            Err(Error::ColumnNotFound(_))
        ));
        assert!(matches!(
            session.execute("INSERT INTO missing VALUES (1)"),
            Err(Error::TableNotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn test_auto_increment_follows_max() -> Result<()> {
        let mut session = session()?;
        for sku in ["a", "b", "c"] {
            session.execute(&format!("INSERT INTO items (sku, price) VALUES ('{}', 1)", sku))?;
        }
        session.execute("DELETE FROM items WHERE id = 2")?;
        session.execute("INSERT INTO items (sku, price) VALUES ('d', 1)")?;
        let ResultSet::Scan { rows, .. } =
            session.execute("SELECT id FROM items WHERE sku = 'd'")?
        else {
            panic!("expected scan");
        };
        assert_eq!(rows[0].get("id"), Some(&Some("4".to_string())));
        Ok(())
    }

    #[test]
    fn test_auto_increment_exhausted() -> Result<()> {
        let mut session = session()?;
        session.execute("INSERT INTO items (sku, price) VALUES ('a', 1)")?;
        session.execute(&format!("UPDATE items SET id = {} WHERE id = 1", i64::MAX))?;
        assert!(matches!(
            session.execute("INSERT INTO items (sku, price) VALUES ('b', 1)"),
            Err(Error::ConstraintViolation(_))
        ));

        let ResultSet::Scan { rows, .. } = session.execute("SELECT * FROM items")? else {
            panic!("expected scan");
        };
        assert_eq!(rows.len(), 1);
        Ok(())
    }

    #[test]
    fn test_update() -> Result<()> {
        let mut session = session()?;
        session.execute("INSERT INTO items (sku, price) VALUES ('a', 1)")?;
        session.execute("INSERT INTO items (sku, price) VALUES ('b', 2)")?;

        assert_eq!(
            session.execute("UPDATE items SET note = 'cheap' WHERE price < 5")?,
            ResultSet::Update { count: 2 }
        );
        assert_eq!(
            session.execute("UPDATE items SET note = null WHERE id = 9")?,
            ResultSet::Update { count: 0 }
        );
        assert!(matches!(
            session.execute("UPDATE items SET sku = 'a' WHERE id = 2"),
            Err(Error::ConstraintViolation(_))
        ));
        assert!(matches!(
            session.execute("UPDATE items SET sku = 'z' WHERE price > 0"),
            Err(Error::ConstraintViolation(_))
        ));
        assert!(matches!(
            session.execute("UPDATE items SET price = null WHERE id = 1"),
            Err(Error::ConstraintViolation(_))
        ));
        assert!(matches!(
            session.execute("UPDATE items SET colour = 'red' WHERE id = 1"),
            Err(Error::ColumnNotFound(_))
        ));
        // same value on the same row is not a collision
        assert_eq!(
            session.execute("UPDATE items SET sku = 'a' WHERE id = 1")?,
            ResultSet::Update { count: 1 }
        );
        Ok(())
    }

    #[test]
    fn test_delete_unknown_column() -> Result<()> {
        let mut session = session()?;
        assert!(matches!(
            session.execute("DELETE FROM items WHERE colour = 'red'"),
            Err(Error::ColumnNotFound(_))
        ));
        assert_eq!(
            session.execute("DELETE FROM items WHERE id > 0")?,
            ResultSet::Delete { count: 0 }
        );
        Ok(())
    }
}
