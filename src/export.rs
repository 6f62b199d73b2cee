//! Read-only renderings of a database: a re-executable SQL dump and an
//! entity-relationship text diagram.

use crate::{
    error::Result,
    sql::{
        engine::Transaction,
        schema::{Constraint, Database, Relationship, Table},
        types::DataType,
    },
};

/// Tables ordered so that every foreign key target precedes the table using it
fn creation_order(database: &Database) -> Vec<&Table> {
    let mut ordered: Vec<&Table> = Vec::with_capacity(database.tables.len());
    let mut pending = database.tables.iter().collect::<Vec<_>>();
    while !pending.is_empty() {
        let ready = pending.iter().position(|t| {
            t.columns.iter().all(|c| match &c.foreign_key {
                Some(fk) => {
                    fk.table == t.name
                        || database.get_table(&fk.table).is_none()
                        || ordered.iter().any(|o| o.name == fk.table)
                }
                None => true,
            })
        });
        // a reference cycle cannot be satisfied, keep declaration order
        ordered.push(pending.remove(ready.unwrap_or(0)));
    }
    ordered
}

fn column_definition(table: &Table) -> String {
    table
        .columns
        .iter()
        .map(|col| {
            let mut def = format!("{} {}", col.name, col.datatype);
            for constraint in &col.constraints {
                def.push(' ');
                def.push_str(constraint.to_str());
            }
            if let Some(fk) = &col.foreign_key {
                def.push_str(&format!(" foreign_key {}.{}", fk.table, fk.column));
            }
            def
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn literal(datatype: DataType, value: Option<&str>) -> String {
    match (datatype, value) {
        (_, None) => "null".to_string(),
        (DataType::Int | DataType::Double, Some(v)) => v.to_string(),
        (DataType::String, Some(v)) if v.contains('\'') && !v.contains('"') => format!("\"{}\"", v),
        (DataType::String, Some(v)) => format!("'{}'", v),
    }
}

/// Renders CREATE and INSERT statements that rebuild the database. Rows whose
/// auto_increment value differs from what replaying INSERT assigns get an
/// UPDATE restoring the stored value.
pub fn dump_database<T: Transaction>(txn: &T, name: &str) -> Result<String> {
    let database = txn.get_database(name)?;
    let mut lines = vec![format!("CREATE DATABASE {};", name), format!("USE {};", name)];

    for table in creation_order(database) {
        lines.push(format!("CREATE TABLE {} ({});", table.name, column_definition(table)));
        let columns = table.column_names().join(", ");
        let auto_columns = table
            .columns
            .iter()
            .filter(|c| c.has(Constraint::AutoIncrement))
            .collect::<Vec<_>>();
        // highest value per auto_increment column once the rows so far are replayed
        let mut replayed_max: Vec<Option<i64>> = vec![None; auto_columns.len()];

        for row in txn.scan_table(table)? {
            let value = |name: &str| row.get(name).and_then(|v| v.as_deref());
            let values = table
                .columns
                .iter()
                .map(|c| literal(c.datatype, value(&c.name)))
                .collect::<Vec<_>>()
                .join(", ");
            lines.push(format!("INSERT INTO {} ({}) VALUES ({});", table.name, columns, values));

            // INSERT assigns max + 1, put the stored value back when it differs
            for (col, max) in auto_columns.iter().zip(replayed_max.iter_mut()) {
                let stored = value(&col.name);
                let Some(assigned) = max.map_or(Some(1), |m| m.checked_add(1)) else {
                    continue;
                };
                if stored != Some(assigned.to_string().as_str()) {
                    lines.push(format!(
                        "UPDATE {} SET {} = {} WHERE {} = {};",
                        table.name,
                        col.name,
                        literal(col.datatype, stored),
                        col.name,
                        assigned
                    ));
                }
                if let Some(stored) = stored.and_then(|v| v.parse::<i64>().ok()) {
                    *max = Some(max.map_or(stored, |m| m.max(stored)));
                }
            }
        }
    }

    let mut dump = lines.join("\n");
    dump.push('\n');
    Ok(dump)
}

/// Renders the entity-relationship diagram text of a database
pub fn render_erd(database: &Database) -> String {
    let mut erd = format!("Entity-Relationship Diagram for Database: {}\n\n", database.name);

    for table in &database.tables {
        erd.push_str(&format!("Table: {}\nColumns:\n", table.name));
        for col in &table.columns {
            erd.push_str(&format!("  - {} ({})", col.name, col.datatype));
            if !col.constraints.is_empty() {
                let constraints = col
                    .constraints
                    .iter()
                    .map(|c| c.to_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                erd.push_str(&format!(" {}", constraints));
            }
            erd.push('\n');
            if let Some(fk) = &col.foreign_key {
                erd.push_str(&format!("    Foreign Key -> {}.{}\n", fk.table, fk.column));
            }
        }
        erd.push('\n');
    }

    erd.push_str("Relationships and Cardinality:\n");
    let relationships = Relationship::derive(database);
    for table in &database.tables {
        let mut owned = relationships.iter().filter(|r| r.table == table.name).peekable();
        if owned.peek().is_none() {
            continue;
        }
        erd.push_str(&format!("Table: {}\n", table.name));
        for rel in owned {
            erd.push_str(&format!(
                "  - {} ({}) -> ({}) {}\n",
                rel.left_column, rel.left_cardinality, rel.right_cardinality, rel.right_column
            ));
        }
        erd.push('\n');
    }
    erd
}
