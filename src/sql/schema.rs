use std::fmt::Display;

use crate::{
    error::{Error, Result},
    sql::types::DataType,
};

/// Column constraints
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Constraint {
    PrimaryKey,
    NonNull,
    AutoIncrement,
    Unique,
}

impl Constraint {
    pub const ALL: [Constraint; 4] = [
        Constraint::PrimaryKey,
        Constraint::NonNull,
        Constraint::AutoIncrement,
        Constraint::Unique,
    ];

    /// Parses a constraint name (case-insensitive)
    pub fn from_str(name: &str) -> Option<Constraint> {
        Some(match name.to_lowercase().as_ref() {
            "primary_key" => Constraint::PrimaryKey,
            "non_null" => Constraint::NonNull,
            "auto_increment" => Constraint::AutoIncrement,
            "unique" => Constraint::Unique,
            _ => return None,
        })
    }

    pub fn to_str(&self) -> &str {
        match self {
            Constraint::PrimaryKey => "primary_key",
            Constraint::NonNull => "non_null",
            Constraint::AutoIncrement => "auto_increment",
            Constraint::Unique => "unique",
        }
    }
}

impl Display for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_str())
    }
}

/// Characters the table file header uses as delimiters, never valid in a name
pub const RESERVED_NAME_CHARS: [char; 7] = [':', '|', '[', ']', '(', ')', ','];

/// Foreign key target (`table.column`)
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    pub table: String,
    pub column: String,
}

/// Column schema definition
///
/// Immutable once built; `Column::new` is the only way to get one that
/// passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub datatype: DataType,
    /// Declared constraints, deduplicated, in declaration order
    pub constraints: Vec<Constraint>,
    pub foreign_key: Option<ForeignKey>,
}

impl Column {
    pub fn new(
        name: &str,
        datatype: DataType,
        constraints: Vec<Constraint>,
        foreign_key: Option<ForeignKey>,
    ) -> Result<Self> {
        if name.is_empty()
            || name.contains(RESERVED_NAME_CHARS)
            || name.contains(char::is_whitespace)
        {
            return Err(Error::InvalidColumnDefinition(format!("invalid column name {}", name)));
        }
        let mut deduped = Vec::with_capacity(constraints.len());
        for c in constraints {
            if !deduped.contains(&c) {
                deduped.push(c);
            }
        }
        if deduped.contains(&Constraint::AutoIncrement) && datatype != DataType::Int {
            return Err(Error::InvalidColumnDefinition(format!(
                "auto_increment can only be applied to int columns, column {} is {}",
                name, datatype
            )));
        }
        Ok(Self {
            name: name.to_lowercase(),
            datatype,
            constraints: deduped,
            foreign_key,
        })
    }

    pub fn has(&self, constraint: Constraint) -> bool {
        self.constraints.contains(&constraint)
    }

    /// primary_key or non_null
    pub fn is_required(&self) -> bool {
        self.has(Constraint::PrimaryKey) || self.has(Constraint::NonNull)
    }

    /// primary_key or unique
    pub fn is_unique(&self) -> bool {
        self.has(Constraint::PrimaryKey) || self.has(Constraint::Unique)
    }
}

/// Table schema definition
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Owning database (back-reference by name)
    pub database: String,
    pub name: String,
    /// Column order is the on-disk order
    pub columns: Vec<Column>,
}

impl Table {
    /// Validates table schema
    pub fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(Error::InvalidColumnDefinition(format!(
                "table {} has no columns",
                self.name
            )));
        }
        if self.name.contains('(') || self.name.contains(')') {
            return Err(Error::MalformedStatement(format!(
                "CREATE TABLE (table name {} is invalid)",
                self.name
            )));
        }
        for (i, col) in self.columns.iter().enumerate() {
            if self.columns[..i].iter().any(|c| c.name == col.name) {
                return Err(Error::InvalidColumnDefinition(format!(
                    "duplicate column {} in table {}",
                    col.name, self.name
                )));
            }
        }
        Ok(())
    }

    pub fn get_column(&self, name: &str) -> Option<&Column> {
        let name = name.to_lowercase();
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns the column, or an error if the table does not declare it
    pub fn must_get_column(&self, name: &str) -> Result<&Column> {
        self.get_column(name)
            .ok_or_else(|| Error::ColumnNotFound(format!("{}.{}", self.name, name)))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.get_column(name).is_some()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// A database owns an ordered list of uniquely-named tables
#[derive(Debug, Clone, PartialEq)]
pub struct Database {
    pub name: String,
    pub tables: Vec<Table>,
}

impl Database {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tables: Vec::new(),
        }
    }

    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn must_get_table(&self, name: &str) -> Result<&Table> {
        self.get_table(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    /// Checks a new table against this database before it is registered:
    /// the name must be free and every foreign key must point at an
    /// already-created table that declares the referenced column.
    pub fn check_new_table(&self, table: &Table) -> Result<()> {
        table.validate()?;
        if self.get_table(&table.name).is_some() {
            return Err(Error::AlreadyExists(format!("table {}", table.name)));
        }
        for col in &table.columns {
            let Some(fk) = &col.foreign_key else { continue };
            let target = self.get_table(&fk.table).ok_or_else(|| {
                Error::InvalidColumnDefinition(format!(
                    "invalid table {} in foreign key of column {}",
                    fk.table, col.name
                ))
            })?;
            if !target.has_column(&fk.column) {
                return Err(Error::InvalidColumnDefinition(format!(
                    "invalid column {}.{} in foreign key of column {}",
                    fk.table, fk.column, col.name
                )));
            }
        }
        Ok(())
    }

    pub fn add_table(&mut self, table: Table) {
        self.tables.push(table);
    }

    pub fn remove_table(&mut self, name: &str) -> Option<Table> {
        let pos = self.tables.iter().position(|t| t.name == name)?;
        Some(self.tables.remove(pos))
    }
}

/// Relationship endpoint cardinality
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    One,
    Many,
}

impl Cardinality {
    pub fn of(column: &Column) -> Self {
        if column.is_unique() {
            Cardinality::One
        } else {
            Cardinality::Many
        }
    }
}

impl Display for Cardinality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cardinality::One => f.write_str("ONE"),
            Cardinality::Many => f.write_str("MANY"),
        }
    }
}

/// Foreign key relationship between two columns, derived on demand
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub table: String,
    pub left_column: String,
    pub left_cardinality: Cardinality,
    pub right_column: String,
    pub right_cardinality: Cardinality,
}

impl Relationship {
    /// All relationships of a database whose foreign key target still resolves
    pub fn derive(database: &Database) -> Vec<Relationship> {
        let mut relationships = Vec::new();
        for table in &database.tables {
            for col in &table.columns {
                let Some(fk) = &col.foreign_key else { continue };
                let Some(right) = database
                    .get_table(&fk.table)
                    .and_then(|t| t.get_column(&fk.column))
                else {
                    continue;
                };
                relationships.push(Relationship {
                    table: table.name.clone(),
                    left_column: col.name.clone(),
                    left_cardinality: Cardinality::of(col),
                    right_column: right.name.clone(),
                    right_cardinality: Cardinality::of(right),
                });
            }
        }
        relationships
    }
}
