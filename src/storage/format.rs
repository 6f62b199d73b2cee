//! Line codec for table data files.
//!
//! Line 1 is the schema header, one cell per column:
//!
//! ```text
//! id: int [primary_key, auto_increment] | user_id: int [] (users: id) |
//! ```
//!
//! Every following line is one row, cells in schema order:
//!
//! ```text
//! id: 1 | user_id: |
//! ```
//!
//! `name:` is an absent value, `name: v` a present one. Backslash, pipe and
//! newline are escaped inside values so any string survives a round trip.

use crate::{
    error::{Error, Result},
    sql::{
        schema::{Column, Constraint, ForeignKey, Table},
        types::{DataType, Row},
    },
};

const SEPARATOR: &str = " | ";

/// Encodes the header line of a table data file
pub fn encode_header(table: &Table) -> String {
    let mut line = String::new();
    for col in &table.columns {
        let constraints = col
            .constraints
            .iter()
            .map(|c| c.to_str())
            .collect::<Vec<_>>()
            .join(", ");
        line.push_str(&format!("{}: {} [{}]", col.name, col.datatype, constraints));
        if let Some(fk) = &col.foreign_key {
            line.push_str(&format!(" ({}: {})", fk.table, fk.column));
        }
        line.push_str(SEPARATOR);
    }
    line
}

/// Decodes a header line back into the table's columns
pub fn decode_header(database: &str, name: &str, line: &str) -> Result<Table> {
    let corrupt = |detail: &str| {
        Error::Io(format!(
            "corrupt header in table {}.{}: {}",
            database, name, detail
        ))
    };

    let mut columns = Vec::new();
    for cell in line.split('|').map(str::trim).filter(|c| !c.is_empty()) {
        let (col_name, rest) = cell.split_once(':').ok_or_else(|| corrupt(cell))?;
        let rest = rest.trim();

        let (type_name, rest) = rest.split_once(' ').unwrap_or((rest, ""));
        let datatype = DataType::from_str(type_name).ok_or_else(|| corrupt(cell))?;

        let rest = rest.trim();
        let (constraints, rest) = match rest.strip_prefix('[') {
            Some(r) => r.split_once(']').ok_or_else(|| corrupt(cell))?,
            None => ("", rest),
        };
        let constraints = constraints
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(|c| Constraint::from_str(c).ok_or_else(|| corrupt(cell)))
            .collect::<Result<Vec<_>>>()?;

        let rest = rest.trim();
        let foreign_key = match rest.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
            Some(target) => {
                let (table, column) = target.split_once(':').ok_or_else(|| corrupt(cell))?;
                Some(ForeignKey {
                    table: table.trim().to_string(),
                    column: column.trim().to_string(),
                })
            }
            None if rest.is_empty() => None,
            None => return Err(corrupt(cell)),
        };

        columns.push(Column::new(col_name.trim(), datatype, constraints, foreign_key)?);
    }

    let table = Table {
        database: database.to_string(),
        name: name.to_string(),
        columns,
    };
    table.validate().map_err(|e| corrupt(&e.to_string()))?;
    Ok(table)
}

/// Encodes a row as a data line, every cell followed by the separator
pub fn encode_row(table: &Table, row: &Row) -> String {
    let mut line = String::new();
    for col in &table.columns {
        match row.get(&col.name).and_then(|v| v.as_deref()) {
            Some(value) => line.push_str(&format!("{}: {}", col.name, escape(value))),
            None => line.push_str(&format!("{}:", col.name)),
        }
        line.push_str(SEPARATOR);
    }
    line
}

/// Decodes a data line, with or without the trailing separator. Columns of
/// the table missing from the line are absent.
pub fn decode_row(table: &Table, line: &str) -> Result<Row> {
    let mut row = table
        .columns
        .iter()
        .map(|c| (c.name.clone(), None))
        .collect::<Row>();

    let mut cells = split_cells(line);
    let terminated = cells.len() > 1 && cells.last().is_some_and(|c| c.trim().is_empty());
    if terminated {
        cells.pop();
    }
    let last = cells.len().saturating_sub(1);
    for (i, cell) in cells.iter().enumerate() {
        let mut cell = cell.as_str();
        if i > 0 {
            cell = cell.strip_prefix(' ').unwrap_or(cell);
        }
        if i < last || terminated {
            cell = cell.strip_suffix(' ').unwrap_or(cell);
        }

        let (name, value) = cell.split_once(':').ok_or_else(|| {
            Error::Io(format!("corrupt row in table {}: {}", table.name, line))
        })?;
        let column = table.must_get_column(name.trim())?;
        let value = match value.strip_prefix(' ') {
            Some(value) => Some(unescape(value)),
            None if value.is_empty() => None,
            None => Some(unescape(value)),
        };
        row.insert(column.name.clone(), value);
    }
    Ok(row)
}

/// Human-readable description written beside the data file
pub fn render_metadata(table: &Table) -> String {
    let mut text = format!("Metadata file for table: {}\n\nColumns:\n", table.name);
    for col in &table.columns {
        text.push_str(&format!("{}: {}", col.name, col.datatype));
        if !col.constraints.is_empty() {
            let constraints = col
                .constraints
                .iter()
                .map(|c| c.to_str())
                .collect::<Vec<_>>()
                .join(", ");
            text.push_str(&format!("\n  Constraints: {}", constraints));
        }
        if let Some(fk) = &col.foreign_key {
            text.push_str(&format!("\n  Foreign Key -> {}.{}", fk.table, fk.column));
        }
        text.push('\n');
    }
    text
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '|' => out.push_str("\\|"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some(next) => out.push(next),
            None => out.push('\\'),
        }
    }
    out
}

/// Splits on unescaped pipes, keeping escapes in place
fn split_cells(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        match c {
            '|' => cells.push(std::mem::take(&mut cell)),
            '\\' => {
                cell.push('\\');
                if let Some(next) = chars.next() {
                    cell.push(next);
                }
            }
            c => cell.push(c),
        }
    }
    cells.push(cell);
    cells
}
