use crate::{
    error::Result,
    sql::{condition::Condition, engine::Transaction, executor::ResultSet, types::Row},
};

use super::Executor;

/// Table scan executor (SELECT)
pub struct Scan {
    table_name: String,
    columns: Option<Vec<String>>,
    filter: Option<Condition>,
}

impl Scan {
    pub fn new(
        table_name: String,
        columns: Option<Vec<String>>,
        filter: Option<Condition>,
    ) -> Box<Self> {
        Box::new(Self {
            table_name,
            columns,
            filter,
        })
    }
}

impl<T: Transaction> Executor<T> for Scan {
    fn execute(self: Box<Self>, txn: &mut T) -> Result<ResultSet> {
        let table = txn.must_get_table(&self.table_name)?;
        let columns = match self.columns {
            Some(names) => names
                .iter()
                .map(|n| Ok(table.must_get_column(n)?.name.clone()))
                .collect::<Result<Vec<_>>>()?,
            None => table.column_names(),
        };
        if let Some(filter) = &self.filter {
            table.must_get_column(&filter.column)?;
        }

        let rows = txn
            .scan_table(&table)?
            .into_iter()
            .filter(|r| self.filter.as_ref().is_none_or(|f| f.evaluate(r)))
            .map(|r| {
                columns
                    .iter()
                    .map(|c| (c.clone(), r.get(c).cloned().flatten()))
                    .collect::<Row>()
            })
            .collect();
        Ok(ResultSet::Scan { columns, rows })
    }
}

/// Splits a value into chunks of at most `width` characters
fn wrap(value: &str, width: usize) -> Vec<String> {
    let chars = value.chars().collect::<Vec<_>>();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars.chunks(width).map(|c| c.iter().collect()).collect()
}

/// Renders rows as a text table: header, separator, then the rows.
///
/// Each column is as wide as its longest header or value, capped at
/// `max_width`; longer values continue on extra lines of the same row.
pub fn render_table(columns: &[String], rows: &[Row], max_width: usize) -> String {
    if rows.is_empty() {
        return "No rows found.".to_string();
    }
    let cell = |row: &Row, col: &str| -> String {
        row.get(col)
            .and_then(|v| v.clone())
            .unwrap_or_else(|| "null".to_string())
    };

    let widths = columns
        .iter()
        .map(|col| {
            let longest = rows
                .iter()
                .map(|r| cell(r, col).chars().count())
                .max()
                .unwrap_or(0);
            longest.max(col.chars().count()).min(max_width).max(1)
        })
        .collect::<Vec<_>>();

    let mut lines = Vec::new();
    lines.push(
        columns
            .iter()
            .zip(&widths)
            .map(|(col, w)| format!("{:<w$} | ", col, w = w))
            .collect::<String>(),
    );
    lines.push(
        widths
            .iter()
            .map(|w| format!("{}-+-", "-".repeat(*w)))
            .collect::<String>(),
    );

    for row in rows {
        let wrapped = columns
            .iter()
            .zip(&widths)
            .map(|(col, w)| wrap(&cell(row, col), *w))
            .collect::<Vec<_>>();
        let height = wrapped.iter().map(Vec::len).max().unwrap_or(1);
        for i in 0..height {
            lines.push(
                wrapped
                    .iter()
                    .zip(&widths)
                    .map(|(parts, w)| {
                        let part = parts.get(i).map(String::as_str).unwrap_or("");
                        format!("{:<w$} | ", part, w = w)
                    })
                    .collect::<String>(),
            );
        }
    }

    lines
        .iter()
        .map(|l| l.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}
