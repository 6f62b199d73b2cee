use crate::error::{Error, Result};
use crate::sql::condition::Condition;
use crate::sql::parser::lexer::{Keyword, Lexer, Token};
use crate::sql::schema::{Column, Constraint, ForeignKey};
use crate::sql::types::{parse_literal, DataType};

pub mod ast;
mod lexer;

/// Statement kinds, identified by their leading keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    CreateDatabase,
    CreateTable,
    UseDatabase,
    Insert,
    Select,
    Update,
    Delete,
    DropTable,
    SetAutoCommit,
    StartTransaction,
    Rollback,
    Commit,
}

impl StatementKind {
    pub const ALL: [StatementKind; 12] = [
        StatementKind::CreateDatabase,
        StatementKind::CreateTable,
        StatementKind::UseDatabase,
        StatementKind::Insert,
        StatementKind::Select,
        StatementKind::Update,
        StatementKind::Delete,
        StatementKind::DropTable,
        StatementKind::SetAutoCommit,
        StatementKind::StartTransaction,
        StatementKind::Rollback,
        StatementKind::Commit,
    ];

    /// Keyword sequence the statement must start with
    pub fn prefix(&self) -> &'static [Keyword] {
        match self {
            StatementKind::CreateDatabase => &[Keyword::Create, Keyword::Database],
            StatementKind::CreateTable => &[Keyword::Create, Keyword::Table],
            StatementKind::UseDatabase => &[Keyword::Use],
            StatementKind::Insert => &[Keyword::Insert, Keyword::Into],
            StatementKind::Select => &[Keyword::Select],
            StatementKind::Update => &[Keyword::Update],
            StatementKind::Delete => &[Keyword::Delete, Keyword::From],
            StatementKind::DropTable => &[Keyword::Drop, Keyword::Table],
            StatementKind::SetAutoCommit => &[Keyword::Set, Keyword::Autocommit],
            StatementKind::StartTransaction => &[Keyword::Start, Keyword::Transaction],
            StatementKind::Rollback => &[Keyword::Rollback],
            StatementKind::Commit => &[Keyword::Commit],
        }
    }

    pub fn name(&self) -> String {
        self.prefix()
            .iter()
            .map(|k| k.to_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Classifies command text by its leading keywords.
    ///
    /// Matching is token-wise, so `USER` never matches `USE` and
    /// `CREATE TABLE` never matches `CREATE DATABASE`. Prefixes are disjoint
    /// (none is a token-prefix of another), so at most one kind can match and
    /// the order of `ALL` does not affect the result.
    pub fn classify(text: &str) -> Result<StatementKind> {
        let leading = Lexer::new(text)
            .map_while(|t| match t {
                Ok(Token::Keyword(k)) => Some(k),
                _ => None,
            })
            .take(2)
            .collect::<Vec<_>>();

        Self::ALL
            .into_iter()
            .find(|kind| leading.starts_with(kind.prefix()))
            .ok_or_else(|| Error::UnknownStatement(text.to_string()))
    }

    fn malformed(&self, detail: &str) -> Error {
        if detail.is_empty() {
            Error::MalformedStatement(self.name())
        } else {
            Error::MalformedStatement(format!("{} ({})", self.name(), detail))
        }
    }
}

/// Strips surrounding whitespace and one trailing semicolon
pub fn strip_terminator(input: &str) -> &str {
    let input = input.trim();
    input.strip_suffix(';').unwrap_or(input).trim_end()
}

/// `exit` is a command-loop signal, recognized before classification
pub fn is_exit(input: &str) -> bool {
    strip_terminator(input).eq_ignore_ascii_case("exit")
}

/// Statement parser - classifies command text and extracts its operands
pub struct Parser<'a> {
    text: &'a str,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given command text
    pub fn new(input: &'a str) -> Self {
        Parser {
            text: strip_terminator(input),
        }
    }

    /// Parses the command text into a statement
    pub fn parse(&mut self) -> Result<ast::Statement> {
        let kind = StatementKind::classify(self.text)?;
        let words = self.text.split_whitespace().collect::<Vec<_>>();
        match kind {
            StatementKind::CreateDatabase => {
                let [_, _, name] = words[..] else {
                    return Err(kind.malformed(""));
                };
                Ok(ast::Statement::CreateDatabase {
                    name: name.to_string(),
                })
            }
            StatementKind::UseDatabase => {
                let [_, name] = words[..] else {
                    return Err(kind.malformed(""));
                };
                Ok(ast::Statement::UseDatabase {
                    name: name.to_string(),
                })
            }
            StatementKind::DropTable => {
                let [_, _, name] = words[..] else {
                    return Err(kind.malformed(""));
                };
                Ok(ast::Statement::DropTable {
                    name: name.to_string(),
                })
            }
            StatementKind::StartTransaction => match words.len() {
                2 => Ok(ast::Statement::StartTransaction),
                _ => Err(kind.malformed("")),
            },
            StatementKind::Commit => match words.len() {
                1 => Ok(ast::Statement::Commit),
                _ => Err(kind.malformed("")),
            },
            StatementKind::Rollback => match words.len() {
                1 => Ok(ast::Statement::Rollback),
                _ => Err(kind.malformed("")),
            },
            StatementKind::SetAutoCommit => self.parse_set_autocommit(kind),
            StatementKind::CreateTable => self.parse_create_table(kind, &words),
            StatementKind::Insert => self.parse_insert(kind, &words),
            StatementKind::Select => self.parse_select(kind),
            StatementKind::Update => self.parse_update(kind, &words),
            StatementKind::Delete => self.parse_delete(kind),
        }
    }

    /// SET AUTOCOMMIT = 0|1
    fn parse_set_autocommit(&self, kind: StatementKind) -> Result<ast::Statement> {
        let rest = self.after_keyword(Keyword::Autocommit).unwrap_or_default().trim();
        let flag = rest.strip_prefix('=').unwrap_or(rest).trim();
        match flag {
            "0" => Ok(ast::Statement::SetAutoCommit { enabled: false }),
            "1" => Ok(ast::Statement::SetAutoCommit { enabled: true }),
            _ => Err(kind.malformed("expected 0 or 1")),
        }
    }

    /// CREATE TABLE name (col type [constraint|foreign_key t.c]*, ...)
    fn parse_create_table(&self, kind: StatementKind, words: &[&str]) -> Result<ast::Statement> {
        if words.len() < 4 {
            return Err(kind.malformed(""));
        }
        let name = words[2].to_string();
        let block = inside_parens(self.text)
            .filter(|b| !b.trim().is_empty())
            .ok_or_else(|| {
                Error::InvalidColumnDefinition(format!("no column definitions for table {}", name))
            })?;

        let columns = block
            .split(',')
            .map(parse_column)
            .collect::<Result<Vec<_>>>()?;
        Ok(ast::Statement::CreateTable { name, columns })
    }

    /// INSERT INTO name [(col, ...)] VALUES (v, ...)
    fn parse_insert(&self, kind: StatementKind, words: &[&str]) -> Result<ast::Statement> {
        let values_at = find_keyword(self.text, Keyword::Values);
        let into_end = self.keyword_end(Keyword::Into);
        let (Some(values_at), Some(into_end)) = (values_at, into_end) else {
            return Err(kind.malformed("missing VALUES"));
        };
        if words.len() <= 3 || into_end > values_at {
            return Err(kind.malformed(""));
        }

        // table name runs up to whitespace or the column list
        let target = self.text[into_end..values_at].trim();
        let name_len = target
            .find(|c: char| c.is_whitespace() || c == '(')
            .unwrap_or(target.len());
        let table_name = target[..name_len].to_string();
        if table_name.is_empty() {
            return Err(kind.malformed("missing table name"));
        }

        let columns = match inside_parens(&target[name_len..]) {
            Some(list) if !list.trim().is_empty() => Some(split_names(list).ok_or_else(|| {
                kind.malformed("empty column name")
            })?),
            _ => None,
        };

        let values_text = self.text[values_at + Keyword::Values.to_str().len()..].trim();
        let inner = values_text
            .strip_prefix('(')
            .and_then(|v| v.strip_suffix(')'))
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| kind.malformed("invalid values provided"))?;
        let values = Lexer::new(inner).scan_values()?;

        Ok(ast::Statement::Insert {
            table_name,
            columns,
            values,
        })
    }

    /// SELECT cols|* FROM name [WHERE cond]
    fn parse_select(&self, kind: StatementKind) -> Result<ast::Statement> {
        let select_end = self
            .keyword_end(Keyword::Select)
            .ok_or_else(|| kind.malformed(""))?;
        let from_at = find_keyword(self.text, Keyword::From)
            .ok_or_else(|| kind.malformed("missing FROM"))?;
        let from_end = from_at + Keyword::From.to_str().len();
        if from_at < select_end {
            return Err(kind.malformed(""));
        }

        let projection = self.text[select_end..from_at].trim();
        let columns = match projection {
            "*" => None,
            _ => Some(split_names(projection).ok_or_else(|| kind.malformed("empty column name"))?),
        };

        let rest = &self.text[from_end..];
        let (target, filter) = match find_keyword(rest, Keyword::Where) {
            Some(at) => (
                &rest[..at],
                Some(parse_filter(kind, &rest[at + Keyword::Where.to_str().len()..])?),
            ),
            None => (rest, None),
        };
        let table_name = single_word(target)
            .ok_or_else(|| kind.malformed("expected a table name after FROM"))?;

        Ok(ast::Statement::Select {
            table_name,
            columns,
            filter,
        })
    }

    /// UPDATE name SET col = value WHERE cond
    fn parse_update(&self, kind: StatementKind, words: &[&str]) -> Result<ast::Statement> {
        let set_at = find_keyword(self.text, Keyword::Set);
        let where_at = find_keyword(self.text, Keyword::Where);
        let (Some(set_at), Some(where_at)) = (set_at, where_at) else {
            return Err(kind.malformed("SET and WHERE are required"));
        };
        let update_end = self.keyword_end(Keyword::Update).unwrap_or_default();
        if set_at > where_at || words.len() < 2 {
            return Err(kind.malformed(""));
        }
        let table_name = single_word(&self.text[update_end..set_at])
            .ok_or_else(|| kind.malformed("expected a table name before SET"))?;

        let assignment = self.text[set_at + Keyword::Set.to_str().len()..where_at].trim();
        let (column, value) = parse_assignment(assignment)?;
        let filter = parse_filter(kind, &self.text[where_at + Keyword::Where.to_str().len()..])?;

        Ok(ast::Statement::Update {
            table_name,
            column,
            value,
            filter,
        })
    }

    /// DELETE FROM name WHERE cond
    fn parse_delete(&self, kind: StatementKind) -> Result<ast::Statement> {
        let from_end = self.keyword_end(Keyword::From).ok_or_else(|| kind.malformed(""))?;
        let rest = &self.text[from_end..];
        let where_at = find_keyword(rest, Keyword::Where)
            .ok_or_else(|| kind.malformed("WHERE is required"))?;
        let table_name = single_word(&rest[..where_at])
            .ok_or_else(|| kind.malformed("expected a table name before WHERE"))?;
        let filter = parse_filter(kind, &rest[where_at + Keyword::Where.to_str().len()..])?;
        Ok(ast::Statement::Delete { table_name, filter })
    }

    /// Byte offset just past the first whole-word occurrence of the keyword
    fn keyword_end(&self, keyword: Keyword) -> Option<usize> {
        find_keyword(self.text, keyword).map(|at| at + keyword.to_str().len())
    }

    fn after_keyword(&self, keyword: Keyword) -> Option<&'a str> {
        let text = self.text;
        self.keyword_end(keyword).map(|end| &text[end..])
    }
}

/// Parses one column definition: `name type [constraint|foreign_key table.column]*`
fn parse_column(def: &str) -> Result<Column> {
    let parts = def.split_whitespace().collect::<Vec<_>>();
    if parts.len() < 2 {
        return Err(Error::InvalidColumnDefinition(def.trim().to_string()));
    }

    let datatype = DataType::from_str(parts[1]).ok_or_else(|| {
        Error::InvalidColumnDefinition(format!(
            "invalid column type {}. Allowed types: [{}]",
            parts[1],
            DataType::ALL.map(|t| t.to_str().to_string()).join(", ")
        ))
    })?;

    let mut constraints = Vec::new();
    let mut foreign_key = None;
    let mut iter = parts[2..].iter();
    while let Some(part) = iter.next() {
        if part.eq_ignore_ascii_case("foreign_key") {
            let (table, column) = iter
                .next()
                .and_then(|target| target.split_once('.'))
                .filter(|(t, c)| !t.is_empty() && !c.is_empty())
                .ok_or_else(|| {
                    Error::InvalidColumnDefinition(format!(
                        "invalid foreign key definition for column {}",
                        parts[0]
                    ))
                })?;
            if foreign_key.is_some() {
                return Err(Error::InvalidColumnDefinition(format!(
                    "column {} declares more than one foreign key",
                    parts[0]
                )));
            }
            foreign_key = Some(ForeignKey {
                table: table.to_string(),
                column: column.to_lowercase(),
            });
        } else {
            let constraint = Constraint::from_str(part).ok_or_else(|| {
                Error::InvalidColumnDefinition(format!(
                    "invalid constraint {}. Allowed constraints: [{}]",
                    part,
                    Constraint::ALL.map(|c| c.to_str().to_string()).join(", ")
                ))
            })?;
            constraints.push(constraint);
        }
    }

    Column::new(parts[0], datatype, constraints, foreign_key)
}

/// Parses the single `col = value` assignment of a SET clause
fn parse_assignment(assignment: &str) -> Result<(String, Option<String>)> {
    let mut quote = None;
    let mut equals = Vec::new();
    for (i, c) in assignment.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '=') => equals.push(i),
            _ => {}
        }
    }
    let [at] = equals[..] else {
        return Err(Error::InvalidSetClause(format!(
            "expected exactly one column = value assignment, got '{}'",
            assignment
        )));
    };

    let column = single_word(&assignment[..at])
        .ok_or_else(|| Error::InvalidSetClause(format!("invalid column in '{}'", assignment)))?;
    Ok((column.to_lowercase(), parse_literal(&assignment[at + 1..])))
}

fn parse_filter(kind: StatementKind, condition: &str) -> Result<Condition> {
    let condition = condition.trim();
    if condition.is_empty() {
        return Err(kind.malformed("empty WHERE condition"));
    }
    Condition::parse(condition)
}

/// Comma-separated names, lowercased; None if any entry is empty
fn split_names(list: &str) -> Option<Vec<String>> {
    list.split(',')
        .map(|n| Some(n.trim()).filter(|n| !n.is_empty()).map(str::to_lowercase))
        .collect()
}

/// The text as one whitespace-free word, or None
fn single_word(text: &str) -> Option<String> {
    let mut words = text.split_whitespace();
    match (words.next(), words.next()) {
        (Some(word), None) => Some(word.to_string()),
        _ => None,
    }
}

/// Content of the first parenthesis pair, matched by depth
fn inside_parens(text: &str) -> Option<&str> {
    let open = text.find('(')?;
    let mut depth = 0usize;
    for (i, c) in text[open..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[open + 1..open + i]);
                }
            }
            _ => {}
        }
    }
    None
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80
}

/// Byte offset of the first whole-word, case-insensitive occurrence of the
/// keyword outside quoted strings
fn find_keyword(text: &str, keyword: Keyword) -> Option<usize> {
    let kw = keyword.to_str().as_bytes();
    let bytes = text.as_bytes();
    let mut quote = None;
    for i in 0..bytes.len() {
        let b = bytes[i];
        let after_word = i > 0 && is_word_byte(bytes[i - 1]);
        match quote {
            Some(q) if b == q => {
                quote = None;
                continue;
            }
            Some(_) => continue,
            None if (b == b'\'' || b == b'"') && !after_word => {
                quote = Some(b);
                continue;
            }
            None => {}
        }
        let end = i + kw.len();
        if !after_word
            && end <= bytes.len()
            && bytes[i..end].eq_ignore_ascii_case(kw)
            && (end == bytes.len() || !is_word_byte(bytes[end]))
        {
            return Some(i);
        }
    }
    None
}
