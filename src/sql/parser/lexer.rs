//! Statement lexer - splits command text into words, quoted strings and symbols,
//! and scans INSERT value lists into value units

use std::{iter::Peekable, str::Chars};

use crate::{
    error::{Error, Result},
    sql::types::parse_literal,
};

/// Represents a single lexical token in the command text
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Reserved keyword
    Keyword(Keyword),
    /// Any other run of non-symbol characters (names, numbers, dotted references)
    Word(String),
    /// Single- or double-quoted string, quotes removed
    String(String),
    OpenParen,
    CloseParen,
    Comma,
    Semicolon,
    Asterisk,
    Equal,
}

/// Reserved keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Create,
    Database,
    Table,
    Use,
    Insert,
    Into,
    Values,
    Select,
    From,
    Where,
    Update,
    Set,
    Delete,
    Drop,
    Autocommit,
    Start,
    Transaction,
    Rollback,
    Commit,
}

impl Keyword {
    /// Attempts to parse a string as a keyword (case-insensitive)
    pub fn from_str(ident: &str) -> Option<Keyword> {
        Some(match ident.to_uppercase().as_ref() {
            "CREATE" => Keyword::Create,
            "DATABASE" => Keyword::Database,
            "TABLE" => Keyword::Table,
            "USE" => Keyword::Use,
            "INSERT" => Keyword::Insert,
            "INTO" => Keyword::Into,
            "VALUES" => Keyword::Values,
            "SELECT" => Keyword::Select,
            "FROM" => Keyword::From,
            "WHERE" => Keyword::Where,
            "UPDATE" => Keyword::Update,
            "SET" => Keyword::Set,
            "DELETE" => Keyword::Delete,
            "DROP" => Keyword::Drop,
            "AUTOCOMMIT" => Keyword::Autocommit,
            "START" => Keyword::Start,
            "TRANSACTION" => Keyword::Transaction,
            "ROLLBACK" => Keyword::Rollback,
            "COMMIT" => Keyword::Commit,
            _ => return None,
        })
    }

    /// Returns the uppercase string representation of the keyword
    pub fn to_str(&self) -> &str {
        match self {
            Keyword::Create => "CREATE",
            Keyword::Database => "DATABASE",
            Keyword::Table => "TABLE",
            Keyword::Use => "USE",
            Keyword::Insert => "INSERT",
            Keyword::Into => "INTO",
            Keyword::Values => "VALUES",
            Keyword::Select => "SELECT",
            Keyword::From => "FROM",
            Keyword::Where => "WHERE",
            Keyword::Update => "UPDATE",
            Keyword::Set => "SET",
            Keyword::Delete => "DELETE",
            Keyword::Drop => "DROP",
            Keyword::Autocommit => "AUTOCOMMIT",
            Keyword::Start => "START",
            Keyword::Transaction => "TRANSACTION",
            Keyword::Rollback => "ROLLBACK",
            Keyword::Commit => "COMMIT",
        }
    }
}

/// Lexical analyzer over command text
pub struct Lexer<'a> {
    iter: Peekable<Chars<'a>>,
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        self.scan().transpose()
    }
}

impl<'a> Lexer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            iter: text.chars().peekable(),
        }
    }

    /// Consumes the next character if it satisfies the predicate
    fn next_if<F: Fn(char) -> bool>(&mut self, predicate: F) -> Option<char> {
        self.iter.peek().filter(|&c| predicate(*c))?;
        self.iter.next()
    }

    /// Consumes consecutive characters while they satisfy the predicate
    fn next_while<F: Fn(char) -> bool>(&mut self, predicate: F) -> Option<String> {
        let mut value = String::new();
        while let Some(c) = self.next_if(&predicate) {
            value.push(c);
        }
        Some(value).filter(|v| !v.is_empty())
    }

    fn erase_whitespace(&mut self) {
        self.next_while(|c| c.is_whitespace());
    }

    fn scan(&mut self) -> Result<Option<Token>> {
        self.erase_whitespace();
        match self.iter.peek() {
            Some(&q) if q == '\'' || q == '"' => {
                self.scan_string(q).map(|s| Some(Token::String(s)))
            }
            Some(&c) if is_symbol(c) => Ok(self.scan_symbol()),
            Some(_) => Ok(self.scan_word()),
            None => Ok(None),
        }
    }

    /// Scans a quoted string, returning its content without the quotes
    fn scan_string(&mut self, quote: char) -> Result<String> {
        self.iter.next();
        let mut val = String::new();
        loop {
            match self.iter.next() {
                Some(c) if c == quote => break,
                Some(c) => val.push(c),
                None => {
                    return Err(Error::MalformedStatement(format!(
                        "statement (unterminated string {}{})",
                        quote, val
                    )));
                }
            }
        }
        Ok(val)
    }

    /// Scans a word; keywords are recognized case-insensitively
    fn scan_word(&mut self) -> Option<Token> {
        let word =
            self.next_while(|c| !c.is_whitespace() && !is_symbol(c) && c != '\'' && c != '"')?;
        Some(Keyword::from_str(&word).map_or(Token::Word(word), Token::Keyword))
    }

    fn scan_symbol(&mut self) -> Option<Token> {
        let token = match self.iter.peek()? {
            '(' => Token::OpenParen,
            ')' => Token::CloseParen,
            ',' => Token::Comma,
            ';' => Token::Semicolon,
            '*' => Token::Asterisk,
            '=' => Token::Equal,
            _ => return None,
        };
        self.iter.next();
        Some(token)
    }

    /// Scans a comma-separated value list (the text inside `VALUES ( ... )`).
    ///
    /// Each unit is a single-quoted string, a double-quoted string, or a bare
    /// run of characters up to the next comma. Quoted units keep their content
    /// verbatim; bare units are trimmed, and a bare `null` is an absent value.
    pub fn scan_values(mut self) -> Result<Vec<Option<String>>> {
        let mut values = Vec::new();
        loop {
            self.erase_whitespace();
            let value = match self.iter.peek() {
                Some(&q) if q == '\'' || q == '"' => Some(self.scan_string(q)?),
                _ => {
                    let bare = self.next_while(|c| c != ',').unwrap_or_default();
                    parse_literal(&bare)
                }
            };
            values.push(value);

            self.erase_whitespace();
            match self.iter.next() {
                Some(',') => continue,
                None => break,
                Some(c) => {
                    return Err(Error::MalformedStatement(format!(
                        "INSERT (unexpected character {} after value)",
                        c
                    )))
                }
            }
        }
        Ok(values)
    }
}

fn is_symbol(c: char) -> bool {
    matches!(c, '(' | ')' | ',' | ';' | '*' | '=')
}
