use std::{collections::BTreeMap, fmt::Display};

use crate::error::{Error, Result};

/// Declared column types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Int,
    String,
    Double,
}

impl DataType {
    pub const ALL: [DataType; 3] = [DataType::Int, DataType::String, DataType::Double];

    /// Parses a type name (case-insensitive)
    pub fn from_str(name: &str) -> Option<DataType> {
        Some(match name.to_lowercase().as_ref() {
            "int" => DataType::Int,
            "string" => DataType::String,
            "double" => DataType::Double,
            _ => return None,
        })
    }

    pub fn to_str(&self) -> &str {
        match self {
            DataType::Int => "int",
            DataType::String => "string",
            DataType::Double => "double",
        }
    }

    /// Checks that a stored value is acceptable for this type
    pub fn validate(&self, column: &str, value: &str) -> Result<()> {
        let ok = match self {
            DataType::Int => value.parse::<i64>().is_ok(),
            DataType::Double => value.parse::<f64>().is_ok(),
            DataType::String => true,
        };
        if !ok {
            return Err(Error::TypeMismatch(format!(
                "'{}' is not a valid {} for column {}",
                value,
                self.to_str(),
                column
            )));
        }
        Ok(())
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_str())
    }
}

/// A row maps column name to an optional value; `None` is an absent (null) value
pub type Row = BTreeMap<String, Option<String>>;

/// Strips one layer of matching surrounding quotes (single or double)
pub fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Converts a raw operand into a stored value: bare `null` is absent, anything else is unquoted
pub fn parse_literal(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("null") {
        return None;
    }
    Some(unquote(raw).to_string())
}

#[cfg(test)]
mod tests {
    use super::{parse_literal, unquote, DataType};
    use crate::error::{Error, Result};

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("'Alice'"), "Alice");
        assert_eq!(unquote("\"Bob\""), "Bob");
        assert_eq!(unquote("''"), "");
        assert_eq!(unquote("'mismatch\""), "'mismatch\"");
        assert_eq!(unquote("'"), "'");
        assert_eq!(unquote("''nested''"), "'nested'");
    }

    #[test]
    fn test_parse_literal() {
        assert_eq!(parse_literal(" null "), None);
        assert_eq!(parse_literal("NULL"), None);
        assert_eq!(parse_literal("'null'"), Some("null".to_string()));
        assert_eq!(parse_literal(" 'x y' "), Some("x y".to_string()));
    }

    #[test]
    fn test_validate() -> Result<()> {
        DataType::Int.validate("id", "42")?;
        DataType::Double.validate("price", "4.5")?;
        DataType::Double.validate("price", "4")?;
        DataType::String.validate("name", "anything")?;
        assert!(matches!(
            DataType::Int.validate("id", "4.5"),
            Err(Error::TypeMismatch(_))
        ));
        assert_eq!(DataType::from_str("DOUBLE"), Some(DataType::Double));
        assert_eq!(DataType::from_str("bool"), None);
        Ok(())
    }
}
